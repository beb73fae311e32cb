/// Scheduled transmission-opportunity model: `Contact` plus its per-priority
/// mutable available volume.
pub mod contact;
/// Ordered sequence of contacts a bundle would traverse to a destination.
pub mod route;
/// Payload in flight between acquisition and delivery or drop.
pub mod bundle;
/// FIFO-with-sort queue of bundles held on a node.
pub mod buffer;
/// Candidate route filter (feasibility screen for a bundle against a route set).
pub mod candidate;
/// External input requesting acquisition and delivery of data from a target.
pub mod request;
/// Scheduler output tying a request to an acquiring node and delivery path.
pub mod task;
/// Gossip-replicated map of task UID to task state.
pub mod task_table;

/// The deterministic contact graph: sorted contact list plus adjacency.
pub mod contact_plan;
/// Primitive type aliases and opaque identifiers.
pub mod types;
/// Lexer/parser traits shared by contact-plan and simulation-input ingest.
pub mod parsing;
/// JSON simulation-input deserialization (`simulation`, `traffic`, ...).
pub mod sim_input;

/// Route search over the contact graph: earliest-arrival Dijkstra and Yen's
/// k-shortest paths.
pub mod pathfinding;
/// Pluggable route ordering strategies.
pub mod distance;
/// Per-destination route cache.
pub mod route_storage;

/// The CGS two-phase planner.
pub mod scheduler;
/// Per-node identity, buffers, queues and route table (C6 data model).
pub mod node;
/// Per-node forwarding engine: contact lifecycle, bundle assignment,
/// over-booking reconciliation, MSR pinning.
pub mod forwarding;

/// The discrete-event simulation harness: a virtual-clock event heap driving
/// contact lifecycle, bundle forwarding and request arrivals.
pub mod sim;

/// Aggregate counters and latency samples observed by the scheduler, task
/// table and forwarding engine.
pub mod analytics;
/// The object threaded by reference through every component in place of a
/// global: virtual clock, id allocator, analytics sink.
pub mod context;
/// Errors that cross an API boundary of this crate.
pub mod error;
/// Id generation for requests and tasks.
pub mod utils;

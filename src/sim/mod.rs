use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::analytics::Summary;
use crate::bundle::Bundle;
use crate::contact::Contact;
use crate::contact_plan::ContactPlan;
use crate::context::Context;
use crate::forwarding;
use crate::node::Node;
use crate::request::Request;
use crate::scheduler::{find_duplicate_task, SchedulingProfile, Scheduler};
use crate::sim_input::SimulationInput;
use crate::task::TaskStatus;
use crate::types::{Date, Duration, EndpointId, NodeID};

pub mod generators;

/// The occurrences the event heap schedules. Grounded on the source's
/// coroutine set (`node.py`'s `contact_controller`/`contact_procedure`,
/// `bundle_assignment_controller`, `main.py`'s `requests_generator`),
/// translated from cooperative coroutines into explicit event records per
/// the "avoid native async" redesign note: a contact's entire transmit and
/// refund behaviour is computed in one step at `ContactStart` rather than
/// stepped through tick by tick, since every contact's full window is known
/// up front in a deterministic contact plan.
enum Event {
    ContactStart(usize),
    Arrival { to: NodeID, bundle: Bundle },
    Assignment,
    Request(Request),
}

struct Scheduled {
    at: Date,
    seq: u64,
    event: Event,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at && self.seq == other.seq
    }
}
impl Eq for Scheduled {}

/// Reversed so [`BinaryHeap`] (a max-heap) pops the earliest time first,
/// breaking ties by insertion order (FIFO) to keep the simulation
/// deterministic for events scheduled at the same instant.
impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .at
            .partial_cmp(&self.at)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}
impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The discrete-event simulation harness: a virtual clock driven by a
/// min-heap of events, a shared contact plan, every node's state, and the
/// CGS scheduler that turns requests into tasks.
///
/// Generic over the scheduling profile so a run is monomorphized to exactly
/// one of the five feature-flag combinations (§9 "Dynamic dispatch").
pub struct Engine<P: SchedulingProfile> {
    pub ctx: Context,
    pub plan: ContactPlan,
    pub nodes: HashMap<NodeID, Node>,
    pub scheduler: Scheduler<P>,
    /// The node that runs CGS scheduling for every incoming request — the
    /// mission-planning authority (§3 "Scheduler" as a role, not a type).
    pub planner: NodeID,
    /// Node ids that are acquisition targets rather than network
    /// participants: contacts whose `to` is one of these are treated as
    /// acquisition opportunities (§4.7.1 "target contact"), not handshake
    /// and transmission opportunities.
    pub targets: HashSet<NodeID>,
    pub msr: bool,
    assignment_period: Duration,
    heap: BinaryHeap<Scheduled>,
    seq: u64,
}

impl<P: SchedulingProfile> Engine<P> {
    pub fn new(
        plan: ContactPlan,
        nodes: HashMap<NodeID, Node>,
        targets: HashSet<NodeID>,
        planner: NodeID,
        ctx: Context,
        assignment_period: Duration,
        msr: bool,
    ) -> Self {
        let mut engine = Self {
            ctx,
            plan,
            nodes,
            scheduler: Scheduler::new(),
            planner,
            targets,
            msr,
            assignment_period,
            heap: BinaryHeap::new(),
            seq: 0,
        };
        for idx in 0..engine.plan.contacts().len() {
            let start = engine.plan.contact(idx).start;
            engine.push(start, Event::ContactStart(idx));
        }
        engine.push(0.0, Event::Assignment);
        engine
    }

    /// Builds an [`Engine`] from a decoded simulation-input document: every
    /// satellite and gateway becomes a [`Node`], every target's id is added
    /// to the acquisition-target set, and the first gateway (or, absent
    /// one, the first satellite) is used as the scheduling authority.
    pub fn bootstrap(input: &SimulationInput, plan: ContactPlan, seed: u64) -> Self {
        let mut nodes = HashMap::new();
        for sat in &input.satellites {
            nodes.insert(sat.uid, Node::new(sat.uid, sat.eid, sat.buffer_capacity));
        }
        for gw in &input.gateways {
            nodes.insert(gw.uid, Node::new(gw.uid, gw.eid, gw.buffer_capacity));
        }
        let targets: HashSet<NodeID> = input.targets.iter().map(|t| t.uid).collect();
        let planner = input
            .gateways
            .first()
            .or_else(|| input.satellites.first())
            .map(|n| n.uid)
            .expect("simulation input names at least one node");

        Self::new(
            plan,
            nodes,
            targets,
            planner,
            Context::new(seed),
            input.simulation.step_size,
            input.traffic.msr,
        )
    }

    fn push(&mut self, at: Date, event: Event) {
        self.seq += 1;
        self.heap.push(Scheduled { at, seq: self.seq, event });
    }

    /// Enqueues a request to be handed to the scheduler when the clock
    /// reaches its `time_created`.
    pub fn submit_request(&mut self, request: Request) {
        let at = request.time_created;
        self.push(at, Event::Request(request));
    }

    /// Processes every event at or before `until`, advancing the virtual
    /// clock as it goes.
    pub fn run_until(&mut self, until: Date) {
        while let Some(top) = self.heap.peek() {
            if top.at > until {
                break;
            }
            let Scheduled { at, event, .. } = self.heap.pop().unwrap();
            self.ctx.advance_to(at);
            self.dispatch(at, event, until);
        }
    }

    pub fn summary(&self) -> Summary {
        self.ctx.analytics.summary()
    }

    fn dispatch(&mut self, now: Date, event: Event, until: Date) {
        match event {
            Event::ContactStart(idx) => self.handle_contact_start(now, idx),
            Event::Arrival { to, bundle } => {
                if let Some(node) = self.nodes.get_mut(&to) {
                    forwarding::receive_bundle(node, bundle, now, &mut self.ctx);
                }
            }
            Event::Assignment => {
                let endpoints: HashMap<NodeID, EndpointId> = self
                    .nodes
                    .iter()
                    .filter_map(|(&id, n)| n.eid.map(|e| (id, e)))
                    .collect();
                let node_endpoint = |n: NodeID| endpoints.get(&n).copied();
                for node in self.nodes.values_mut() {
                    forwarding::assign_bundles(node, &mut self.plan, now, node_endpoint, &mut self.ctx);
                }
                forwarding::reconcile_overbooking(&mut self.plan, &mut self.nodes, &mut self.ctx);
                let next = now + self.assignment_period;
                if next <= until {
                    self.push(next, Event::Assignment);
                }
            }
            Event::Request(request) => self.handle_request(now, request),
        }
    }

    fn handle_contact_start(&mut self, now: Date, idx: usize) {
        let contact = self.plan.contact(idx).clone();
        if self.targets.contains(&contact.to) {
            self.handle_target_contact(now, &contact);
        } else {
            self.handle_node_contact(now, &contact);
        }
    }

    /// §4.7.1's "target contact": the sending node is visiting a target it
    /// has been assigned to acquire data from, not a network neighbour. The
    /// whole window is resolved in one step (this event's synchronous
    /// simplification), so a task is due if its pickup falls anywhere within
    /// `[contact.start, contact.end]`, not only exactly at `now`.
    fn handle_target_contact(&mut self, now: Date, contact: &Contact) {
        let Some(node) = self.nodes.get_mut(&contact.frm) else { return };

        let due: Vec<_> = node
            .task_table
            .iter()
            .filter(|t| {
                t.assignee == Some(contact.frm)
                    && t.target == contact.to
                    && t.status == TaskStatus::Pending
                    && t.pickup_time.map(|p| p <= contact.end).unwrap_or(true)
            })
            .map(|t| t.uid.clone())
            .collect();

        for uid in due {
            let Some(task) = node.task_table.get(&uid).cloned() else { continue };
            if node.buffer.capacity_remaining() < task.size {
                continue;
            }

            let acquired_at = task.pickup_time.unwrap_or(now);
            let mut bundle = Bundle::new(
                contact.frm,
                task.destination,
                task.target,
                task.size,
                acquired_at + task.lifetime,
                task.priority,
                acquired_at,
            );
            bundle.task_id = Some(task.uid.clone());
            if self.msr {
                bundle.obey_route = true;
                bundle.route = task.del_path.clone();
            }
            node.buffer.append(bundle);
            self.ctx.analytics.add_bundle();

            let mut acquired = task;
            acquired.mark_acquired(acquired_at, contact.frm);
            let neighbours = node.neighbours.clone();
            node.task_table.insert_local(acquired, &neighbours);
        }
    }

    /// §4.7.1's "node contact": gossip handshake, then drain the sending
    /// node's outbound queue for `contact.to` across the whole window.
    fn handle_node_contact(&mut self, now: Date, contact: &Contact) {
        let Some(mut frm_node) = self.nodes.remove(&contact.frm) else { return };

        let outgoing = frm_node.task_table.outgoing_sync(contact.to);
        if let Some(to_node) = self.nodes.get_mut(&contact.to) {
            if !outgoing.is_empty() {
                let neighbours = to_node.neighbours.clone();
                to_node.task_table.merge(contact.frm, outgoing, &neighbours);
            }
            if !to_node.neighbours.contains(&contact.frm) {
                to_node.neighbours.push(contact.frm);
            }
        }
        if !frm_node.neighbours.contains(&contact.to) {
            frm_node.neighbours.push(contact.to);
        }

        let (arrivals, refund) = forwarding::run_contact(&mut frm_node, &mut self.plan, contact);
        for bundle in refund {
            frm_node.buffer.append(bundle);
        }
        self.nodes.insert(contact.frm, frm_node);

        for arrival in arrivals {
            self.push(arrival.at, Event::Arrival { to: arrival.to, bundle: arrival.bundle });
        }
    }

    /// §4.5: deduplicate against a pending task for the same target if one
    /// exists, otherwise run the CGS planner and gossip the resulting task
    /// into the planner node's table.
    fn handle_request(&mut self, now: Date, request: Request) {
        self.ctx.analytics.submit_request(request.uid.clone(), now);

        let duplicate = self
            .nodes
            .get(&self.planner)
            .and_then(|node| find_duplicate_task(&node.task_table, &request))
            .map(|t| t.uid.clone());

        if let Some(uid) = duplicate {
            self.ctx.analytics.duplicated_request();
            if let Some(node) = self.nodes.get_mut(&self.planner) {
                if let Some(mut task) = node.task_table.get(&uid).cloned() {
                    task.request_ids.push(request.uid.clone());
                    let neighbours = node.neighbours.clone();
                    node.task_table.insert_local(task, &neighbours);
                }
            }
            return;
        }

        let node_endpoint = |n: NodeID| self.nodes.get(&n).and_then(|node| node.eid);
        let task = self.scheduler.schedule_task(
            self.planner,
            &request,
            now,
            &mut self.plan,
            &[],
            node_endpoint,
            &mut self.ctx,
        );

        match task {
            Some(task) => {
                if let Some(node) = self.nodes.get_mut(&self.planner) {
                    let neighbours = node.neighbours.clone();
                    node.task_table.insert_local(task, &neighbours);
                }
            }
            None => self.ctx.analytics.fail_request(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Request;
    use crate::scheduler::FullCgs;
    use crate::types::{Priority, RequestId};

    fn node_set(ids: &[NodeID]) -> HashMap<NodeID, Node> {
        ids.iter().map(|&id| (id, Node::new(id, None, 100.0))).collect()
    }

    #[test]
    fn a_request_turns_into_a_delivered_bundle() {
        let plan = ContactPlan::new(vec![
            Contact::new(1, 9, 5.0, 100.0, 10.0, 0.0, 1.0).unwrap(),
            Contact::new(1, 2, 20.0, 100.0, 10.0, 0.0, 1.0).unwrap(),
        ]);
        let mut nodes = node_set(&[1, 2]);
        nodes.get_mut(&2).unwrap().eid = Some(42);

        let mut targets = HashSet::new();
        targets.insert(9);

        let mut engine: Engine<FullCgs> = Engine::new(plan, nodes, targets, 1, Context::new(7), 1.0, false);

        let request = Request::new(RequestId("R1".into()), 9, 50.0, 100.0, Priority::Normal, 42, 4.0, 0.0);
        engine.submit_request(request);
        engine.run_until(60.0);

        let summary = engine.summary();
        assert_eq!(summary.tasks_processed, 1);
        assert_eq!(summary.bundles_delivered, 1);
    }
}

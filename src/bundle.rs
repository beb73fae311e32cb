use std::cmp::Ordering;

use crate::types::{ContactId, Date, EndpointId, NodeID, Priority, RequestId, TaskId, Volume};

/// A payload in flight between acquisition and delivery or drop.
///
/// Grounded on the source's `Bundle` dataclass (`bundles.py`). The assigned
/// `route` is stored as the sequence of Contact UIDs it must traverse (not a
/// full [`crate::route::Route`]) per §3 — forwarding consults the live
/// contact plan by those ids rather than carrying a stale route snapshot.
#[cfg_attr(feature = "debug", derive(Debug))]
#[derive(Clone)]
pub struct Bundle {
    pub src: NodeID,
    pub dst: EndpointId,
    pub target_id: NodeID,
    pub size: Volume,
    pub deadline: Date,
    pub priority: Priority,
    pub critical: bool,
    /// `false` means the bundle must be sent whole (no fragmentation).
    pub fragment: bool,
    pub created_at: Date,
    pub task_id: Option<TaskId>,
    /// Moderate Source Routing: if set, the bundle may only leave during a
    /// contact whose UID equals `route[0]`.
    pub obey_route: bool,
    pub route: Option<Vec<ContactId>>,
    pub previous_node: Option<NodeID>,
    pub hop_count: u32,
}

impl Bundle {
    pub fn new(
        src: NodeID,
        dst: EndpointId,
        target_id: NodeID,
        size: Volume,
        deadline: Date,
        priority: Priority,
        created_at: Date,
    ) -> Self {
        Self {
            src,
            dst,
            target_id,
            size,
            deadline,
            priority,
            critical: false,
            fragment: false,
            created_at,
            task_id: None,
            obey_route: false,
            route: None,
            previous_node: None,
            hop_count: 0,
        }
    }

    pub fn age(&self, now: Date) -> Date {
        now - self.created_at
    }

    pub fn next_hop(&self) -> Option<&ContactId> {
        self.route.as_ref().and_then(|r| r.first())
    }

    pub fn pop_first_hop(&mut self) {
        if let Some(route) = &mut self.route {
            if !route.is_empty() {
                route.remove(0);
            }
        }
    }

    pub fn clear_route(&mut self) {
        self.route = None;
        self.obey_route = false;
    }
}

/// Ordering used to choose which bundle to preempt during over-booking
/// reconciliation (§3, §4.7.3): critical bundles first, then higher
/// priority, then older `created_at`, then fewer completed hops. This is the
/// *preemption* rank — "greater" means "evict last" — matching the sign of
/// the source's `Bundle.__lt__`.
impl PartialEq for Bundle {
    fn eq(&self, other: &Self) -> bool {
        self.critical == other.critical
            && self.priority == other.priority
            && self.created_at == other.created_at
            && self.hop_count == other.hop_count
    }
}
impl Eq for Bundle {}

impl Ord for Bundle {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .critical
            .cmp(&self.critical)
            .then_with(|| other.priority.cmp(&self.priority))
            .then_with(|| {
                self.created_at
                    .partial_cmp(&other.created_at)
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| other.hop_count.cmp(&self.hop_count))
    }
}

impl PartialOrd for Bundle {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A request's associated UIDs, kept alongside the bundle only for audit
/// trails that want to trace a delivered bundle back to its requests.
pub type RequestIds = Vec<RequestId>;

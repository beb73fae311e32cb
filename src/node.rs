use std::collections::{HashMap, VecDeque};

use crate::bundle::Bundle;
use crate::buffer::Buffer;
use crate::contact_plan::ContactPlan;
use crate::route_storage::RouteCache;
use crate::task_table::TaskTable;
use crate::types::{Date, EndpointId, NodeID, Priority, Volume};

/// A participant in the network: identity, buffer, outbound queues, cached
/// routes and task table (§3 "Node").
///
/// Grounded on the source's `Node` dataclass (`node.py`): `buffer`,
/// `outbound_queues`, `route_table` and `drop_list` carry over directly; the
/// contact plan itself is *not* duplicated per node (unlike the source, which
/// hangs a full plan reference off every node), since every node here acts
/// against one shared plan owned by [`crate::sim::Engine`].
#[cfg_attr(feature = "debug", derive(Debug))]
pub struct Node {
    pub uid: NodeID,
    /// Logical delivery address this node answers to, if any. Several nodes
    /// may share one (anycast gateways).
    pub eid: Option<EndpointId>,
    pub buffer: Buffer,
    /// Per-neighbour outbound ring, drained FIFO during that neighbour's
    /// contact (§4.7.1).
    pub outbound_queues: HashMap<NodeID, VecDeque<Bundle>>,
    pub route_cache: RouteCache,
    pub task_table: TaskTable,
    pub drop_list: Vec<Bundle>,
    /// Every node this one has ever had a contact with; used to know who a
    /// locally-originated task change must be marked "changed for" (§4.6).
    pub neighbours: Vec<NodeID>,
    /// Nodes a route may not pass back through (return-to-sender / loop
    /// avoidance, §4.4).
    pub excluded_nodes: Vec<NodeID>,
}

impl Node {
    pub fn new(uid: NodeID, eid: Option<EndpointId>, buffer_capacity: Volume) -> Self {
        Self {
            uid,
            eid,
            buffer: Buffer::new(buffer_capacity),
            outbound_queues: HashMap::new(),
            route_cache: RouteCache::new(),
            task_table: TaskTable::new(),
            drop_list: Vec::new(),
            neighbours: Vec::new(),
            excluded_nodes: Vec::new(),
        }
    }

    pub fn outbound_queue_mut(&mut self, to: NodeID) -> &mut VecDeque<Bundle> {
        self.outbound_queues.entry(to).or_default()
    }

    /// Total volume already queued toward `to` at priority `>= priority`,
    /// consumed by the candidate filter's ETO computation (§4.4).
    pub fn outbound_backlog(&self, to: NodeID, priority: Priority) -> Volume {
        self.outbound_queues
            .get(&to)
            .map(|q| q.iter().filter(|b| b.priority >= priority).map(|b| b.size).sum())
            .unwrap_or(0.0)
    }

    /// Volume an earlier, still-open contact toward `to` could drain from the
    /// backlog before `before` (a candidate route's first-hop start), per
    /// §4.4's ETO relief term ("backlog relief from earlier same-endpoint
    /// contacts still open"). A contact counts only if it's still live
    /// (`end > now`) and started ahead of `before` — it can't be credited
    /// with draining anything after the hop we're relieving against has
    /// already begun.
    pub fn outbound_relief(&self, plan: &ContactPlan, to: NodeID, now: Date, before: Date, priority: Priority) -> Volume {
        plan.outgoing(self.uid)
            .iter()
            .map(|&idx| plan.contact(idx))
            .filter(|c| c.to == to && c.end > now && c.start < before)
            .map(|c| {
                let window = (c.end.min(before) - c.start.max(now)).max(0.0);
                c.available(priority).min(c.rate * window)
            })
            .sum()
    }

    /// A flattened view across every outbound queue, used only by over-booking
    /// reconciliation (§4.7.3), which has to rank bundles across the whole
    /// node rather than one queue at a time. Kept as a derived view rather
    /// than a second structure kept in sync (§9 "Container choices").
    pub fn all_outbound(&self) -> impl Iterator<Item = (NodeID, &Bundle)> {
        self.outbound_queues
            .iter()
            .flat_map(|(&to, q)| q.iter().map(move |b| (to, b)))
    }

    pub fn is_delivery_point_for(&self, endpoint: EndpointId) -> bool {
        self.eid == Some(endpoint)
    }

    /// Removes and returns the lowest-ranked (least worth keeping) bundle
    /// across every outbound queue whose next hop is `contact_id`, for
    /// over-booking reconciliation (§4.7.3) to preempt.
    pub fn remove_worst_outbound_for(&mut self, contact_id: &crate::types::ContactId) -> Option<Bundle> {
        let mut worst: Option<(NodeID, usize, Bundle)> = None;
        for (&to, q) in self.outbound_queues.iter() {
            for (i, b) in q.iter().enumerate() {
                if b.next_hop() != Some(contact_id) {
                    continue;
                }
                let replace = match &worst {
                    None => true,
                    Some((_, _, w)) => b > w,
                };
                if replace {
                    worst = Some((to, i, b.clone()));
                }
            }
        }
        let (to, idx, _) = worst?;
        self.outbound_queues.get_mut(&to).and_then(|q| q.remove(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::Contact;

    #[test]
    fn outbound_backlog_sums_only_same_or_higher_priority() {
        let mut node = Node::new(1, None, 100.0);
        let low = Bundle::new(1, 9, 2, 3.0, 50.0 as Date, Priority::Bulk, 0.0);
        let high = Bundle::new(1, 9, 2, 4.0, 50.0, Priority::Expedited, 0.0);
        node.outbound_queue_mut(2).push_back(low);
        node.outbound_queue_mut(2).push_back(high);

        assert_eq!(node.outbound_backlog(2, Priority::Bulk), 7.0);
        assert_eq!(node.outbound_backlog(2, Priority::Expedited), 4.0);
    }

    #[test]
    fn all_outbound_flattens_every_queue() {
        let mut node = Node::new(1, None, 100.0);
        node.outbound_queue_mut(2).push_back(Bundle::new(1, 9, 2, 1.0, 10.0, Priority::Bulk, 0.0));
        node.outbound_queue_mut(3).push_back(Bundle::new(1, 9, 2, 1.0, 10.0, Priority::Bulk, 0.0));
        assert_eq!(node.all_outbound().count(), 2);
    }

    #[test]
    fn outbound_relief_only_counts_earlier_still_open_contacts_to_the_same_next_hop() {
        let node = Node::new(1, None, 100.0);
        let plan = ContactPlan::new(vec![
            // Still open at now=2, started before `before`=10: counts.
            Contact::new(1, 2, 0.0, 20.0, 2.0, 0.0, 1.0).unwrap(),
            // Starts at or after `before`: this is the hop being relieved
            // against, not an earlier one, so it must not count itself.
            Contact::new(1, 2, 10.0, 20.0, 2.0, 0.0, 1.0).unwrap(),
            // Already ended by now=2: can't relieve anything.
            Contact::new(1, 2, 0.0, 1.0, 2.0, 0.0, 1.0).unwrap(),
            // Same window, different next hop: irrelevant.
            Contact::new(1, 3, 0.0, 20.0, 2.0, 0.0, 1.0).unwrap(),
        ]);

        // Only the first contact qualifies: open for 10-2=8 units at rate 2,
        // giving 16 units of relief, capped by its own mav (100.0 here).
        let relief = node.outbound_relief(&plan, 2, 2.0, 10.0, Priority::Bulk);
        assert_eq!(relief, 16.0);
    }
}

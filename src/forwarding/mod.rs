use std::collections::HashMap;

use tracing::trace;

use crate::candidate;
use crate::contact::Contact;
use crate::contact_plan::ContactPlan;
use crate::context::Context;
use crate::node::Node;
use crate::pathfinding::{yen::k_shortest, SearchConstraint};
use crate::types::{ContactId, Date, EndpointId, NodeID, Priority};

/// Routes considered per destination when the cache needs refilling (§4.3).
const ROUTE_SEARCH_WIDTH: usize = 3;

/// A bundle that finished crossing a contact, with the time it arrives at
/// the receiving node.
pub struct Arrival {
    pub at: Date,
    pub to: NodeID,
    pub bundle: crate::bundle::Bundle,
}

/// Drains a sending node's outbound queue toward `contact.to` for the
/// duration of `contact` (§4.7.1 "node contact": handshake already applied
/// by the caller, this is the transmit loop).
///
/// Bundles that don't fit before `contact.end`, or whose pinned next hop
/// doesn't match this contact, are left for the caller to refund to the
/// node's buffer — matching the source's `contact_procedure`, which returns
/// every bundle still queued (sent or not) to the buffer once the contact
/// ends. Each refunded bundle's first-hop reservation is released against
/// `plan` before it's handed back (spec.md:148, volume conservation).
pub fn run_contact(
    node: &mut Node,
    plan: &mut ContactPlan,
    contact: &Contact,
) -> (Vec<Arrival>, Vec<crate::bundle::Bundle>) {
    let mut queue = node.outbound_queues.remove(&contact.to).unwrap_or_default();
    let mut arrivals = Vec::new();
    let mut refund = Vec::new();
    let mut t = contact.start;
    let contact_id = contact.id();

    while t < contact.end {
        let Some(bundle) = queue.pop_front() else { break };
        let send_time = if contact.rate > 0.0 {
            bundle.size / contact.rate
        } else {
            0.0
        };
        if contact.end - t < send_time {
            release_first_hop(plan, &bundle);
            refund.push(bundle);
            break;
        }
        if bundle.next_hop() != Some(&contact_id) {
            release_first_hop(plan, &bundle);
            refund.push(bundle);
            continue;
        }

        let mut sent = bundle;
        sent.previous_node = Some(contact.frm);
        sent.hop_count += 1;
        sent.pop_first_hop();
        let arrival_at = t + send_time + contact.owlt;
        trace!(from = contact.frm, to = contact.to, at = arrival_at, "bundle sent");
        arrivals.push(Arrival { at: arrival_at, to: contact.to, bundle: sent });
        t += send_time;
    }

    for bundle in &queue {
        release_first_hop(plan, bundle);
    }
    refund.extend(queue);
    (arrivals, refund)
}

/// Releases the reservation a refunded bundle's first hop still holds, if
/// that hop is still present in `plan` (it always will be, since the
/// contact currently running is one of its own hops or a sibling of it).
fn release_first_hop(plan: &mut ContactPlan, bundle: &crate::bundle::Bundle) {
    let Some(hop_id) = bundle.next_hop() else { return };
    if let Some(idx) = plan.index_of(hop_id) {
        plan.contact_mut(idx).release(bundle.priority, bundle.size);
    }
}

/// Receives a bundle at `node` (§4.7.1 `bundle_receive`): dropped if the
/// buffer has no room, delivered if `node` answers the bundle's destination
/// endpoint, otherwise buffered for assignment.
pub fn receive_bundle(node: &mut Node, bundle: crate::bundle::Bundle, now: Date, ctx: &mut Context) {
    if node.buffer.capacity_remaining() < bundle.size {
        ctx.analytics.drop_bundle();
        node.drop_list.push(bundle);
        return;
    }

    if node.is_delivery_point_for(bundle.dst) {
        if let Some(task_id) = &bundle.task_id {
            if let Some(task) = node.task_table.get(task_id).cloned() {
                let mut delivered = task;
                delivered.mark_delivered(now, node.uid, bundle.dst);
                node.task_table.insert_local(delivered, &node.neighbours.clone());
            }
        }
        ctx.analytics.deliver_bundle(bundle.created_at, now);
        return;
    }

    node.buffer.append(bundle);
}

/// Moderate Source Routing pin (§4.7.2 step 1): if `bundle`'s carried route
/// still starts with a live, departable hop out of `node`, reserves volume
/// along every hop still in the plan and returns the node to queue toward.
/// Returns `None` if the pinned first hop has expired or no longer belongs
/// to this node, in which case the caller falls back to ordinary CGR.
fn pin_to_route(node: &Node, plan: &mut ContactPlan, now: Date, bundle: &crate::bundle::Bundle) -> Option<NodeID> {
    let hop_ids = bundle.route.as_ref()?;
    let first_id = hop_ids.first()?;
    let first_idx = plan.index_of(first_id)?;
    let first = plan.contact(first_idx);
    if first.frm != node.uid || first.end <= now {
        return None;
    }
    let next = first.to;

    for id in hop_ids {
        if let Some(idx) = plan.index_of(id) {
            plan.contact_mut(idx).force_reserve(bundle.priority, bundle.size);
        }
    }
    Some(next)
}

/// Assigns every bundle currently in `node`'s buffer to a cached route
/// (§4.7.2): the first feasible candidate wins, its first hop's volume is
/// reserved (optimistically, via [`Contact::force_reserve`]) and the bundle
/// moves to that hop's outbound queue. A bundle with no feasible route is
/// dropped.
///
/// Refills `node`'s route cache for a destination via a fresh
/// [`k_shortest`] search (§4.3) whenever it has nothing valid cached,
/// rather than requiring a caller to have warmed it in advance.
pub fn assign_bundles(
    node: &mut Node,
    plan: &mut ContactPlan,
    now: Date,
    node_endpoint: impl Fn(NodeID) -> Option<EndpointId> + Copy,
    ctx: &mut Context,
) {
    let pending = node.buffer.drain_matching(|_| true);
    let node_uid = node.uid;
    let excluded = node.excluded_nodes.clone();

    for mut bundle in pending {
        if bundle.obey_route {
            if let Some(pinned) = pin_to_route(node, plan, now, &bundle) {
                node.outbound_queue_mut(pinned).push_back(bundle);
                continue;
            }
            bundle.clear_route();
        }

        if node.route_cache.get(node_uid, bundle.dst, now).is_empty() {
            let found = k_shortest(
                plan,
                node_uid,
                now,
                node_endpoint,
                bundle.dst,
                SearchConstraint::new(),
                ROUTE_SEARCH_WIDTH,
            );
            node.route_cache.store(node_uid, bundle.dst, found);
        }
        let routes = node.route_cache.get(node_uid, bundle.dst, now).to_vec();
        let outbound_backlog = |to: NodeID, p: Priority| node.outbound_backlog(to, p);
        let backlog_relief = |to: NodeID, before: Date| node.outbound_relief(plan, to, now, before, bundle.priority);
        let filtered = candidate::filter_candidates(
            &routes,
            node_uid,
            now,
            &bundle,
            &excluded,
            outbound_backlog,
            backlog_relief,
        );

        match filtered.into_iter().next() {
            Some(route) => {
                let mut assigned = bundle;
                let hop_ids: Vec<ContactId> = route.hops().iter().map(Contact::id).collect();
                assigned.route = Some(hop_ids);
                if let Some(idx) = plan.index_of(&route.hops()[0].id()) {
                    plan.contact_mut(idx).force_reserve(assigned.priority, assigned.size);
                }
                node.outbound_queue_mut(route.next_node()).push_back(assigned);
            }
            None => {
                ctx.analytics.drop_bundle();
                node.drop_list.push(bundle);
            }
        }
    }
}

/// Over-booking reconciliation (§4.7.3): repeatedly, for every contact whose
/// `mav` has been driven negative at some priority, preempts the
/// lowest-ranked bundle assigned to it (via [`crate::bundle::Bundle`]'s
/// preemption order), refunds its reservation and returns it to its node's
/// buffer for reassignment.
pub fn reconcile_overbooking(plan: &mut ContactPlan, nodes: &mut HashMap<NodeID, Node>, ctx: &mut Context) {
    for idx in 0..plan.contacts().len() {
        let (id, frm) = {
            let c = plan.contact(idx);
            (c.id(), c.frm)
        };

        loop {
            let over_booked = plan.contact(idx).mav.iter().any(|m| *m < 0.0);
            if !over_booked {
                break;
            }
            let Some(node) = nodes.get_mut(&frm) else { break };
            let Some(mut bundle) = node.remove_worst_outbound_for(&id) else { break };

            plan.contact_mut(idx).release(bundle.priority, bundle.size);
            bundle.clear_route();
            ctx.analytics.reroute_bundle();

            if !node.buffer.append(bundle.clone()) {
                node.drop_list.push(bundle);
                ctx.analytics.drop_bundle();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::Bundle;
    use crate::types::{Priority, TaskId};

    fn contact(frm: NodeID, to: NodeID, start: Date, end: Date) -> Contact {
        Contact::new(frm, to, start, end, 1.0, 0.0, 1.0).unwrap()
    }

    #[test]
    fn run_contact_sends_a_bundle_pinned_to_it() {
        let c = contact(1, 2, 0.0, 10.0);
        let mut plan = ContactPlan::new(vec![c.clone()]);
        let mut node = Node::new(1, None, 100.0);
        let mut b = Bundle::new(1, 9, 5, 4.0, 100.0, Priority::Normal, 0.0);
        b.route = Some(vec![c.id()]);
        b.task_id = Some(TaskId("T".into()));
        node.outbound_queue_mut(2).push_back(b);

        let (arrivals, refund) = run_contact(&mut node, &mut plan, &c);
        assert_eq!(arrivals.len(), 1);
        assert!(refund.is_empty());
        assert_eq!(arrivals[0].at, 4.0);
        assert!(arrivals[0].bundle.route.as_ref().unwrap().is_empty());
    }

    #[test]
    fn run_contact_refunds_a_bundle_pinned_elsewhere() {
        let c = contact(1, 2, 0.0, 10.0);
        let other = ContactId::new(1, 2, 99.0);
        let elsewhere = Contact::new(1, 2, 99.0, 110.0, 1.0, 0.0, 1.0).unwrap();
        let mut plan = ContactPlan::new(vec![c.clone(), elsewhere]);
        plan.contact_mut(1).force_reserve(Priority::Normal, 4.0);
        let mut node = Node::new(1, None, 100.0);
        let mut b = Bundle::new(1, 9, 5, 4.0, 100.0, Priority::Normal, 0.0);
        b.route = Some(vec![other]);
        node.outbound_queue_mut(2).push_back(b);

        let (arrivals, refund) = run_contact(&mut node, &mut plan, &c);
        assert!(arrivals.is_empty());
        assert_eq!(refund.len(), 1);
        // The refunded bundle's reservation on its (different) pinned hop
        // was released, not left dangling.
        assert_eq!(plan.contact(1).mav, [1.0, 1.0, 1.0]);
    }

    #[test]
    fn receive_bundle_delivers_when_destination_matches() {
        let mut node = Node::new(2, Some(5), 100.0);
        let mut ctx = Context::new(1);
        let b = Bundle::new(1, 5, 5, 4.0, 100.0, Priority::Normal, 0.0);
        receive_bundle(&mut node, b, 1.0, &mut ctx);
        assert_eq!(ctx.analytics.bundles_delivered, 1);
        assert!(node.buffer.is_empty());
    }

    #[test]
    fn receive_bundle_buffers_when_not_destination() {
        let mut node = Node::new(2, Some(9), 100.0);
        let mut ctx = Context::new(1);
        let b = Bundle::new(1, 5, 5, 4.0, 100.0, Priority::Normal, 0.0);
        receive_bundle(&mut node, b, 1.0, &mut ctx);
        assert_eq!(node.buffer.len(), 1);
    }

    #[test]
    fn reconciliation_preempts_lowest_ranked_bundle_on_overbooked_contact() {
        let mut plan = ContactPlan::new(vec![contact(1, 2, 0.0, 10.0)]);
        let id = plan.contact(0).id();
        plan.contact_mut(0).force_reserve(Priority::Bulk, 12.0);

        let mut node = Node::new(1, None, 100.0);
        let mut low = Bundle::new(1, 9, 5, 3.0, 100.0, Priority::Bulk, 0.0);
        low.route = Some(vec![id.clone()]);
        let mut high = Bundle::new(1, 9, 5, 3.0, 100.0, Priority::Expedited, 1.0);
        high.route = Some(vec![id]);
        node.outbound_queue_mut(2).push_back(low);
        node.outbound_queue_mut(2).push_back(high);

        let mut nodes = HashMap::new();
        nodes.insert(1, node);
        let mut ctx = Context::new(1);
        reconcile_overbooking(&mut plan, &mut nodes, &mut ctx);

        assert!(plan.contact(0).mav.iter().all(|m| *m >= 0.0));
        let node = nodes.get(&1).unwrap();
        assert_eq!(node.buffer.len(), 1);
        assert_eq!(node.buffer.iter().next().unwrap().priority, Priority::Bulk);
    }

    #[test]
    fn assign_bundles_honors_a_live_pinned_route() {
        let mut plan = ContactPlan::new(vec![contact(1, 2, 0.0, 10.0), contact(2, 3, 0.0, 10.0)]);
        let pinned: Vec<ContactId> = plan.contacts().iter().map(Contact::id).collect();

        let mut node = Node::new(1, None, 100.0);
        let mut b = Bundle::new(1, 9, 2, 3.0, 100.0, Priority::Normal, 0.0);
        b.obey_route = true;
        b.route = Some(pinned);
        node.buffer.append(b);

        let mut ctx = Context::new(1);
        assign_bundles(&mut node, &mut plan, 0.0, |_| None, &mut ctx);

        assert!(node.buffer.is_empty());
        assert_eq!(node.outbound_queue_mut(2).len(), 1);
        assert!(plan.contact(0).mav.iter().any(|m| *m < 1.0));
        assert!(plan.contact(1).mav.iter().any(|m| *m < 1.0));
    }

    #[test]
    fn assign_bundles_falls_back_to_cgr_once_pinned_hop_expires() {
        let mut plan = ContactPlan::new(vec![contact(1, 2, 0.0, 5.0), contact(1, 2, 6.0, 10.0)]);
        let stale_first = plan.contacts()[0].id();

        let mut node = Node::new(1, None, 100.0);
        let mut b = Bundle::new(1, 2, 2, 3.0, 100.0, Priority::Normal, 0.0);
        b.obey_route = true;
        b.route = Some(vec![stale_first]);
        node.buffer.append(b);

        let mut ctx = Context::new(1);
        assign_bundles(&mut node, &mut plan, 7.0, |n| if n == 2 { Some(2) } else { None }, &mut ctx);

        let queued = node.outbound_queue_mut(2);
        assert_eq!(queued.len(), 1);
        assert!(!queued[0].obey_route);
    }
}

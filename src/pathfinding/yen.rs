use std::collections::HashMap;

use crate::contact_plan::ContactPlan;
use crate::distance::{BestDeliveryTime, Distance};
use crate::pathfinding::{dijkstra::earliest_arrival, SearchConstraint};
use crate::route::Route;
use crate::types::{ContactId, EndpointId, NodeID};

/// Extends a Dijkstra result into up to `k` distinct routes by contact
/// suppression, per §4.3.
///
/// For each prefix of the last accepted route, the prefix's own contacts are
/// suppressed (so a candidate can't loop back through the root path) and the
/// specific next hop any previously accepted route already took at that
/// point is excluded (so Yen doesn't just rediscover a known route), then
/// Dijkstra runs again from the divergence point. The best candidate across
/// every prefix is accepted each round; suppression is reset between rounds.
pub fn k_shortest(
    plan: &mut ContactPlan,
    source: NodeID,
    now: f64,
    node_endpoint: impl Fn(NodeID) -> Option<EndpointId> + Copy,
    target: EndpointId,
    constraint: SearchConstraint,
    k: usize,
) -> Vec<Route> {
    plan.clear_management_working_area();

    let mut accepted: Vec<Route> = Vec::new();
    let Some(first) = earliest_arrival(plan, source, now, node_endpoint, target, constraint)
    else {
        return accepted;
    };
    accepted.push(first);

    let mut candidates: Vec<Route> = Vec::new();

    while accepted.len() < k {
        let last = accepted.last().unwrap().clone();
        let hops = last.hops();

        for prefix_len in 0..hops.len().saturating_sub(1) {
            plan.clear_management_working_area();

            let prefix = &hops[..=prefix_len];
            let by_id: HashMap<ContactId, usize> = plan
                .contacts()
                .iter()
                .enumerate()
                .map(|(idx, c)| (c.id(), idx))
                .collect();

            for hop in prefix {
                if let Some(&idx) = by_id.get(&hop.id()) {
                    plan.contact_mut(idx).suppressed = true;
                }
            }
            if let Some(&tail_idx) = by_id.get(&prefix.last().unwrap().id()) {
                plan.contact_mut(tail_idx).suppressed_next_hop = true;
            }

            let divergent_hops: Vec<ContactId> = accepted
                .iter()
                .filter(|r| shares_prefix(r, prefix))
                .filter_map(|r| r.hops().get(prefix_len + 1).map(|c| c.id()))
                .collect();

            let divergence_node = prefix.last().unwrap().to;
            let divergence_time = prefix.last().unwrap().arrival_time;
            let prefix_nodes: Vec<NodeID> = prefix.iter().map(|c| c.frm).collect();

            let spur_constraint = SearchConstraint {
                excluded_nodes: &prefix_nodes,
                excluded_contacts: &divergent_hops,
                ..constraint
            };

            if let Some(spur) = earliest_arrival(
                plan,
                divergence_node,
                divergence_time,
                node_endpoint,
                target,
                spur_constraint,
            ) {
                let mut full_hops = prefix.to_vec();
                full_hops.extend(spur.hops().iter().cloned());
                let candidate = Route::from_hops(full_hops, spur.best_delivery_time());

                let already_known = accepted
                    .iter()
                    .chain(candidates.iter())
                    .any(|r| same_sequence(r, &candidate));
                if !already_known {
                    candidates.push(candidate);
                }
            }
        }

        plan.clear_management_working_area();

        if candidates.is_empty() {
            break;
        }
        let best_idx = (0..candidates.len())
            .min_by(|&a, &b| BestDeliveryTime::cmp(&candidates[a], &candidates[b]))
            .unwrap();
        accepted.push(candidates.remove(best_idx));
    }

    accepted
}

fn shares_prefix(route: &Route, prefix: &[crate::contact::Contact]) -> bool {
    let hops = route.hops();
    if hops.len() < prefix.len() {
        return false;
    }
    hops[..prefix.len()]
        .iter()
        .zip(prefix)
        .all(|(a, b)| a.id() == b.id())
}

fn same_sequence(a: &Route, b: &Route) -> bool {
    a.hops().len() == b.hops().len()
        && a.hops()
            .iter()
            .zip(b.hops())
            .all(|(x, y)| x.id() == y.id())
}

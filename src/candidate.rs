use crate::bundle::Bundle;
use crate::distance::{BestDeliveryTime, Distance};
use crate::route::Route;
use crate::types::{Date, NodeID, Priority, Volume};

/// Feasibility screen run by a node over its cached routes to a bundle's
/// destination before enqueueing it (§4.4). `outbound_backlog` reports the
/// volume already queued toward `next_node` at priority `>= bundle.priority`;
/// `backlog_relief(next_node, hop0.start)` reports how much of that backlog
/// an earlier, still-open, same-endpoint contact could absorb before this
/// route's first hop even starts. Both are supplied by the caller (the
/// forwarding engine, which owns the outbound queues and the contact plan)
/// rather than looked up here, since a `Route` carries no knowledge of
/// either.
pub fn filter_candidates(
    routes: &[Route],
    node: NodeID,
    now: Date,
    bundle: &Bundle,
    excluded_nodes: &[NodeID],
    outbound_backlog: impl Fn(NodeID, Priority) -> Volume,
    backlog_relief: impl Fn(NodeID, Date) -> Volume,
) -> Vec<Route> {
    let mut out = Vec::new();

    for route in routes {
        // 1. best_delivery_time within deadline
        if route.best_delivery_time() > bundle.deadline {
            continue;
        }
        // 2. loop-avoidance / return-to-sender policy
        if excluded_nodes.contains(&route.next_node()) {
            continue;
        }
        // 3. no back-edge: no hop may deliver back to this node
        if route.hops().iter().any(|h| h.to == node) {
            continue;
        }

        let hop0 = &route.hops()[0];
        let backlog = outbound_backlog(route.next_node(), bundle.priority);
        let relief = backlog_relief(route.next_node(), hop0.start);
        let eto = now.max(hop0.start) + (backlog - relief).max(0.0) / hop0.rate.max(f64::MIN_POSITIVE);

        // 4. ETO must still fall inside the first hop's window
        if eto > hop0.end {
            continue;
        }

        // 5/6. recompute timings and effective volume limit from the ETO
        let (arrival, limit) = route.retime(eto, bundle.size, bundle.priority);
        if arrival > bundle.deadline {
            continue;
        }
        if limit <= 0.0 {
            continue;
        }
        if !bundle.fragment && limit < bundle.size {
            continue;
        }

        out.push(route.clone());
    }

    out.sort_by(|a, b| BestDeliveryTime::cmp(a, b));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::Contact;
    use crate::types::TaskId;

    fn bundle(size: Volume, deadline: Date, fragment: bool) -> Bundle {
        let mut b = Bundle::new(1, 99, 5, size, deadline, Priority::Normal, 0.0);
        b.fragment = fragment;
        b.task_id = Some(TaskId("T".into()));
        b
    }

    fn direct_route(end: Date) -> Route {
        Route::new(Contact::new(1, 2, 0.0, end, 1.0, 0.0, 1.0).unwrap(), 4.0)
    }

    #[test]
    fn accepts_a_feasible_direct_route() {
        let routes = vec![direct_route(10.0)];
        let b = bundle(4.0, 20.0, false);
        let out = filter_candidates(&routes, 1, 0.0, &b, &[], |_, _| 0.0, |_, _| 0.0);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn rejects_route_missing_deadline() {
        let routes = vec![direct_route(10.0)];
        let mut b = bundle(4.0, 3.0, false);
        b.deadline = 3.0;
        let out = filter_candidates(&routes, 1, 0.0, &b, &[], |_, _| 0.0, |_, _| 0.0);
        assert!(out.is_empty());
    }

    #[test]
    fn rejects_excluded_next_hop() {
        let routes = vec![direct_route(10.0)];
        let b = bundle(4.0, 20.0, false);
        let out = filter_candidates(&routes, 1, 0.0, &b, &[2], |_, _| 0.0, |_, _| 0.0);
        assert!(out.is_empty());
    }

    #[test]
    fn rejects_when_backlog_pushes_eto_past_window_end() {
        let routes = vec![direct_route(10.0)];
        let b = bundle(4.0, 20.0, false);
        // 20 units already queued at >= priority toward node 2, no relief:
        // ETO = 0 + 20/1 = 20 > end(10).
        let out = filter_candidates(&routes, 1, 0.0, &b, &[], |_, _| 20.0, |_, _| 0.0);
        assert!(out.is_empty());
    }

    #[test]
    fn whole_bundle_needs_full_size_unless_fragmentable() {
        let routes = vec![direct_route(2.0)]; // only 2 units of volume available
        let whole = bundle(4.0, 20.0, false);
        assert!(filter_candidates(&routes, 1, 0.0, &whole, &[], |_, _| 0.0, |_, _| 0.0).is_empty());

        let fragment = bundle(4.0, 20.0, true);
        assert!(!filter_candidates(&routes, 1, 0.0, &fragment, &[], |_, _| 0.0, |_, _| 0.0).is_empty());
    }
}

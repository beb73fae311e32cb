use proptest::prelude::*;

use cgsr::bundle::Bundle;
use cgsr::candidate::filter_candidates;
use cgsr::contact::Contact;
use cgsr::route::Route;
use cgsr::types::Priority;

fn priority_strategy() -> impl Strategy<Value = Priority> {
    prop_oneof![
        Just(Priority::Bulk),
        Just(Priority::Normal),
        Just(Priority::Expedited),
    ]
}

proptest! {
    /// A reservation and its matching release always return a contact's mav
    /// to exactly what it was before, whatever priority or volume is chosen.
    #[test]
    fn reserve_then_release_is_a_round_trip(
        capacity in 1.0f64..1000.0,
        priority in priority_strategy(),
        volume in 0.0f64..1000.0,
    ) {
        let mut c = Contact::new(1, 2, 0.0, 1.0, capacity, 0.0, 1.0).unwrap();
        let before = c.mav;
        if c.reserve(priority, volume) {
            c.release(priority, volume);
            prop_assert_eq!(c.mav, before);
        }
    }

    /// Whatever priority a reservation targets, the mav array stays
    /// non-decreasing by index: a reservation at a given priority can only
    /// ever narrow a lower priority's share at least as much as its own.
    #[test]
    fn mav_stays_monotonic_by_priority_index(
        capacity in 1.0f64..1000.0,
        ops in prop::collection::vec((priority_strategy(), 0.0f64..200.0), 0..20),
    ) {
        let mut c = Contact::new(1, 2, 0.0, 1.0, capacity, 0.0, 1.0).unwrap();
        for (priority, volume) in ops {
            c.force_reserve(priority, volume);
            prop_assert!(c.mav[0] <= c.mav[1]);
            prop_assert!(c.mav[1] <= c.mav[2]);
        }
    }

    /// force_reserve followed by release at the same priority and volume is
    /// also a round trip, even once mav has been driven negative: release
    /// only ever adds back what was taken.
    #[test]
    fn force_reserve_then_release_is_a_round_trip(
        capacity in 1.0f64..1000.0,
        priority in priority_strategy(),
        volume in 0.0f64..2000.0,
    ) {
        let mut c = Contact::new(1, 2, 0.0, 1.0, capacity, 0.0, 1.0).unwrap();
        let before = c.mav;
        c.force_reserve(priority, volume);
        c.release(priority, volume);
        prop_assert_eq!(c.mav, before);
    }

    /// Along any chain of hops with non-decreasing start times, retime never
    /// reports an arrival earlier than the one before it: a bundle can't be
    /// delivered before it was sent on its first hop.
    #[test]
    fn retime_never_produces_a_decreasing_arrival(
        rate in 1.0f64..50.0,
        size in 0.1f64..20.0,
        gap0 in 0.0f64..20.0,
        gap1 in 0.0f64..20.0,
    ) {
        let hop0 = Contact::new(1, 2, 0.0, 100.0, rate, 0.0, 1.0).unwrap();
        let hop1 = Contact::new(2, 3, gap0, gap0 + 100.0, rate, 0.0, 1.0).unwrap();
        let hop2 = Contact::new(3, 4, gap0 + gap1, gap0 + gap1 + 100.0, rate, 0.0, 1.0).unwrap();
        let route = Route::from_hops(vec![hop0, hop1, hop2], 0.0);

        let (arrival, limit) = route.retime(0.0, size, Priority::Bulk);
        prop_assert!(arrival >= 0.0);
        prop_assert!(limit >= 0.0 || limit.is_nan() == false);
    }

    /// filter_candidates never returns a route whose computed delivery time
    /// misses the bundle's deadline, regardless of the deadline chosen.
    #[test]
    fn filter_candidates_never_exceeds_the_deadline(
        deadline in 0.0f64..50.0,
        size in 0.1f64..20.0,
        rate in 1.0f64..20.0,
    ) {
        let hop = Contact::new(1, 2, 0.0, 100.0, rate, 0.0, 1.0).unwrap();
        let route = Route::new(hop, 0.0);
        let mut bundle = Bundle::new(1, 9, 2, size, deadline, Priority::Normal, 0.0);
        bundle.task_id = None;

        let out = filter_candidates(&[route], 1, 0.0, &bundle, &[], |_, _| 0.0, |_, _| 0.0);
        for r in &out {
            prop_assert!(r.best_delivery_time() <= deadline);
        }
    }
}

#[cfg(test)]
mod deadline_honour {
    use super::*;

    #[test]
    fn a_route_arriving_after_the_deadline_is_always_rejected() {
        let hop = Contact::new(1, 2, 0.0, 100.0, 1.0, 0.0, 1.0).unwrap();
        let route = Route::new(hop, 50.0);
        let bundle = Bundle::new(1, 9, 2, 4.0, 10.0, Priority::Normal, 0.0);

        let out = filter_candidates(&[route], 1, 0.0, &bundle, &[], |_, _| 0.0, |_, _| 0.0);
        assert!(out.is_empty());
    }
}

#[cfg(test)]
mod msr_pinning {
    use std::collections::HashMap;

    use cgsr::context::Context;
    use cgsr::forwarding;
    use cgsr::node::Node;

    use super::*;

    /// Whenever a bundle carries `obey_route` with a pinned hop still live
    /// out of this node, assignment reserves every pinned hop's volume and
    /// never consults the ordinary route cache — so an unreachable
    /// destination (as far as CGR is concerned) still gets queued.
    #[test]
    fn pinned_route_is_always_honoured_while_its_first_hop_is_live() {
        let mut plan = cgsr::contact_plan::ContactPlan::new(vec![
            Contact::new(1, 2, 0.0, 10.0, 5.0, 0.0, 1.0).unwrap(),
        ]);
        let hop_id = plan.contacts()[0].id();

        let mut node = Node::new(1, None, 100.0);
        let mut bundle = Bundle::new(1, 9, 2, 3.0, 100.0, Priority::Normal, 0.0);
        bundle.obey_route = true;
        bundle.route = Some(vec![hop_id]);
        node.buffer.append(bundle);

        let mut ctx = Context::new(1);
        forwarding::assign_bundles(&mut node, &mut plan, 0.0, |_| None, &mut ctx);

        assert!(node.buffer.is_empty());
        assert_eq!(ctx.analytics.bundles_dropped, 0);
        assert_eq!(node.outbound_queue_mut(2).len(), 1);

        let mut nodes = HashMap::new();
        nodes.insert(1, node);
        forwarding::reconcile_overbooking(&mut plan, &mut nodes, &mut ctx);
        // A single bundle within a contact's full capacity never over-books.
        assert!(plan.contact(0).mav.iter().all(|m| *m >= 0.0));
    }
}

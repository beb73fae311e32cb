use std::cmp::Ordering;

use crate::route::Route;
use crate::types::Priority;

/// A pluggable ordering strategy over candidate routes to the same
/// destination.
///
/// The teacher's `Distance<CM>` trait compared `RouteStage` tree nodes under
/// a swappable manager type; here it is repurposed to compare finished
/// [`Route`]s, since this crate's routes are concrete. `BestDeliveryTime`
/// mirrors the source's `Route.__lt__` (`routing.py`): best-case arrival
/// time first, then bottleneck resource, then confidence.
pub trait Distance
where
    Self: Sized,
{
    fn cmp(first: &Route, second: &Route) -> Ordering;

    fn partial_cmp(first: &Route, second: &Route) -> Option<Ordering> {
        Some(Self::cmp(first, second))
    }

    fn eq(first: &Route, second: &Route) -> bool {
        Self::cmp(first, second) == Ordering::Equal
    }
}

/// Orders by best delivery time, then residual volume at `Priority::Bulk`,
/// then confidence — the default strategy, matching `Route.__lt__`.
pub struct BestDeliveryTime;

impl Distance for BestDeliveryTime {
    fn cmp(first: &Route, second: &Route) -> Ordering {
        first
            .best_delivery_time()
            .partial_cmp(&second.best_delivery_time())
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                second
                    .volume_at(Priority::Bulk)
                    .partial_cmp(&first.volume_at(Priority::Bulk))
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| {
                second
                    .confidence()
                    .partial_cmp(&first.confidence())
                    .unwrap_or(Ordering::Equal)
            })
    }
}

/// Orders by bottleneck residual volume first, falling back to best delivery
/// time — used by the resource-aware scheduling profile, which cares more
/// about not starving other traffic than about shaving the last second off
/// delivery.
pub struct ResourceAware;

impl Distance for ResourceAware {
    fn cmp(first: &Route, second: &Route) -> Ordering {
        second
            .volume_at(Priority::Bulk)
            .partial_cmp(&first.volume_at(Priority::Bulk))
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                first
                    .best_delivery_time()
                    .partial_cmp(&second.best_delivery_time())
                    .unwrap_or(Ordering::Equal)
            })
    }
}

/// Orders purely by hop count, shortest first — useful as a tie-break or for
/// benchmarking against the volume-aware strategies above.
pub struct HopCount;

impl Distance for HopCount {
    fn cmp(first: &Route, second: &Route) -> Ordering {
        first.hop_count().cmp(&second.hop_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::Contact;

    fn route(to: u32, start: f64, end: f64, arrival: f64) -> Route {
        Route::new(
            Contact::new(0, to, start, end, 1.0, 0.0, 1.0).unwrap(),
            arrival,
        )
    }

    #[test]
    fn best_delivery_time_prefers_earlier_arrival() {
        let a = route(1, 0.0, 10.0, 5.0);
        let b = route(1, 0.0, 10.0, 7.0);
        assert_eq!(BestDeliveryTime::cmp(&a, &b), Ordering::Less);
    }
}

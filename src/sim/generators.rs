use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_distr::{Distribution, Exp};

use crate::request::Request;
use crate::types::{Date, DataRate, Duration, EndpointId, NodeID, Priority, Volume};
use crate::utils::IdAllocator;

/// Derives the mean request inter-arrival time from the traffic model's
/// congestion target (§6): a target's nominal `download_capacity` (volume it
/// could push out per unit time) scaled by `congestion` gives the rate
/// requests should arrive at to keep that target's downlink at roughly that
/// fraction of saturation.
pub fn mean_request_inter_arrival_time(
    sim_duration: Duration,
    bundle_size: Volume,
    download_capacity: DataRate,
    congestion: f64,
) -> Duration {
    let congestion = congestion.max(f64::MIN_POSITIVE);
    sim_duration * bundle_size / (download_capacity * congestion)
}

/// Poisson-arrival generator of acquisition-and-delivery [`Request`]s against
/// a pool of targets, grounded on the source's `requests_generator`
/// coroutine (`main.py`): each tick draws an exponential wait, then a
/// uniformly chosen target.
pub struct RequestGenerator {
    inter_arrival: Exp<f64>,
    rng: StdRng,
    targets: Vec<NodeID>,
    destination: EndpointId,
    size: Volume,
    priority: Priority,
    max_time_to_acquire: Duration,
    bundle_lifetime: Duration,
}

impl RequestGenerator {
    pub fn new(
        seed: u64,
        mean_inter_arrival: Duration,
        targets: Vec<NodeID>,
        destination: EndpointId,
        size: Volume,
        priority: Priority,
        max_time_to_acquire: Duration,
        bundle_lifetime: Duration,
    ) -> Self {
        assert!(!targets.is_empty(), "request generator needs at least one target");
        Self {
            inter_arrival: Exp::new(1.0 / mean_inter_arrival).expect("positive mean inter-arrival time"),
            rng: StdRng::seed_from_u64(seed),
            targets,
            destination,
            size,
            priority,
            max_time_to_acquire,
            bundle_lifetime,
        }
    }

    /// Draws the wait until the next request arrives.
    pub fn next_arrival_delay(&mut self) -> Duration {
        self.inter_arrival.sample(&mut self.rng)
    }

    /// Produces a request arriving at `now`, addressed to a uniformly chosen
    /// target from the pool.
    pub fn generate(&mut self, now: Date, ids: &mut IdAllocator) -> Request {
        let target = *self
            .targets
            .choose(&mut self.rng)
            .expect("at least one target");
        Request::new(
            ids.next_request_id(),
            target,
            now + self.max_time_to_acquire,
            self.bundle_lifetime,
            self.priority,
            self.destination,
            self.size,
            now,
        )
    }
}

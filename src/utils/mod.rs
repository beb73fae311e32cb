use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::route::Route;
use crate::types::{RequestId, TaskId};

/// Generates opaque identifiers for requests and tasks.
///
/// The source (`misc.py`) kept a single module-level `USED_IDS` set and a
/// free `id_generator()` function. Per the "Global mutable state" design
/// note, that global is replaced here by an explicitly threaded allocator
/// that the caller owns (see `Context`).
pub struct IdAllocator {
    rng: rand::rngs::StdRng,
    used: std::collections::HashSet<String>,
}

impl IdAllocator {
    pub fn new(seed: u64) -> Self {
        use rand::SeedableRng;
        Self {
            rng: rand::rngs::StdRng::seed_from_u64(seed),
            used: std::collections::HashSet::new(),
        }
    }

    fn generate(&mut self, size: usize) -> String {
        loop {
            let id: String = (&mut self.rng)
                .sample_iter(&Alphanumeric)
                .take(size)
                .map(char::from)
                .map(|c| c.to_ascii_uppercase())
                .collect();
            if self.used.insert(id.clone()) {
                return id;
            }
        }
    }

    pub fn next_request_id(&mut self) -> RequestId {
        RequestId(self.generate(12))
    }

    pub fn next_task_id(&mut self) -> TaskId {
        TaskId(self.generate(12))
    }
}

/// Prints a human-readable trace of a route's hops, in the order they would
/// be traversed.
pub fn pretty_print_route(route: &Route) {
    println!(
        "Route to node {} | bdt={} | hops={} | volume={} | confidence={}",
        route.to_node(),
        route.best_delivery_time(),
        route.hops().len(),
        route.volume(),
        route.confidence()
    );
    for (i, hop) in route.hops().iter().enumerate() {
        println!(
            "\t- hop {}: {} -> {} [{},{}]",
            i, hop.frm, hop.to, hop.start, hop.end
        );
    }
}

use std::collections::HashMap;

use crate::route::Route;
use crate::types::{Date, EndpointId, NodeID};

/// Per-`(node, destination endpoint)` cache of previously computed routes.
///
/// Grounded on the teacher's `TreeCache`, simplified to the concrete [`Route`]
/// model used here: entries key on `(NodeID, EndpointId)` rather than caching
/// a whole pathfinding tree per bundle, and invalidation is lazy (§9
/// "Container choices") — a route is dropped the first time a lookup
/// observes one of its hops' `end <= now`, rather than being proactively
/// swept whenever a contact expires.
#[derive(Default)]
pub struct RouteCache {
    entries: HashMap<(NodeID, EndpointId), Vec<Route>>,
}

impl RouteCache {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Returns the cached routes from `from` to `to` still valid at `now`,
    /// evicting any entry whose hops have started to expire.
    pub fn get(&mut self, from: NodeID, to: EndpointId, now: Date) -> &[Route] {
        let key = (from, to);
        if let Some(routes) = self.entries.get_mut(&key) {
            routes.retain(|r| r.hops().iter().all(|h| h.end > now));
        }
        self.entries.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn store(&mut self, from: NodeID, to: EndpointId, routes: Vec<Route>) {
        self.entries.insert((from, to), routes);
    }

    pub fn invalidate(&mut self, from: NodeID, to: EndpointId) {
        self.entries.remove(&(from, to));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

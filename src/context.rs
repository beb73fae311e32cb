use crate::analytics::Analytics;
use crate::types::Date;
use crate::utils::IdAllocator;

/// The object threaded by reference through every component that would
/// otherwise have reached for a global.
///
/// Per the "Global mutable state" design note: the source's ID generator
/// and analytics bus were the only globals. Here they — plus the virtual
/// clock — are carried explicitly as fields of `Context`, and every
/// component (`Scheduler`, `Node`, the forwarding engine, the DES harness)
/// takes `&Context`/`&mut Context` rather than reaching for module state.
pub struct Context {
    now: Date,
    pub ids: IdAllocator,
    pub analytics: Analytics,
}

impl Context {
    pub fn new(seed: u64) -> Self {
        Self {
            now: 0.0,
            ids: IdAllocator::new(seed),
            analytics: Analytics::new(),
        }
    }

    pub fn now(&self) -> Date {
        self.now
    }

    /// Advances the virtual clock. Only the DES harness (`sim::Engine`) is
    /// expected to call this; every other component only reads `now()`.
    pub fn advance_to(&mut self, t: Date) {
        debug_assert!(t >= self.now, "virtual clock must be monotone");
        self.now = t;
    }
}

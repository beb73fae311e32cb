use std::collections::HashMap;

use tracing::{debug, trace};

use crate::types::{Date, Duration, RequestId, TaskId};

/// Aggregate counters and latency samples collected over a simulation run.
///
/// Grounded verbatim on the source's `Analytics` class (`analytics.py`): one
/// counter per event the forwarding engine, scheduler and task table observe.
/// Where the source printed directly, this emits a `tracing` event instead
/// (see the crate's logging design) in addition to updating the counter.
pub struct Analytics {
    /// Simulation time before which collected samples are discarded.
    pub warm_up: Date,
    /// Simulation time after which no further samples are collected.
    pub cool_down: Date,

    requests_submitted_at: HashMap<RequestId, Date>,
    pub requests_submitted: u64,
    pub requests_failed: u64,
    /// Count of submitted requests that an existing task already covered.
    pub requests_duplicated: u64,

    pub tasks_processed: u64,
    pub tasks_failed: u64,
    pub tasks_redundant: u64,
    pub tasks_renewed: u64,

    pub bundles_acquired: u64,
    pub bundles_forwarded: u64,
    pub bundles_delivered: u64,
    pub bundles_dropped: u64,
    pub bundles_rerouted: u64,

    latencies: Vec<Duration>,
}

/// A snapshot of every counter, printed by the binary at end of run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub requests_submitted: u64,
    pub requests_failed: u64,
    pub requests_duplicated: u64,
    pub tasks_processed: u64,
    pub tasks_failed: u64,
    pub tasks_redundant: u64,
    pub tasks_renewed: u64,
    pub bundles_acquired: u64,
    pub bundles_forwarded: u64,
    pub bundles_delivered: u64,
    pub bundles_dropped: u64,
    pub bundles_rerouted: u64,
    pub latency_ave: Option<f64>,
    pub latency_stdev: Option<f64>,
}

impl Analytics {
    pub fn new() -> Self {
        Self {
            warm_up: 0.0,
            cool_down: Date::INFINITY,
            requests_submitted_at: HashMap::new(),
            requests_submitted: 0,
            requests_failed: 0,
            requests_duplicated: 0,
            tasks_processed: 0,
            tasks_failed: 0,
            tasks_redundant: 0,
            tasks_renewed: 0,
            bundles_acquired: 0,
            bundles_forwarded: 0,
            bundles_delivered: 0,
            bundles_dropped: 0,
            bundles_rerouted: 0,
            latencies: Vec::new(),
        }
    }

    pub fn with_window(warm_up: Date, cool_down: Date) -> Self {
        Self {
            warm_up,
            cool_down,
            ..Self::new()
        }
    }

    fn in_window(&self, t: Date) -> bool {
        t >= self.warm_up && t <= self.cool_down
    }

    pub fn submit_request(&mut self, id: RequestId, now: Date) {
        trace!(request = %id, "request submitted");
        self.requests_submitted_at.insert(id, now);
        self.requests_submitted += 1;
    }

    pub fn fail_request(&mut self) {
        self.requests_failed += 1;
    }

    pub fn duplicated_request(&mut self) {
        self.requests_duplicated += 1;
    }

    pub fn add_task(&mut self, id: &TaskId) {
        debug!(task = %id, "task scheduled");
        self.tasks_processed += 1;
    }

    pub fn fail_task(&mut self) {
        self.tasks_failed += 1;
    }

    pub fn redundant_task(&mut self) {
        self.tasks_redundant += 1;
    }

    /// A redundant task was superseded by a freshly scheduled one for the
    /// same target (§4.6a renewal accounting).
    pub fn renew_task(&mut self, id: &TaskId) {
        debug!(task = %id, "task renewed");
        self.tasks_renewed += 1;
    }

    pub fn add_bundle(&mut self) {
        self.bundles_acquired += 1;
    }

    pub fn forward_bundle(&mut self) {
        self.bundles_forwarded += 1;
    }

    pub fn deliver_bundle(&mut self, created_at: Date, now: Date) {
        if self.in_window(now) {
            self.latencies.push(now - created_at);
        }
        self.bundles_delivered += 1;
    }

    pub fn drop_bundle(&mut self) {
        self.bundles_dropped += 1;
    }

    /// A bundle was assigned to a route different from the one it was most
    /// recently assigned to (e.g. it missed its contact and was reassigned).
    pub fn reroute_bundle(&mut self) {
        self.bundles_rerouted += 1;
    }

    pub fn latency_ave(&self) -> Option<f64> {
        if self.latencies.is_empty() {
            return None;
        }
        Some(self.latencies.iter().sum::<f64>() / self.latencies.len() as f64)
    }

    pub fn latency_stdev(&self) -> Option<f64> {
        let n = self.latencies.len();
        if n < 2 {
            return None;
        }
        let mean = self.latency_ave()?;
        let variance = self
            .latencies
            .iter()
            .map(|x| (x - mean).powi(2))
            .sum::<f64>()
            / (n - 1) as f64;
        Some(variance.sqrt())
    }

    pub fn summary(&self) -> Summary {
        Summary {
            requests_submitted: self.requests_submitted,
            requests_failed: self.requests_failed,
            requests_duplicated: self.requests_duplicated,
            tasks_processed: self.tasks_processed,
            tasks_failed: self.tasks_failed,
            tasks_redundant: self.tasks_redundant,
            tasks_renewed: self.tasks_renewed,
            bundles_acquired: self.bundles_acquired,
            bundles_forwarded: self.bundles_forwarded,
            bundles_delivered: self.bundles_delivered,
            bundles_dropped: self.bundles_dropped,
            bundles_rerouted: self.bundles_rerouted,
            latency_ave: self.latency_ave(),
            latency_stdev: self.latency_stdev(),
        }
    }
}

impl Default for Analytics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latency_stats_need_two_samples() {
        let mut a = Analytics::new();
        a.deliver_bundle(0.0, 5.0);
        assert_eq!(a.latency_ave(), Some(5.0));
        assert_eq!(a.latency_stdev(), None);
        a.deliver_bundle(0.0, 7.0);
        assert_eq!(a.latency_ave(), Some(6.0));
        assert!(a.latency_stdev().unwrap() > 0.0);
    }

    #[test]
    fn warm_up_and_cool_down_exclude_samples() {
        let mut a = Analytics::with_window(10.0, 20.0);
        a.deliver_bundle(0.0, 5.0);
        assert_eq!(a.bundles_delivered, 1);
        assert_eq!(a.latency_ave(), None);
        a.deliver_bundle(0.0, 15.0);
        assert_eq!(a.latency_ave(), Some(15.0));
    }
}

use crate::contact::Contact;
use crate::types::{Date, NodeID, Priority, Volume};

/// An ordered sequence of contacts a bundle would traverse to reach a
/// destination, together with the arrival time a search computed for it.
///
/// Grounded on the source's `Route` class (`routing.py`): hops are stored as
/// full contact snapshots (not indices), so a route remains meaningful even
/// after the contact plan it was drawn from has moved on — callers that need
/// the live contact look it up by [`Contact::id`].
#[cfg_attr(feature = "debug", derive(Debug))]
#[derive(Clone)]
pub struct Route {
    hops: Vec<Contact>,
    /// Best-case delivery time computed by the search that produced this
    /// route (earliest arrival at `to_node()`).
    arrival_time: Date,
}

impl Route {
    /// Starts a new route from its first hop.
    pub fn new(first_hop: Contact, arrival_time: Date) -> Self {
        Self {
            hops: vec![first_hop],
            arrival_time,
        }
    }

    pub fn from_hops(hops: Vec<Contact>, arrival_time: Date) -> Self {
        debug_assert!(!hops.is_empty());
        Self { hops, arrival_time }
    }

    pub fn hops(&self) -> &[Contact] {
        &self.hops
    }

    pub fn append(&mut self, hop: Contact, arrival_time: Date) {
        self.hops.push(hop);
        self.arrival_time = arrival_time;
    }

    /// The node this route was rooted at (the sender of its first hop).
    pub fn from_node(&self) -> NodeID {
        self.hops[0].frm
    }

    /// The node the first hop forwards through — what a node consults its
    /// route table for when deciding an outbound queue.
    pub fn next_node(&self) -> NodeID {
        self.hops[0].to
    }

    /// The final destination this route delivers to.
    pub fn to_node(&self) -> NodeID {
        self.hops.last().expect("route has at least one hop").to
    }

    pub fn best_delivery_time(&self) -> Date {
        self.arrival_time
    }

    /// Bottleneck residual volume at `priority` across every hop.
    pub fn volume_at(&self, priority: Priority) -> Volume {
        self.hops
            .iter()
            .map(|h| h.available(priority))
            .fold(Volume::INFINITY, f64::min)
    }

    /// Bottleneck full-window capacity across every hop, independent of
    /// priority or of what has already been reserved.
    pub fn volume(&self) -> Volume {
        self.hops
            .iter()
            .map(Contact::capacity)
            .fold(Volume::INFINITY, f64::min)
    }

    /// Combined confidence of the route succeeding end to end: the product
    /// of each hop's confidence, per the source's `availability` property.
    pub fn confidence(&self) -> f64 {
        self.hops.iter().map(|h| h.confidence).product()
    }

    pub fn hop_count(&self) -> usize {
        self.hops.len()
    }

    /// `true` if `node` appears as the sender or receiver of any hop, used
    /// to reject routes that would loop back through an excluded node.
    pub fn visits(&self, node: NodeID) -> bool {
        self.hops.iter().any(|h| h.frm == node || h.to == node)
    }

    /// Recomputes hop-wise timing and the bottleneck effective volume limit
    /// for a bundle of `size` whose first byte cannot leave before
    /// `first_byte_tx_at` (the candidate filter's ETO, or just the hop's own
    /// start for a plain feasibility check), per §4.1's hop-timing recipe.
    ///
    /// Returns `(best_delivery_time, effective_volume_limit)`. The limit is
    /// clamped at 0 (§9 open question: "the meaning of effective_volume_limit
    /// when mav has been transiently driven negative" — scoring clamps to 0
    /// while reconciliation still tracks the signed value on the contact
    /// itself).
    pub fn retime(&self, first_byte_tx_at: Date, size: Volume, priority: Priority) -> (Date, Volume) {
        let mut effective_stop = vec![Date::INFINITY; self.hops.len()];
        let mut running_min = Date::INFINITY;
        for i in (0..self.hops.len()).rev() {
            running_min = running_min.min(self.hops[i].end);
            effective_stop[i] = running_min;
        }

        let mut limit = Volume::INFINITY;
        let mut last_byte_arr = first_byte_tx_at;
        let mut prev_arrival = first_byte_tx_at;
        for (i, hop) in self.hops.iter().enumerate() {
            let first_byte_tx = if i == 0 {
                first_byte_tx_at
            } else {
                prev_arrival.max(hop.start)
            };
            let tx_time = if hop.rate > 0.0 { size / hop.rate } else { 0.0 };
            let last_byte_tx = first_byte_tx + tx_time;
            let arrival = last_byte_tx + hop.owlt;

            let eff_vol = ((effective_stop[i] - first_byte_tx) * hop.rate).max(0.0);
            let vol_limit = eff_vol.min(hop.available(priority).max(0.0));
            limit = limit.min(vol_limit);

            prev_arrival = arrival;
            last_byte_arr = arrival;
        }
        (last_byte_arr, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hop(frm: NodeID, to: NodeID, start: Date, end: Date) -> Contact {
        Contact::new(frm, to, start, end, 1.0, 1.0, 1.0).unwrap()
    }

    #[test]
    fn volume_is_the_bottleneck_hop() {
        let mut route = Route::new(hop(1, 2, 0.0, 10.0), 1.0);
        route.append(hop(2, 3, 0.0, 2.0), 3.0);
        assert_eq!(route.volume(), 2.0);
        assert_eq!(route.to_node(), 3);
        assert_eq!(route.next_node(), 2);
    }

    #[test]
    fn confidence_multiplies_across_hops() {
        let mut route = Route::new(
            Contact::new(1, 2, 0.0, 10.0, 1.0, 1.0, 0.5).unwrap(),
            1.0,
        );
        route.append(
            Contact::new(2, 3, 0.0, 10.0, 1.0, 1.0, 0.5).unwrap(),
            2.0,
        );
        assert_eq!(route.confidence(), 0.25);
    }
}

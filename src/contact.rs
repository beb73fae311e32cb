use std::cmp::Ordering;

use crate::types::{ContactId, Date, DataRate, NodeID, Priority, Volume};

/// A scheduled transmission opportunity from one node to another.
///
/// Mirrors the source's `Contact` dataclass (`routing.py`): a fixed time
/// window, a data rate, a one-way light time and a confidence level. Unlike
/// the teacher's `Contact<CM: ContactManager>`, there is no swappable manager
/// type here — the per-priority residual volume (`mav`) and the transient
/// search/management fields below are owned directly on `Contact`, since this
/// crate has exactly one notion of a contact's resource state.
#[cfg_attr(feature = "debug", derive(Debug))]
#[derive(Clone)]
pub struct Contact {
    /// Node transmitting during this contact.
    pub frm: NodeID,
    /// Node receiving during this contact.
    pub to: NodeID,
    pub start: Date,
    pub end: Date,
    pub rate: DataRate,
    /// One-way light time, added to `end` when computing arrival times.
    pub owlt: Date,
    /// Confidence in [0, 1] that the contact will occur as scheduled.
    pub confidence: f64,

    /// Mutable available volume remaining at each priority. `mav[p]` is what
    /// may still be reserved at priority `p`; reserving `v` at priority `p`
    /// decrements `mav[0..=p]` by `v` (lower-priority traffic is squeezed
    /// out first, per the `Priority` ordering).
    pub mav: [Volume; Priority::COUNT],

    // --- Dijkstra search working area, cleared before every route search ---
    pub arrival_time: Date,
    pub visited: bool,
    pub predecessor: Option<ContactId>,

    // --- Yen management working area, cleared before every k-path search ---
    pub suppressed: bool,
    pub suppressed_next_hop: bool,
}

impl Contact {
    /// Builds a contact, deriving the full-capacity `mav` from `rate` and the
    /// window length. Returns `None` if the window is empty or inverted.
    pub fn new(
        frm: NodeID,
        to: NodeID,
        start: Date,
        end: Date,
        rate: DataRate,
        owlt: Date,
        confidence: f64,
    ) -> Option<Self> {
        if !(start < end) {
            return None;
        }
        let capacity = rate * (end - start);
        Some(Self {
            frm,
            to,
            start,
            end,
            rate,
            owlt,
            confidence,
            mav: [capacity; Priority::COUNT],
            arrival_time: Date::INFINITY,
            visited: false,
            predecessor: None,
            suppressed: false,
            suppressed_next_hop: false,
        })
    }

    pub fn id(&self) -> ContactId {
        ContactId::new(self.frm, self.to, self.start)
    }

    /// Total capacity of the window, independent of what has been reserved.
    pub fn capacity(&self) -> Volume {
        self.rate * (self.end - self.start)
    }

    /// Volume still available at `priority` (bounded by every lower or equal
    /// priority level's residual, since a reservation at `priority` also
    /// consumes the budget of everything beneath it).
    pub fn available(&self, priority: Priority) -> Volume {
        self.mav[priority.as_index()]
    }

    /// Reserves `volume` at `priority`, decrementing `mav[0..=priority]`.
    ///
    /// Returns `false` without modifying anything if the reservation would
    /// drive any affected level negative.
    pub fn reserve(&mut self, priority: Priority, volume: Volume) -> bool {
        let idx = priority.as_index();
        if self.mav[..=idx].iter().any(|m| *m < volume) {
            return false;
        }
        for m in &mut self.mav[..=idx] {
            *m -= volume;
        }
        true
    }

    /// Reserves `volume` at `priority` unconditionally, allowed to drive
    /// `mav` negative.
    ///
    /// Bundle assignment (§4.7.2) uses this instead of [`reserve`](Self::reserve):
    /// unlike scheduling, which must know up front whether a plan is
    /// feasible, assignment commits to a cached route optimistically and
    /// leaves correcting an over-subscribed contact to reconciliation
    /// (§4.7.3), which preempts lower-ranked bundles and releases their share
    /// back with [`release`](Self::release).
    pub fn force_reserve(&mut self, priority: Priority, volume: Volume) {
        let idx = priority.as_index();
        for m in &mut self.mav[..=idx] {
            *m -= volume;
        }
    }

    /// Releases a reservation previously made with [`reserve`](Self::reserve).
    pub fn release(&mut self, priority: Priority, volume: Volume) {
        let idx = priority.as_index();
        for m in &mut self.mav[..=idx] {
            *m += volume;
        }
    }

    /// Earliest moment data handed to this contact at `now` could arrive,
    /// ignoring residual volume.
    pub fn arrival_time_from(&self, now: Date) -> Date {
        now.max(self.start) + self.owlt
    }

    /// Clears the Dijkstra working area. Must run before every route search
    /// that will write `arrival_time`/`visited`/`predecessor`.
    pub fn clear_dijkstra_working_area(&mut self) {
        self.arrival_time = Date::INFINITY;
        self.visited = false;
        self.predecessor = None;
    }

    /// Clears the Yen management working area before a fresh k-path search.
    pub fn clear_management_working_area(&mut self) {
        self.suppressed = false;
        self.suppressed_next_hop = false;
    }
}

impl PartialEq for Contact {
    fn eq(&self, other: &Self) -> bool {
        self.frm == other.frm && self.to == other.to && self.start == other.start
    }
}
impl Eq for Contact {}

impl Ord for Contact {
    /// Orders by `(frm, to, start)`, matching the contact plan's natural
    /// sort order and the stable tie-break used wherever contacts are
    /// compared outside of a search's arrival-time ranking.
    fn cmp(&self, other: &Self) -> Ordering {
        self.frm
            .cmp(&other.frm)
            .then(self.to.cmp(&other.to))
            .then(
                self.start
                    .partial_cmp(&other.start)
                    .unwrap_or(Ordering::Equal),
            )
    }
}

impl PartialOrd for Contact {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_empty_window() {
        assert!(Contact::new(1, 2, 10.0, 10.0, 1.0, 0.0, 1.0).is_none());
        assert!(Contact::new(1, 2, 10.0, 5.0, 1.0, 0.0, 1.0).is_none());
    }

    #[test]
    fn reserve_squeezes_lower_priorities() {
        let mut c = Contact::new(1, 2, 0.0, 10.0, 1.0, 0.0, 1.0).unwrap();
        assert_eq!(c.mav, [10.0, 10.0, 10.0]);
        assert!(c.reserve(Priority::Normal, 4.0));
        assert_eq!(c.mav, [6.0, 6.0, 10.0]);
        assert!(c.reserve(Priority::Expedited, 6.0));
        assert_eq!(c.mav, [0.0, 0.0, 4.0]);
        assert!(!c.reserve(Priority::Bulk, 1.0));
    }

    #[test]
    fn release_restores_reservation() {
        let mut c = Contact::new(1, 2, 0.0, 10.0, 1.0, 0.0, 1.0).unwrap();
        c.reserve(Priority::Normal, 4.0);
        c.release(Priority::Normal, 4.0);
        assert_eq!(c.mav, [10.0, 10.0, 10.0]);
    }
}

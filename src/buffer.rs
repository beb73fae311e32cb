use crate::bundle::Bundle;
use crate::types::Volume;

/// A FIFO-with-sort queue of bundles held on a node, grounded on the
/// source's `Buffer` dataclass (`bundles.py`): bundles are kept sorted by
/// the preemption order at all times, so the most important bundle is
/// always at the front.
#[cfg_attr(feature = "debug", derive(Debug))]
pub struct Buffer {
    capacity: Volume,
    bundles: Vec<Bundle>,
}

impl Buffer {
    pub fn new(capacity: Volume) -> Self {
        Self {
            capacity,
            bundles: Vec::new(),
        }
    }

    pub fn capacity_remaining(&self) -> Volume {
        self.capacity - self.bundles.iter().map(|b| b.size).sum::<Volume>()
    }

    /// Inserts `bundle`, keeping the buffer sorted. Returns `false` without
    /// modifying the buffer if there isn't room.
    pub fn append(&mut self, bundle: Bundle) -> bool {
        if self.capacity_remaining() < bundle.size {
            return false;
        }
        self.bundles.push(bundle);
        self.bundles.sort();
        true
    }

    /// Removes and returns the front (most important) bundle.
    pub fn extract(&mut self) -> Option<Bundle> {
        if self.bundles.is_empty() {
            None
        } else {
            Some(self.bundles.remove(0))
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bundle> {
        self.bundles.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Bundle> {
        self.bundles.iter_mut()
    }

    /// Removes every bundle matching `predicate`, returning them. Used by
    /// assignment to pull bundles out for routing and by over-booking
    /// reconciliation's refund path.
    pub fn drain_matching(&mut self, mut predicate: impl FnMut(&Bundle) -> bool) -> Vec<Bundle> {
        let mut drained = Vec::new();
        let mut i = 0;
        while i < self.bundles.len() {
            if predicate(&self.bundles[i]) {
                drained.push(self.bundles.remove(i));
            } else {
                i += 1;
            }
        }
        drained
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Priority;

    #[test]
    fn append_respects_capacity() {
        let mut buf = Buffer::new(5.0);
        assert!(buf.append(Bundle::new(1, 9, 2, 3.0, 100.0, Priority::Bulk, 0.0)));
        assert!(buf.append(Bundle::new(1, 9, 2, 2.0, 100.0, Priority::Bulk, 0.0)));
        assert!(!buf.append(Bundle::new(1, 9, 2, 1.0, 100.0, Priority::Bulk, 0.0)));
        assert_eq!(buf.capacity_remaining(), 0.0);
    }

    #[test]
    fn extract_returns_most_important_first() {
        let mut buf = Buffer::new(10.0);
        buf.append(Bundle::new(1, 9, 2, 1.0, 100.0, Priority::Bulk, 0.0));
        buf.append(Bundle::new(1, 9, 2, 1.0, 100.0, Priority::Expedited, 1.0));
        let first = buf.extract().unwrap();
        assert_eq!(first.priority, Priority::Expedited);
    }
}

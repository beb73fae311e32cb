use crate::types::{ContactId, Date, NodeID, Priority, Volume};

pub mod dijkstra;
pub mod yen;

/// Constraints a route search must respect, threaded through both Dijkstra
/// and Yen so the two share one notion of "feasible hop".
#[derive(Clone, Copy)]
pub struct SearchConstraint<'a> {
    /// A hop may not arrive later than this.
    pub deadline: Option<Date>,
    /// A hop must have at least this much residual volume at `priority`.
    pub size: Option<Volume>,
    pub priority: Priority,
    /// Nodes the route must not pass through (besides the source itself).
    pub excluded_nodes: &'a [NodeID],
    /// Specific contacts Yen has ruled out as the divergent hop at the
    /// current spur node, so the search doesn't just rediscover a route
    /// already accepted (§4.3).
    pub excluded_contacts: &'a [ContactId],
}

impl<'a> SearchConstraint<'a> {
    pub fn new() -> Self {
        Self {
            deadline: None,
            size: None,
            priority: Priority::Bulk,
            excluded_nodes: &[],
            excluded_contacts: &[],
        }
    }
}

impl<'a> Default for SearchConstraint<'a> {
    fn default() -> Self {
        Self::new()
    }
}

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::contact_plan::ContactPlan;
use crate::pathfinding::SearchConstraint;
use crate::route::Route;
use crate::types::{ContactId, Date, EndpointId, NodeID};

/// One entry of the search frontier: a contact that could be taken next,
/// ranked so the earliest-arriving one pops first.
///
/// Determinism (§4.2): ties in arrival time are broken by `(start,
/// end-start, -confidence, uid)`, matching the source's stable sort.
struct Candidate {
    arrival: Date,
    start: Date,
    span: Date,
    confidence: f64,
    uid: ContactId,
    idx: usize,
    predecessor: Option<usize>,
}

impl Candidate {
    fn key(&self) -> (Date, Date, Date, f64) {
        (self.arrival, self.start, -self.span, -self.confidence)
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key() && self.uid == other.uid
    }
}
impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse the natural comparison so the
        // candidate with the smallest key (earliest arrival) pops first.
        other
            .arrival
            .partial_cmp(&self.arrival)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.start.partial_cmp(&self.start).unwrap_or(Ordering::Equal))
            .then_with(|| self.span.partial_cmp(&other.span).unwrap_or(Ordering::Equal))
            .then_with(|| {
                self.confidence
                    .partial_cmp(&other.confidence)
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| other.uid.cmp(&self.uid))
    }
}

/// Runs an earliest-arrival Dijkstra search from `source` at `now` toward any
/// node carrying `target`, expanding through `plan`.
///
/// Mutates the Dijkstra working area (`arrival_time`, `visited`,
/// `predecessor`) of every contact it touches, per §3; callers must not rely
/// on those fields surviving past the call, and must call
/// [`ContactPlan::clear_dijkstra_working_area`] before reusing the plan for
/// another search that needs a clean slate (this function does so itself on
/// entry).
pub fn earliest_arrival(
    plan: &mut ContactPlan,
    source: NodeID,
    now: Date,
    node_endpoint: impl Fn(NodeID) -> Option<EndpointId>,
    target: EndpointId,
    constraint: SearchConstraint,
) -> Option<Route> {
    plan.clear_dijkstra_working_area();
    let by_id: HashMap<ContactId, usize> = plan
        .contacts()
        .iter()
        .enumerate()
        .map(|(idx, c)| (c.id(), idx))
        .collect();

    let mut heap: BinaryHeap<Candidate> = BinaryHeap::new();
    for &idx in plan.outgoing(source) {
        push_if_feasible(plan, &by_id, &mut heap, idx, now, None, source, constraint);
    }

    while let Some(top) = heap.pop() {
        if plan.contact(top.idx).visited {
            continue;
        }
        let predecessor_id = top.predecessor.map(|p| plan.contact(p).id());
        {
            let c = plan.contact_mut(top.idx);
            c.visited = true;
            c.arrival_time = top.arrival;
            if let Some(id) = predecessor_id {
                c.predecessor = Some(id);
            }
        }
        let to = plan.contact(top.idx).to;

        if node_endpoint(to) == Some(target) {
            return Some(reconstruct(plan, &by_id, top.idx, top.arrival));
        }

        for &next_idx in plan.outgoing(to) {
            push_if_feasible(
                plan,
                &by_id,
                &mut heap,
                next_idx,
                top.arrival,
                Some(top.idx),
                source,
                constraint,
            );
        }
    }

    None
}

/// `true` if `node` already appears on the path ending at `predecessor`
/// (including the search's root `source`), per §4.2's "receiver already on
/// the path" rejection and §9's cycle mitigation: the source and every
/// contact's `to` along the predecessor chain counts as visited.
fn node_on_path(
    plan: &ContactPlan,
    by_id: &HashMap<ContactId, usize>,
    predecessor: Option<usize>,
    node: NodeID,
    source: NodeID,
) -> bool {
    if node == source {
        return true;
    }
    let mut cursor = predecessor;
    while let Some(idx) = cursor {
        let c = plan.contact(idx);
        if c.to == node {
            return true;
        }
        cursor = c.predecessor.as_ref().and_then(|id| by_id.get(id).copied());
    }
    false
}

#[allow(clippy::too_many_arguments)]
fn push_if_feasible(
    plan: &ContactPlan,
    by_id: &HashMap<ContactId, usize>,
    heap: &mut BinaryHeap<Candidate>,
    idx: usize,
    predecessor_arrival: Date,
    predecessor: Option<usize>,
    source: NodeID,
    constraint: SearchConstraint,
) {
    let c = plan.contact(idx);
    if c.visited || c.suppressed {
        return;
    }
    if constraint.excluded_nodes.contains(&c.to) {
        return;
    }
    if constraint.excluded_contacts.contains(&c.id()) {
        return;
    }
    if node_on_path(plan, by_id, predecessor, c.to, source) {
        return;
    }
    let arrival = c.arrival_time_from(predecessor_arrival);
    let size = constraint.size.unwrap_or(0.0);
    if let Some(size) = constraint.size {
        if c.available(constraint.priority) < size {
            return;
        }
    }
    // The contact must still be open once the transfer itself completes,
    // even when no size was given (a zero-size transfer still needs the
    // window to not already be closed).
    if c.end <= arrival + size / c.rate {
        return;
    }
    if let Some(deadline) = constraint.deadline {
        if arrival > deadline {
            return;
        }
    }
    heap.push(Candidate {
        arrival,
        start: c.start,
        span: c.end - c.start,
        confidence: c.confidence,
        uid: c.id(),
        idx,
        predecessor,
    });
}

fn reconstruct(plan: &ContactPlan, by_id: &HashMap<ContactId, usize>, last: usize, arrival_time: Date) -> Route {
    let mut hops = Vec::new();
    let mut cursor = Some(last);
    while let Some(idx) = cursor {
        let c = plan.contact(idx);
        hops.push(c.clone());
        cursor = c.predecessor.as_ref().and_then(|id| by_id.get(id).copied());
    }
    hops.reverse();
    Route::from_hops(hops, arrival_time)
}

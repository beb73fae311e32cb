use std::cmp::Ordering;

use crate::types::{ContactId, Date, Duration, EndpointId, NodeID, Priority, RequestId, TaskId, Volume};

/// A scheduled acquisition-and-delivery assignment, gossiped between nodes
/// via their [`crate::task_table::TaskTable`]s.
///
/// Grounded on the source's `Task` dataclass (`scheduling.py`).
#[cfg_attr(feature = "debug", derive(Debug))]
#[derive(Clone)]
pub struct Task {
    pub uid: TaskId,
    pub target: NodeID,
    pub destination: EndpointId,
    pub priority: Priority,
    pub size: Volume,
    pub lifetime: Duration,
    pub deadline_acquire: Date,
    pub assignee: Option<NodeID>,
    pub scheduled_at: Date,
    pub scheduled_by: NodeID,
    pub pickup_time: Option<Date>,
    pub delivery_time: Option<Date>,
    pub acq_path: Option<Vec<ContactId>>,
    pub del_path: Option<Vec<ContactId>>,
    pub request_ids: Vec<RequestId>,
    pub status: TaskStatus,
    pub acquired_at: Option<Date>,
    pub acquired_by: Option<NodeID>,
    pub delivered_at: Option<Date>,
    pub delivered_by: Option<NodeID>,
    pub delivered_to: Option<EndpointId>,
    pub failed_at: Option<Date>,
    pub failed_on: Option<NodeID>,
}

#[cfg_attr(feature = "debug", derive(Debug))]
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Acquired,
    Redundant,
    Rescheduled,
    Delivered,
    Failed,
}

impl TaskStatus {
    /// Tier in the merge lattice (§4.6): pending < acquired < redundant <
    /// {rescheduled, delivered, failed}. Statuses sharing the top tier are
    /// mutually incomparable, matching the source's `Task.__lt__`, which
    /// never treats one of them as less than another.
    fn rank(self) -> u8 {
        match self {
            TaskStatus::Pending => 0,
            TaskStatus::Acquired => 1,
            TaskStatus::Redundant => 2,
            TaskStatus::Rescheduled | TaskStatus::Delivered | TaskStatus::Failed => 3,
        }
    }
}

impl Task {
    pub fn new(
        uid: TaskId,
        target: NodeID,
        destination: EndpointId,
        priority: Priority,
        size: Volume,
        lifetime: Duration,
        deadline_acquire: Date,
        scheduled_at: Date,
        scheduled_by: NodeID,
    ) -> Self {
        Self {
            uid,
            target,
            destination,
            priority,
            size,
            lifetime,
            deadline_acquire,
            assignee: None,
            scheduled_at,
            scheduled_by,
            pickup_time: None,
            delivery_time: None,
            acq_path: None,
            del_path: None,
            request_ids: Vec::new(),
            status: TaskStatus::Pending,
            acquired_at: None,
            acquired_by: None,
            delivered_at: None,
            delivered_by: None,
            delivered_to: None,
            failed_at: None,
            failed_on: None,
        }
    }

    pub fn mark_acquired(&mut self, t: Date, by: NodeID) {
        self.status = TaskStatus::Acquired;
        self.acquired_at = Some(t);
        self.acquired_by = Some(by);
    }

    pub fn mark_delivered(&mut self, t: Date, by: NodeID, to: EndpointId) {
        self.status = TaskStatus::Delivered;
        self.delivered_at = Some(t);
        self.delivered_by = Some(by);
        self.delivered_to = Some(to);
    }

    pub fn mark_failed(&mut self, t: Date, node: NodeID) {
        self.status = TaskStatus::Failed;
        self.failed_at = Some(t);
        self.failed_on = Some(node);
    }
}

/// Partial order over task status used when merging task tables: a task is
/// only ever replaced by one that is strictly "more advanced"; tasks in the
/// same terminal tier (e.g. `Delivered` vs `Failed`) are incomparable and the
/// existing entry is kept.
impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.uid == other.uid && self.status == other.status
    }
}

impl PartialOrd for Task {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.status == other.status {
            return Some(Ordering::Equal);
        }
        match self.status.rank().cmp(&other.status.rank()) {
            Ordering::Equal => None,
            ord => Some(ord),
        }
    }
}

use std::collections::{HashMap, HashSet};

use crate::task::Task;
use crate::types::{NodeID, TaskId};

/// Per-node store of every task known to the network, synchronized between
/// neighbours by gossip (§4.6): on each contact start, a node sends the
/// neighbour every task changed since their last sync (or, on first contact,
/// everything).
#[derive(Default)]
pub struct TaskTable {
    tasks: HashMap<TaskId, Task>,
    /// For each neighbour, the set of task uids changed since the last sync
    /// sent to them.
    changed_for: HashMap<NodeID, HashSet<TaskId>>,
}

impl TaskTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, uid: &TaskId) -> Option<&Task> {
        self.tasks.get(uid)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    /// Inserts or updates a locally-originated task, marking it changed for
    /// every known neighbour.
    pub fn insert_local(&mut self, task: Task, neighbours: &[NodeID]) {
        let uid = task.uid.clone();
        self.tasks.insert(uid.clone(), task);
        for &n in neighbours {
            self.changed_for.entry(n).or_default().insert(uid.clone());
        }
    }

    /// Drains the set of tasks changed since the last sync sent to `to`,
    /// returning the tasks to transmit. On a neighbour's first contact
    /// (nothing recorded yet for it), sends the entire table.
    pub fn outgoing_sync(&mut self, to: NodeID) -> Vec<Task> {
        match self.changed_for.remove(&to) {
            Some(uids) => uids
                .into_iter()
                .filter_map(|uid| self.tasks.get(&uid).cloned())
                .collect(),
            None => self.tasks.values().cloned().collect(),
        }
    }

    /// Merges a batch of tasks received from `from`, per §4.6: new uids are
    /// inserted; known uids are replaced only if the incoming task is
    /// strictly greater under the task status ordering. Any entry that
    /// actually changes is marked changed for every other neighbour.
    pub fn merge(&mut self, from: NodeID, incoming: Vec<Task>, neighbours: &[NodeID]) {
        for task in incoming {
            let uid = task.uid.clone();
            let should_replace = match self.tasks.get(&uid) {
                None => true,
                Some(existing) => matches!(
                    task.partial_cmp(existing),
                    Some(std::cmp::Ordering::Greater)
                ),
            };
            if !should_replace {
                continue;
            }
            self.tasks.insert(uid.clone(), task);
            for &n in neighbours {
                if n != from {
                    self.changed_for.entry(n).or_default().insert(uid.clone());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Priority, TaskId};

    fn task(uid: &str, status: crate::task::TaskStatus) -> Task {
        let mut t = Task::new(
            TaskId(uid.to_string()),
            1,
            2,
            Priority::Bulk,
            1.0,
            100.0,
            100.0,
            0.0,
            1,
        );
        t.status = status;
        t
    }

    #[test]
    fn new_uid_is_inserted_and_marked_changed_for_others() {
        let mut table = TaskTable::new();
        let t = task("A", crate::task::TaskStatus::Pending);
        table.merge(5, vec![t], &[5, 6, 7]);
        assert!(table.get(&TaskId("A".into())).is_some());
        let sync = table.outgoing_sync(6);
        assert_eq!(sync.len(), 1);
        // node 5 was the sender and must not receive it back
        let sync_from_sender = table.outgoing_sync(5);
        assert_eq!(sync_from_sender.len(), 1); // first sync still sends everything
    }

    #[test]
    fn equal_status_does_not_overwrite() {
        let mut table = TaskTable::new();
        let mut original = task("A", crate::task::TaskStatus::Acquired);
        original.assignee = Some(5);
        table.merge(5, vec![original], &[5]);

        let mut duplicate = task("A", crate::task::TaskStatus::Acquired);
        duplicate.assignee = Some(6);
        table.merge(6, vec![duplicate], &[5, 6]);

        // An equal-status incoming task must not replace the existing entry,
        // even though it carries different bookkeeping from a different node.
        assert_eq!(table.get(&TaskId("A".into())).unwrap().assignee, Some(5));
    }

    #[test]
    fn greater_status_replaces() {
        let mut table = TaskTable::new();
        table.merge(5, vec![task("A", crate::task::TaskStatus::Pending)], &[5]);
        table.merge(6, vec![task("A", crate::task::TaskStatus::Acquired)], &[5, 6]);
        assert_eq!(table.get(&TaskId("A".into())).unwrap().status, crate::task::TaskStatus::Acquired);
    }
}

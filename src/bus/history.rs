//! History: a parsed snapshot of the bus and the dedup queries over it.
//!
//! Every question a role asks ("did I already hand this task on?") is
//! answered by a linear scan of a fresh snapshot, comparing the parsed
//! task ID for exact equality. Nothing here is cached between steps.

use crate::model::{BusEntry, Report, Role, Status};

/// Entries read from the bus at one instant, in append order.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<BusEntry>,
}

impl History {
    pub fn new(entries: Vec<BusEntry>) -> Self {
        Self { entries }
    }

    /// `TODO` entries addressed to `role`, in append order.
    pub fn todo_for(&self, role: Role) -> impl Iterator<Item = &BusEntry> {
        self.entries
            .iter()
            .filter(move |e| e.to == role && e.status == Status::Todo)
    }

    /// Entries belonging to exactly this task ID.
    pub fn for_task<'a>(&'a self, task_id: &str) -> impl Iterator<Item = &'a BusEntry> {
        self.entries.iter().filter(move |e| e.task_id == task_id)
    }

    /// Whether `from` has already sent `to` anything about this task.
    pub fn has_sent(&self, task_id: &str, from: Role, to: Role) -> bool {
        self.for_task(task_id)
            .any(|e| e.from == from && e.to == to)
    }

    /// Whether anyone has already addressed `to` about this task.
    pub fn has_addressed(&self, task_id: &str, to: Role) -> bool {
        self.for_task(task_id).any(|e| e.to == to)
    }

    /// Whether the Tester has filed its `DONE` report for this task.
    pub fn has_test_report(&self, task_id: &str) -> bool {
        self.test_report(task_id).is_some()
    }

    /// The Tester's most recent `DONE` report for this task.
    pub fn test_report(&self, task_id: &str) -> Option<&BusEntry> {
        self.for_task(task_id)
            .filter(|e| e.from == Role::Tester && e.to == Role::Leader && e.status == Status::Done)
            .last()
    }

    /// Whether this task has been broadcast to everyone.
    pub fn is_announced(&self, task_id: &str) -> bool {
        self.has_addressed(task_id, Role::All)
    }

    /// Whether any task at all has been broadcast.
    pub fn any_announced(&self) -> bool {
        self.entries.iter().any(|e| e.to == Role::All)
    }

    /// Task IDs with a passing Tester report but no broadcast yet,
    /// in the order their reports were appended.
    pub fn passed_unannounced(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        for e in &self.entries {
            let passed = e.from == Role::Tester
                && e.to == Role::Leader
                && e.status == Status::Done
                && Report::of(&e.message) == Some(Report::Passed);
            if passed && !ids.contains(&e.task_id.as_str()) && !self.is_announced(&e.task_id) {
                ids.push(&e.task_id);
            }
        }
        ids
    }

    /// Every task ID mentioned on the bus, in first-seen order.
    pub fn task_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        for e in &self.entries {
            if !ids.contains(&e.task_id.as_str()) {
                ids.push(&e.task_id);
            }
        }
        ids
    }
}

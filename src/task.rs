//! Task, epic, and subtask records.
//!
//! All three record kinds share one numeric id space handed out by the
//! manager. Epics never carry a caller-set status: it is derived from the
//! statuses of their subtasks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier shared by tasks, epics, and subtasks.
pub type TaskId = u64;

/// Progress state of a task or subtask. Epics take the derived value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    New,
    InProgress,
    Done,
}

/// A plain standalone task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub description: String,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A task composed of subtasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Epic {
    pub id: TaskId,
    pub name: String,
    pub description: String,
    /// Derived from the subtasks; the manager owns this field.
    pub status: TaskStatus,
    /// Subtask ids in creation order.
    pub subtask_ids: Vec<TaskId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A task that belongs to exactly one epic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: TaskId,
    pub epic_id: TaskId,
    pub name: String,
    pub description: String,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Snapshot of whichever record kind was fetched; the view-history payload.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskItem {
    Task(Task),
    Epic(Epic),
    Subtask(Subtask),
}

impl TaskItem {
    pub fn id(&self) -> TaskId {
        match self {
            TaskItem::Task(task) => task.id,
            TaskItem::Epic(epic) => epic.id,
            TaskItem::Subtask(subtask) => subtask.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            TaskItem::Task(task) => &task.name,
            TaskItem::Epic(epic) => &epic.name,
            TaskItem::Subtask(subtask) => &subtask.name,
        }
    }

    pub fn status(&self) -> TaskStatus {
        match self {
            TaskItem::Task(task) => task.status,
            TaskItem::Epic(epic) => epic.status,
            TaskItem::Subtask(subtask) => subtask.status,
        }
    }
}

/// Derive an epic's status from its subtask statuses.
///
/// An epic with no subtasks, or only `New` ones, is `New`; one whose
/// subtasks are all `Done` is `Done`; any mix is `InProgress`.
pub fn derive_epic_status<I>(statuses: I) -> TaskStatus
where
    I: IntoIterator<Item = TaskStatus>,
{
    let mut seen_any = false;
    let mut all_new = true;
    let mut all_done = true;
    for status in statuses {
        seen_any = true;
        all_new &= status == TaskStatus::New;
        all_done &= status == TaskStatus::Done;
    }

    if !seen_any || all_new {
        TaskStatus::New
    } else if all_done {
        TaskStatus::Done
    } else {
        TaskStatus::InProgress
    }
}

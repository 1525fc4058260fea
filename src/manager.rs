//! In-memory task manager.
//!
//! Owns the task, epic, and subtask maps, hands out ids, derives epic
//! status from subtasks, and feeds the view history: every fetch by id is
//! recorded as a view, every delete withdraws exactly the removed ids.
//!
//! A manager built with [`TaskManager::file_backed`] additionally writes a
//! snapshot after every state change (views included, since history order
//! is part of the persisted state). Plain managers never touch disk.

use std::collections::HashMap;

use chrono::Utc;
use tracing::debug;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::history::ViewHistory;
use crate::storage::{Snapshot, Storage, SNAPSHOT_SCHEMA_VERSION};
use crate::task::{derive_epic_status, Epic, Subtask, Task, TaskId, TaskItem, TaskStatus};

/// In-memory store of tasks, epics, and subtasks with view history.
#[derive(Debug, Clone)]
pub struct TaskManager {
    tasks: HashMap<TaskId, Task>,
    epics: HashMap<TaskId, Epic>,
    subtasks: HashMap<TaskId, Subtask>,
    history: ViewHistory,
    /// Next id to hand out; ids are never reused.
    next_id: TaskId,
    /// Write-through snapshot target, if file-backed.
    storage: Option<Storage>,
}

impl Default for TaskManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskManager {
    /// Create an empty in-memory manager with unbounded history.
    pub fn new() -> Self {
        Self {
            tasks: HashMap::new(),
            epics: HashMap::new(),
            subtasks: HashMap::new(),
            history: ViewHistory::new(),
            next_id: 1,
            storage: None,
        }
    }

    /// Create an empty in-memory manager honoring `history.capacity`.
    pub fn with_config(config: &Config) -> Self {
        let history = match config.history.capacity {
            Some(capacity) => ViewHistory::with_capacity_limit(capacity),
            None => ViewHistory::new(),
        };
        Self {
            history,
            ..Self::new()
        }
    }

    /// Open a file-backed manager: loads the existing snapshot if present,
    /// then persists after every state change.
    pub fn file_backed(storage: Storage, config: &Config) -> Result<Self> {
        storage.init()?;
        let mut manager = match storage.load_snapshot()? {
            Some(snapshot) => Self::from_snapshot(snapshot, config),
            None => Self::with_config(config),
        };
        manager.storage = Some(storage);
        Ok(manager)
    }

    // =========================================================================
    // Tasks
    // =========================================================================

    pub fn create_task(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Task> {
        let id = self.allocate_id();
        let now = Utc::now();
        let task = Task {
            id,
            name: name.into(),
            description: description.into(),
            status: TaskStatus::New,
            created_at: now,
            updated_at: now,
        };
        self.tasks.insert(id, task.clone());
        debug!(id, "task created");
        self.persist()?;
        Ok(task)
    }

    /// Fetch a task by id. This is a view event: the task is recorded in
    /// the history as most recently viewed.
    pub fn task(&mut self, id: TaskId) -> Result<Task> {
        let task = self.tasks.get(&id).cloned().ok_or(Error::TaskNotFound(id))?;
        self.history.add(TaskItem::Task(task.clone()));
        self.persist()?;
        Ok(task)
    }

    /// All tasks, sorted by id. Listing is not a view event.
    pub fn tasks(&self) -> Vec<Task> {
        let mut tasks: Vec<Task> = self.tasks.values().cloned().collect();
        tasks.sort_by_key(|task| task.id);
        tasks
    }

    /// Replace a task. `created_at` is preserved from the stored record.
    pub fn update_task(&mut self, task: Task) -> Result<()> {
        let existing = self
            .tasks
            .get(&task.id)
            .ok_or(Error::TaskNotFound(task.id))?;
        let mut record = task;
        record.created_at = existing.created_at;
        record.updated_at = Utc::now();
        self.tasks.insert(record.id, record);
        self.persist()?;
        Ok(())
    }

    pub fn delete_task(&mut self, id: TaskId) -> Result<()> {
        self.tasks.remove(&id).ok_or(Error::TaskNotFound(id))?;
        self.history.remove(id);
        debug!(id, "task deleted");
        self.persist()?;
        Ok(())
    }

    pub fn delete_all_tasks(&mut self) -> Result<()> {
        let removed: Vec<TaskId> = self.tasks.keys().copied().collect();
        self.tasks.clear();
        self.history.remove_all(removed);
        self.persist()?;
        Ok(())
    }

    // =========================================================================
    // Epics
    // =========================================================================

    pub fn create_epic(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Epic> {
        let id = self.allocate_id();
        let now = Utc::now();
        let epic = Epic {
            id,
            name: name.into(),
            description: description.into(),
            status: TaskStatus::New,
            subtask_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.epics.insert(id, epic.clone());
        debug!(id, "epic created");
        self.persist()?;
        Ok(epic)
    }

    /// Fetch an epic by id. This is a view event.
    pub fn epic(&mut self, id: TaskId) -> Result<Epic> {
        let epic = self.epics.get(&id).cloned().ok_or(Error::EpicNotFound(id))?;
        self.history.add(TaskItem::Epic(epic.clone()));
        self.persist()?;
        Ok(epic)
    }

    /// All epics, sorted by id.
    pub fn epics(&self) -> Vec<Epic> {
        let mut epics: Vec<Epic> = self.epics.values().cloned().collect();
        epics.sort_by_key(|epic| epic.id);
        epics
    }

    /// Update an epic's name and description. Status and subtask membership
    /// are derived state and are taken from the stored record, not the
    /// caller's value.
    pub fn update_epic(&mut self, epic: Epic) -> Result<()> {
        let existing = self
            .epics
            .get_mut(&epic.id)
            .ok_or(Error::EpicNotFound(epic.id))?;
        existing.name = epic.name;
        existing.description = epic.description;
        existing.updated_at = Utc::now();
        self.persist()?;
        Ok(())
    }

    /// Delete an epic and all of its subtasks.
    pub fn delete_epic(&mut self, id: TaskId) -> Result<()> {
        let epic = self.epics.remove(&id).ok_or(Error::EpicNotFound(id))?;
        let mut removed: Vec<TaskId> = Vec::with_capacity(epic.subtask_ids.len() + 1);
        for subtask_id in &epic.subtask_ids {
            if self.subtasks.remove(subtask_id).is_some() {
                removed.push(*subtask_id);
            }
        }
        removed.push(id);
        self.history.remove_all(removed);
        debug!(id, "epic deleted");
        self.persist()?;
        Ok(())
    }

    /// Delete every epic and, with them, every subtask.
    pub fn delete_all_epics(&mut self) -> Result<()> {
        let mut removed: Vec<TaskId> = self.epics.keys().copied().collect();
        removed.extend(self.subtasks.keys().copied());
        self.epics.clear();
        self.subtasks.clear();
        self.history.remove_all(removed);
        self.persist()?;
        Ok(())
    }

    // =========================================================================
    // Subtasks
    // =========================================================================

    /// Create a subtask under an existing epic and re-derive its status.
    pub fn create_subtask(
        &mut self,
        epic_id: TaskId,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Subtask> {
        if !self.epics.contains_key(&epic_id) {
            return Err(Error::EpicNotFound(epic_id));
        }
        let id = self.allocate_id();
        let now = Utc::now();
        let subtask = Subtask {
            id,
            epic_id,
            name: name.into(),
            description: description.into(),
            status: TaskStatus::New,
            created_at: now,
            updated_at: now,
        };
        self.subtasks.insert(id, subtask.clone());
        if let Some(epic) = self.epics.get_mut(&epic_id) {
            epic.subtask_ids.push(id);
        }
        self.refresh_epic(epic_id);
        debug!(id, epic_id, "subtask created");
        self.persist()?;
        Ok(subtask)
    }

    /// Fetch a subtask by id. This is a view event.
    pub fn subtask(&mut self, id: TaskId) -> Result<Subtask> {
        let subtask = self
            .subtasks
            .get(&id)
            .cloned()
            .ok_or(Error::SubtaskNotFound(id))?;
        self.history.add(TaskItem::Subtask(subtask.clone()));
        self.persist()?;
        Ok(subtask)
    }

    /// All subtasks, sorted by id.
    pub fn subtasks(&self) -> Vec<Subtask> {
        let mut subtasks: Vec<Subtask> = self.subtasks.values().cloned().collect();
        subtasks.sort_by_key(|subtask| subtask.id);
        subtasks
    }

    /// Subtasks of one epic, in the epic's creation order.
    pub fn epic_subtasks(&self, epic_id: TaskId) -> Result<Vec<Subtask>> {
        let epic = self
            .epics
            .get(&epic_id)
            .ok_or(Error::EpicNotFound(epic_id))?;
        Ok(epic
            .subtask_ids
            .iter()
            .filter_map(|id| self.subtasks.get(id))
            .cloned()
            .collect())
    }

    /// Replace a subtask and re-derive its epic's status. A subtask cannot
    /// move between epics.
    pub fn update_subtask(&mut self, subtask: Subtask) -> Result<()> {
        let existing = self
            .subtasks
            .get(&subtask.id)
            .ok_or(Error::SubtaskNotFound(subtask.id))?;
        if subtask.epic_id != existing.epic_id {
            return Err(Error::InvalidArgument(format!(
                "subtask {} cannot move between epics",
                subtask.id
            )));
        }
        let mut record = subtask;
        record.created_at = existing.created_at;
        record.updated_at = Utc::now();
        let epic_id = record.epic_id;
        self.subtasks.insert(record.id, record);
        self.refresh_epic(epic_id);
        self.persist()?;
        Ok(())
    }

    /// Delete a subtask, detach it from its epic, and re-derive the epic.
    pub fn delete_subtask(&mut self, id: TaskId) -> Result<()> {
        let subtask = self.subtasks.remove(&id).ok_or(Error::SubtaskNotFound(id))?;
        if let Some(epic) = self.epics.get_mut(&subtask.epic_id) {
            epic.subtask_ids.retain(|subtask_id| *subtask_id != id);
        }
        self.refresh_epic(subtask.epic_id);
        self.history.remove(id);
        debug!(id, "subtask deleted");
        self.persist()?;
        Ok(())
    }

    /// Delete every subtask; all epics fall back to `New`.
    pub fn delete_all_subtasks(&mut self) -> Result<()> {
        let removed: Vec<TaskId> = self.subtasks.keys().copied().collect();
        self.subtasks.clear();
        let epic_ids: Vec<TaskId> = self.epics.keys().copied().collect();
        for epic_id in epic_ids {
            if let Some(epic) = self.epics.get_mut(&epic_id) {
                epic.subtask_ids.clear();
            }
            self.refresh_epic(epic_id);
        }
        self.history.remove_all(removed);
        self.persist()?;
        Ok(())
    }

    // =========================================================================
    // History and snapshots
    // =========================================================================

    /// The view history, least recently viewed first.
    pub fn history(&self) -> Vec<TaskItem> {
        self.history.items()
    }

    /// Serialize the whole manager state.
    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            schema_version: SNAPSHOT_SCHEMA_VERSION.to_string(),
            generated_at: Utc::now(),
            tasks: self.tasks(),
            epics: self.epics(),
            subtasks: self.subtasks(),
            history: self.history.items().iter().map(|item| item.id()).collect(),
            next_id: self.next_id,
        }
    }

    /// Rebuild a manager from a snapshot, replaying the history id list
    /// through the tracker. Ids that no longer resolve to a record are
    /// dropped.
    pub fn from_snapshot(snapshot: Snapshot, config: &Config) -> Self {
        let mut manager = Self::with_config(config);
        for task in snapshot.tasks {
            manager.tasks.insert(task.id, task);
        }
        for epic in snapshot.epics {
            manager.epics.insert(epic.id, epic);
        }
        for subtask in snapshot.subtasks {
            manager.subtasks.insert(subtask.id, subtask);
        }
        manager.next_id = snapshot.next_id.max(1);
        for id in snapshot.history {
            match manager.lookup_item(id) {
                Some(item) => manager.history.add(item),
                None => debug!(id, "dropping stale history id from snapshot"),
            }
        }
        manager
    }

    fn lookup_item(&self, id: TaskId) -> Option<TaskItem> {
        if let Some(task) = self.tasks.get(&id) {
            return Some(TaskItem::Task(task.clone()));
        }
        if let Some(epic) = self.epics.get(&id) {
            return Some(TaskItem::Epic(epic.clone()));
        }
        self.subtasks
            .get(&id)
            .map(|subtask| TaskItem::Subtask(subtask.clone()))
    }

    fn allocate_id(&mut self) -> TaskId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Recompute a derived epic status after subtask changes.
    fn refresh_epic(&mut self, epic_id: TaskId) {
        let Some(epic) = self.epics.get(&epic_id) else {
            return;
        };
        let status = derive_epic_status(
            epic.subtask_ids
                .iter()
                .filter_map(|id| self.subtasks.get(id))
                .map(|subtask| subtask.status),
        );
        if let Some(epic) = self.epics.get_mut(&epic_id) {
            epic.status = status;
            epic.updated_at = Utc::now();
        }
    }

    fn persist(&self) -> Result<()> {
        if let Some(storage) = &self.storage {
            storage.save_snapshot(&self.to_snapshot())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> TaskManager {
        TaskManager::new()
    }

    #[test]
    fn create_and_fetch_task() {
        let mut manager = manager();
        let created = manager.create_task("Write docs", "crate-level docs").expect("create");
        let fetched = manager.task(created.id).expect("fetch");
        assert_eq!(fetched, created);
        assert_eq!(fetched.status, TaskStatus::New);
    }

    #[test]
    fn ids_are_unique_across_kinds() {
        let mut manager = manager();
        let task = manager.create_task("a", "").expect("task");
        let epic = manager.create_epic("b", "").expect("epic");
        let subtask = manager.create_subtask(epic.id, "c", "").expect("subtask");
        assert!(task.id < epic.id && epic.id < subtask.id);
    }

    #[test]
    fn fetch_records_view() {
        let mut manager = manager();
        let task = manager.create_task("a", "").expect("task");
        let epic = manager.create_epic("b", "").expect("epic");

        manager.task(task.id).expect("view task");
        manager.epic(epic.id).expect("view epic");

        let viewed: Vec<TaskId> = manager.history().iter().map(|item| item.id()).collect();
        assert_eq!(viewed, vec![task.id, epic.id]);
    }

    #[test]
    fn listing_is_not_a_view_event() {
        let mut manager = manager();
        manager.create_task("a", "").expect("task");
        let _ = manager.tasks();
        assert!(manager.history().is_empty());
    }

    #[test]
    fn fetch_missing_task_fails() {
        let mut manager = manager();
        let err = manager.task(99).expect_err("missing");
        assert!(matches!(err, Error::TaskNotFound(99)));
        assert!(manager.history().is_empty());
    }

    #[test]
    fn epic_status_follows_subtasks() {
        let mut manager = manager();
        let epic = manager.create_epic("release", "").expect("epic");
        assert_eq!(manager.epics()[0].status, TaskStatus::New);

        let mut first = manager.create_subtask(epic.id, "build", "").expect("subtask");
        let mut second = manager.create_subtask(epic.id, "publish", "").expect("subtask");
        assert_eq!(manager.epics()[0].status, TaskStatus::New);

        first.status = TaskStatus::Done;
        manager.update_subtask(first.clone()).expect("update");
        assert_eq!(manager.epics()[0].status, TaskStatus::InProgress);

        second.status = TaskStatus::Done;
        manager.update_subtask(second).expect("update");
        assert_eq!(manager.epics()[0].status, TaskStatus::Done);

        first.status = TaskStatus::InProgress;
        manager.update_subtask(first).expect("update");
        assert_eq!(manager.epics()[0].status, TaskStatus::InProgress);
    }

    #[test]
    fn update_epic_keeps_derived_state() {
        let mut manager = manager();
        let epic = manager.create_epic("release", "").expect("epic");
        let mut subtask = manager.create_subtask(epic.id, "build", "").expect("subtask");
        subtask.status = TaskStatus::Done;
        manager.update_subtask(subtask).expect("update");

        let mut edited = manager.epics()[0].clone();
        edited.name = "ship".to_string();
        edited.status = TaskStatus::New;
        edited.subtask_ids.clear();
        manager.update_epic(edited).expect("update epic");

        let stored = &manager.epics()[0];
        assert_eq!(stored.name, "ship");
        assert_eq!(stored.status, TaskStatus::Done);
        assert_eq!(stored.subtask_ids.len(), 1);
    }

    #[test]
    fn subtask_cannot_move_between_epics() {
        let mut manager = manager();
        let first = manager.create_epic("a", "").expect("epic");
        let second = manager.create_epic("b", "").expect("epic");
        let mut subtask = manager.create_subtask(first.id, "c", "").expect("subtask");

        subtask.epic_id = second.id;
        let err = manager.update_subtask(subtask).expect_err("moved");
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn subtask_requires_existing_epic() {
        let mut manager = manager();
        let err = manager.create_subtask(5, "c", "").expect_err("no epic");
        assert!(matches!(err, Error::EpicNotFound(5)));
    }

    #[test]
    fn delete_epic_cascades_to_subtasks() {
        let mut manager = manager();
        let epic = manager.create_epic("a", "").expect("epic");
        let subtask = manager.create_subtask(epic.id, "b", "").expect("subtask");

        manager.epic(epic.id).expect("view");
        manager.subtask(subtask.id).expect("view");
        manager.delete_epic(epic.id).expect("delete");

        assert!(manager.epics().is_empty());
        assert!(manager.subtasks().is_empty());
        assert!(manager.history().is_empty());
    }

    #[test]
    fn delete_subtask_redraws_epic_status() {
        let mut manager = manager();
        let epic = manager.create_epic("a", "").expect("epic");
        let mut keep = manager.create_subtask(epic.id, "keep", "").expect("subtask");
        let drop = manager.create_subtask(epic.id, "drop", "").expect("subtask");

        keep.status = TaskStatus::Done;
        manager.update_subtask(keep).expect("update");
        assert_eq!(manager.epics()[0].status, TaskStatus::InProgress);

        manager.delete_subtask(drop.id).expect("delete");
        let stored = &manager.epics()[0];
        assert_eq!(stored.status, TaskStatus::Done);
        assert_eq!(stored.subtask_ids.len(), 1);
    }

    #[test]
    fn delete_all_subtasks_resets_epics() {
        let mut manager = manager();
        let epic = manager.create_epic("a", "").expect("epic");
        let mut subtask = manager.create_subtask(epic.id, "b", "").expect("subtask");
        subtask.status = TaskStatus::Done;
        manager.update_subtask(subtask).expect("update");
        assert_eq!(manager.epics()[0].status, TaskStatus::Done);

        manager.delete_all_subtasks().expect("delete all");
        assert!(manager.subtasks().is_empty());
        let stored = &manager.epics()[0];
        assert_eq!(stored.status, TaskStatus::New);
        assert!(stored.subtask_ids.is_empty());
    }

    #[test]
    fn snapshot_roundtrip_preserves_state_and_history() {
        let mut manager = manager();
        let task = manager.create_task("a", "").expect("task");
        let epic = manager.create_epic("b", "").expect("epic");
        let subtask = manager.create_subtask(epic.id, "c", "").expect("subtask");

        manager.subtask(subtask.id).expect("view");
        manager.task(task.id).expect("view");

        let snapshot = manager.to_snapshot();
        let restored = TaskManager::from_snapshot(snapshot, &Config::default());

        assert_eq!(restored.tasks(), manager.tasks());
        assert_eq!(restored.epics(), manager.epics());
        assert_eq!(restored.subtasks(), manager.subtasks());
        let viewed: Vec<TaskId> = restored.history().iter().map(|item| item.id()).collect();
        assert_eq!(viewed, vec![subtask.id, task.id]);
    }

    #[test]
    fn stale_history_ids_are_dropped_on_restore() {
        let mut manager = manager();
        let task = manager.create_task("a", "").expect("task");
        manager.task(task.id).expect("view");

        let mut snapshot = manager.to_snapshot();
        snapshot.history.push(999);

        let restored = TaskManager::from_snapshot(snapshot, &Config::default());
        let viewed: Vec<TaskId> = restored.history().iter().map(|item| item.id()).collect();
        assert_eq!(viewed, vec![task.id]);
    }

    #[test]
    fn config_capacity_bounds_manager_history() {
        let mut config = Config::default();
        config.history.capacity = Some(2);
        let mut manager = TaskManager::with_config(&config);

        let ids: Vec<TaskId> = (0..3)
            .map(|n| manager.create_task(format!("t{n}"), "").expect("task").id)
            .collect();
        for id in &ids {
            manager.task(*id).expect("view");
        }

        let viewed: Vec<TaskId> = manager.history().iter().map(|item| item.id()).collect();
        assert_eq!(viewed, vec![ids[1], ids[2]]);
    }
}

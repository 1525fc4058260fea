use taskpad::config::Config;
use taskpad::storage::Storage;
use taskpad::task::{TaskId, TaskStatus};
use taskpad::TaskManager;

fn storage_in(dir: &tempfile::TempDir) -> Storage {
    Storage::new(dir.path().join(".taskpad"))
}

#[test]
fn file_backed_starts_empty_and_creates_data_dir() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = Config::default();
    config.store.data_dir = dir.path().join(".taskpad");
    let storage = Storage::from_config(&config);

    let manager = TaskManager::file_backed(storage.clone(), &config).expect("open");

    assert!(manager.tasks().is_empty());
    assert!(manager.history().is_empty());
    assert!(storage.data_dir().exists());
}

#[test]
fn state_survives_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = Config::default();

    let (task_id, subtask_id) = {
        let mut manager = TaskManager::file_backed(storage_in(&dir), &config).expect("open");
        let task = manager.create_task("task", "standalone").expect("task");
        let epic = manager.create_epic("epic", "").expect("epic");
        let mut subtask = manager.create_subtask(epic.id, "subtask", "").expect("subtask");
        subtask.status = TaskStatus::Done;
        let subtask_id = subtask.id;
        manager.update_subtask(subtask).expect("update");

        manager.subtask(subtask_id).expect("view");
        manager.task(task.id).expect("view");
        (task.id, subtask_id)
    };

    let mut reopened = TaskManager::file_backed(storage_in(&dir), &config).expect("reopen");

    assert_eq!(reopened.tasks().len(), 1);
    assert_eq!(reopened.tasks()[0].name, "task");
    assert_eq!(reopened.epics()[0].status, TaskStatus::Done);
    assert_eq!(reopened.subtasks()[0].id, subtask_id);

    let viewed: Vec<TaskId> = reopened.history().iter().map(|item| item.id()).collect();
    assert_eq!(viewed, vec![subtask_id, task_id]);

    // Ids keep counting from where the previous session stopped.
    let fresh = reopened.create_task("later", "").expect("task");
    assert!(fresh.id > subtask_id);
}

#[test]
fn deletes_are_persisted() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = Config::default();

    {
        let mut manager = TaskManager::file_backed(storage_in(&dir), &config).expect("open");
        let a = manager.create_task("a", "").expect("task");
        let b = manager.create_task("b", "").expect("task");
        manager.task(a.id).expect("view");
        manager.task(b.id).expect("view");
        manager.delete_task(a.id).expect("delete");
    }

    let reopened = TaskManager::file_backed(storage_in(&dir), &config).expect("reopen");
    assert_eq!(reopened.tasks().len(), 1);
    assert_eq!(reopened.history().len(), 1);
    assert_eq!(reopened.history()[0].name(), "b");
}

#[test]
fn view_order_alone_is_persisted() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = Config::default();

    let (a_id, b_id) = {
        let mut manager = TaskManager::file_backed(storage_in(&dir), &config).expect("open");
        let a = manager.create_task("a", "").expect("task");
        let b = manager.create_task("b", "").expect("task");
        manager.task(a.id).expect("view");
        manager.task(b.id).expect("view");
        // Re-view flips recency without any record change.
        manager.task(a.id).expect("view");
        (a.id, b.id)
    };

    let reopened = TaskManager::file_backed(storage_in(&dir), &config).expect("reopen");
    let viewed: Vec<TaskId> = reopened.history().iter().map(|item| item.id()).collect();
    assert_eq!(viewed, vec![b_id, a_id]);
}

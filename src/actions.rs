use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Duration, Utc};

use crate::agenda::days_until;
use crate::clock::Clock;
use crate::codec;
use crate::error::{ActionResult, StoreError, StoreResult};
use crate::forms::{IssueForm, TaskForm, WinForm};
use crate::models::{new_id, Issue, Notification, NotificationKind, Snapshot, Task, TaskStatus, Win};
use crate::store::{RootStore, StoreSlot};

pub const SNOOZE_HOURS: i64 = 3;

pub const IMPORT_REJECTED: &str = "Sorry – that file does not look like a valid OT CSM Buddy backup.";

pub fn add_notification(store: &mut RootStore, clock: &dyn Clock, msg: impl Into<String>, kind: NotificationKind) {
    store.get_mut::<Notification>().push(Notification {
        id: new_id(),
        msg: msg.into(),
        kind,
        read: false,
        date: clock.timestamp(),
    });
}

/// Warns about a task that is overdue or due within three days.
fn notify_due(store: &mut RootStore, clock: &dyn Clock, task: &Task) {
    let days = days_until(task.due, clock.today());
    if days < 0 {
        add_notification(store, clock, format!("Task \"{}\" is overdue!", task.title), NotificationKind::Danger);
    } else if days <= 3 {
        let when = match days {
            0 => "today".to_string(),
            1 => "1 day".to_string(),
            n => format!("{n} days"),
        };
        add_notification(
            store,
            clock,
            format!("Task \"{}\" due in {when}.", task.title),
            NotificationKind::Warning,
        );
    }
}

fn replace_by_id<T: StoreSlot>(store: &mut RootStore, record: T) -> StoreResult<()> {
    let index = store.index_of::<T>(record.id())?;
    store.get_mut::<T>().set(index, record)?;
    Ok(())
}

fn delete_by_id<T: StoreSlot>(store: &mut RootStore, id: &str) -> StoreResult<T> {
    let index = store.index_of::<T>(id)?;
    store.get_mut::<T>().remove(index)
}

fn find<T: StoreSlot>(store: &RootStore, id: &str) -> StoreResult<T> {
    let index = store.index_of::<T>(id)?;
    Ok(store.get::<T>()[index].clone())
}

pub fn create_task(store: &mut RootStore, clock: &dyn Clock, form: &TaskForm) -> ActionResult<Task> {
    let task = form.build(None, clock)?;
    store.get_mut::<Task>().push(task.clone());
    notify_due(store, clock, &task);
    Ok(task)
}

pub fn edit_task(store: &mut RootStore, clock: &dyn Clock, id: &str, form: &TaskForm) -> ActionResult<Task> {
    let existing = find::<Task>(store, id)?;
    let task = form.build(Some(&existing), clock)?;
    replace_by_id(store, task.clone())?;
    notify_due(store, clock, &task);
    Ok(task)
}

pub fn delete_task(store: &mut RootStore, id: &str) -> ActionResult<Task> {
    Ok(delete_by_id(store, id)?)
}

/// Re-tags a task with a new kanban status; its position does not change.
pub fn set_task_status(store: &mut RootStore, id: &str, status: TaskStatus) -> ActionResult<()> {
    let index = store.index_of::<Task>(id)?;
    store.get_mut::<Task>().update(index, |task| task.status = status)?;
    Ok(())
}

/// Moves a task one kanban column left or right. `None` at the board's edge.
pub fn shift_task(store: &mut RootStore, id: &str, forward: bool) -> ActionResult<Option<TaskStatus>> {
    let current = find::<Task>(store, id)?.status;
    match current.shifted(forward) {
        Some(next) => {
            set_task_status(store, id, next)?;
            Ok(Some(next))
        }
        None => Ok(None),
    }
}

pub fn create_issue(store: &mut RootStore, clock: &dyn Clock, form: &IssueForm) -> ActionResult<Issue> {
    let issue = form.build(None, clock)?;
    store.get_mut::<Issue>().push(issue.clone());
    add_notification(store, clock, format!("New issue logged: {}", issue.title), NotificationKind::Danger);
    Ok(issue)
}

pub fn edit_issue(store: &mut RootStore, clock: &dyn Clock, id: &str, form: &IssueForm) -> ActionResult<Issue> {
    let existing = find::<Issue>(store, id)?;
    let issue = form.build(Some(&existing), clock)?;
    replace_by_id(store, issue.clone())?;
    Ok(issue)
}

pub fn delete_issue(store: &mut RootStore, id: &str) -> ActionResult<Issue> {
    Ok(delete_by_id(store, id)?)
}

pub fn create_win(store: &mut RootStore, clock: &dyn Clock, form: &WinForm) -> ActionResult<Win> {
    let win = form.build(None, clock)?;
    store.get_mut::<Win>().push(win.clone());
    add_notification(store, clock, format!("🎉 Major win: {}", win.title), NotificationKind::Success);
    Ok(win)
}

pub fn edit_win(store: &mut RootStore, clock: &dyn Clock, id: &str, form: &WinForm) -> ActionResult<Win> {
    let existing = find::<Win>(store, id)?;
    let win = form.build(Some(&existing), clock)?;
    replace_by_id(store, win.clone())?;
    Ok(win)
}

pub fn delete_win(store: &mut RootStore, id: &str) -> ActionResult<Win> {
    Ok(delete_by_id(store, id)?)
}

pub fn dismiss_notification(store: &mut RootStore, id: &str) -> ActionResult<()> {
    let index = store.index_of::<Notification>(id)?;
    store.get_mut::<Notification>().update(index, |n| n.read = true)?;
    Ok(())
}

/// Pushes the notification's date three hours out and marks it read.
pub fn snooze_notification(store: &mut RootStore, clock: &dyn Clock, id: &str) -> ActionResult<()> {
    let index = store.index_of::<Notification>(id)?;
    let until = clock.timestamp().plus(Duration::hours(SNOOZE_HOURS));
    store.get_mut::<Notification>().update(index, |n| {
        n.date = until;
        n.read = true;
    })?;
    Ok(())
}

/// Empties all four collections with one durable write.
pub fn reset_all(store: &mut RootStore) {
    store.replace_all(Snapshot::default());
    log::info!("All data cleared");
}

pub fn backup_file_name(clock: &dyn Clock) -> String {
    let stamp = clock.now().with_timezone(&Utc).format("%Y-%m-%d-%H-%M-%S");
    format!("ot_csm_buddy_backup_{stamp}.json")
}

/// Writes the snapshot to `target` (a file, or a directory to put a
/// timestamped backup in) and returns the file written.
pub fn export_backup(store: &mut RootStore, clock: &dyn Clock, target: &Path) -> ActionResult<PathBuf> {
    let path = if target.is_dir() { target.join(backup_file_name(clock)) } else { target.to_path_buf() };

    // the durable copy is exported verbatim once it is known to be current
    let durable = if store.persist_now() {
        store.durable_text()?
    } else {
        log::warn!("Exporting from memory, the saved copy is stale");
        None
    };
    let text = match durable {
        Some(text) => text,
        None => codec::encode(&store.snapshot())?,
    };
    fs::write(&path, text).map_err(StoreError::from)?;
    log::info!("Exported backup to {}", path.display());

    add_notification(store, clock, "Data exported successfully ✅", NotificationKind::Success);
    Ok(path)
}

/// Replaces the whole store with a backup. A backup that fails validation
/// changes nothing.
pub fn import_backup(store: &mut RootStore, clock: &dyn Clock, text: &str) -> ActionResult<()> {
    let snapshot = codec::decode_import(text).inspect_err(|err| log::warn!("Rejected import: {err}"))?;
    store.replace_all(snapshot);
    add_notification(store, clock, "Data import complete 🎉", NotificationKind::Success);
    Ok(())
}

pub fn import_backup_file(store: &mut RootStore, clock: &dyn Clock, path: &Path) -> ActionResult<()> {
    let text = fs::read_to_string(path).map_err(StoreError::from)?;
    import_backup(store, clock, &text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::codec::STORAGE_KEY;
    use crate::error::{ActionError, ValidationError};
    use crate::models::{IssueStatus, Priority, Slot};
    use crate::storage::MemoryStorage;
    use chrono::NaiveDate;

    fn setup() -> (RootStore, MemoryStorage, FixedClock) {
        let handle = MemoryStorage::new();
        let store = RootStore::hydrate(Box::new(handle.clone()));
        let clock = FixedClock::on(NaiveDate::from_ymd_opt(2025, 9, 15).unwrap());
        (store, handle, clock)
    }

    fn durable(handle: &MemoryStorage) -> Snapshot {
        codec::decode(&handle.item(STORAGE_KEY).unwrap_or_default())
    }

    fn task_form(title: &str, due: &str, priority: Priority) -> TaskForm {
        TaskForm { title: title.into(), desc: String::new(), due: due.into(), priority }
    }

    #[test]
    fn empty_title_writes_nothing() {
        let (mut store, handle, clock) = setup();
        let err = create_task(&mut store, &clock, &task_form("   ", "", Priority::High)).unwrap_err();
        assert!(matches!(err, ActionError::Validation(ValidationError::EmptyTitle)));
        assert_eq!(store.tasks().len(), 0);
        assert_eq!(store.notifications().len(), 0);
        assert_eq!(handle.writes(), 0);
    }

    #[test]
    fn task_due_today_moves_to_overdue_the_next_day() {
        let (mut store, _handle, clock) = setup();
        let today = clock.today().format("%Y-%m-%d").to_string();
        let task = create_task(&mut store, &clock, &task_form("Renewal call", &today, Priority::High)).unwrap();

        let ids = |list: Vec<&Task>| list.into_iter().map(|t| t.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(crate::agenda::todays_tasks(store.tasks(), clock.today())), vec![task.id.clone()]);
        assert!(crate::agenda::overdue_tasks(store.tasks(), clock.today()).is_empty());

        clock.advance(Duration::days(1));
        assert!(crate::agenda::todays_tasks(store.tasks(), clock.today()).is_empty());
        assert_eq!(ids(crate::agenda::overdue_tasks(store.tasks(), clock.today())), vec![task.id]);
    }

    #[test]
    fn due_notifications_follow_days_remaining() {
        let (mut store, _handle, clock) = setup();
        let on = |days: i64| (clock.today() + Duration::days(days)).format("%Y-%m-%d").to_string();

        create_task(&mut store, &clock, &task_form("late", &on(-1), Priority::Low)).unwrap();
        create_task(&mut store, &clock, &task_form("now", &on(0), Priority::Low)).unwrap();
        create_task(&mut store, &clock, &task_form("soon", &on(1), Priority::Low)).unwrap();
        create_task(&mut store, &clock, &task_form("later", &on(3), Priority::Low)).unwrap();
        create_task(&mut store, &clock, &task_form("far", &on(4), Priority::Low)).unwrap();

        let messages: Vec<(String, NotificationKind)> =
            store.notifications().iter().map(|n| (n.msg.clone(), n.kind)).collect();
        assert_eq!(
            messages,
            vec![
                ("Task \"late\" is overdue!".to_string(), NotificationKind::Danger),
                ("Task \"now\" due in today.".to_string(), NotificationKind::Warning),
                ("Task \"soon\" due in 1 day.".to_string(), NotificationKind::Warning),
                ("Task \"later\" due in 3 days.".to_string(), NotificationKind::Warning),
            ]
        );
    }

    #[test]
    fn creating_an_issue_appends_an_unread_notification() {
        let (mut store, handle, clock) = setup();
        let form = IssueForm { title: "Data sync failing".into(), ..IssueForm::default() };
        create_issue(&mut store, &clock, &form).unwrap();

        assert_eq!(store.issues().len(), 1);
        let note = store.notifications().last().unwrap();
        assert!(!note.read);
        assert!(note.msg.contains("Data sync failing"));
        assert_eq!(note.kind, NotificationKind::Danger);
        assert_eq!(durable(&handle), store.snapshot());
    }

    #[test]
    fn edit_and_delete_round_trip_through_storage() {
        let (mut store, handle, clock) = setup();
        let win = create_win(&mut store, &clock, &WinForm { title: "Upsell".into(), desc: String::new() }).unwrap();
        edit_win(&mut store, &clock, &win.id, &WinForm { title: "Big upsell".into(), desc: "2x".into() }).unwrap();
        assert_eq!(durable(&handle).wins[0].title, "Big upsell");
        assert_eq!(durable(&handle).wins[0].date, win.date);

        let writes = handle.writes();
        assert!(edit_win(&mut store, &clock, &win.id, &WinForm::default()).is_err());
        assert_eq!(handle.writes(), writes);

        delete_win(&mut store, &win.id).unwrap();
        assert!(durable(&handle).wins.is_empty());
        assert!(matches!(
            delete_win(&mut store, &win.id),
            Err(ActionError::Store(StoreError::NotFound { slot: Slot::Wins, .. }))
        ));
    }

    #[test]
    fn kanban_moves_retag_without_reordering() {
        let (mut store, handle, clock) = setup();
        let a = create_task(&mut store, &clock, &task_form("a", "2030-01-01", Priority::Low)).unwrap();
        let b = create_task(&mut store, &clock, &task_form("b", "2030-01-01", Priority::Low)).unwrap();

        assert_eq!(shift_task(&mut store, &a.id, true).unwrap(), Some(TaskStatus::InProgress));
        assert_eq!(shift_task(&mut store, &b.id, false).unwrap(), None);
        set_task_status(&mut store, &a.id, TaskStatus::Done).unwrap();

        let on_disk = durable(&handle).tasks;
        assert_eq!(on_disk[0].id, a.id);
        assert_eq!(on_disk[0].status, TaskStatus::Done);
        assert_eq!(on_disk[1].status, TaskStatus::Todo);
    }

    #[test]
    fn dismiss_and_snooze_mark_read() {
        let (mut store, _handle, clock) = setup();
        add_notification(&mut store, &clock, "one", NotificationKind::Info);
        add_notification(&mut store, &clock, "two", NotificationKind::Info);
        let first = store.notifications()[0].clone();
        let second = store.notifications()[1].clone();

        dismiss_notification(&mut store, &first.id).unwrap();
        snooze_notification(&mut store, &clock, &second.id).unwrap();

        let notes = store.notifications();
        assert!(notes.iter().all(|n| n.read));
        assert_eq!(notes[0].date, first.date);
        assert_eq!(notes[1].date, second.date.plus(Duration::hours(SNOOZE_HOURS)));
        assert_eq!(crate::agenda::unread_count(notes), 0);
    }

    #[test]
    fn reset_empties_memory_and_storage() {
        let (mut store, handle, clock) = setup();
        create_task(&mut store, &clock, &task_form("a", "", Priority::Low)).unwrap();
        create_issue(&mut store, &clock, &IssueForm { title: "b".into(), ..IssueForm::default() }).unwrap();
        create_win(&mut store, &clock, &WinForm { title: "c".into(), desc: String::new() }).unwrap();

        reset_all(&mut store);
        for slot in Slot::ALL {
            assert_eq!(store.len(slot), 0);
        }
        assert!(durable(&handle).is_empty());
    }

    #[test]
    fn import_missing_a_key_changes_nothing() {
        let (mut store, handle, clock) = setup();
        create_task(&mut store, &clock, &task_form("keep me", "", Priority::Low)).unwrap();
        let before = store.snapshot();
        let writes = handle.writes();

        let text = r#"{"tasks": [], "issues": [], "notifications": []}"#;
        let err = import_backup(&mut store, &clock, text).unwrap_err();
        assert!(matches!(err, ActionError::Store(StoreError::ImportShape(Slot::Wins))));
        assert_eq!(store.snapshot(), before);
        assert_eq!(handle.writes(), writes);
    }

    #[test]
    fn import_replaces_everything_and_announces_itself() {
        let (mut store, _handle, clock) = setup();
        create_task(&mut store, &clock, &task_form("old", "", Priority::Low)).unwrap();

        let mut incoming = Snapshot::default();
        incoming.issues.push(
            IssueForm { title: "from backup".into(), status: IssueStatus::Open, desc: String::new() }
                .build(None, &clock)
                .unwrap(),
        );
        import_backup(&mut store, &clock, &codec::encode(&incoming).unwrap()).unwrap();

        assert!(store.tasks().is_empty());
        assert_eq!(store.issues().as_slice(), incoming.issues.as_slice());
        assert_eq!(store.notifications().len(), 1);
        assert_eq!(store.notifications()[0].msg, "Data import complete 🎉");
    }

    #[test]
    fn export_writes_a_backup_that_imports_cleanly() {
        let (mut store, _handle, clock) = setup();
        create_task(&mut store, &clock, &task_form("exported", "2030-05-05", Priority::Medium)).unwrap();
        let dir = tempfile::tempdir().unwrap();

        let path = export_backup(&mut store, &clock, dir.path()).unwrap();
        assert!(path.file_name().unwrap().to_string_lossy().starts_with("ot_csm_buddy_backup_"));
        let exported = codec::decode_import(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(exported.tasks, store.tasks().as_slice());
        assert_eq!(store.notifications().last().unwrap().msg, "Data exported successfully ✅");

        let mut other = RootStore::hydrate(Box::new(MemoryStorage::new()));
        import_backup_file(&mut other, &clock, &path).unwrap();
        assert_eq!(other.tasks().as_slice(), store.tasks().as_slice());
    }
}

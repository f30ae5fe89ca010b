use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde_json::{Map, Value};

use crate::codec::{self, STORAGE_KEY};
use crate::error::{StoreError, StoreResult};
use crate::models::{Issue, Notification, Record, Slot, Snapshot, Task, Win};
use crate::observable::ObservableCollection;
use crate::storage::Storage;

/// Writes whole snapshots to storage on behalf of the four collections.
///
/// Each slot's latest serialized value is kept staged, so a change to one
/// collection can be written out as a full snapshot without touching the
/// other three.
struct Persister {
    storage: RefCell<Box<dyn Storage>>,
    staged: RefCell<Map<String, Value>>,
    last_error: RefCell<Option<String>>,
    writes: Cell<usize>,
}

impl Persister {
    fn new(storage: Box<dyn Storage>) -> Self {
        Persister {
            storage: RefCell::new(storage),
            staged: RefCell::new(Map::new()),
            last_error: RefCell::new(None),
            writes: Cell::new(0),
        }
    }

    fn stage<T: Record>(&self, items: &[T]) -> bool {
        match codec::slot_value(items) {
            Ok(value) => {
                self.staged.borrow_mut().insert(T::SLOT.key().to_string(), value);
                true
            }
            Err(err) => {
                self.fail(&err);
                false
            }
        }
    }

    fn changed<T: Record>(&self, items: &[T]) {
        if self.stage(items) {
            self.flush();
        }
    }

    fn flush(&self) -> bool {
        let result = serde_json::to_string(&*self.staged.borrow())
            .map_err(StoreError::from)
            .and_then(|text| self.storage.borrow_mut().set_item(STORAGE_KEY, &text));
        match result {
            Ok(()) => {
                self.writes.set(self.writes.get() + 1);
                self.last_error.borrow_mut().take();
                true
            }
            Err(err) => {
                self.fail(&err);
                false
            }
        }
    }

    fn fail(&self, err: &StoreError) {
        log::error!("Could not save data: {err}");
        *self.last_error.borrow_mut() = Some(err.to_string());
    }
}

/// The four named collections, each mirrored to durable storage on every write.
pub struct RootStore {
    tasks: ObservableCollection<Task>,
    issues: ObservableCollection<Issue>,
    wins: ObservableCollection<Win>,
    notifications: ObservableCollection<Notification>,
    persister: Rc<Persister>,
}

/// Typed access from a record type to its slot in the store.
pub trait StoreSlot: Record + Sized {
    fn slot(store: &RootStore) -> &ObservableCollection<Self>;

    fn slot_mut(store: &mut RootStore) -> &mut ObservableCollection<Self>;
}

macro_rules! store_slot {
    ($record:ty, $field:ident) => {
        impl StoreSlot for $record {
            fn slot(store: &RootStore) -> &ObservableCollection<Self> {
                &store.$field
            }

            fn slot_mut(store: &mut RootStore) -> &mut ObservableCollection<Self> {
                &mut store.$field
            }
        }
    };
}

store_slot!(Task, tasks);
store_slot!(Issue, issues);
store_slot!(Win, wins);
store_slot!(Notification, notifications);

impl RootStore {
    /// Loads the last snapshot from `storage` and wraps each collection.
    ///
    /// Unreadable or malformed data never fails hydration; the affected slots
    /// simply start empty.
    pub fn hydrate(storage: Box<dyn Storage>) -> Self {
        let snapshot = match storage.get_item(STORAGE_KEY) {
            Ok(Some(text)) => codec::decode(&text),
            Ok(None) => Snapshot::default(),
            Err(err) => {
                log::error!("Could not read saved data from {}: {err}", storage.describe());
                Snapshot::default()
            }
        };
        log::info!(
            "Hydrated store from {}: {} tasks, {} issues, {} wins, {} notifications",
            storage.describe(),
            snapshot.tasks.len(),
            snapshot.issues.len(),
            snapshot.wins.len(),
            snapshot.notifications.len()
        );

        let persister = Rc::new(Persister::new(storage));
        Self::stage_all(&persister, &snapshot);
        RootStore {
            tasks: Self::wrap(&persister, snapshot.tasks),
            issues: Self::wrap(&persister, snapshot.issues),
            wins: Self::wrap(&persister, snapshot.wins),
            notifications: Self::wrap(&persister, snapshot.notifications),
            persister,
        }
    }

    fn wrap<T: Record>(persister: &Rc<Persister>, items: Vec<T>) -> ObservableCollection<T> {
        let persister = Rc::clone(persister);
        ObservableCollection::new(items, Box::new(move |items: &[T]| persister.changed(items)))
    }

    fn stage_all(persister: &Persister, snapshot: &Snapshot) -> bool {
        persister.stage(&snapshot.tasks)
            & persister.stage(&snapshot.issues)
            & persister.stage(&snapshot.wins)
            & persister.stage(&snapshot.notifications)
    }

    pub fn get<T: StoreSlot>(&self) -> &ObservableCollection<T> {
        T::slot(self)
    }

    pub fn get_mut<T: StoreSlot>(&mut self) -> &mut ObservableCollection<T> {
        T::slot_mut(self)
    }

    pub fn tasks(&self) -> &ObservableCollection<Task> {
        &self.tasks
    }

    pub fn issues(&self) -> &ObservableCollection<Issue> {
        &self.issues
    }

    pub fn wins(&self) -> &ObservableCollection<Win> {
        &self.wins
    }

    pub fn notifications(&self) -> &ObservableCollection<Notification> {
        &self.notifications
    }

    /// Replaces one slot wholesale and persists immediately.
    pub fn set<T: StoreSlot>(&mut self, items: Vec<T>) {
        let fresh = Self::wrap(&self.persister, items);
        *T::slot_mut(self) = fresh;
        self.persister.changed(T::slot(self).as_slice());
    }

    /// Replaces all four slots with a single durable write.
    pub fn replace_all(&mut self, snapshot: Snapshot) {
        Self::stage_all(&self.persister, &snapshot);
        self.tasks = Self::wrap(&self.persister, snapshot.tasks);
        self.issues = Self::wrap(&self.persister, snapshot.issues);
        self.wins = Self::wrap(&self.persister, snapshot.wins);
        self.notifications = Self::wrap(&self.persister, snapshot.notifications);
        self.persister.flush();
    }

    /// Writes the current state regardless of pending changes.
    pub fn persist_now(&self) -> bool {
        let staged = Self::stage_all(&self.persister, &self.snapshot());
        staged && self.persister.flush()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tasks: self.tasks.to_vec(),
            issues: self.issues.to_vec(),
            wins: self.wins.to_vec(),
            notifications: self.notifications.to_vec(),
        }
    }

    pub fn len(&self, slot: Slot) -> usize {
        match slot {
            Slot::Tasks => self.tasks.len(),
            Slot::Issues => self.issues.len(),
            Slot::Wins => self.wins.len(),
            Slot::Notifications => self.notifications.len(),
        }
    }

    pub fn index_of<T: StoreSlot>(&self, id: &str) -> StoreResult<usize> {
        T::slot(self)
            .position(|record| record.id() == id)
            .ok_or_else(|| StoreError::not_found(T::SLOT, id))
    }

    /// The raw text currently held by the durable layer.
    pub fn durable_text(&self) -> StoreResult<Option<String>> {
        self.persister.storage.borrow().get_item(STORAGE_KEY)
    }

    pub fn storage_description(&self) -> String {
        self.persister.storage.borrow().describe()
    }

    pub fn last_persist_error(&self) -> Option<String> {
        self.persister.last_error.borrow().clone()
    }

    /// Successful durable writes since hydration.
    #[cfg(test)]
    pub fn persist_count(&self) -> usize {
        self.persister.writes.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Timestamp;
    use crate::models::{NotificationKind, Priority, TaskStatus};
    use crate::storage::MemoryStorage;
    use chrono::NaiveDate;

    fn task(id: &str, title: &str) -> Task {
        Task {
            id: id.into(),
            title: title.into(),
            desc: String::new(),
            due: NaiveDate::from_ymd_opt(2025, 5, 2).unwrap(),
            priority: Priority::Medium,
            status: TaskStatus::Todo,
            created: Timestamp(1_746_000_000_000),
        }
    }

    fn notification(id: &str) -> Notification {
        Notification {
            id: id.into(),
            msg: format!("note {id}"),
            kind: NotificationKind::Info,
            read: false,
            date: Timestamp(1_746_000_000_000),
        }
    }

    fn durable(handle: &MemoryStorage) -> Snapshot {
        codec::decode(&handle.item(STORAGE_KEY).unwrap_or_default())
    }

    #[test]
    fn hydrate_starts_empty_without_a_snapshot() {
        let handle = MemoryStorage::new();
        let store = RootStore::hydrate(Box::new(handle.clone()));
        assert_eq!(store.snapshot(), Snapshot::default());
        assert_eq!(handle.writes(), 0);
    }

    #[test]
    fn hydrate_reads_previous_snapshot() {
        let saved = Snapshot { tasks: vec![task("t1", "Kickoff")], ..Snapshot::default() };
        let handle = MemoryStorage::with_item(STORAGE_KEY, &codec::encode(&saved).unwrap());
        let store = RootStore::hydrate(Box::new(handle));
        assert_eq!(store.snapshot(), saved);
    }

    #[test]
    fn each_mutation_persists_once_and_is_durable() {
        let handle = MemoryStorage::new();
        let mut store = RootStore::hydrate(Box::new(handle.clone()));

        store.get_mut::<Task>().push(task("t1", "Kickoff"));
        assert_eq!(handle.writes(), 1);
        assert_eq!(durable(&handle).tasks, vec![task("t1", "Kickoff")]);

        store.get_mut::<Task>().update(0, |t| t.status = TaskStatus::Done).unwrap();
        assert_eq!(handle.writes(), 2);
        assert_eq!(durable(&handle).tasks[0].status, TaskStatus::Done);

        store.get_mut::<Notification>().push(notification("n1"));
        assert_eq!(handle.writes(), 3);
        let on_disk = durable(&handle);
        assert_eq!(on_disk.tasks.len(), 1);
        assert_eq!(on_disk.notifications.len(), 1);
        assert_eq!(store.persist_count(), 3);
    }

    #[test]
    fn get_returns_the_live_collection() {
        let mut store = RootStore::hydrate(Box::new(MemoryStorage::new()));
        store.get_mut::<Task>().push(task("t1", "a"));
        let first: *const ObservableCollection<Task> = store.get::<Task>();
        let second: *const ObservableCollection<Task> = store.tasks();
        assert_eq!(first, second);
        assert_eq!(store.get::<Task>().len(), 1);
    }

    #[test]
    fn set_rewraps_and_persists_immediately() {
        let handle = MemoryStorage::new();
        let mut store = RootStore::hydrate(Box::new(handle.clone()));
        store.set(vec![task("t1", "a"), task("t2", "b")]);
        assert_eq!(handle.writes(), 1);
        assert_eq!(durable(&handle).tasks.len(), 2);

        // the replacement is observed like the original
        store.get_mut::<Task>().retain(|t| t.id != "t1");
        assert_eq!(handle.writes(), 2);
        assert_eq!(durable(&handle).tasks, vec![task("t2", "b")]);
    }

    #[test]
    fn replace_all_writes_once() {
        let handle = MemoryStorage::new();
        let mut store = RootStore::hydrate(Box::new(handle.clone()));
        store.get_mut::<Task>().push(task("t1", "a"));
        store.get_mut::<Notification>().push(notification("n1"));

        store.replace_all(Snapshot::default());
        assert_eq!(handle.writes(), 3);
        assert!(durable(&handle).is_empty());
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn persistence_failure_is_swallowed_and_reported() {
        let handle = MemoryStorage::new();
        let mut store = RootStore::hydrate(Box::new(handle.clone()));
        store.get_mut::<Task>().push(task("t1", "a"));

        handle.set_quota(Some(10));
        store.get_mut::<Task>().push(task("t2", "b"));
        assert_eq!(store.tasks().len(), 2);
        assert_eq!(durable(&handle).tasks.len(), 1);
        assert!(store.last_persist_error().unwrap().contains("quota"));

        handle.set_quota(None);
        assert!(store.persist_now());
        assert_eq!(durable(&handle).tasks.len(), 2);
        assert_eq!(store.last_persist_error(), None);
    }

    #[test]
    fn index_of_reports_missing_ids() {
        let mut store = RootStore::hydrate(Box::new(MemoryStorage::new()));
        store.get_mut::<Task>().push(task("t1", "a"));
        assert_eq!(store.index_of::<Task>("t1").unwrap(), 0);
        assert!(matches!(
            store.index_of::<Task>("zz"),
            Err(StoreError::NotFound { slot: Slot::Tasks, .. })
        ));
    }
}

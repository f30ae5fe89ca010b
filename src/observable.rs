use std::cmp::Ordering;
use std::fmt;
use std::ops::Deref;

use crate::error::{StoreError, StoreResult};

/// Called after every mutation with the collection's new contents.
///
/// The hook only sees a shared slice, so it cannot mutate the collection that
/// invoked it.
pub type ChangeHook<T> = Box<dyn Fn(&[T])>;

/// An ordered list that reports every write to its owner.
///
/// Reads go through `Deref<Target = [T]>`. Writes are limited to the methods
/// below. The hook fires exactly once per write call, after the change is
/// applied, whether or not the contents changed: `pop` on an empty list or
/// a `retain` that keeps everything still counts as a write.
pub struct ObservableCollection<T> {
    items: Vec<T>,
    on_change: ChangeHook<T>,
}

impl<T> ObservableCollection<T> {
    pub fn new(items: Vec<T>, on_change: ChangeHook<T>) -> Self {
        ObservableCollection { items, on_change }
    }

    fn changed(&self) {
        (self.on_change)(&self.items);
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn position(&self, pred: impl Fn(&T) -> bool) -> Option<usize> {
        self.items.iter().position(pred)
    }

    pub fn push(&mut self, item: T) {
        self.items.push(item);
        self.changed();
    }

    pub fn insert(&mut self, index: usize, item: T) -> StoreResult<()> {
        if index > self.items.len() {
            return Err(StoreError::IndexOutOfRange { index, len: self.items.len() });
        }
        self.items.insert(index, item);
        self.changed();
        Ok(())
    }

    pub fn pop(&mut self) -> Option<T> {
        let item = self.items.pop();
        self.changed();
        item
    }

    pub fn remove(&mut self, index: usize) -> StoreResult<T> {
        if index >= self.items.len() {
            return Err(StoreError::IndexOutOfRange { index, len: self.items.len() });
        }
        let item = self.items.remove(index);
        self.changed();
        Ok(item)
    }

    /// Keeps only the items matching `keep`; returns how many were dropped.
    pub fn retain(&mut self, keep: impl FnMut(&T) -> bool) -> usize {
        let before = self.items.len();
        self.items.retain(keep);
        self.changed();
        before - self.items.len()
    }

    /// Index assignment: swaps the record at `index` for `item`.
    pub fn set(&mut self, index: usize, item: T) -> StoreResult<T> {
        let len = self.items.len();
        let slot = self
            .items
            .get_mut(index)
            .ok_or(StoreError::IndexOutOfRange { index, len })?;
        let old = std::mem::replace(slot, item);
        self.changed();
        Ok(old)
    }

    /// In-place field change on a single record.
    pub fn update<R>(&mut self, index: usize, edit: impl FnOnce(&mut T) -> R) -> StoreResult<R> {
        let len = self.items.len();
        let item = self
            .items
            .get_mut(index)
            .ok_or(StoreError::IndexOutOfRange { index, len })?;
        let out = edit(item);
        self.changed();
        Ok(out)
    }

    pub fn move_item(&mut self, from: usize, to: usize) -> StoreResult<()> {
        let len = self.items.len();
        if from >= len || to >= len {
            return Err(StoreError::IndexOutOfRange { index: from.max(to), len });
        }
        let item = self.items.remove(from);
        self.items.insert(to, item);
        self.changed();
        Ok(())
    }

    pub fn sort_by(&mut self, compare: impl FnMut(&T, &T) -> Ordering) {
        self.items.sort_by(compare);
        self.changed();
    }

    pub fn reverse(&mut self) {
        self.items.reverse();
        self.changed();
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.changed();
    }

    /// Bulk replace; returns the previous contents.
    pub fn replace(&mut self, items: Vec<T>) -> Vec<T> {
        let old = std::mem::replace(&mut self.items, items);
        self.changed();
        old
    }
}

impl<T> Deref for ObservableCollection<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.items
    }
}

impl<T: fmt::Debug> fmt::Debug for ObservableCollection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recording(items: Vec<i32>) -> (ObservableCollection<i32>, Rc<RefCell<Vec<Vec<i32>>>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let collection = ObservableCollection::new(
            items,
            Box::new(move |items: &[i32]| sink.borrow_mut().push(items.to_vec())),
        );
        (collection, seen)
    }

    #[test]
    fn every_write_fires_once_after_the_change() {
        let (mut c, seen) = recording(vec![3, 1, 2]);

        c.push(4);
        assert_eq!(seen.borrow().last().unwrap(), &vec![3, 1, 2, 4]);

        c.set(0, 9).unwrap();
        c.update(1, |n| *n += 10).unwrap();
        c.retain(|n| *n != 2);
        c.sort_by(|a, b| a.cmp(b));
        c.reverse();
        c.move_item(0, 2).unwrap();
        c.insert(0, 5).unwrap();
        assert_eq!(c.remove(0).unwrap(), 5);
        assert_eq!(c.pop(), Some(11));
        c.replace(vec![7]);
        c.clear();

        let seen = seen.borrow();
        assert_eq!(seen.len(), 12);
        assert_eq!(seen[1], vec![9, 1, 2, 4]);
        assert_eq!(seen[2], vec![9, 11, 2, 4]);
        assert_eq!(seen[3], vec![9, 11, 4]);
        assert_eq!(seen[10], vec![7]);
        assert!(seen[11].is_empty());
    }

    #[test]
    fn reads_do_not_fire() {
        let (c, seen) = recording(vec![1, 2, 3]);
        assert_eq!(c.len(), 3);
        assert_eq!(c[1], 2);
        assert_eq!(c.iter().sum::<i32>(), 6);
        assert_eq!(c.position(|n| *n == 3), Some(2));
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn rejected_writes_do_not_fire() {
        let (mut c, seen) = recording(vec![1]);
        assert!(matches!(c.set(5, 0), Err(StoreError::IndexOutOfRange { index: 5, len: 1 })));
        assert!(c.update(1, |n| *n = 0).is_err());
        assert!(c.remove(3).is_err());
        assert!(c.move_item(0, 4).is_err());
        assert!(c.insert(2, 0).is_err());
        assert!(seen.borrow().is_empty());
        assert_eq!(c.as_slice(), &[1]);
    }

    #[test]
    fn retain_reports_dropped_count_and_fires_even_when_nothing_matched() {
        let (mut c, seen) = recording(vec![1, 2, 3]);
        assert_eq!(c.retain(|n| *n > 1), 1);
        assert_eq!(c.retain(|_| true), 0);
        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn pop_on_empty_still_counts_as_a_write() {
        let (mut c, seen) = recording(Vec::new());
        assert_eq!(c.pop(), None);
        assert_eq!(seen.borrow().as_slice(), &[Vec::<i32>::new()]);
    }
}

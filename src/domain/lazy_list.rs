//! Random-access list whose elements are mapped on first access.

use std::fmt;

use parking_lot::Mutex;

type Source<V> = Box<dyn Fn(usize) -> Option<V> + Send + Sync>;

/// Read-only list over fetched rows.
///
/// The mapping closure runs at most once per index; its result is memoized.
/// Indices for which the mapping yields `None` are skipped by
/// [`LazyList::iter`].
pub struct LazyList<V> {
    len: usize,
    source: Source<V>,
    mapped: Mutex<Vec<Option<Option<V>>>>,
}

impl<V: Clone> LazyList<V> {
    /// Wraps `rows`, mapping each one with `map` when first read.
    pub fn new<T, M>(rows: Vec<T>, map: M) -> Self
    where
        T: Send + Sync + 'static,
        M: Fn(&T) -> Option<V> + Send + Sync + 'static,
    {
        let len = rows.len();
        Self {
            len,
            source: Box::new(move |index| rows.get(index).and_then(&map)),
            mapped: Mutex::new(vec![None; len]),
        }
    }

    /// Number of underlying rows, including ones that map to nothing.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if there are no underlying rows.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the mapped element at `index`.
    pub fn get(&self, index: usize) -> Option<V> {
        if index >= self.len {
            return None;
        }
        let memoized = self.mapped.lock()[index].clone();
        if let Some(value) = memoized {
            return value;
        }
        let value = (self.source)(index);
        self.mapped.lock()[index] = Some(value.clone());
        value
    }

    /// Iterates the elements that mapped to a value.
    pub fn iter(&self) -> impl Iterator<Item = V> + '_ {
        (0..self.len).filter_map(|index| self.get(index))
    }

    /// Collects the mapped elements.
    #[must_use]
    pub fn to_vec(&self) -> Vec<V> {
        self.iter().collect()
    }
}

impl<V> fmt::Debug for LazyList<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyList").field("len", &self.len).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn test_map_runs_once_per_index() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let list = LazyList::new(vec![1, 2, 3], move |row: &i32| {
            counter.fetch_add(1, Ordering::SeqCst);
            Some(row * 10)
        });

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(list.get(1), Some(20));
        assert_eq!(list.get(1), Some(20));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(list.get(3), None);
    }

    #[test]
    fn test_iteration_skips_unmapped_rows() {
        let list = LazyList::new(vec![1, -2, 3, -4], |row: &i32| {
            (*row > 0).then(|| row.to_string())
        });

        assert_eq!(list.len(), 4);
        assert_eq!(list.to_vec(), vec!["1".to_string(), "3".to_string()]);
    }

    #[test]
    fn test_empty_list() {
        let list = LazyList::new(Vec::<u8>::new(), |row: &u8| Some(*row));
        assert!(list.is_empty());
        assert_eq!(list.iter().count(), 0);
    }
}

//! An ordered queue whose entries survive mutation during iteration.
//!
//! Run passes operate on an *order snapshot*: the caller grabs the sorted
//! handle list, then resolves each handle against the pool as it goes.
//! Entries deleted mid-pass simply stop resolving - the generational
//! handles guarantee a recycled slot is never mistaken for the deleted
//! entry - and entries inserted mid-pass are picked up on the next pass.
use genpool::{Pool, Ptr};

#[derive(Debug)]
pub(crate) struct OrderedQueue<T> {
    pool: Pool<T>,
    /// Live entries in execution order.
    order: Vec<Ptr>,
}

impl<T> OrderedQueue<T> {
    pub fn new() -> Self {
        Self {
            pool: Pool::new(),
            order: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Insert `item` before the first queued entry for which
    /// `sorts_before(item, entry)` holds.
    pub fn insert(&mut self, item: T, sorts_before: impl Fn(&T, &T) -> bool) -> Ptr {
        let ptr = self.pool.allocate(item);
        let item = &self.pool[ptr];
        let pos = self
            .order
            .iter()
            .position(|&p| sorts_before(item, &self.pool[p]))
            .unwrap_or(self.order.len());
        self.order.insert(pos, ptr);
        ptr
    }

    /// Remove and drop the entry. Stale handles are ignored.
    pub fn delete(&mut self, ptr: Ptr) -> Option<T> {
        let item = self.pool.deallocate(ptr)?;
        self.order.retain(|&p| p != ptr);
        Some(item)
    }

    /// Re-place an entry after its sort key changed.
    pub fn reorder(&mut self, ptr: Ptr, sorts_before: impl Fn(&T, &T) -> bool) {
        if !self.pool.contains(ptr) {
            return;
        }
        self.order.retain(|&p| p != ptr);
        let item = &self.pool[ptr];
        let pos = self
            .order
            .iter()
            .position(|&p| sorts_before(item, &self.pool[p]))
            .unwrap_or(self.order.len());
        self.order.insert(pos, ptr);
    }

    /// The execution order at this instant, for a run pass.
    pub fn snapshot(&self) -> Vec<Ptr> {
        self.order.clone()
    }

    pub fn head(&self) -> Option<&T> {
        self.order.first().map(|&p| &self.pool[p])
    }

    pub fn get_mut(&mut self, ptr: Ptr) -> Option<&mut T> {
        self.pool.get_mut(ptr)
    }

    pub fn contains(&self, ptr: Ptr) -> bool {
        self.pool.contains(ptr)
    }

    pub fn iter(&self) -> impl Iterator<Item = &'_ T> + '_ {
        let pool = &self.pool;
        self.order.iter().map(move |&p| &pool[p])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn by_value(a: &i32, b: &i32) -> bool {
        a < b
    }

    #[test]
    fn insert_keeps_order() {
        let mut q = OrderedQueue::new();
        for &v in &[3, 7, 5, 1, 9] {
            q.insert(v, by_value);
        }
        let vals: Vec<_> = q.iter().copied().collect();
        assert_eq!(vals, [1, 3, 5, 7, 9]);
        assert_eq!(q.head(), Some(&1));
    }

    #[test]
    fn equal_keys_keep_insertion_order() {
        let mut q = OrderedQueue::new();
        let a = q.insert((1, 'a'), |x, y| x.0 < y.0);
        let b = q.insert((1, 'b'), |x, y| x.0 < y.0);
        let vals: Vec<_> = q.iter().map(|&(_, c)| c).collect();
        assert_eq!(vals, ['a', 'b']);
        let _ = (a, b);
    }

    #[test]
    fn delete_during_snapshot_walk() {
        let mut q = OrderedQueue::new();
        let p1 = q.insert(1, by_value);
        let p2 = q.insert(2, by_value);
        let p3 = q.insert(3, by_value);

        let snap = q.snapshot();
        q.delete(p2);

        let seen: Vec<_> = snap
            .into_iter()
            .filter_map(|p| q.get_mut(p).map(|v| *v))
            .collect();
        assert_eq!(seen, [1, 3]);
        let _ = (p1, p3);
    }

    #[test]
    fn reorder_moves_entry() {
        let mut q = OrderedQueue::new();
        let p = q.insert(10, by_value);
        q.insert(5, by_value);
        q.insert(20, by_value);

        *q.get_mut(p).unwrap() = 1;
        q.reorder(p, by_value);
        let vals: Vec<_> = q.iter().copied().collect();
        assert_eq!(vals, [1, 5, 20]);
    }
}

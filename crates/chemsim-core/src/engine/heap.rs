use slotmap::{Key, SecondaryMap};

/// An addressable binary min-heap of `f64` priorities.
///
/// Every key owns at most one entry, and the heap remembers where each entry
/// lives, so the priority of any key can be changed in `O(log n)` without a
/// scan. The minimum priority is always at the top. `+inf` is a valid priority
/// and sinks below every finite one.
#[derive(Debug, Clone)]
pub struct IndexedHeap<K: Key> {
    entries: Vec<(f64, K)>,
    positions: SecondaryMap<K, usize>,
}

impl<K: Key> Default for IndexedHeap<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            positions: SecondaryMap::new(),
        }
    }
}

impl<K: Key> IndexedHeap<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            positions: SecondaryMap::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: K) -> bool {
        self.positions.contains_key(key)
    }

    /// The key with the smallest priority, and that priority.
    pub fn peek(&self) -> Option<(K, f64)> {
        self.entries.first().map(|&(priority, key)| (key, priority))
    }

    pub fn priority(&self, key: K) -> Option<f64> {
        self.positions.get(key).map(|&pos| self.entries[pos].0)
    }

    /// Inserts `key` or, if already present, moves it to `priority`.
    pub fn push(&mut self, key: K, priority: f64) {
        if self.positions.contains_key(key) {
            self.update(key, priority);
            return;
        }
        let pos = self.entries.len();
        self.entries.push((priority, key));
        self.positions.insert(key, pos);
        self.sift_up(pos);
    }

    /// Changes the priority of a present key. Returns `false` if the key is absent.
    pub fn update(&mut self, key: K, priority: f64) -> bool {
        let Some(&pos) = self.positions.get(key) else {
            return false;
        };
        let old = self.entries[pos].0;
        self.entries[pos].0 = priority;
        if priority < old {
            self.sift_up(pos);
        } else if priority > old {
            self.sift_down(pos);
        }
        true
    }

    pub fn remove(&mut self, key: K) -> Option<f64> {
        let pos = self.positions.remove(key)?;
        let last = self.entries.len() - 1;
        if pos != last {
            self.entries.swap(pos, last);
            let moved = self.entries[pos].1;
            self.positions.insert(moved, pos);
        }
        let (priority, _) = self.entries.pop()?;
        if pos < self.entries.len() {
            self.sift_down(pos);
            self.sift_up(pos);
        }
        Some(priority)
    }

    /// Applies `f` to every priority and restores heap order.
    ///
    /// Order-preserving maps (such as a constant shift) leave the layout
    /// valid; the rebuild still runs so arbitrary maps are safe.
    pub fn map_priorities<F>(&mut self, mut f: F)
    where
        F: FnMut(K, f64) -> f64,
    {
        for entry in &mut self.entries {
            entry.0 = f(entry.1, entry.0);
        }
        for pos in (0..self.entries.len() / 2).rev() {
            self.sift_down(pos);
        }
    }

    fn sift_up(&mut self, mut pos: usize) {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if self.entries[pos].0 < self.entries[parent].0 {
                self.swap(pos, parent);
                pos = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut pos: usize) {
        let len = self.entries.len();
        loop {
            let left = 2 * pos + 1;
            let right = left + 1;
            let mut smallest = pos;
            if left < len && self.entries[left].0 < self.entries[smallest].0 {
                smallest = left;
            }
            if right < len && self.entries[right].0 < self.entries[smallest].0 {
                smallest = right;
            }
            if smallest == pos {
                break;
            }
            self.swap(pos, smallest);
            pos = smallest;
        }
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.entries.swap(a, b);
        self.positions.insert(self.entries[a].1, a);
        self.positions.insert(self.entries[b].1, b);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ids::ReactionId;
    use slotmap::SlotMap;

    fn keys(n: usize) -> Vec<ReactionId> {
        let mut map: SlotMap<ReactionId, ()> = SlotMap::with_key();
        (0..n).map(|_| map.insert(())).collect()
    }

    fn assert_heap_order(heap: &IndexedHeap<ReactionId>) {
        for (pos, &(priority, key)) in heap.entries.iter().enumerate() {
            assert_eq!(heap.positions[key], pos);
            if pos > 0 {
                assert!(heap.entries[(pos - 1) / 2].0 <= priority);
            }
        }
    }

    #[test]
    fn peek_returns_minimum() {
        let k = keys(5);
        let mut heap = IndexedHeap::new();
        for (i, &key) in k.iter().enumerate() {
            heap.push(key, [5.0, 1.0, 4.0, f64::INFINITY, 2.0][i]);
        }

        assert_eq!(heap.peek(), Some((k[1], 1.0)));
        assert_eq!(heap.len(), 5);
        assert_heap_order(&heap);
    }

    #[test]
    fn update_moves_keys_both_directions() {
        let k = keys(4);
        let mut heap = IndexedHeap::new();
        for (i, &key) in k.iter().enumerate() {
            heap.push(key, i as f64);
        }

        assert!(heap.update(k[3], -1.0));
        assert_eq!(heap.peek(), Some((k[3], -1.0)));
        assert!(heap.update(k[3], f64::INFINITY));
        assert_eq!(heap.peek(), Some((k[0], 0.0)));
        assert_eq!(heap.priority(k[3]), Some(f64::INFINITY));
        assert_heap_order(&heap);
    }

    #[test]
    fn remove_keeps_positions_consistent() {
        let k = keys(8);
        let mut heap = IndexedHeap::new();
        for (i, &key) in k.iter().enumerate() {
            heap.push(key, ((i * 7) % 8) as f64);
        }

        assert_eq!(heap.remove(k[0]), Some(0.0));
        assert_eq!(heap.remove(k[0]), None);
        assert!(!heap.contains(k[0]));
        assert_heap_order(&heap);

        let mut drained = Vec::new();
        while let Some((key, priority)) = heap.peek() {
            drained.push(priority);
            heap.remove(key);
            assert_heap_order(&heap);
        }
        assert_eq!(drained, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn map_priorities_shifts_everything() {
        let k = keys(3);
        let mut heap = IndexedHeap::new();
        heap.push(k[0], 3.0);
        heap.push(k[1], 1.0);
        heap.push(k[2], f64::INFINITY);

        heap.map_priorities(|_, p| p - 1.0);

        assert_eq!(heap.peek(), Some((k[1], 0.0)));
        assert_eq!(heap.priority(k[0]), Some(2.0));
        assert_eq!(heap.priority(k[2]), Some(f64::INFINITY));
        assert_heap_order(&heap);
    }

    #[test]
    fn push_on_present_key_updates_in_place() {
        let k = keys(2);
        let mut heap = IndexedHeap::new();
        heap.push(k[0], 2.0);
        heap.push(k[1], 3.0);
        heap.push(k[1], 1.0);

        assert_eq!(heap.len(), 2);
        assert_eq!(heap.peek(), Some((k[1], 1.0)));
    }
}

//! Fixed-capacity LRU cache of rendered rows keyed by absolute row offset
//!
//! Shared between the UI loop and background page loads, so every operation
//! takes the internal lock. `IndexMap` insertion order doubles as recency
//! order: index 0 is least recently used, the tail is most recently used.

use indexmap::IndexMap;
use parking_lot::Mutex;

#[derive(Debug)]
pub struct RowCache {
    capacity: usize,
    entries: Mutex<IndexMap<usize, Vec<String>>>,
}

impl RowCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(IndexMap::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Look up a row and mark it most recently used
    pub fn get(&self, offset: usize) -> Option<Vec<String>> {
        let mut entries = self.entries.lock();
        promote(&mut entries, offset)
    }

    /// Insert or replace a row, evicting the least recently used entry when full
    pub fn set(&self, offset: usize, values: Vec<String>) {
        if self.capacity == 0 {
            return;
        }
        let mut entries = self.entries.lock();
        insert(&mut entries, self.capacity, offset, values);
    }

    /// Presence check that does not affect recency
    pub fn contains(&self, offset: usize) -> bool {
        self.entries.lock().contains_key(&offset)
    }

    /// All rows in `[offset, offset + limit)` or nothing. Hits are promoted.
    pub fn get_range(&self, offset: usize, limit: usize) -> Option<Vec<Vec<String>>> {
        if limit == 0 {
            return None;
        }
        let mut entries = self.entries.lock();
        if !(offset..offset + limit).all(|o| entries.contains_key(&o)) {
            return None;
        }
        (offset..offset + limit)
            .map(|o| promote(&mut entries, o))
            .collect()
    }

    /// Store consecutive rows starting at `offset` under a single lock
    pub fn set_range(&self, offset: usize, rows: &[Vec<String>]) {
        if self.capacity == 0 {
            return;
        }
        let mut entries = self.entries.lock();
        for (i, row) in rows.iter().enumerate() {
            insert(&mut entries, self.capacity, offset + i, row.clone());
        }
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

fn promote(entries: &mut IndexMap<usize, Vec<String>>, offset: usize) -> Option<Vec<String>> {
    let values = entries.shift_remove(&offset)?;
    entries.insert(offset, values.clone());
    Some(values)
}

fn insert(
    entries: &mut IndexMap<usize, Vec<String>>,
    capacity: usize,
    offset: usize,
    values: Vec<String>,
) {
    if entries.shift_remove(&offset).is_none() && entries.len() >= capacity {
        entries.shift_remove_index(0);
    }
    entries.insert(offset, values);
}

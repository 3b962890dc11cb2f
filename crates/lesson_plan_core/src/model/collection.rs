//! Variable-length plan sections with a length floor.
//!
//! # Responsibility
//! - Hold list items behind shared pointers for copy-on-write updates.
//! - Provide append/remove operations that keep at least one item.
//!
//! # Invariants
//! - A list is never empty.
//! - Removing the last remaining item, or an out-of-range index, is a no-op.

use serde::{Serialize, Serializer};
use std::sync::Arc;

/// Non-empty, structurally shared list of plan records.
#[derive(Debug, PartialEq, Eq)]
pub struct ItemList<T> {
    items: Arc<Vec<Arc<T>>>,
}

impl<T> Clone for ItemList<T> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
        }
    }
}

impl<T> ItemList<T> {
    /// Builds a list from `items`, padding with `factory` up to `min_len`.
    ///
    /// `min_len` is clamped to at least 1.
    pub fn padded(items: Vec<T>, min_len: usize, mut factory: impl FnMut() -> T) -> Self {
        let target = min_len.max(1);
        let mut shared: Vec<Arc<T>> = items.into_iter().map(Arc::new).collect();
        while shared.len() < target {
            shared.push(Arc::new(factory()));
        }
        Self {
            items: Arc::new(shared),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Always `false` for lists built through this module.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index).map(Arc::as_ref)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.items.iter().map(Arc::as_ref)
    }

    /// Returns a new list with one item from `factory` appended.
    ///
    /// Existing items are shared with `self`.
    pub fn append(&self, factory: impl FnOnce() -> T) -> Self {
        let mut items = Vec::with_capacity(self.items.len() + 1);
        items.extend(self.items.iter().cloned());
        items.push(Arc::new(factory()));
        Self {
            items: Arc::new(items),
        }
    }

    /// Returns a new list without the item at `index`.
    ///
    /// # Invariants
    /// - Returns `self` unchanged when only one item remains.
    /// - Returns `self` unchanged when `index` is out of range.
    pub fn remove_at(&self, index: usize) -> Self {
        if self.items.len() <= 1 || index >= self.items.len() {
            return self.clone();
        }

        let items = self
            .items
            .iter()
            .enumerate()
            .filter(|(position, _)| *position != index)
            .map(|(_, item)| Arc::clone(item))
            .collect();
        Self {
            items: Arc::new(items),
        }
    }

    /// Whether both lists point at the same backing storage.
    pub fn shares_storage_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.items, &other.items)
    }

    /// Whether the item at `index` is the same allocation in both lists.
    pub fn shares_item_with(&self, other: &Self, index: usize) -> bool {
        match (self.items.get(index), other.items.get(index)) {
            (Some(left), Some(right)) => Arc::ptr_eq(left, right),
            _ => false,
        }
    }
}

impl<T: Clone> ItemList<T> {
    /// Returns a uniquely owned item for in-place writes, cloning shared nodes.
    pub(crate) fn item_mut(&mut self, index: usize) -> Option<&mut T> {
        if index >= self.items.len() {
            return None;
        }
        Arc::make_mut(&mut self.items)
            .get_mut(index)
            .map(Arc::make_mut)
    }
}

impl<T: Serialize> Serialize for ItemList<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

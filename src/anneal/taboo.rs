//! Recently moved components.

use crate::problem::ComponentId;
use std::collections::VecDeque;

/// A bounded FIFO of components that may not be moved again.
///
/// Pushing onto a full list evicts the oldest entry. A capacity of zero
/// disables the list.
#[derive(Debug, Clone)]
pub struct TabooList {
    entries: VecDeque<ComponentId>,
    capacity: usize,
}

impl TabooList {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn contains(&self, component: ComponentId) -> bool {
        self.entries.contains(&component)
    }

    pub fn push(&mut self, component: ComponentId) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(component);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.entries.iter().copied()
    }
}

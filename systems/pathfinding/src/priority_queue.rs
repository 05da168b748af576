//! Array-backed binary min-heap with decrease-key support.

use thiserror::Error;

/// Failures reported by [`PriorityQueue`]. Each one is a caller bug.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum QueueError {
    /// `pop` was called on an empty queue.
    #[error("priority queue underflow")]
    Underflow,
    /// `decrease_key` named an element that is not queued.
    #[error("cannot decrease the key of an element that is not queued")]
    MissingElement,
    /// `decrease_key` asked for a higher cost than the queued one.
    #[error("cannot raise a queued cost from {current} to {requested}")]
    CostIncrease {
        /// Cost currently stored for the element.
        current: f64,
        /// Cost passed to `decrease_key`.
        requested: f64,
    },
}

#[derive(Clone, Copy, Debug)]
struct Entry<T> {
    element: T,
    cost: f64,
}

/// Min-priority queue over `(element, cost)` pairs stored in a dense heap.
///
/// The queue does not reject duplicate elements; callers that rely on
/// [`PriorityQueue::decrease_key`] must push each element at most once.
/// Elements with equal cost leave in an unspecified order.
#[derive(Clone, Debug)]
pub struct PriorityQueue<T> {
    entries: Vec<Entry<T>>,
}

impl<T> Default for PriorityQueue<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T: PartialEq> PriorityQueue<T> {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty queue with room for `capacity` elements.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Number of queued elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cost of the element `pop` would return next.
    #[must_use]
    pub fn peek_cost(&self) -> Option<f64> {
        self.entries.first().map(|entry| entry.cost)
    }

    /// Inserts `element` with the provided cost.
    pub fn push(&mut self, element: T, cost: f64) {
        self.entries.push(Entry { element, cost });
        self.bubble_up(self.entries.len() - 1);
    }

    /// Removes and returns the minimum-cost element.
    pub fn pop(&mut self) -> Result<T, QueueError> {
        if self.entries.is_empty() {
            return Err(QueueError::Underflow);
        }
        let head = self.entries.swap_remove(0);
        self.bubble_down(0);
        Ok(head.element)
    }

    /// Lowers the cost of an already queued element and restores heap order.
    ///
    /// The element is located by a linear scan. Requesting a cost above the
    /// stored one fails without modifying the queue.
    pub fn decrease_key(&mut self, element: &T, cost: f64) -> Result<(), QueueError> {
        let index = self
            .entries
            .iter()
            .position(|entry| entry.element == *element)
            .ok_or(QueueError::MissingElement)?;

        let current = self.entries[index].cost;
        if current < cost {
            return Err(QueueError::CostIncrease {
                current,
                requested: cost,
            });
        }

        self.entries[index].cost = cost;
        self.bubble_up(index);
        Ok(())
    }

    /// Confirms that every parent costs no more than either child.
    #[must_use]
    pub fn verify_heap_invariant(&self) -> bool {
        self.verify_from(0)
    }

    fn verify_from(&self, index: usize) -> bool {
        let left = index * 2 + 1;
        let right = left + 1;
        for child in [left, right] {
            if child >= self.entries.len() {
                continue;
            }
            if self.entries[child].cost < self.entries[index].cost {
                return false;
            }
            if !self.verify_from(child) {
                return false;
            }
        }
        true
    }

    fn bubble_up(&mut self, mut index: usize) {
        while index > 0 {
            let parent = (index - 1) / 2;
            if self.entries[index].cost < self.entries[parent].cost {
                self.entries.swap(index, parent);
                index = parent;
            } else {
                break;
            }
        }
    }

    fn bubble_down(&mut self, mut index: usize) {
        let len = self.entries.len();
        loop {
            let left = index * 2 + 1;
            if left >= len {
                break;
            }
            let right = left + 1;
            let smaller = if right < len && self.entries[right].cost < self.entries[left].cost {
                right
            } else {
                left
            };
            if self.entries[smaller].cost < self.entries[index].cost {
                self.entries.swap(index, smaller);
                index = smaller;
            } else {
                break;
            }
        }
    }
}

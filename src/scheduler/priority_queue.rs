//! Min-heap of scheduled items with O(log n) removal by identity.

use std::collections::HashMap;

use super::scheduled_item::ScheduledItem;

/// Priority queue ordered by `(due_time, sequence)`.
///
/// `dequeue` yields items in non-decreasing due-time order, FIFO among
/// items due at the same tick. Cancelled items are removed eagerly via
/// [`remove`](SchedulerQueue::remove), located through a sequence-number →
/// heap-slot index that is maintained on every sift swap, so removal never
/// degenerates into a linear scan.
#[derive(Default)]
pub struct SchedulerQueue {
  heap: Vec<ScheduledItem>,
  slots: HashMap<u64, usize>,
}

impl SchedulerQueue {
  pub fn new() -> Self { Self::default() }

  pub fn len(&self) -> usize { self.heap.len() }

  pub fn is_empty(&self) -> bool { self.heap.is_empty() }

  pub fn enqueue(&mut self, item: ScheduledItem) {
    let pos = self.heap.len();
    self.slots.insert(item.sequence(), pos);
    self.heap.push(item);
    self.sift_up(pos);
  }

  pub fn peek(&self) -> Option<&ScheduledItem> { self.heap.first() }

  /// Remove and return the minimum item.
  pub fn dequeue(&mut self) -> Option<ScheduledItem> {
    if self.heap.is_empty() {
      return None;
    }
    let item = self.remove_at(0);
    Some(item)
  }

  /// Remove the item with the given sequence number. Returns false when the
  /// item is not queued (already dequeued or never enqueued) — cancelling
  /// an item that is currently being invoked is a no-op.
  pub fn remove(&mut self, seq: u64) -> bool {
    match self.slots.get(&seq).copied() {
      Some(pos) => {
        self.remove_at(pos);
        true
      }
      None => false,
    }
  }

  fn remove_at(&mut self, pos: usize) -> ScheduledItem {
    let last = self.heap.len() - 1;
    self.swap(pos, last);
    let item = self.heap.pop().expect("non-empty heap");
    self.slots.remove(&item.sequence());
    if pos < self.heap.len() {
      // The swapped-in item may violate the heap property in either
      // direction relative to its new neighbourhood.
      self.sift_up(pos);
      self.sift_down(pos);
    }
    item
  }

  fn swap(&mut self, a: usize, b: usize) {
    if a == b {
      return;
    }
    self.heap.swap(a, b);
    self.slots.insert(self.heap[a].sequence(), a);
    self.slots.insert(self.heap[b].sequence(), b);
  }

  fn sift_up(&mut self, mut pos: usize) {
    while pos > 0 {
      let parent = (pos - 1) / 2;
      if self.heap[pos].key() >= self.heap[parent].key() {
        break;
      }
      self.swap(pos, parent);
      pos = parent;
    }
  }

  fn sift_down(&mut self, mut pos: usize) {
    let len = self.heap.len();
    loop {
      let left = 2 * pos + 1;
      if left >= len {
        break;
      }
      let right = left + 1;
      let mut min = left;
      if right < len && self.heap[right].key() < self.heap[left].key() {
        min = right;
      }
      if self.heap[pos].key() <= self.heap[min].key() {
        break;
      }
      self.swap(pos, min);
      pos = min;
    }
  }
}

//! A unit of scheduled work and its cancellation handle.

use crate::disposable::{BoxDisposable, Disposable, SingleAssignmentDisposable};

/// The shape of work a time-ordered scheduler runs. The returned disposable
/// is the action's own teardown (for example the handle of a recursively
/// scheduled follow-up) and is captured by the item's cancellation slot.
pub type SchedulerAction = Box<dyn FnOnce() -> BoxDisposable + Send + 'static>;

/// One entry in a scheduler's work queue.
///
/// Ordered by due tick; items due at the same tick run in the order they
/// were scheduled (`seq` is a monotone sequence number that doubles as the
/// item's identity for cancellation-driven removal).
pub struct ScheduledItem {
  due: u64,
  seq: u64,
  action: Option<SchedulerAction>,
  cancel: SingleAssignmentDisposable,
}

impl ScheduledItem {
  pub fn new(due: u64, seq: u64, action: SchedulerAction) -> Self {
    Self { due, seq, action: Some(action), cancel: SingleAssignmentDisposable::new() }
  }

  pub fn due_time(&self) -> u64 { self.due }

  pub fn sequence(&self) -> u64 { self.seq }

  /// The handle shared with whoever scheduled this item.
  pub fn cancel_handle(&self) -> SingleAssignmentDisposable { self.cancel.clone() }

  /// Heap key: due time first, insertion order as the tie breaker.
  pub(crate) fn key(&self) -> (u64, u64) { (self.due, self.seq) }

  /// Run the action unless the item was cancelled first. The action's own
  /// teardown lands in the cancellation slot, so a handle disposed after
  /// the run releases it immediately.
  pub fn invoke(mut self) {
    if self.cancel.is_disposed() {
      return;
    }
    if let Some(action) = self.action.take() {
      let teardown = action();
      self.cancel.set_disposable(teardown);
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
  };

  use super::*;
  use crate::disposable::{self, BooleanDisposable};

  fn noop_item(due: u64, seq: u64) -> ScheduledItem {
    ScheduledItem::new(due, seq, Box::new(disposable::empty))
  }

  #[test]
  fn cancelled_item_does_not_run() {
    let ran = Arc::new(AtomicBool::new(false));
    let r = ran.clone();
    let item = ScheduledItem::new(
      0,
      0,
      Box::new(move || {
        r.store(true, Ordering::SeqCst);
        disposable::empty()
      }),
    );

    item.cancel_handle().dispose();
    item.invoke();
    assert!(!ran.load(Ordering::SeqCst));
  }

  #[test]
  fn cancel_after_invoke_releases_returned_teardown() {
    let teardown = BooleanDisposable::new();
    let t = teardown.clone();
    let item = ScheduledItem::new(0, 0, Box::new(move || Box::new(t) as _));
    let handle = item.cancel_handle();

    item.invoke();
    assert!(!teardown.is_disposed());
    handle.dispose();
    assert!(teardown.is_disposed());
  }

  #[test]
  fn key_orders_by_due_then_sequence() {
    assert!(noop_item(1, 5).key() < noop_item(2, 0).key());
    assert!(noop_item(2, 0).key() < noop_item(2, 1).key());
  }
}

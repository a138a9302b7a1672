//! A disposable slot that can be written at most once.

use std::sync::{Arc, Mutex};

use super::{BoxDisposable, Disposable};

enum Slot {
  Empty,
  Set(BoxDisposable),
  Disposed,
}

/// Holds at most one inner disposable.
///
/// Assigning twice is a contract violation and panics. Assigning after the
/// slot was disposed releases the incoming value immediately, so an
/// `assign` racing a `dispose` resolves deterministically: whichever call
/// wins the slot decides whether the value is retained or torn down on the
/// spot.
///
/// Schedulers use this as the cancellation handle of a work item: the
/// action's own teardown is assigned into the slot once the action ran, and
/// a handle disposed beforehand suppresses the run entirely.
#[derive(Clone)]
pub struct SingleAssignmentDisposable {
  slot: Arc<Mutex<Slot>>,
}

impl Default for SingleAssignmentDisposable {
  fn default() -> Self { Self { slot: Arc::new(Mutex::new(Slot::Empty)) } }
}

impl SingleAssignmentDisposable {
  pub fn new() -> Self { Self::default() }

  /// Store the inner disposable.
  ///
  /// # Panics
  ///
  /// Panics if the slot already holds a value and has not been disposed.
  pub fn set_disposable(&self, disposable: BoxDisposable) {
    let mut guard = self.slot.lock().unwrap();
    match &*guard {
      Slot::Empty => {
        *guard = Slot::Set(disposable);
      }
      Slot::Disposed => {
        drop(guard);
        disposable.dispose();
      }
      Slot::Set(_) => {
        drop(guard);
        panic!("SingleAssignmentDisposable already holds an inner disposable");
      }
    }
  }
}

impl Disposable for SingleAssignmentDisposable {
  fn dispose(&self) {
    let prior = std::mem::replace(&mut *self.slot.lock().unwrap(), Slot::Disposed);
    // The inner teardown runs after the slot lock is released, so a
    // callback that touches this handle again cannot deadlock.
    if let Slot::Set(inner) = prior {
      inner.dispose();
    }
  }

  fn is_disposed(&self) -> bool { matches!(*self.slot.lock().unwrap(), Slot::Disposed) }
}

//! A disposable slot whose content can be swapped, disposing the previous
//! occupant.

use std::sync::{Arc, Mutex};

use super::{BoxDisposable, Disposable};

enum Slot {
  Current(Option<BoxDisposable>),
  Disposed,
}

/// Holds a "current" disposable; each assignment disposes the previous one.
///
/// Once the serial itself is disposed, the current value is released and
/// every future assignment is released immediately as well. Operators that
/// repeatedly re-schedule work (drain loops, timers) keep their pending
/// handle in one of these so cancelling the operator cancels whatever is
/// in flight.
#[derive(Clone)]
pub struct SerialDisposable {
  slot: Arc<Mutex<Slot>>,
}

impl Default for SerialDisposable {
  fn default() -> Self { Self { slot: Arc::new(Mutex::new(Slot::Current(None))) } }
}

impl SerialDisposable {
  pub fn new() -> Self { Self::default() }

  /// Swap in a new inner disposable, releasing the previous one.
  pub fn set_disposable(&self, disposable: BoxDisposable) {
    let prior = {
      let mut guard = self.slot.lock().unwrap();
      match &mut *guard {
        Slot::Current(current) => current.replace(disposable),
        Slot::Disposed => {
          drop(guard);
          disposable.dispose();
          return;
        }
      }
    };
    if let Some(prior) = prior {
      prior.dispose();
    }
  }
}

impl Disposable for SerialDisposable {
  fn dispose(&self) {
    let prior = std::mem::replace(&mut *self.slot.lock().unwrap(), Slot::Disposed);
    if let Slot::Current(Some(inner)) = prior {
      inner.dispose();
    }
  }

  fn is_disposed(&self) -> bool { matches!(*self.slot.lock().unwrap(), Slot::Disposed) }
}

//! A queue-draining gate that provides logical, not thread-level,
//! exclusivity.

use std::{
  collections::VecDeque,
  sync::{Arc, Mutex},
};

use crate::observer::Observer;

struct LockState {
  queue: VecDeque<Box<dyn FnOnce() + Send>>,
  has_owner: bool,
  faulted: bool,
}

/// Serializes closures without ever blocking a caller.
///
/// [`wait`](AsyncLock::wait) enqueues the closure; the caller that finds
/// the gate idle becomes the owner and drains the queue to empty —
/// including work enqueued while it was draining — then releases
/// ownership. Every other caller returns immediately, knowing the owner
/// will run its work in arrival order. Re-entrant `wait` calls from inside
/// a running closure are therefore deferred, never nested.
///
/// A closure that panics faults the gate: the pending queue is dropped,
/// later work is discarded, and the panic propagates to the owner.
pub struct AsyncLock {
  state: Mutex<LockState>,
}

impl Default for AsyncLock {
  fn default() -> Self {
    Self {
      state: Mutex::new(LockState { queue: VecDeque::new(), has_owner: false, faulted: false }),
    }
  }
}

impl AsyncLock {
  pub fn new() -> Self { Self::default() }

  pub fn wait(&self, action: impl FnOnce() + Send + 'static) {
    {
      let mut state = self.state.lock().unwrap();
      if state.faulted {
        return;
      }
      state.queue.push_back(Box::new(action));
      if state.has_owner {
        return;
      }
      state.has_owner = true;
    }

    loop {
      let work = {
        let mut state = self.state.lock().unwrap();
        match state.queue.pop_front() {
          Some(work) => work,
          None => {
            state.has_owner = false;
            return;
          }
        }
      };

      let fault = FaultGuard { state: &self.state, armed: true };
      work();
      std::mem::forget(fault);
    }
  }

  /// Discard all pending work and refuse any future work.
  pub fn clear(&self) {
    let mut state = self.state.lock().unwrap();
    state.faulted = true;
    state.queue.clear();
  }
}

struct FaultGuard<'a> {
  state: &'a Mutex<LockState>,
  armed: bool,
}

impl Drop for FaultGuard<'_> {
  fn drop(&mut self) {
    if self.armed {
      // Unwinding out of a queued closure; poison the gate so the
      // stream stays linear instead of resuming mid-sequence.
      if let Ok(mut state) = self.state.lock() {
        state.faulted = true;
        state.queue.clear();
      }
    }
  }
}

/// An observer wrapper that pushes every call through an [`AsyncLock`],
/// restoring the single-threaded observable grammar for a consumer fed by
/// concurrent producers.
pub struct SynchronizedObserver<O> {
  gate: Arc<AsyncLock>,
  observer: Arc<Mutex<O>>,
}

impl<O> SynchronizedObserver<O> {
  pub fn new(observer: O) -> Self {
    Self { gate: Arc::new(AsyncLock::new()), observer: Arc::new(Mutex::new(observer)) }
  }

  /// Share an existing gate, e.g. with a sibling wrapper around the same
  /// downstream.
  pub fn with_gate(observer: O, gate: Arc<AsyncLock>) -> Self {
    Self { gate, observer: Arc::new(Mutex::new(observer)) }
  }
}

impl<O> Clone for SynchronizedObserver<O> {
  fn clone(&self) -> Self { Self { gate: self.gate.clone(), observer: self.observer.clone() } }
}

impl<Item, Err, O> Observer<Item, Err> for SynchronizedObserver<O>
where
  Item: Send + 'static,
  Err: Send + 'static,
  O: Observer<Item, Err> + Send + 'static,
{
  fn on_next(&mut self, value: Item) {
    let observer = self.observer.clone();
    self
      .gate
      .wait(move || observer.lock().unwrap().on_next(value));
  }

  fn on_error(&mut self, err: Err) {
    let observer = self.observer.clone();
    self
      .gate
      .wait(move || observer.lock().unwrap().on_error(err));
  }

  fn on_completed(&mut self) {
    let observer = self.observer.clone();
    self
      .gate
      .wait(move || observer.lock().unwrap().on_completed());
  }
}

//! Synchronous inline execution.

use std::time::Duration;

use super::{wall_clock_now, Scheduler};
use crate::disposable::{self, BoxDisposable};

/// Runs scheduled work right here, right now, on the caller's stack.
///
/// `schedule_after` blocks the caller for the delay. There is no queue, so
/// the returned handle has nothing left to cancel by the time the caller
/// sees it.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImmediateScheduler;

impl ImmediateScheduler {
  pub fn new() -> Self { Self }
}

impl Scheduler for ImmediateScheduler {
  fn now(&self) -> Duration { wall_clock_now() }

  fn schedule<F>(&self, action: F) -> BoxDisposable
  where
    F: FnOnce() + Send + 'static,
  {
    action();
    disposable::empty()
  }

  fn schedule_after<F>(&self, delay: Duration, action: F) -> BoxDisposable
  where
    F: FnOnce() + Send + 'static,
  {
    if !delay.is_zero() {
      std::thread::sleep(delay);
    }
    action();
    disposable::empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::disposable::Disposable;

  #[test]
  fn runs_synchronously() {
    use std::sync::{
      atomic::{AtomicBool, Ordering},
      Arc,
    };

    let ran = Arc::new(AtomicBool::new(false));
    let r = ran.clone();
    let handle = ImmediateScheduler.schedule(move || r.store(true, Ordering::SeqCst));
    assert!(ran.load(Ordering::SeqCst));
    assert!(handle.is_disposed());
  }

  #[test]
  fn past_due_absolute_time_runs_at_once() {
    use std::sync::{
      atomic::{AtomicBool, Ordering},
      Arc,
    };

    let ran = Arc::new(AtomicBool::new(false));
    let r = ran.clone();
    // A due time already behind the clock must not underflow into a wait.
    ImmediateScheduler.schedule_at(Duration::ZERO, move || r.store(true, Ordering::SeqCst));
    assert!(ran.load(Ordering::SeqCst));
  }
}

//! A scheduler that creates a new thread for each unit of work.

use std::{thread, time::Duration};

use super::{wall_clock_now, LongRunningScheduler, PeriodicScheduler, Scheduler};
use crate::disposable::{BooleanDisposable, BoxDisposable, Disposable};

/// One spawned thread per scheduled action.
///
/// Cancellation is best effort: a delayed action checks its flag after the
/// sleep, an already-running action is never interrupted. This is the
/// natural host for the periodic and long-running capabilities, since a
/// dedicated thread may block as long as it likes.
#[derive(Clone, Copy, Debug, Default)]
pub struct NewThreadScheduler;

impl NewThreadScheduler {
  pub fn new() -> Self { Self }
}

impl Scheduler for NewThreadScheduler {
  fn now(&self) -> Duration { wall_clock_now() }

  fn schedule<F>(&self, action: F) -> BoxDisposable
  where
    F: FnOnce() + Send + 'static,
  {
    self.schedule_after(Duration::ZERO, action)
  }

  fn schedule_after<F>(&self, delay: Duration, action: F) -> BoxDisposable
  where
    F: FnOnce() + Send + 'static,
  {
    let cancel = BooleanDisposable::new();
    let flag = cancel.clone();
    thread::spawn(move || {
      if !delay.is_zero() {
        thread::sleep(delay);
      }
      if !flag.is_disposed() {
        action();
      }
    });
    Box::new(cancel)
  }

  fn periodic(&self) -> Option<&dyn PeriodicScheduler> { Some(self) }

  fn long_running(&self) -> Option<&dyn LongRunningScheduler> { Some(self) }
}

impl PeriodicScheduler for NewThreadScheduler {
  fn schedule_periodic(&self, period: Duration, mut tick: Box<dyn FnMut() + Send>) -> BoxDisposable {
    let cancel = BooleanDisposable::new();
    let flag = cancel.clone();
    thread::spawn(move || loop {
      thread::sleep(period);
      if flag.is_disposed() {
        break;
      }
      tick();
    });
    Box::new(cancel)
  }
}

impl LongRunningScheduler for NewThreadScheduler {
  fn schedule_long_running(
    &self, action: Box<dyn FnOnce(BooleanDisposable) + Send>,
  ) -> BoxDisposable {
    let cancel = BooleanDisposable::new();
    let token = cancel.clone();
    thread::spawn(move || action(token));
    Box::new(cancel)
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    atomic::{AtomicUsize, Ordering},
    mpsc, Arc,
  };

  use super::*;

  #[test]
  fn runs_on_another_thread() {
    let (tx, rx) = mpsc::channel();
    NewThreadScheduler.schedule(move || {
      tx.send(thread::current().id()).unwrap();
    });
    let worker = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_ne!(worker, thread::current().id());
  }

  #[test]
  fn cancelled_delayed_work_never_runs() {
    let ran = Arc::new(AtomicUsize::new(0));
    let r = ran.clone();
    let handle = NewThreadScheduler.schedule_after(Duration::from_millis(50), move || {
      r.fetch_add(1, Ordering::SeqCst);
    });
    handle.dispose();
    thread::sleep(Duration::from_millis(200));
    assert_eq!(ran.load(Ordering::SeqCst), 0);
  }

  #[test]
  fn long_running_observes_its_token() {
    let (tx, rx) = mpsc::channel();
    let scheduler = NewThreadScheduler;
    let handle = scheduler
      .long_running()
      .expect("capability")
      .schedule_long_running(Box::new(move |token| {
        while !token.is_disposed() {
          thread::sleep(Duration::from_millis(1));
        }
        tx.send(()).unwrap();
      }));

    handle.dispose();
    rx.recv_timeout(Duration::from_secs(5)).unwrap();
  }
}

//! Pool-backed scheduling on `futures`' executor.

use std::{thread, time::Duration};

use futures::{executor::ThreadPool, future};
use once_cell::sync::Lazy;

use super::{wall_clock_now, Scheduler};
use crate::disposable::{BooleanDisposable, BoxDisposable, Disposable};

static DEFAULT_POOL: Lazy<ThreadPool> =
  Lazy::new(|| ThreadPool::new().expect("create thread pool failed."));

/// Dispatches work onto a shared `futures` thread pool.
///
/// Actions scheduled here may run concurrently with each other and with
/// the scheduling thread; state they share must be gated accordingly.
/// Delayed work is parked on a timer thread first so pool workers are
/// never blocked sleeping.
#[derive(Clone)]
pub struct ThreadPoolScheduler {
  pool: ThreadPool,
}

impl Default for ThreadPoolScheduler {
  fn default() -> Self { Self { pool: DEFAULT_POOL.clone() } }
}

impl ThreadPoolScheduler {
  pub fn new() -> Self { Self::default() }

  pub fn with_pool(pool: ThreadPool) -> Self { Self { pool } }

  fn spawn<F>(&self, cancel: BooleanDisposable, action: F)
  where
    F: FnOnce() + Send + 'static,
  {
    self.pool.spawn_ok(future::lazy(move |_| {
      if !cancel.is_disposed() {
        action();
      }
    }));
  }
}

impl Scheduler for ThreadPoolScheduler {
  fn now(&self) -> Duration { wall_clock_now() }

  fn schedule<F>(&self, action: F) -> BoxDisposable
  where
    F: FnOnce() + Send + 'static,
  {
    let cancel = BooleanDisposable::new();
    self.spawn(cancel.clone(), action);
    Box::new(cancel)
  }

  fn schedule_after<F>(&self, delay: Duration, action: F) -> BoxDisposable
  where
    F: FnOnce() + Send + 'static,
  {
    if delay.is_zero() {
      return self.schedule(action);
    }
    let cancel = BooleanDisposable::new();
    let flag = cancel.clone();
    let this = self.clone();
    thread::spawn(move || {
      thread::sleep(delay);
      if !flag.is_disposed() {
        this.spawn(flag, action);
      }
    });
    Box::new(cancel)
  }
}

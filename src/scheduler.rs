//! Scheduler abstraction: ordering, cancellation and clocks for units of
//! work.
//!
//! A [`Scheduler`] orders work and decides where it runs; it never owns a
//! runtime of its own but delegates to a host facility (a spawned thread, a
//! pool, the current call stack, or a virtual clock). Every `schedule_*`
//! call returns a cancellation handle; cancelling before the action is due
//! prevents it from running at all, cancelling later releases whatever the
//! action itself returned.
//!
//! Optional capabilities (periodic ticks, long-running work) are probed via
//! [`Scheduler::periodic`] and [`Scheduler::long_running`] rather than
//! downcasting.

use std::time::Duration;

mod immediate;
mod new_thread;
mod priority_queue;
mod scheduled_item;
#[cfg(feature = "thread-pool")]
mod thread_pool;
mod virtual_time;

pub use immediate::ImmediateScheduler;
pub use new_thread::NewThreadScheduler;
pub use priority_queue::SchedulerQueue;
pub use scheduled_item::{ScheduledItem, SchedulerAction};
#[cfg(feature = "thread-pool")]
pub use thread_pool::ThreadPoolScheduler;
pub use virtual_time::VirtualTimeScheduler;

use crate::disposable::{BooleanDisposable, BoxDisposable};

/// An object that orders tasks and schedules their execution.
pub trait Scheduler: Clone {
  /// The scheduler's notion of "now". Virtual schedulers report their
  /// logical clock; real schedulers report wall-clock time.
  fn now(&self) -> Duration;

  /// Schedule `action` to run as soon as possible.
  fn schedule<F>(&self, action: F) -> BoxDisposable
  where
    F: FnOnce() + Send + 'static;

  /// Schedule `action` to run after `delay`.
  fn schedule_after<F>(&self, delay: Duration, action: F) -> BoxDisposable
  where
    F: FnOnce() + Send + 'static;

  /// Schedule `action` to run at `due`, an absolute time on this
  /// scheduler's clock. A due time at or before `now` runs as soon as
  /// possible.
  fn schedule_at<F>(&self, due: Duration, action: F) -> BoxDisposable
  where
    F: FnOnce() + Send + 'static,
  {
    self.schedule_after(due.saturating_sub(self.now()), action)
  }

  /// Periodic-execution capability, if this scheduler has one.
  fn periodic(&self) -> Option<&dyn PeriodicScheduler> { None }

  /// Long-running-work capability, if this scheduler has one.
  fn long_running(&self) -> Option<&dyn LongRunningScheduler> { None }
}

/// Capability: run a tick repeatedly with a fixed period until cancelled.
pub trait PeriodicScheduler {
  fn schedule_periodic(&self, period: Duration, tick: Box<dyn FnMut() + Send>) -> BoxDisposable;
}

/// Capability: run one action on a dedicated context where it may block for
/// the lifetime of the subscription. The action polls the provided token to
/// find out it was cancelled.
pub trait LongRunningScheduler {
  fn schedule_long_running(
    &self, action: Box<dyn FnOnce(BooleanDisposable) + Send>,
  ) -> BoxDisposable;
}

/// Wall-clock "now" shared by the real schedulers.
pub(crate) fn wall_clock_now() -> Duration {
  use std::time::{SystemTime, UNIX_EPOCH};
  SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .unwrap_or(Duration::ZERO)
}

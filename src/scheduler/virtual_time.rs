//! Virtual-time scheduling: a logical clock advanced by draining work.

use std::{
  sync::{Arc, Mutex, Weak},
  time::Duration,
};

use super::{
  priority_queue::SchedulerQueue, scheduled_item::ScheduledItem, PeriodicScheduler, Scheduler,
};
use crate::disposable::{self, BooleanDisposable, BoxDisposable, Disposable};

struct VirtualCore {
  clock: u64,
  queue: SchedulerQueue,
  next_seq: u64,
  enabled: bool,
}

/// A scheduler whose clock is a plain integer tick counter that only moves
/// when queued work is drained.
///
/// Scheduling at a due time at or before the current clock is clamped to
/// `clock + 1`: "now" is already in the past by the time the item lands in
/// the queue, and the strict step guarantees that a zero-delay recursive
/// reschedule makes forward progress instead of spinning at one instant.
///
/// Actions run outside the scheduler's internal lock, so an action is free
/// to schedule (or cancel) further work. A panic escaping an action
/// propagates out of [`start`](VirtualTimeScheduler::start) and halts the
/// drain; for tests that is the point — failures surface, they are not
/// swallowed.
///
/// For the [`Scheduler`] trait one tick equals one millisecond; the
/// tick-based inherent API is the primary surface and never converts.
#[derive(Clone)]
pub struct VirtualTimeScheduler {
  core: Arc<Mutex<VirtualCore>>,
}

impl Default for VirtualTimeScheduler {
  fn default() -> Self {
    Self {
      core: Arc::new(Mutex::new(VirtualCore {
        clock: 0,
        queue: SchedulerQueue::new(),
        next_seq: 0,
        enabled: false,
      })),
    }
  }
}

impl VirtualTimeScheduler {
  pub fn new() -> Self { Self::default() }

  /// Current logical time in ticks.
  pub fn clock(&self) -> u64 { self.core.lock().unwrap().clock }

  /// Number of queued work items.
  pub fn pending(&self) -> usize { self.core.lock().unwrap().queue.len() }

  /// Schedule work at an absolute tick. Due times at or before the current
  /// clock are clamped to `clock + 1`.
  pub fn schedule_absolute<F>(&self, due: u64, action: F) -> BoxDisposable
  where
    F: FnOnce() -> BoxDisposable + Send + 'static,
  {
    let mut core = self.core.lock().unwrap();
    let due = if due <= core.clock { core.clock + 1 } else { due };
    let seq = core.next_seq;
    core.next_seq += 1;
    let item = ScheduledItem::new(due, seq, Box::new(action));
    let handle = item.cancel_handle();
    core.queue.enqueue(item);
    drop(core);

    Box::new(QueuedWork { core: Arc::downgrade(&self.core), seq, handle })
  }

  /// Schedule work `delay` ticks from now.
  pub fn schedule_relative<F>(&self, delay: u64, action: F) -> BoxDisposable
  where
    F: FnOnce() -> BoxDisposable + Send + 'static,
  {
    let now = self.clock();
    self.schedule_absolute(now.saturating_add(delay), action)
  }

  /// Drain the queue to exhaustion (or until [`stop`]ped), advancing the
  /// clock to each item's due time before invoking it.
  ///
  /// [`stop`]: VirtualTimeScheduler::stop
  pub fn start(&self) {
    self.core.lock().unwrap().enabled = true;
    loop {
      let item = {
        let mut core = self.core.lock().unwrap();
        if !core.enabled {
          break;
        }
        match core.queue.dequeue() {
          Some(item) => {
            core.clock = core.clock.max(item.due_time());
            item
          }
          None => break,
        }
      };
      item.invoke();
    }
    self.core.lock().unwrap().enabled = false;
  }

  /// Ask a running [`start`](VirtualTimeScheduler::start) drain to halt
  /// after the current item.
  pub fn stop(&self) { self.core.lock().unwrap().enabled = false; }

  /// Run everything due up to and including `time`, then set the clock to
  /// `time`.
  ///
  /// # Panics
  ///
  /// Panics if `time` is in the past — virtual time never moves backwards.
  pub fn advance_to(&self, time: u64) {
    assert!(
      time >= self.clock(),
      "cannot advance virtual time backwards (clock {}, requested {})",
      self.clock(),
      time
    );
    loop {
      let item = {
        let mut core = self.core.lock().unwrap();
        match core.queue.peek() {
          Some(next) if next.due_time() <= time => {
            let item = core.queue.dequeue().expect("peeked item");
            core.clock = core.clock.max(item.due_time());
            item
          }
          _ => break,
        }
      };
      item.invoke();
    }
    let mut core = self.core.lock().unwrap();
    core.clock = core.clock.max(time);
  }

  /// Run everything due within the next `delta` ticks.
  pub fn advance_by(&self, delta: u64) {
    let target = self.clock().saturating_add(delta);
    self.advance_to(target);
  }

  /// Move the clock forward without running any queued work.
  pub fn sleep(&self, delta: u64) {
    let mut core = self.core.lock().unwrap();
    core.clock = core.clock.saturating_add(delta);
  }
}

impl Scheduler for VirtualTimeScheduler {
  fn now(&self) -> Duration { Duration::from_millis(self.clock()) }

  fn schedule<F>(&self, action: F) -> BoxDisposable
  where
    F: FnOnce() + Send + 'static,
  {
    self.schedule_relative(0, move || {
      action();
      disposable::empty()
    })
  }

  fn schedule_after<F>(&self, delay: Duration, action: F) -> BoxDisposable
  where
    F: FnOnce() + Send + 'static,
  {
    self.schedule_relative(delay.as_millis() as u64, move || {
      action();
      disposable::empty()
    })
  }

  fn schedule_at<F>(&self, due: Duration, action: F) -> BoxDisposable
  where
    F: FnOnce() + Send + 'static,
  {
    self.schedule_absolute(due.as_millis() as u64, move || {
      action();
      disposable::empty()
    })
  }

  fn periodic(&self) -> Option<&dyn PeriodicScheduler> { Some(self) }
}

impl PeriodicScheduler for VirtualTimeScheduler {
  fn schedule_periodic(&self, period: Duration, tick: Box<dyn FnMut() + Send>) -> BoxDisposable {
    let stop = BooleanDisposable::new();
    let period = period.as_millis() as u64;
    schedule_tick(self.clone(), period, Arc::new(Mutex::new(tick)), stop.clone());
    Box::new(stop)
  }
}

fn schedule_tick(
  scheduler: VirtualTimeScheduler, period: u64, tick: Arc<Mutex<Box<dyn FnMut() + Send>>>,
  stop: BooleanDisposable,
) {
  scheduler.clone().schedule_relative(period, move || {
    if stop.is_disposed() {
      return disposable::empty();
    }
    (tick.lock().unwrap())();
    schedule_tick(scheduler, period, tick, stop);
    disposable::empty()
  });
}

/// Cancellation handle for a queued virtual-time item: disposing removes
/// the item from the queue before it can run, and tears down whatever an
/// already-run action returned.
struct QueuedWork {
  core: Weak<Mutex<VirtualCore>>,
  seq: u64,
  handle: crate::disposable::SingleAssignmentDisposable,
}

impl Disposable for QueuedWork {
  fn dispose(&self) {
    self.handle.dispose();
    if let Some(core) = self.core.upgrade() {
      core.lock().unwrap().queue.remove(self.seq);
    }
  }

  fn is_disposed(&self) -> bool { self.handle.is_disposed() }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicU64, Ordering};

  use super::*;

  #[test]
  fn clock_advances_to_each_due_time_in_order() {
    let scheduler = VirtualTimeScheduler::new();
    let order = Arc::new(Mutex::new(Vec::new()));

    for (due, label) in [(300u64, "c"), (100, "a"), (200, "b")] {
      let order = order.clone();
      let s = scheduler.clone();
      scheduler.schedule_absolute(due, move || {
        order.lock().unwrap().push((s.clock(), label));
        disposable::empty()
      });
    }

    scheduler.start();
    assert_eq!(*order.lock().unwrap(), vec![(100, "a"), (200, "b"), (300, "c")]);
  }

  #[test]
  fn past_due_times_are_clamped_strictly_forward() {
    let scheduler = VirtualTimeScheduler::new();
    scheduler.sleep(50);

    let observed = Arc::new(AtomicU64::new(0));
    let o = observed.clone();
    let s = scheduler.clone();
    scheduler.schedule_absolute(10, move || {
      o.store(s.clock(), Ordering::SeqCst);
      disposable::empty()
    });

    scheduler.start();
    assert_eq!(observed.load(Ordering::SeqCst), 51);
  }

  #[test]
  fn zero_delay_recursive_reschedule_makes_progress() {
    let scheduler = VirtualTimeScheduler::new();
    let times = Arc::new(Mutex::new(Vec::new()));

    fn bounce(scheduler: VirtualTimeScheduler, times: Arc<Mutex<Vec<u64>>>, left: u32) {
      if left == 0 {
        return;
      }
      let s = scheduler.clone();
      scheduler.clone().schedule_relative(0, move || {
        times.lock().unwrap().push(s.clock());
        bounce(s.clone(), times, left - 1);
        disposable::empty()
      });
    }

    bounce(scheduler.clone(), times.clone(), 3);
    scheduler.start();
    assert_eq!(*times.lock().unwrap(), vec![1, 2, 3]);
  }

  #[test]
  fn trait_level_absolute_scheduling_uses_the_virtual_clock() {
    let scheduler = VirtualTimeScheduler::new();
    let observed = Arc::new(AtomicU64::new(0));

    {
      let o = observed.clone();
      let s = scheduler.clone();
      Scheduler::schedule_at(&scheduler, Duration::from_millis(40), move || {
        o.store(s.clock(), Ordering::SeqCst);
      });
    }
    scheduler.start();
    assert_eq!(observed.load(Ordering::SeqCst), 40);

    // Past-due absolute times get the same strict forward clamp.
    scheduler.sleep(10);
    {
      let o = observed.clone();
      let s = scheduler.clone();
      Scheduler::schedule_at(&scheduler, Duration::from_millis(5), move || {
        o.store(s.clock(), Ordering::SeqCst);
      });
    }
    scheduler.start();
    assert_eq!(observed.load(Ordering::SeqCst), 51);
  }

  #[test]
  fn cancelled_work_is_removed_before_it_runs() {
    let scheduler = VirtualTimeScheduler::new();
    let ran = Arc::new(AtomicU64::new(0));
    let r = ran.clone();

    let handle = scheduler.schedule_absolute(100, move || {
      r.fetch_add(1, Ordering::SeqCst);
      disposable::empty()
    });

    assert_eq!(scheduler.pending(), 1);
    handle.dispose();
    assert_eq!(scheduler.pending(), 0);

    scheduler.start();
    assert_eq!(ran.load(Ordering::SeqCst), 0);
  }

  #[test]
  fn advance_to_runs_only_due_work() {
    let scheduler = VirtualTimeScheduler::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    for due in [50u64, 150] {
      let log = log.clone();
      scheduler.schedule_absolute(due, move || {
        log.lock().unwrap().push(due);
        disposable::empty()
      });
    }

    scheduler.advance_to(100);
    assert_eq!(*log.lock().unwrap(), vec![50]);
    assert_eq!(scheduler.clock(), 100);

    scheduler.advance_by(50);
    assert_eq!(*log.lock().unwrap(), vec![50, 150]);
    assert_eq!(scheduler.clock(), 150);
  }

  #[test]
  #[should_panic(expected = "cannot advance virtual time backwards")]
  fn advance_to_the_past_panics() {
    let scheduler = VirtualTimeScheduler::new();
    scheduler.sleep(100);
    scheduler.advance_to(10);
  }

  #[test]
  fn stop_halts_the_drain() {
    let scheduler = VirtualTimeScheduler::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    {
      let log = log.clone();
      let s = scheduler.clone();
      scheduler.schedule_absolute(1, move || {
        log.lock().unwrap().push(1);
        s.stop();
        disposable::empty()
      });
    }
    {
      let log = log.clone();
      scheduler.schedule_absolute(2, move || {
        log.lock().unwrap().push(2);
        disposable::empty()
      });
    }

    scheduler.start();
    assert_eq!(*log.lock().unwrap(), vec![1]);

    scheduler.start();
    assert_eq!(*log.lock().unwrap(), vec![1, 2]);
  }

  #[test]
  fn periodic_ticks_until_cancelled() {
    let scheduler = VirtualTimeScheduler::new();
    let ticks = Arc::new(AtomicU64::new(0));
    let t = ticks.clone();

    let subscription =
      PeriodicScheduler::schedule_periodic(&scheduler, Duration::from_millis(10), {
        Box::new(move || {
          t.fetch_add(1, Ordering::SeqCst);
        })
      });

    scheduler.advance_to(35);
    assert_eq!(ticks.load(Ordering::SeqCst), 3);

    subscription.dispose();
    scheduler.advance_to(100);
    assert_eq!(ticks.load(Ordering::SeqCst), 3);
  }
}

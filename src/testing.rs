//! Deterministic testing over virtual time.
//!
//! The harness turns timing-sensitive assertions into plain data
//! comparisons: sources are described as `(tick, notification)` pairs, a
//! [`TestScheduler`] replays them over its virtual clock, and a
//! [`MockObserver`] stamps everything it receives with the tick it arrived
//! at. A test then compares two `Vec`s.

use std::sync::{Arc, Mutex};

use crate::notification::Notification;

mod cold_observable;
mod hot_observable;
mod mock_observer;
mod test_scheduler;

pub use cold_observable::ColdObservable;
pub use hot_observable::HotObservable;
pub use mock_observer::MockObserver;
pub use test_scheduler::{TestScheduler, CREATED, DISPOSED, SUBSCRIBED};

/// A notification stamped with the virtual tick at which it occurred.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Recorded<Item, Err> {
  pub time: u64,
  pub value: Notification<Item, Err>,
}

impl<Item, Err> Recorded<Item, Err> {
  pub fn new(time: u64, value: Notification<Item, Err>) -> Self { Self { time, value } }
}

/// `Next(value)` at `time`.
pub fn on_next<Item, Err>(time: u64, value: Item) -> Recorded<Item, Err> {
  Recorded::new(time, Notification::Next(value))
}

/// `Error(err)` at `time`.
pub fn on_error<Item, Err>(time: u64, err: Err) -> Recorded<Item, Err> {
  Recorded::new(time, Notification::Error(err))
}

/// `Completed` at `time`.
pub fn on_completed<Item, Err>(time: u64) -> Recorded<Item, Err> {
  Recorded::new(time, Notification::Completed)
}

/// Sentinel unsubscribe tick for a subscription that was never disposed.
pub const INFINITE: u64 = u64::MAX;

/// The lifetime of one subscription, in virtual ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Subscription {
  pub subscribe: u64,
  pub unsubscribe: u64,
}

impl Subscription {
  /// A subscription that is still open.
  pub fn new(subscribe: u64) -> Self { Self { subscribe, unsubscribe: INFINITE } }

  /// A subscription disposed at `unsubscribe`.
  pub fn finite(subscribe: u64, unsubscribe: u64) -> Self { Self { subscribe, unsubscribe } }

  pub fn is_open(&self) -> bool { self.unsubscribe == INFINITE }
}

/// Shared log of subscription windows, stamped as they open and close.
pub(crate) type SubscriptionLog = Arc<Mutex<Vec<Subscription>>>;

pub(crate) fn open_window(log: &SubscriptionLog, at: u64) -> usize {
  let mut log = log.lock().unwrap();
  log.push(Subscription::new(at));
  log.len() - 1
}

pub(crate) fn close_window(log: &SubscriptionLog, index: usize, at: u64) {
  log.lock().unwrap()[index].unsubscribe = at;
}

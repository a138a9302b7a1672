use std::sync::{Arc, Mutex};

use super::Recorded;
use crate::{notification::Notification, observer::Observer, scheduler::VirtualTimeScheduler};

/// An observer that stamps every notification with the virtual tick at
/// which it arrived.
pub struct MockObserver<Item, Err> {
  clock: VirtualTimeScheduler,
  messages: Arc<Mutex<Vec<Recorded<Item, Err>>>>,
}

impl<Item, Err> Clone for MockObserver<Item, Err> {
  fn clone(&self) -> Self {
    Self { clock: self.clock.clone(), messages: self.messages.clone() }
  }
}

impl<Item, Err> MockObserver<Item, Err> {
  pub fn new(scheduler: &VirtualTimeScheduler) -> Self {
    Self { clock: scheduler.clone(), messages: Arc::new(Mutex::new(Vec::new())) }
  }

  /// Everything recorded so far, in arrival order.
  pub fn messages(&self) -> Vec<Recorded<Item, Err>>
  where
    Item: Clone,
    Err: Clone,
  {
    self.messages.lock().unwrap().clone()
  }

  fn record(&self, value: Notification<Item, Err>) {
    let time = self.clock.clock();
    self.messages.lock().unwrap().push(Recorded { time, value });
  }
}

impl<Item, Err> Observer<Item, Err> for MockObserver<Item, Err> {
  fn on_next(&mut self, value: Item) { self.record(Notification::Next(value)); }

  fn on_error(&mut self, err: Err) { self.record(Notification::Error(err)); }

  fn on_completed(&mut self) { self.record(Notification::Completed); }
}

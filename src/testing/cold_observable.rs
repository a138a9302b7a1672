use std::sync::{Arc, Mutex};

use super::{close_window, open_window, Recorded, Subscription, SubscriptionLog};
use crate::{
  disposable::{self, ActionDisposable, BoxDisposable, CompositeDisposable, Disposable},
  observable::Observable,
  observer::Observer,
  scheduler::VirtualTimeScheduler,
};

/// A test source whose timeline is relative to each subscription.
///
/// Every subscriber gets its own private replay: a message recorded at
/// tick `t` arrives `t` ticks after that subscriber's subscribe time.
pub struct ColdObservable<Item, Err> {
  messages: Arc<Vec<Recorded<Item, Err>>>,
  scheduler: VirtualTimeScheduler,
  subscriptions: SubscriptionLog,
}

impl<Item, Err> Clone for ColdObservable<Item, Err> {
  fn clone(&self) -> Self {
    Self {
      messages: self.messages.clone(),
      scheduler: self.scheduler.clone(),
      subscriptions: self.subscriptions.clone(),
    }
  }
}

impl<Item, Err> ColdObservable<Item, Err> {
  pub fn new(scheduler: &VirtualTimeScheduler, messages: Vec<Recorded<Item, Err>>) -> Self {
    Self {
      messages: Arc::new(messages),
      scheduler: scheduler.clone(),
      subscriptions: Arc::new(Mutex::new(Vec::new())),
    }
  }

  /// Every subscription window opened against this source.
  pub fn subscriptions(&self) -> Vec<Subscription> { self.subscriptions.lock().unwrap().clone() }
}

impl<Item, Err> Observable<Item, Err> for ColdObservable<Item, Err>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
{
  fn subscribe<O>(&self, observer: O) -> BoxDisposable
  where
    O: Observer<Item, Err> + Send + 'static,
  {
    let index = open_window(&self.subscriptions, self.scheduler.clock());
    let observer = Arc::new(Mutex::new(observer));
    let pending = CompositeDisposable::new();

    for Recorded { time, value } in self.messages.iter() {
      let observer = observer.clone();
      let value = value.clone();
      pending.add_boxed(self.scheduler.schedule_relative(*time, move || {
        value.accept(&mut *observer.lock().unwrap());
        disposable::empty()
      }));
    }

    let log = self.subscriptions.clone();
    let clock = self.scheduler.clone();
    Box::new(ActionDisposable::new(move || {
      pending.dispose();
      close_window(&log, index, clock.clock());
    }))
  }
}

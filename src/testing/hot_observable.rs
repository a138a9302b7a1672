use std::sync::{Arc, Mutex};

use super::{close_window, open_window, Recorded, Subscription, SubscriptionLog};
use crate::{
  disposable::{self, ActionDisposable, BoxDisposable},
  notification::Notification,
  observable::Observable,
  observer::Observer,
  scheduler::VirtualTimeScheduler,
};

type SharedObserver<Item, Err> = Arc<Mutex<Box<dyn Observer<Item, Err> + Send>>>;

struct HotCore<Item, Err> {
  observers: Vec<(u64, SharedObserver<Item, Err>)>,
  next_id: u64,
}

/// A test source that plays its timeline on the wall, whether anyone is
/// subscribed or not.
///
/// Each recorded message is scheduled at its absolute tick when the
/// observable is created; a subscriber only receives the notifications
/// whose ticks fall inside its subscription window. Delivery happens
/// after the subscriber table lock is released, so an observer may
/// dispose its own subscription from inside a callback.
pub struct HotObservable<Item, Err> {
  core: Arc<Mutex<HotCore<Item, Err>>>,
  scheduler: VirtualTimeScheduler,
  subscriptions: SubscriptionLog,
}

impl<Item, Err> Clone for HotObservable<Item, Err> {
  fn clone(&self) -> Self {
    Self {
      core: self.core.clone(),
      scheduler: self.scheduler.clone(),
      subscriptions: self.subscriptions.clone(),
    }
  }
}

impl<Item, Err> HotObservable<Item, Err>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
{
  pub fn new(scheduler: &VirtualTimeScheduler, messages: Vec<Recorded<Item, Err>>) -> Self {
    let hot = Self {
      core: Arc::new(Mutex::new(HotCore { observers: Vec::new(), next_id: 0 })),
      scheduler: scheduler.clone(),
      subscriptions: Arc::new(Mutex::new(Vec::new())),
    };
    for Recorded { time, value } in messages {
      let core = hot.core.clone();
      scheduler.schedule_absolute(time, move || {
        broadcast(&core, &value);
        disposable::empty()
      });
    }
    hot
  }

  /// Every subscription window opened against this source.
  pub fn subscriptions(&self) -> Vec<Subscription> { self.subscriptions.lock().unwrap().clone() }
}

fn broadcast<Item, Err>(core: &Arc<Mutex<HotCore<Item, Err>>>, value: &Notification<Item, Err>)
where
  Item: Clone,
  Err: Clone,
{
  let targets: Vec<SharedObserver<Item, Err>> = {
    let core = core.lock().unwrap();
    core.observers.iter().map(|(_, observer)| observer.clone()).collect()
  };
  for observer in targets {
    let mut observer = observer.lock().unwrap();
    match value {
      Notification::Next(v) => observer.on_next(v.clone()),
      Notification::Error(e) => observer.on_error(e.clone()),
      Notification::Completed => observer.on_completed(),
    }
  }
}

impl<Item, Err> Observable<Item, Err> for HotObservable<Item, Err>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
{
  fn subscribe<O>(&self, observer: O) -> BoxDisposable
  where
    O: Observer<Item, Err> + Send + 'static,
  {
    let id = {
      let mut core = self.core.lock().unwrap();
      let id = core.next_id;
      core.next_id += 1;
      let shared: SharedObserver<Item, Err> = Arc::new(Mutex::new(Box::new(observer)));
      core.observers.push((id, shared));
      id
    };
    let index = open_window(&self.subscriptions, self.scheduler.clock());

    let core = Arc::downgrade(&self.core);
    let log = self.subscriptions.clone();
    let clock = self.scheduler.clone();
    Box::new(ActionDisposable::new(move || {
      if let Some(core) = core.upgrade() {
        let mut core = core.lock().unwrap();
        if let Some(pos) = core.observers.iter().position(|(k, _)| *k == id) {
          core.observers.remove(pos);
        }
      }
      close_window(&log, index, clock.clock());
    }))
  }
}

use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{ColdObservable, HotObservable, MockObserver, Recorded};
use crate::{
  disposable::{self, BoxDisposable, Disposable},
  observable::Observable,
  scheduler::{PeriodicScheduler, Scheduler, VirtualTimeScheduler},
};

/// Default tick at which [`TestScheduler::start_with`] calls the source
/// factory.
pub const CREATED: u64 = 100;
/// Default tick at which the subscription is made.
pub const SUBSCRIBED: u64 = 200;
/// Default tick at which the subscription is disposed.
pub const DISPOSED: u64 = 1000;

/// A virtual-time scheduler with factories for recorded test sources and a
/// canned create / subscribe / dispose lifecycle.
#[derive(Clone, Default)]
pub struct TestScheduler {
  scheduler: VirtualTimeScheduler,
}

impl TestScheduler {
  pub fn new() -> Self { Self::default() }

  /// The underlying virtual scheduler, e.g. to hand to code under test.
  pub fn scheduler(&self) -> &VirtualTimeScheduler { &self.scheduler }

  pub fn clock(&self) -> u64 { self.scheduler.clock() }

  pub fn advance_to(&self, time: u64) { self.scheduler.advance_to(time); }

  pub fn advance_by(&self, delta: u64) { self.scheduler.advance_by(delta); }

  pub fn sleep(&self, delta: u64) { self.scheduler.sleep(delta); }

  /// Drain the queue to exhaustion without the canned lifecycle.
  pub fn start(&self) { self.scheduler.start(); }

  pub fn stop(&self) { self.scheduler.stop(); }

  pub fn schedule_absolute<F>(&self, due: u64, action: F) -> BoxDisposable
  where
    F: FnOnce() -> BoxDisposable + Send + 'static,
  {
    self.scheduler.schedule_absolute(due, action)
  }

  pub fn schedule_relative<F>(&self, delay: u64, action: F) -> BoxDisposable
  where
    F: FnOnce() -> BoxDisposable + Send + 'static,
  {
    self.scheduler.schedule_relative(delay, action)
  }

  /// A source that plays `messages` at their absolute ticks regardless of
  /// subscribers.
  pub fn create_hot_observable<Item, Err>(
    &self, messages: Vec<Recorded<Item, Err>>,
  ) -> HotObservable<Item, Err>
  where
    Item: Clone + Send + 'static,
    Err: Clone + Send + 'static,
  {
    HotObservable::new(&self.scheduler, messages)
  }

  /// A source that replays `messages` relative to each subscription.
  pub fn create_cold_observable<Item, Err>(
    &self, messages: Vec<Recorded<Item, Err>>,
  ) -> ColdObservable<Item, Err>
  where
    Item: Clone + Send + 'static,
    Err: Clone + Send + 'static,
  {
    ColdObservable::new(&self.scheduler, messages)
  }

  /// An observer that stamps arrivals with this scheduler's clock.
  pub fn create_observer<Item, Err>(&self) -> MockObserver<Item, Err> {
    MockObserver::new(&self.scheduler)
  }

  /// Run the canonical lifecycle: call `create` at `created`, subscribe a
  /// fresh observer at `subscribed`, dispose at `disposed`, and drain the
  /// queue to exhaustion. Returns the observer with everything it saw.
  pub fn start_with_timing<Item, Err, Source, Create>(
    &self, create: Create, created: u64, subscribed: u64, disposed: u64,
  ) -> MockObserver<Item, Err>
  where
    Item: Clone + Send + 'static,
    Err: Clone + Send + 'static,
    Source: Observable<Item, Err> + Send + 'static,
    Create: FnOnce() -> Source + Send + 'static,
  {
    let observer = self.create_observer();
    let source: Arc<Mutex<Option<Source>>> = Arc::new(Mutex::new(None));
    let subscription: Arc<Mutex<Option<BoxDisposable>>> = Arc::new(Mutex::new(None));

    {
      let source = source.clone();
      self.scheduler.schedule_absolute(created, move || {
        *source.lock().unwrap() = Some(create());
        disposable::empty()
      });
    }
    {
      let source = source.clone();
      let subscription = subscription.clone();
      let observer = observer.clone();
      self.scheduler.schedule_absolute(subscribed, move || {
        let source = source.lock().unwrap();
        if let Some(source) = source.as_ref() {
          *subscription.lock().unwrap() = Some(source.subscribe(observer));
        }
        disposable::empty()
      });
    }
    {
      let subscription = subscription.clone();
      self.scheduler.schedule_absolute(disposed, move || {
        if let Some(subscription) = subscription.lock().unwrap().take() {
          subscription.dispose();
        }
        disposable::empty()
      });
    }

    self.scheduler.start();
    observer
  }

  /// [`start_with_timing`](TestScheduler::start_with_timing) with the
  /// default 100 / 200 / 1000 lifecycle.
  pub fn start_with<Item, Err, Source, Create>(&self, create: Create) -> MockObserver<Item, Err>
  where
    Item: Clone + Send + 'static,
    Err: Clone + Send + 'static,
    Source: Observable<Item, Err> + Send + 'static,
    Create: FnOnce() -> Source + Send + 'static,
  {
    self.start_with_timing(create, CREATED, SUBSCRIBED, DISPOSED)
  }
}

impl Scheduler for TestScheduler {
  fn now(&self) -> Duration { self.scheduler.now() }

  fn schedule<F>(&self, action: F) -> BoxDisposable
  where
    F: FnOnce() + Send + 'static,
  {
    self.scheduler.schedule(action)
  }

  fn schedule_after<F>(&self, delay: Duration, action: F) -> BoxDisposable
  where
    F: FnOnce() + Send + 'static,
  {
    self.scheduler.schedule_after(delay, action)
  }

  fn schedule_at<F>(&self, due: Duration, action: F) -> BoxDisposable
  where
    F: FnOnce() + Send + 'static,
  {
    self.scheduler.schedule_at(due, action)
  }

  fn periodic(&self) -> Option<&dyn PeriodicScheduler> { Some(&self.scheduler) }
}

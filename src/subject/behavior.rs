use std::sync::{Arc, Mutex};

use super::{
  deliver_completed, deliver_error, deliver_next, ArenaSubscription, ObserverArena, Registry,
  SubjectState,
};
use crate::{
  disposable::{self, BoxDisposable},
  observable::Observable,
  observer::Observer,
};

struct BehaviorCore<Item, Err> {
  registry: Registry<Item, Err>,
  value: Item,
}

impl<Item, Err> ObserverArena for BehaviorCore<Item, Err> {
  fn remove_observer(&mut self, id: u64) { self.registry.remove(id); }
}

/// A subject that remembers the latest value and starts every subscriber
/// with it.
///
/// Subscribing delivers the current value before anything newer reaches
/// the subscriber, so a consumer never observes a gap between "what is the
/// value now" and "tell me when it changes".
pub struct BehaviorSubject<Item, Err> {
  core: Arc<Mutex<BehaviorCore<Item, Err>>>,
}

impl<Item, Err> Clone for BehaviorSubject<Item, Err> {
  fn clone(&self) -> Self { Self { core: self.core.clone() } }
}

impl<Item, Err> BehaviorSubject<Item, Err> {
  pub fn new(initial: Item) -> Self {
    Self {
      core: Arc::new(Mutex::new(BehaviorCore { registry: Registry::default(), value: initial })),
    }
  }

  /// The latest value the subject has seen.
  pub fn value(&self) -> Item
  where
    Item: Clone,
  {
    self.core.lock().unwrap().value.clone()
  }

  pub fn observer_count(&self) -> usize { self.core.lock().unwrap().registry.len() }
}

impl<Item, Err> Observer<Item, Err> for BehaviorSubject<Item, Err>
where
  Item: Clone,
  Err: Clone,
{
  fn on_next(&mut self, value: Item) {
    let targets = {
      let mut core = self.core.lock().unwrap();
      if !core.registry.is_active() {
        return;
      }
      core.value = value.clone();
      core.registry.snapshot()
    };
    deliver_next(targets, value);
  }

  fn on_error(&mut self, err: Err) {
    let targets = {
      let mut core = self.core.lock().unwrap();
      if !core.registry.is_active() {
        return;
      }
      core.registry.settle(SubjectState::Errored(err.clone()))
    };
    deliver_error(targets, err);
  }

  fn on_completed(&mut self) {
    let targets = {
      let mut core = self.core.lock().unwrap();
      if !core.registry.is_active() {
        return;
      }
      core.registry.settle(SubjectState::Completed)
    };
    deliver_completed(targets);
  }
}

impl<Item, Err> Observable<Item, Err> for BehaviorSubject<Item, Err>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
{
  fn subscribe<O>(&self, observer: O) -> BoxDisposable
  where
    O: Observer<Item, Err> + Send + 'static,
  {
    let mut observer = observer;
    let mut core = self.core.lock().unwrap();
    match core.registry.state.clone() {
      SubjectState::Active => {
        let value = core.value.clone();
        let (id, shared) = core.registry.add(Box::new(observer));
        drop(core);
        // The per-subscriber gate keeps the seed ahead of live values.
        shared.lock().unwrap().on_next(value);
        Box::new(ArenaSubscription::register(&self.core, id))
      }
      SubjectState::Completed => {
        let value = core.value.clone();
        drop(core);
        observer.on_next(value);
        observer.on_completed();
        disposable::empty()
      }
      SubjectState::Errored(err) => {
        drop(core);
        observer.on_error(err);
        disposable::empty()
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{notification::Notification, subject::test_support::Recorder};

  #[test]
  fn subscriber_starts_with_the_current_value() {
    let subject: BehaviorSubject<i32, &str> = BehaviorSubject::new(0);
    let mut producer = subject.clone();
    producer.on_next(5);

    let (observer, events) = Recorder::new();
    subject.subscribe(observer);
    producer.on_next(6);

    assert_eq!(
      *events.lock().unwrap(),
      vec![Notification::Next(5), Notification::Next(6)]
    );
    assert_eq!(subject.value(), 6);
  }

  #[test]
  fn completed_subject_replays_value_then_completes() {
    let subject: BehaviorSubject<i32, &str> = BehaviorSubject::new(1);
    let mut producer = subject.clone();
    producer.on_next(2);
    producer.on_completed();

    let (observer, events) = Recorder::new();
    subject.subscribe(observer);
    assert_eq!(
      *events.lock().unwrap(),
      vec![Notification::Next(2), Notification::Completed]
    );
  }

  #[test]
  fn errored_subject_delivers_only_the_error() {
    let subject: BehaviorSubject<i32, &str> = BehaviorSubject::new(1);
    let mut producer = subject.clone();
    producer.on_error("boom");

    let (observer, events) = Recorder::new();
    subject.subscribe(observer);
    assert_eq!(*events.lock().unwrap(), vec![Notification::Error("boom")]);
  }
}

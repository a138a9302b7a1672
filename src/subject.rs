//! Subjects: combined observer + observable that multicast to a dynamic
//! set of subscribers.
//!
//! Every subject owns one mutex guarding its subscriber table and cached
//! state, but never delivers a notification while holding it: producers
//! snapshot the current subscribers and deliver through per-subscriber
//! gates after the table lock is released. An observer is therefore free
//! to dispose subscriptions — its own included — from inside a callback.
//! The table is an arena keyed by generated ids; the disposable handed
//! back from `subscribe` captures only the id and a weak back-reference,
//! never a strong cycle through the subject.

use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc, Mutex, Weak,
};

mod async_subject;
mod behavior;
mod replay;

pub use async_subject::AsyncSubject;
pub use behavior::BehaviorSubject;
pub use replay::ReplaySubject;

use crate::{
  disposable::{self, BoxDisposable, Disposable},
  observable::Observable,
  observer::Observer,
};

pub(crate) type BoxObserver<Item, Err> = Box<dyn Observer<Item, Err> + Send>;
pub(crate) type SharedObserver<Item, Err> = Arc<Mutex<BoxObserver<Item, Err>>>;

/// Where a subject is in the observable grammar.
#[derive(Clone)]
pub(crate) enum SubjectState<Err> {
  Active,
  Completed,
  Errored(Err),
}

/// Id-keyed arena of live subscribers plus the latched terminal state.
pub(crate) struct Registry<Item, Err> {
  entries: Vec<(u64, SharedObserver<Item, Err>)>,
  next_id: u64,
  pub(crate) state: SubjectState<Err>,
}

impl<Item, Err> Default for Registry<Item, Err> {
  fn default() -> Self { Self { entries: Vec::new(), next_id: 0, state: SubjectState::Active } }
}

impl<Item, Err> Registry<Item, Err> {
  pub(crate) fn is_active(&self) -> bool { matches!(self.state, SubjectState::Active) }

  pub(crate) fn add(&mut self, observer: BoxObserver<Item, Err>) -> (u64, SharedObserver<Item, Err>) {
    let id = self.next_id;
    self.next_id += 1;
    let shared = Arc::new(Mutex::new(observer));
    self.entries.push((id, shared.clone()));
    (id, shared)
  }

  pub(crate) fn remove(&mut self, id: u64) {
    if let Some(pos) = self.entries.iter().position(|(k, _)| *k == id) {
      self.entries.remove(pos);
    }
  }

  pub(crate) fn len(&self) -> usize { self.entries.len() }

  /// Current subscribers, cloned out so delivery can happen after the
  /// registry lock is released.
  pub(crate) fn snapshot(&self) -> Vec<SharedObserver<Item, Err>> {
    self.entries.iter().map(|(_, observer)| observer.clone()).collect()
  }

  /// Latch the terminal state and hand the subscribers over for one final
  /// delivery outside the lock.
  pub(crate) fn settle(&mut self, state: SubjectState<Err>) -> Vec<SharedObserver<Item, Err>> {
    self.state = state;
    self.entries.drain(..).map(|(_, observer)| observer).collect()
  }
}

/// Deliver a value to a snapshot of subscribers; the last one receives the
/// moved value instead of a clone.
pub(crate) fn deliver_next<Item, Err>(targets: Vec<SharedObserver<Item, Err>>, value: Item)
where
  Item: Clone,
{
  if let Some((last, rest)) = targets.split_last() {
    for observer in rest {
      observer.lock().unwrap().on_next(value.clone());
    }
    last.lock().unwrap().on_next(value);
  }
}

pub(crate) fn deliver_error<Item, Err>(targets: Vec<SharedObserver<Item, Err>>, err: Err)
where
  Err: Clone,
{
  if let Some((last, rest)) = targets.split_last() {
    for observer in rest {
      observer.lock().unwrap().on_error(err.clone());
    }
    last.lock().unwrap().on_error(err);
  }
}

pub(crate) fn deliver_completed<Item, Err>(targets: Vec<SharedObserver<Item, Err>>) {
  for observer in targets {
    observer.lock().unwrap().on_completed();
  }
}

/// Access trait letting one subscription type serve every subject flavor.
pub(crate) trait ObserverArena {
  fn remove_observer(&mut self, id: u64);
}

impl<Item, Err> ObserverArena for Registry<Item, Err> {
  fn remove_observer(&mut self, id: u64) { self.remove(id); }
}

/// The disposable returned from a subject subscription: an id and a weak
/// back-reference — dropping the subject releases everything regardless of
/// outstanding subscriptions.
pub(crate) struct ArenaSubscription<A> {
  arena: Weak<Mutex<A>>,
  id: u64,
  disposed: AtomicBool,
}

impl<A> ArenaSubscription<A> {
  pub(crate) fn register(arena: &Arc<Mutex<A>>, id: u64) -> Self {
    Self { arena: Arc::downgrade(arena), id, disposed: AtomicBool::new(false) }
  }
}

impl<A: ObserverArena> Disposable for ArenaSubscription<A> {
  fn dispose(&self) {
    if self.disposed.swap(true, Ordering::AcqRel) {
      return;
    }
    if let Some(arena) = self.arena.upgrade() {
      arena.lock().unwrap().remove_observer(self.id);
    }
  }

  fn is_disposed(&self) -> bool { self.disposed.load(Ordering::Acquire) }
}

/// The plain multicast subject: no caching, subscribers only see what is
/// emitted while they are subscribed.
pub struct Subject<Item, Err> {
  core: Arc<Mutex<Registry<Item, Err>>>,
}

impl<Item, Err> Default for Subject<Item, Err> {
  fn default() -> Self { Self { core: Arc::new(Mutex::new(Registry::default())) } }
}

impl<Item, Err> Clone for Subject<Item, Err> {
  fn clone(&self) -> Self { Self { core: self.core.clone() } }
}

impl<Item, Err> Subject<Item, Err> {
  pub fn new() -> Self { Self::default() }

  pub fn observer_count(&self) -> usize { self.core.lock().unwrap().len() }

  pub fn has_observers(&self) -> bool { self.observer_count() > 0 }
}

impl<Item, Err> Observer<Item, Err> for Subject<Item, Err>
where
  Item: Clone,
  Err: Clone,
{
  fn on_next(&mut self, value: Item) {
    let targets = {
      let core = self.core.lock().unwrap();
      if !core.is_active() {
        return;
      }
      core.snapshot()
    };
    deliver_next(targets, value);
  }

  fn on_error(&mut self, err: Err) {
    let targets = {
      let mut core = self.core.lock().unwrap();
      if !core.is_active() {
        return;
      }
      core.settle(SubjectState::Errored(err.clone()))
    };
    deliver_error(targets, err);
  }

  fn on_completed(&mut self) {
    let targets = {
      let mut core = self.core.lock().unwrap();
      if !core.is_active() {
        return;
      }
      core.settle(SubjectState::Completed)
    };
    deliver_completed(targets);
  }
}

impl<Item, Err> Observable<Item, Err> for Subject<Item, Err>
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
    match core.state.clone() {
      SubjectState::Active => {
        let (id, _) = core.add(Box::new(observer));
        drop(core);
        Box::new(ArenaSubscription::register(&self.core, id))
      }
      SubjectState::Completed => {
        drop(core);
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
  use super::{test_support::Recorder, *};
  use crate::{notification::Notification, observer::AnonymousObserver};

  #[test]
  fn multicasts_in_subscription_order() {
    let subject: Subject<i32, &str> = Subject::new();
    let (first, first_events) = Recorder::new();
    let (second, second_events) = Recorder::new();

    subject.subscribe(first);
    let mut producer = subject.clone();
    producer.on_next(1);

    subject.subscribe(second);
    producer.on_next(2);
    producer.on_completed();

    assert_eq!(
      *first_events.lock().unwrap(),
      vec![Notification::Next(1), Notification::Next(2), Notification::Completed]
    );
    assert_eq!(
      *second_events.lock().unwrap(),
      vec![Notification::Next(2), Notification::Completed]
    );
  }

  #[test]
  fn unsubscribe_stops_delivery() {
    let subject: Subject<i32, &str> = Subject::new();
    let (observer, events) = Recorder::new();

    let subscription = subject.subscribe(observer);
    let mut producer = subject.clone();
    producer.on_next(1);
    subscription.dispose();
    producer.on_next(2);

    assert_eq!(*events.lock().unwrap(), vec![Notification::Next(1)]);
    assert!(!subject.has_observers());
  }

  #[test]
  fn disposing_own_subscription_inside_on_next_returns() {
    let subject: Subject<i32, &str> = Subject::new();
    let slot: Arc<Mutex<Option<BoxDisposable>>> = Arc::new(Mutex::new(None));
    let seen = Arc::new(Mutex::new(Vec::new()));

    let observer = AnonymousObserver::new(
      {
        let slot = slot.clone();
        let seen = seen.clone();
        move |v| {
          seen.lock().unwrap().push(v);
          // Take-one: cancel from inside the callback.
          if let Some(subscription) = slot.lock().unwrap().take() {
            subscription.dispose();
          }
        }
      },
      |_: &str| {},
      || {},
    );
    *slot.lock().unwrap() = Some(subject.subscribe(observer));

    let mut producer = subject.clone();
    producer.on_next(1);
    producer.on_next(2);

    assert_eq!(*seen.lock().unwrap(), vec![1]);
    assert!(!subject.has_observers());
  }

  #[test]
  fn late_subscriber_gets_cached_terminal() {
    let subject: Subject<i32, &str> = Subject::new();
    let mut producer = subject.clone();
    producer.on_error("boom");

    let (observer, events) = Recorder::new();
    let subscription = subject.subscribe(observer);
    assert_eq!(*events.lock().unwrap(), vec![Notification::Error("boom")]);
    assert!(subscription.is_disposed());
  }

  #[test]
  fn emissions_after_terminal_are_dropped() {
    let subject: Subject<i32, &str> = Subject::new();
    let (observer, events) = Recorder::new();
    subject.subscribe(observer);

    let mut producer = subject.clone();
    producer.on_completed();
    producer.on_next(1);
    producer.on_error("late");

    assert_eq!(*events.lock().unwrap(), vec![Notification::Completed]);
  }

  #[test]
  fn subscription_outliving_the_subject_is_inert() {
    let subject: Subject<i32, &str> = Subject::new();
    let (observer, _events) = Recorder::new();
    let subscription = subject.subscribe(observer);
    drop(subject);
    subscription.dispose();
  }
}

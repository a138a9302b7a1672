use std::sync::{Arc, Mutex};

use super::{deliver_error, ArenaSubscription, ObserverArena, Registry, SubjectState};
use crate::{
  disposable::{self, BoxDisposable},
  observable::Observable,
  observer::Observer,
};

struct AsyncCore<Item, Err> {
  registry: Registry<Item, Err>,
  last: Option<Item>,
}

impl<Item, Err> ObserverArena for AsyncCore<Item, Err> {
  fn remove_observer(&mut self, id: u64) { self.registry.remove(id); }
}

/// A subject that holds back everything until completion, then emits only
/// the final value.
///
/// Values overwrite a single slot; nothing reaches subscribers until
/// `on_completed`, at which point the last value (if any) and the
/// completion are delivered. An error discards the slot and is delivered
/// alone. Late subscribers get the same sequence from the cache.
pub struct AsyncSubject<Item, Err> {
  core: Arc<Mutex<AsyncCore<Item, Err>>>,
}

impl<Item, Err> Clone for AsyncSubject<Item, Err> {
  fn clone(&self) -> Self { Self { core: self.core.clone() } }
}

impl<Item, Err> Default for AsyncSubject<Item, Err> {
  fn default() -> Self {
    Self { core: Arc::new(Mutex::new(AsyncCore { registry: Registry::default(), last: None })) }
  }
}

impl<Item, Err> AsyncSubject<Item, Err> {
  pub fn new() -> Self { Self::default() }

  pub fn observer_count(&self) -> usize { self.core.lock().unwrap().registry.len() }
}

impl<Item, Err> Observer<Item, Err> for AsyncSubject<Item, Err>
where
  Item: Clone,
  Err: Clone,
{
  fn on_next(&mut self, value: Item) {
    let mut core = self.core.lock().unwrap();
    if core.registry.is_active() {
      core.last = Some(value);
    }
  }

  fn on_error(&mut self, err: Err) {
    let targets = {
      let mut core = self.core.lock().unwrap();
      if !core.registry.is_active() {
        return;
      }
      core.last = None;
      core.registry.settle(SubjectState::Errored(err.clone()))
    };
    deliver_error(targets, err);
  }

  fn on_completed(&mut self) {
    let (last, targets) = {
      let mut core = self.core.lock().unwrap();
      if !core.registry.is_active() {
        return;
      }
      (core.last.clone(), core.registry.settle(SubjectState::Completed))
    };
    for observer in targets {
      let mut observer = observer.lock().unwrap();
      if let Some(value) = last.clone() {
        observer.on_next(value);
      }
      observer.on_completed();
    }
  }
}

impl<Item, Err> Observable<Item, Err> for AsyncSubject<Item, Err>
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
        let (id, _) = core.registry.add(Box::new(observer));
        drop(core);
        Box::new(ArenaSubscription::register(&self.core, id))
      }
      SubjectState::Completed => {
        let last = core.last.clone();
        drop(core);
        if let Some(value) = last {
          observer.on_next(value);
        }
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

use std::{
  collections::VecDeque,
  sync::{Arc, Mutex},
};

use super::{
  deliver_completed, deliver_error, deliver_next, ArenaSubscription, ObserverArena, Registry,
  SubjectState,
};
use crate::{
  disposable::{self, BoxDisposable},
  observable::Observable,
  observer::Observer,
};

struct ReplayCore<Item, Err> {
  registry: Registry<Item, Err>,
  buffer: VecDeque<Item>,
  capacity: Option<usize>,
}

impl<Item, Err> ObserverArena for ReplayCore<Item, Err> {
  fn remove_observer(&mut self, id: u64) { self.registry.remove(id); }
}

/// A subject that replays buffered values to each new subscriber before it
/// joins the live set.
///
/// The buffer is unbounded by default; [`with_buffer_size`] keeps only the
/// most recent `n` values. The buffer is replayed even after the subject
/// terminates, followed by the cached terminal. Replay happens without the
/// core lock held: values that land in the buffer mid-replay are picked up
/// before the subscriber goes live, so nothing is skipped or doubled.
///
/// [`with_buffer_size`]: ReplaySubject::with_buffer_size
pub struct ReplaySubject<Item, Err> {
  core: Arc<Mutex<ReplayCore<Item, Err>>>,
}

impl<Item, Err> Clone for ReplaySubject<Item, Err> {
  fn clone(&self) -> Self { Self { core: self.core.clone() } }
}

impl<Item, Err> Default for ReplaySubject<Item, Err> {
  fn default() -> Self { Self::new() }
}

impl<Item, Err> ReplaySubject<Item, Err> {
  pub fn new() -> Self { Self::with_capacity(None) }

  /// Keep only the `capacity` most recent values for replay.
  pub fn with_buffer_size(capacity: usize) -> Self { Self::with_capacity(Some(capacity)) }

  fn with_capacity(capacity: Option<usize>) -> Self {
    Self {
      core: Arc::new(Mutex::new(ReplayCore {
        registry: Registry::default(),
        buffer: VecDeque::new(),
        capacity,
      })),
    }
  }

  pub fn observer_count(&self) -> usize { self.core.lock().unwrap().registry.len() }
}

impl<Item, Err> Observer<Item, Err> for ReplaySubject<Item, Err>
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
      core.buffer.push_back(value.clone());
      if let Some(capacity) = core.capacity {
        while core.buffer.len() > capacity {
          core.buffer.pop_front();
        }
      }
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

impl<Item, Err> Observable<Item, Err> for ReplaySubject<Item, Err>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
{
  fn subscribe<O>(&self, observer: O) -> BoxDisposable
  where
    O: Observer<Item, Err> + Send + 'static,
  {
    let mut observer = observer;
    let mut replayed = 0;
    loop {
      let pending: Vec<Item>;
      {
        let mut core = self.core.lock().unwrap();
        if core.buffer.len() == replayed {
          // Caught up with the buffer; decide the subscriber's fate while
          // still holding the lock so nothing slips in between.
          return match core.registry.state.clone() {
            SubjectState::Active => {
              let (id, _) = core.registry.add(Box::new(observer));
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
          };
        }
        pending = core.buffer.iter().skip(replayed).cloned().collect();
      }
      replayed += pending.len();
      for value in pending {
        observer.on_next(value);
      }
    }
  }
}

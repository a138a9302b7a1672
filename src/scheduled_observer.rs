//! Moves notification delivery onto a scheduler.

use std::{
  collections::VecDeque,
  sync::{Arc, Mutex},
};

use crate::{
  disposable::{Disposable, SerialDisposable},
  notification::Notification,
  observer::Observer,
  scheduler::Scheduler,
};

struct QueueState<Item, Err> {
  queue: VecDeque<Notification<Item, Err>>,
  busy: bool,
  done: bool,
  faulted: bool,
  disposed: bool,
}

struct Inner<Item, Err, O> {
  state: Mutex<QueueState<Item, Err>>,
  observer: Mutex<O>,
}

/// Decouples producers from a downstream observer by queueing every
/// notification and draining the queue as a unit of scheduled work.
///
/// Producers only ever touch the queue, so `on_next` returns immediately
/// no matter how slow the downstream is. At most one drain is active at a
/// time (the `busy` flag); a drain keeps delivering until the queue is
/// empty, picking up notifications enqueued while it ran, so FIFO order is
/// preserved end to end.
///
/// A panic inside the downstream faults the observer: the queue is
/// dropped, every later call becomes a no-op, and the panic propagates to
/// whatever thread the scheduler ran the drain on.
pub struct ScheduledObserver<Item, Err, O, S> {
  inner: Arc<Inner<Item, Err, O>>,
  scheduler: S,
  drain: SerialDisposable,
}

impl<Item, Err, O, S: Clone> Clone for ScheduledObserver<Item, Err, O, S> {
  fn clone(&self) -> Self {
    Self {
      inner: self.inner.clone(),
      scheduler: self.scheduler.clone(),
      drain: self.drain.clone(),
    }
  }
}

impl<Item, Err, O, S> ScheduledObserver<Item, Err, O, S>
where
  Item: Send + 'static,
  Err: Send + 'static,
  O: Observer<Item, Err> + Send + 'static,
  S: Scheduler + Clone + Send + 'static,
{
  pub fn new(observer: O, scheduler: S) -> Self {
    Self {
      inner: Arc::new(Inner {
        state: Mutex::new(QueueState {
          queue: VecDeque::new(),
          busy: false,
          done: false,
          faulted: false,
          disposed: false,
        }),
        observer: Mutex::new(observer),
      }),
      scheduler,
      drain: SerialDisposable::new(),
    }
  }

  fn enqueue(&mut self, notification: Notification<Item, Err>) {
    {
      let mut state = self.inner.state.lock().unwrap();
      if state.done || state.faulted || state.disposed {
        return;
      }
      if notification.is_terminal() {
        state.done = true;
      }
      state.queue.push_back(notification);
    }
    self.ensure_active();
  }

  /// Schedule a drain unless one is already running.
  fn ensure_active(&mut self) {
    {
      let mut state = self.inner.state.lock().unwrap();
      if state.busy || state.faulted || state.disposed {
        return;
      }
      state.busy = true;
    }
    let inner = self.inner.clone();
    self
      .drain
      .set_disposable(self.scheduler.schedule(move || drain(&inner)));
  }
}

impl<Item, Err, O, S> Disposable for ScheduledObserver<Item, Err, O, S> {
  /// Stop delivery: pending notifications are dropped and the active drain
  /// is cancelled.
  fn dispose(&self) {
    {
      let mut state = self.inner.state.lock().unwrap();
      state.disposed = true;
      state.queue.clear();
    }
    self.drain.dispose();
  }

  fn is_disposed(&self) -> bool { self.inner.state.lock().unwrap().disposed }
}

fn drain<Item, Err, O>(inner: &Arc<Inner<Item, Err, O>>)
where
  O: Observer<Item, Err>,
{
  loop {
    let notification = {
      let mut state = inner.state.lock().unwrap();
      match state.queue.pop_front() {
        Some(notification) => notification,
        None => {
          state.busy = false;
          return;
        }
      }
    };

    let fault = FaultGuard { state: &inner.state };
    notification.accept(&mut *inner.observer.lock().unwrap());
    std::mem::forget(fault);
  }
}

struct FaultGuard<'a, Item, Err> {
  state: &'a Mutex<QueueState<Item, Err>>,
}

impl<Item, Err> Drop for FaultGuard<'_, Item, Err> {
  fn drop(&mut self) {
    // Unwinding out of a delivery; the stream cannot resume mid-sequence.
    if let Ok(mut state) = self.state.lock() {
      state.faulted = true;
      state.queue.clear();
    }
  }
}

impl<Item, Err, O, S> Observer<Item, Err> for ScheduledObserver<Item, Err, O, S>
where
  Item: Send + 'static,
  Err: Send + 'static,
  O: Observer<Item, Err> + Send + 'static,
  S: Scheduler + Clone + Send + 'static,
{
  fn on_next(&mut self, value: Item) { self.enqueue(Notification::Next(value)); }

  fn on_error(&mut self, err: Err) { self.enqueue(Notification::Error(err)); }

  fn on_completed(&mut self) { self.enqueue(Notification::Completed); }
}

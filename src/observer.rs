//! Observer trait and adapters.
//!
//! An [`Observer`] consumes a push-based stream. Producers promise the
//! grammar `on_next* (on_error | on_completed)?` and promise not to call a
//! single observer concurrently; restoring those promises on behalf of
//! unruly producers is the job of the half-serializer and the synchronized
//! observer, not of observers themselves.

use std::sync::{Arc, Mutex};

/// The consumer side of a push-based stream.
pub trait Observer<Item, Err> {
  /// Receive the next value.
  fn on_next(&mut self, value: Item);

  /// Receive a producer-reported failure. Terminal.
  fn on_error(&mut self, err: Err);

  /// Receive the end-of-stream marker. Terminal.
  fn on_completed(&mut self);
}

impl<Item, Err, T: Observer<Item, Err> + ?Sized> Observer<Item, Err> for Box<T> {
  #[inline]
  fn on_next(&mut self, value: Item) { (**self).on_next(value) }
  #[inline]
  fn on_error(&mut self, err: Err) { (**self).on_error(err) }
  #[inline]
  fn on_completed(&mut self) { (**self).on_completed() }
}

/// Shared-ownership observer; every clone feeds the same consumer.
impl<Item, Err, O: Observer<Item, Err>> Observer<Item, Err> for Arc<Mutex<O>> {
  fn on_next(&mut self, value: Item) { self.lock().unwrap().on_next(value) }
  fn on_error(&mut self, err: Err) { self.lock().unwrap().on_error(err) }
  fn on_completed(&mut self) { self.lock().unwrap().on_completed() }
}

/// Closure-backed observer with a latched terminal state.
///
/// After `on_error` or `on_completed` every further call is a no-op; a
/// single latched flag is enough because a well-behaved source never calls
/// one observer concurrently.
pub struct AnonymousObserver<N, E, C> {
  next: N,
  error: Option<E>,
  completed: Option<C>,
  stopped: bool,
}

impl<N, E, C> AnonymousObserver<N, E, C> {
  pub fn new(next: N, error: E, completed: C) -> Self {
    Self { next, error: Some(error), completed: Some(completed), stopped: false }
  }

  /// Whether a terminal notification has been observed.
  pub fn is_stopped(&self) -> bool { self.stopped }
}

impl<Item, Err, N, E, C> Observer<Item, Err> for AnonymousObserver<N, E, C>
where
  N: FnMut(Item),
  E: FnOnce(Err),
  C: FnOnce(),
{
  fn on_next(&mut self, value: Item) {
    if !self.stopped {
      (self.next)(value);
    }
  }

  fn on_error(&mut self, err: Err) {
    if !self.stopped {
      self.stopped = true;
      if let Some(error) = self.error.take() {
        error(err);
      }
    }
  }

  fn on_completed(&mut self) {
    if !self.stopped {
      self.stopped = true;
      if let Some(completed) = self.completed.take() {
        completed();
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc};

  use super::*;

  #[test]
  fn calls_after_terminal_are_dropped() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let on_next = {
      let seen = seen.clone();
      move |v: i32| seen.borrow_mut().push(format!("next {v}"))
    };
    let on_completed = {
      let seen = seen.clone();
      move || seen.borrow_mut().push("completed".into())
    };
    let mut observer = AnonymousObserver::new(on_next, |_: &str| (), on_completed);

    observer.on_next(1);
    observer.on_completed();
    observer.on_next(2);
    observer.on_completed();
    observer.on_error("late");

    assert_eq!(*seen.borrow(), vec!["next 1".to_string(), "completed".to_string()]);
    assert!(observer.is_stopped());
  }

  #[test]
  fn error_latches_too() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let on_next = {
      let seen = seen.clone();
      move |v: i32| seen.borrow_mut().push(format!("next {v}"))
    };
    let on_error = {
      let seen = seen.clone();
      move |e: &str| seen.borrow_mut().push(format!("error {e}"))
    };
    let mut observer = AnonymousObserver::new(on_next, on_error, || ());

    observer.on_error("boom");
    observer.on_next(1);
    observer.on_error("boom again");

    assert_eq!(*seen.borrow(), vec!["error boom".to_string()]);
  }
}

//! A disposable that keeps a primary resource alive while dependents exist.

use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc, Mutex,
};

use super::{BoxDisposable, Disposable};

struct State {
  underlying: Option<BoxDisposable>,
  outer_disposed: bool,
  count: usize,
}

impl State {
  /// Take the primary for release if the outer handle is gone and no
  /// dependents remain.
  fn try_take(&mut self) -> Option<BoxDisposable> {
    if self.outer_disposed && self.count == 0 {
      self.underlying.take()
    } else {
      None
    }
  }
}

/// Wraps a primary disposable behind a reference count.
///
/// Every [`get_disposable`](RefCountDisposable::get_disposable) call hands
/// out a dependent handle and increments the count. The primary is released
/// exactly once, when the outer handle has been disposed *and* every
/// dependent has been disposed, in whatever order those happen.
#[derive(Clone)]
pub struct RefCountDisposable {
  state: Arc<Mutex<State>>,
}

impl RefCountDisposable {
  pub fn new(underlying: impl Disposable + Send + Sync + 'static) -> Self {
    Self::from_boxed(Box::new(underlying))
  }

  pub fn from_boxed(underlying: BoxDisposable) -> Self {
    Self {
      state: Arc::new(Mutex::new(State {
        underlying: Some(underlying),
        outer_disposed: false,
        count: 0,
      })),
    }
  }

  /// Obtain a dependent handle that must be disposed before the primary can
  /// be released. After the primary is gone the returned handle is inert.
  pub fn get_disposable(&self) -> BoxDisposable {
    let mut guard = self.state.lock().unwrap();
    if guard.underlying.is_none() {
      return super::empty();
    }
    guard.count += 1;
    Box::new(Dependent { state: self.state.clone(), done: AtomicBool::new(false) })
  }
}

impl Disposable for RefCountDisposable {
  fn dispose(&self) {
    let primary = {
      let mut guard = self.state.lock().unwrap();
      guard.outer_disposed = true;
      guard.try_take()
    };
    if let Some(primary) = primary {
      primary.dispose();
    }
  }

  fn is_disposed(&self) -> bool { self.state.lock().unwrap().outer_disposed }
}

struct Dependent {
  state: Arc<Mutex<State>>,
  done: AtomicBool,
}

impl Disposable for Dependent {
  fn dispose(&self) {
    if self.done.swap(true, Ordering::AcqRel) {
      return;
    }
    let primary = {
      let mut guard = self.state.lock().unwrap();
      guard.count -= 1;
      guard.try_take()
    };
    if let Some(primary) = primary {
      primary.dispose();
    }
  }

  fn is_disposed(&self) -> bool { self.done.load(Ordering::Acquire) }
}

//! A growable group of disposables released together.

use std::sync::{Arc, Mutex};

use smallvec::SmallVec;

use super::{BoxDisposable, Disposable};

struct Inner {
  disposed: bool,
  next_key: usize,
  members: SmallVec<[(usize, BoxDisposable); 2]>,
}

/// A set of disposables that are disposed together, each exactly once.
///
/// `add` returns a key that can be used to `remove` (and release) a single
/// member before the group is torn down. Adding to an already disposed
/// composite releases the value immediately.
#[derive(Clone)]
pub struct CompositeDisposable {
  inner: Arc<Mutex<Inner>>,
}

impl Default for CompositeDisposable {
  fn default() -> Self {
    Self {
      inner: Arc::new(Mutex::new(Inner {
        disposed: false,
        next_key: 0,
        members: SmallVec::new(),
      })),
    }
  }
}

impl CompositeDisposable {
  pub fn new() -> Self { Self::default() }

  /// Add a member, returning its removal key.
  pub fn add(&self, disposable: impl Disposable + Send + Sync + 'static) -> usize {
    self.add_boxed(Box::new(disposable))
  }

  pub fn add_boxed(&self, disposable: BoxDisposable) -> usize {
    let mut guard = self.inner.lock().unwrap();
    if guard.disposed {
      drop(guard);
      disposable.dispose();
      return usize::MAX;
    }
    // Drop members that were already released on their own so the group
    // does not grow without bound.
    guard.members.retain(|(_, d)| !d.is_disposed());
    let key = guard.next_key;
    guard.next_key += 1;
    guard.members.push((key, disposable));
    key
  }

  /// Remove and dispose a single member. Returns false if the key is gone
  /// (never added, already removed, or the group was disposed).
  pub fn remove(&self, key: usize) -> bool {
    let removed = {
      let mut guard = self.inner.lock().unwrap();
      match guard.members.iter().position(|(k, _)| *k == key) {
        Some(pos) => Some(guard.members.remove(pos).1),
        None => None,
      }
    };
    match removed {
      Some(d) => {
        d.dispose();
        true
      }
      None => false,
    }
  }

  pub fn len(&self) -> usize { self.inner.lock().unwrap().members.len() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl Disposable for CompositeDisposable {
  fn dispose(&self) {
    let members = {
      let mut guard = self.inner.lock().unwrap();
      if guard.disposed {
        return;
      }
      guard.disposed = true;
      std::mem::take(&mut guard.members)
    };
    // Members are released outside the lock; one of them may add to or
    // re-dispose this composite.
    for (_, member) in members {
      member.dispose();
    }
  }

  fn is_disposed(&self) -> bool { self.inner.lock().unwrap().disposed }
}

//! The producer-side seam consumed by operators and user code.

use crate::{disposable::BoxDisposable, observer::Observer};

/// A push-based source of `Item`s that may fail with `Err`.
///
/// `subscribe` hands the observer to the source and returns the handle that
/// cancels the subscription. Disposing that handle is best effort: work
/// already running synchronously finishes, but nothing scheduled afterwards
/// is delivered.
pub trait Observable<Item, Err> {
  fn subscribe<O>(&self, observer: O) -> BoxDisposable
  where
    O: Observer<Item, Err> + Send + 'static;
}

//! Cancellation-safe disposable primitives.
//!
//! A [`Disposable`] stands for a releasable resource, typically an active
//! subscription or a unit of scheduled work. Every variant in this module
//! shares two guarantees:
//!
//! - `dispose` is idempotent: calling it N times, from any number of threads,
//!   has the same observable effect as calling it once.
//! - the live → disposed transition is monotone; a disposed handle never
//!   comes back to life.
//!
//! All handles are cheap clones of a shared slot, so the producer that
//! created a resource and the consumer that cancels it can each hold one.

use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc, Mutex,
};

mod composite;
mod ref_count;
mod serial;
mod single_assignment;

pub use composite::CompositeDisposable;
pub use ref_count::RefCountDisposable;
pub use serial::SerialDisposable;
pub use single_assignment::SingleAssignmentDisposable;

/// A releasable resource or cancellable subscription.
pub trait Disposable {
  /// Release the resource. Safe to call repeatedly and concurrently; only
  /// the first call has an effect. Never panics.
  fn dispose(&self);

  /// Whether `dispose` has already taken effect.
  fn is_disposed(&self) -> bool;
}

/// Boxed disposable, the common currency between schedulers, subjects and
/// observers.
pub type BoxDisposable = Box<dyn Disposable + Send + Sync>;

impl<T: Disposable + ?Sized> Disposable for Box<T> {
  #[inline]
  fn dispose(&self) { (**self).dispose() }
  #[inline]
  fn is_disposed(&self) -> bool { (**self).is_disposed() }
}

impl<T: Disposable + ?Sized> Disposable for Arc<T> {
  #[inline]
  fn dispose(&self) { (**self).dispose() }
  #[inline]
  fn is_disposed(&self) -> bool { (**self).is_disposed() }
}

/// The disposable handed out when there is nothing left to release, e.g. to
/// a subscriber that only received a cached terminal notification.
#[derive(Clone, Copy, Debug, Default)]
pub struct NopDisposable;

impl Disposable for NopDisposable {
  #[inline]
  fn dispose(&self) {}
  #[inline]
  fn is_disposed(&self) -> bool { true }
}

/// A no-op [`BoxDisposable`].
pub fn empty() -> BoxDisposable { Box::new(NopDisposable) }

/// A latchable flag. Doubles as the cancellation token observed by
/// long-running scheduled work.
#[derive(Clone, Debug, Default)]
pub struct BooleanDisposable(Arc<AtomicBool>);

impl BooleanDisposable {
  pub fn new() -> Self { Self::default() }
}

impl Disposable for BooleanDisposable {
  #[inline]
  fn dispose(&self) { self.0.store(true, Ordering::Release); }

  #[inline]
  fn is_disposed(&self) -> bool { self.0.load(Ordering::Acquire) }
}

/// Runs a teardown closure exactly once, on the first `dispose`.
pub struct ActionDisposable {
  action: Arc<Mutex<Option<Box<dyn FnOnce() + Send>>>>,
}

impl ActionDisposable {
  pub fn new(action: impl FnOnce() + Send + 'static) -> Self {
    Self { action: Arc::new(Mutex::new(Some(Box::new(action)))) }
  }
}

impl Clone for ActionDisposable {
  fn clone(&self) -> Self { Self { action: self.action.clone() } }
}

impl Disposable for ActionDisposable {
  fn dispose(&self) {
    let action = self.action.lock().unwrap().take();
    if let Some(action) = action {
      action();
    }
  }

  fn is_disposed(&self) -> bool { self.action.lock().unwrap().is_none() }
}

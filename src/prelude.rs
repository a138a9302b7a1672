//! Prelude module for convenient imports
//!
//! Re-exports the types and traits most code needs.

// Synchronization gates
pub use crate::async_lock::{AsyncLock, SynchronizedObserver};
// Disposables
pub use crate::disposable::{
  ActionDisposable, BooleanDisposable, BoxDisposable, CompositeDisposable, Disposable,
  NopDisposable, RefCountDisposable, SerialDisposable, SingleAssignmentDisposable,
};
// Terminal serialization
pub use crate::half_serializer::{ErrorSlot, HalfSerializer, Terminal};
// Notifications
pub use crate::notification::Notification;
// Core traits
pub use crate::observable::Observable;
pub use crate::observer::{AnonymousObserver, Observer};
// Scheduled delivery
pub use crate::scheduled_observer::ScheduledObserver;
// Schedulers
#[cfg(feature = "thread-pool")]
pub use crate::scheduler::ThreadPoolScheduler;
pub use crate::scheduler::{
  ImmediateScheduler, LongRunningScheduler, NewThreadScheduler, PeriodicScheduler, Scheduler,
  VirtualTimeScheduler,
};
// Subjects
pub use crate::subject::{AsyncSubject, BehaviorSubject, ReplaySubject, Subject};
// Test harness
pub use crate::testing::{MockObserver, Recorded, Subscription, TestScheduler};

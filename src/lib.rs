//! # rxcore: reactive streams plumbing for Rust
//!
//! The machinery underneath a Reactive Extensions implementation:
//! disposables, schedulers (including virtual time), subjects, delivery
//! serialization, and a deterministic test harness. There is deliberately
//! no operator library here; this crate is the part operators are built
//! on.
//!
//! ## Quick Start
//!
//! ```rust
//! use rxcore::prelude::*;
//!
//! let subject: Subject<i32, ()> = Subject::new();
//! let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
//!
//! let sink = seen.clone();
//! subject.subscribe(AnonymousObserver::new(
//!   move |v| sink.lock().unwrap().push(v),
//!   |_: ()| {},
//!   || {},
//! ));
//!
//! let mut producer = subject.clone();
//! producer.on_next(1);
//! producer.on_next(2);
//! producer.on_completed();
//!
//! assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Disposable`] | Cancellation handle; idempotent and monotone |
//! | [`Scheduler`] | Orders units of work and decides where they run |
//! | [`VirtualTimeScheduler`] | A clock that only moves by draining work |
//! | [`Subject`] | Multicast bridge between producers and observers |
//! | [`TestScheduler`] | Recorded sources and clock-stamped assertions |
//!
//! ## Feature Flags
//!
//! - **`thread-pool`** (default): the `futures`-executor-backed pool
//!   scheduler
//!
//! [`Disposable`]: disposable::Disposable
//! [`Scheduler`]: scheduler::Scheduler
//! [`VirtualTimeScheduler`]: scheduler::VirtualTimeScheduler
//! [`Subject`]: subject::Subject
//! [`TestScheduler`]: testing::TestScheduler

pub mod async_lock;
pub mod disposable;
pub mod half_serializer;
pub mod notification;
pub mod observable;
pub mod observer;
pub mod prelude;
pub mod scheduled_observer;
pub mod scheduler;
pub mod subject;
pub mod testing;

pub use prelude::*;

#[cfg(doctest)]
mod readme_doctests {
  #![doc = include_str!("../README.md")]
}

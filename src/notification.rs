//! Materialized observable events.

use crate::observer::Observer;

/// One event of the observable grammar `Next* (Error | Completed)?`,
/// reified as a value.
///
/// The test harness records these with a virtual timestamp, and the
/// scheduled observer buffers them while a drain is pending. The enum is
/// closed on purpose: everything that consumes notifications matches
/// exhaustively.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notification<Item, Err> {
  Next(Item),
  Error(Err),
  Completed,
}

impl<Item, Err> Notification<Item, Err> {
  /// Whether this notification ends the stream.
  pub fn is_terminal(&self) -> bool { !matches!(self, Notification::Next(_)) }

  /// Deliver this notification to an observer.
  pub fn accept<O>(self, observer: &mut O)
  where
    O: Observer<Item, Err>,
  {
    match self {
      Notification::Next(value) => observer.on_next(value),
      Notification::Error(err) => observer.on_error(err),
      Notification::Completed => observer.on_completed(),
    }
  }
}

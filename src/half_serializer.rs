//! Linearization of concurrent terminal notifications.
//!
//! Upstream contracts forbid concurrent calls into one observer, but
//! operators that merge several scheduler-driven sources receive calls
//! from several threads at once. The half-serializer restores the grammar
//! `on_next* (on_error | on_completed)?` without ever making a caller
//! wait: losers of a race are dropped, never blocked.

use std::{
  marker::PhantomData,
  sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex,
  },
};

use crate::observer::Observer;

/// A terminal event without its value channel.
#[derive(Debug, PartialEq, Eq)]
pub enum Terminal<Err> {
  Error(Err),
  Completed,
}

enum SlotState<Err> {
  Empty,
  Pending(Terminal<Err>),
  Taken,
}

/// First-writer-wins slot for the terminal notification.
///
/// `try_set_error` / `try_complete` return true only for the first caller;
/// everyone else's payload is discarded. `terminate` hands out the pending
/// terminal exactly once and leaves a taken sentinel behind.
pub struct ErrorSlot<Err> {
  state: Mutex<SlotState<Err>>,
}

impl<Err> Default for ErrorSlot<Err> {
  fn default() -> Self { Self { state: Mutex::new(SlotState::Empty) } }
}

impl<Err> ErrorSlot<Err> {
  pub fn new() -> Self { Self::default() }

  pub fn try_set_error(&self, err: Err) -> bool { self.try_set(Terminal::Error(err)) }

  pub fn try_complete(&self) -> bool { self.try_set(Terminal::Completed) }

  fn try_set(&self, terminal: Terminal<Err>) -> bool {
    let mut state = self.state.lock().unwrap();
    match *state {
      SlotState::Empty => {
        *state = SlotState::Pending(terminal);
        true
      }
      _ => false,
    }
  }

  /// Take the recorded terminal for delivery. Only the first call after a
  /// successful `try_set_*` yields a value.
  pub fn terminate(&self) -> Option<Terminal<Err>> {
    let mut state = self.state.lock().unwrap();
    match std::mem::replace(&mut *state, SlotState::Taken) {
      SlotState::Pending(terminal) => Some(terminal),
      _ => None,
    }
  }

  pub fn is_terminated(&self) -> bool {
    !matches!(*self.state.lock().unwrap(), SlotState::Empty)
  }
}

/// Wraps a downstream observer so that concurrent value and terminal calls
/// collapse into one grammatical stream.
///
/// The protocol is a work-in-progress counter plus the [`ErrorSlot`]:
///
/// - `forward_on_next` delivers only when it wins the 0 → 1 transition of
///   `wip`; a concurrent (or re-entrant) caller loses the race and its
///   value is dropped. The winner, on its way out, checks whether a
///   terminal arrived while it was delivering and drains it.
/// - `forward_on_error` / `forward_on_completed` record their terminal
///   first-writer-wins, then either deliver it directly (idle) or leave it
///   for the in-flight `forward_on_next` owner (busy). Either way `wip`
///   never returns to zero afterwards, so all later values are dropped.
///
/// The sink itself is only ever touched by the single thread that won the
/// protocol, so its mutex is uncontended; no lock is held while other
/// callers decide to back off.
pub struct HalfSerializer<Item, Err, O> {
  wip: AtomicUsize,
  slot: ErrorSlot<Err>,
  sink: Mutex<O>,
  _marker: PhantomData<fn(Item)>,
}

impl<Item, Err, O: Observer<Item, Err>> HalfSerializer<Item, Err, O> {
  pub fn new(sink: O) -> Self {
    Self {
      wip: AtomicUsize::new(0),
      slot: ErrorSlot::new(),
      sink: Mutex::new(sink),
      _marker: PhantomData,
    }
  }

  /// Whether a terminal notification has been recorded (it may not have
  /// been delivered yet).
  pub fn is_terminated(&self) -> bool { self.slot.is_terminated() }

  pub fn into_inner(self) -> O { self.sink.into_inner().unwrap() }

  pub fn forward_on_next(&self, value: Item) {
    if self
      .wip
      .compare_exchange(0, 1, Ordering::AcqRel, Ordering::Acquire)
      .is_err()
    {
      // Terminated, or another call is in flight; drop the value.
      return;
    }
    self.sink.lock().unwrap().on_next(value);
    if self.wip.fetch_sub(1, Ordering::AcqRel) != 1 {
      // A terminal raced in while we were delivering; we own its drain.
      self.drain_terminal();
    }
  }

  pub fn forward_on_error(&self, err: Err) {
    if !self.slot.try_set_error(err) {
      return;
    }
    if self.wip.fetch_add(1, Ordering::AcqRel) == 0 {
      self.drain_terminal();
    }
  }

  pub fn forward_on_completed(&self) {
    if !self.slot.try_complete() {
      return;
    }
    if self.wip.fetch_add(1, Ordering::AcqRel) == 0 {
      self.drain_terminal();
    }
  }

  fn drain_terminal(&self) {
    match self.slot.terminate() {
      Some(Terminal::Error(err)) => self.sink.lock().unwrap().on_error(err),
      Some(Terminal::Completed) => self.sink.lock().unwrap().on_completed(),
      None => {}
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Barrier, Mutex};

  use super::*;
  use crate::notification::Notification;

  #[derive(Clone, Default)]
  struct Sink(Arc<Mutex<Vec<Notification<i32, &'static str>>>>);

  impl Sink {
    fn events(&self) -> Vec<Notification<i32, &'static str>> { self.0.lock().unwrap().clone() }
  }

  impl Observer<i32, &'static str> for Sink {
    fn on_next(&mut self, value: i32) { self.0.lock().unwrap().push(Notification::Next(value)); }
    fn on_error(&mut self, err: &'static str) {
      self.0.lock().unwrap().push(Notification::Error(err));
    }
    fn on_completed(&mut self) { self.0.lock().unwrap().push(Notification::Completed); }
  }

  #[test]
  fn error_slot_first_writer_wins() {
    let slot: ErrorSlot<&str> = ErrorSlot::new();
    assert!(slot.try_set_error("first"));
    assert!(!slot.try_set_error("second"));
    assert!(!slot.try_complete());

    assert_eq!(slot.terminate(), Some(Terminal::Error("first")));
    assert_eq!(slot.terminate(), None);
  }

  #[test]
  fn values_flow_until_terminal() {
    let sink = Sink::default();
    let serializer = HalfSerializer::new(sink.clone());

    serializer.forward_on_next(1);
    serializer.forward_on_next(2);
    serializer.forward_on_completed();
    serializer.forward_on_next(3);

    assert_eq!(
      sink.events(),
      vec![Notification::Next(1), Notification::Next(2), Notification::Completed]
    );
  }

  #[test]
  fn second_terminal_is_dropped() {
    let sink = Sink::default();
    let serializer: HalfSerializer<i32, _, _> = HalfSerializer::new(sink.clone());

    serializer.forward_on_error("boom");
    serializer.forward_on_completed();
    serializer.forward_on_error("boom 2");

    assert_eq!(sink.events(), vec![Notification::Error("boom")]);
  }

  #[test]
  fn racing_terminals_produce_exactly_one_winner() {
    for _ in 0..64 {
      let sink = Sink::default();
      let serializer = Arc::new(HalfSerializer::new(sink.clone()));
      let barrier = Arc::new(Barrier::new(2));

      let error_side = {
        let serializer = serializer.clone();
        let barrier = barrier.clone();
        std::thread::spawn(move || {
          barrier.wait();
          serializer.forward_on_error("boom");
        })
      };
      let complete_side = {
        let serializer = serializer.clone();
        let barrier = barrier.clone();
        std::thread::spawn(move || {
          barrier.wait();
          serializer.forward_on_completed();
        })
      };
      error_side.join().unwrap();
      complete_side.join().unwrap();

      serializer.forward_on_next(99);

      let events = sink.events();
      assert_eq!(events.len(), 1, "exactly one terminal must win: {events:?}");
      assert!(events[0].is_terminal());
    }
  }

  #[test]
  fn terminal_racing_a_value_is_delivered_after_it() {
    for _ in 0..64 {
      let sink = Sink::default();
      let serializer = Arc::new(HalfSerializer::new(sink.clone()));
      let barrier = Arc::new(Barrier::new(2));

      let value_side = {
        let serializer = serializer.clone();
        let barrier = barrier.clone();
        std::thread::spawn(move || {
          barrier.wait();
          serializer.forward_on_next(7);
        })
      };
      let terminal_side = {
        let serializer = serializer.clone();
        let barrier = barrier.clone();
        std::thread::spawn(move || {
          barrier.wait();
          serializer.forward_on_completed();
        })
      };
      value_side.join().unwrap();
      terminal_side.join().unwrap();

      let events = sink.events();
      assert_eq!(events.last(), Some(&Notification::Completed));
      assert!(events.len() <= 2);
    }
  }
}

//! End-to-end scenarios exercising the public surface: recorded sources,
//! subjects, scheduled delivery and virtual time working together.

use std::sync::{Arc, Mutex};

use rxcore::{
  prelude::*,
  testing::{self, DISPOSED, SUBSCRIBED},
};

#[test]
fn hot_source_respects_the_default_subscription_window() {
  let scheduler = TestScheduler::new();
  let source = scheduler.create_hot_observable(vec![
    testing::on_next(100, 1),
    testing::on_next(300, 2),
    testing::on_next(700, 3),
    testing::on_next(1200, 4),
  ]);

  let handle = source.clone();
  let observer: MockObserver<i32, ()> = scheduler.start_with(move || handle);

  assert_eq!(
    observer.messages(),
    vec![testing::on_next(300, 2), testing::on_next(700, 3)]
  );
  assert_eq!(
    source.subscriptions(),
    vec![Subscription::finite(SUBSCRIBED, DISPOSED)]
  );
}

#[test]
fn cold_source_shifts_its_timeline_to_the_subscription() {
  let scheduler = TestScheduler::new();
  let source = scheduler.create_cold_observable(vec![
    testing::on_next(10, "a"),
    testing::on_next(40, "b"),
    testing::on_completed(60),
  ]);

  let handle = source.clone();
  let observer: MockObserver<&str, ()> = scheduler.start_with(move || handle);

  assert_eq!(
    observer.messages(),
    vec![
      testing::on_next(210, "a"),
      testing::on_next(240, "b"),
      testing::on_completed(260),
    ]
  );
}

#[test]
fn subject_between_hot_source_and_mock_observer() {
  let scheduler = TestScheduler::new();
  let source = scheduler.create_hot_observable(vec![
    testing::on_next(300, 1),
    testing::on_next(400, 2),
    testing::on_completed(500),
  ]);
  let observer: MockObserver<i32, ()> = scheduler.create_observer();

  let subject: Subject<i32, ()> = Subject::new();
  subject.subscribe(observer.clone());
  source.subscribe(subject.clone());

  scheduler.start();
  assert_eq!(
    observer.messages(),
    vec![
      testing::on_next(300, 1),
      testing::on_next(400, 2),
      testing::on_completed(500),
    ]
  );
}

#[test]
fn scheduled_observer_drains_fifo_on_virtual_time() {
  let scheduler = TestScheduler::new();
  let observer: MockObserver<i32, ()> = scheduler.create_observer();
  let mut scheduled = ScheduledObserver::new(observer.clone(), scheduler.scheduler().clone());

  scheduled.on_next(1);
  scheduled.on_next(2);
  scheduled.on_next(3);
  scheduled.on_completed();
  assert!(observer.messages().is_empty());

  scheduler.start();
  let messages = observer.messages();
  assert_eq!(
    messages.iter().map(|r| r.value.clone()).collect::<Vec<_>>(),
    vec![
      Notification::Next(1),
      Notification::Next(2),
      Notification::Next(3),
      Notification::Completed,
    ]
  );
}

#[test]
fn replay_subject_brings_a_late_observer_up_to_date() {
  let scheduler = TestScheduler::new();
  let source = scheduler.create_hot_observable(vec![
    testing::on_next(100, 1),
    testing::on_next(200, 2),
    testing::on_next(400, 3),
  ]);

  let subject: ReplaySubject<i32, ()> = ReplaySubject::new();
  source.subscribe(subject.clone());

  let observer: MockObserver<i32, ()> = scheduler.create_observer();
  {
    let subject = subject.clone();
    let observer = observer.clone();
    scheduler.schedule_absolute(300, move || {
      subject.subscribe(observer);
      rxcore::disposable::empty()
    });
  }

  scheduler.start();
  assert_eq!(
    observer.messages(),
    vec![
      testing::on_next(300, 1),
      testing::on_next(300, 2),
      testing::on_next(400, 3),
    ]
  );
}

#[test]
fn behavior_subject_seeds_each_subscriber_with_the_latest_value() {
  let subject: BehaviorSubject<i32, ()> = BehaviorSubject::new(0);
  let mut producer = subject.clone();
  producer.on_next(41);
  producer.on_next(42);

  let seen = Arc::new(Mutex::new(Vec::new()));
  let sink = seen.clone();
  subject.subscribe(AnonymousObserver::new(
    move |v| sink.lock().unwrap().push(v),
    |_: ()| {},
    || {},
  ));
  producer.on_next(43);

  assert_eq!(*seen.lock().unwrap(), vec![42, 43]);
}

#[test]
fn synchronized_observer_feeds_a_subject_from_many_threads() {
  let subject: Subject<i32, ()> = Subject::new();
  let seen = Arc::new(Mutex::new(Vec::new()));
  let sink = seen.clone();
  subject.subscribe(AnonymousObserver::new(
    move |v| sink.lock().unwrap().push(v),
    |_: ()| {},
    || {},
  ));

  let shared = SynchronizedObserver::new(subject.clone());
  let mut handles = Vec::new();
  for t in 0..4 {
    let mut producer = shared.clone();
    handles.push(std::thread::spawn(move || {
      for i in 0..50 {
        producer.on_next(t * 1000 + i);
      }
    }));
  }
  for handle in handles {
    handle.join().unwrap();
  }

  let seen = seen.lock().unwrap();
  assert_eq!(seen.len(), 200);
  for t in 0..4 {
    let mine: Vec<i32> = seen.iter().copied().filter(|v| v / 1000 == t).collect();
    let expected: Vec<i32> = (0..50).map(|i| t * 1000 + i).collect();
    assert_eq!(mine, expected);
  }
}

#[test]
fn disposing_mid_window_cuts_off_a_cold_replay() {
  let scheduler = TestScheduler::new();
  let source = scheduler.create_cold_observable(vec![
    testing::on_next(50, 1),
    testing::on_next(900, 2),
  ]);

  let handle = source.clone();
  let observer: MockObserver<i32, ()> =
    scheduler.start_with_timing(move || handle, 0, 100, 500);

  assert_eq!(observer.messages(), vec![testing::on_next(150, 1)]);
  assert_eq!(source.subscriptions(), vec![Subscription::finite(100, 500)]);
}

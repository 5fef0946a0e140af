use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use flowrx::{Flow, FlowError, TestSubscriber};

#[test]
fn test_from_iter_emits_in_order_then_completes() {
    let subscriber = TestSubscriber::new();
    Flow::from_iter(vec![1, 2, 3, 4, 5]).subscribe(subscriber.clone());
    subscriber.assert_values(&[1, 2, 3, 4, 5]);
    subscriber.assert_complete();
    subscriber.assert_no_error();
}

#[test]
fn test_just_emits_single_value() {
    let subscriber = TestSubscriber::new();
    Flow::just(42).subscribe(subscriber.clone());
    subscriber.assert_values(&[42]);
    subscriber.assert_complete();
}

#[test]
fn test_empty_completes_without_values() {
    let subscriber = TestSubscriber::<i32>::new();
    Flow::empty().subscribe(subscriber.clone());
    subscriber.assert_no_values();
    subscriber.assert_complete();
}

#[test]
fn test_error_fails_without_values() {
    let subscriber = TestSubscriber::<i32>::new();
    Flow::error(FlowError::Custom("bad".into())).subscribe(subscriber.clone());
    subscriber.assert_no_values();
    subscriber.assert_error(FlowError::Custom("bad".into()));
}

#[test]
fn test_never_stays_silent() {
    let subscriber = TestSubscriber::<i32>::new();
    Flow::never().subscribe(subscriber.clone());
    subscriber.assert_no_values();
    subscriber.assert_not_terminated();
}

#[test]
fn test_streams_are_cold_and_rerun_per_subscription() {
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&runs);
    let flow = Flow::create(move |emitter| {
        counter.fetch_add(1, Ordering::SeqCst);
        emitter.emit(7);
        emitter.complete();
    });

    let first = TestSubscriber::new();
    let second = TestSubscriber::new();
    flow.subscribe(first.clone());
    flow.subscribe(second.clone());

    assert_eq!(runs.load(Ordering::SeqCst), 2);
    first.assert_values(&[7]);
    second.assert_values(&[7]);
    first.assert_complete();
    second.assert_complete();
}

#[test]
fn test_signals_after_completion_are_dropped() {
    let subscriber = TestSubscriber::new();
    Flow::create(|emitter| {
        emitter.emit(1);
        emitter.complete();
        emitter.emit(2);
        emitter.fail(FlowError::Custom("late".into()));
        emitter.complete();
    })
    .subscribe(subscriber.clone());

    subscriber.assert_values(&[1]);
    subscriber.assert_complete();
    subscriber.assert_no_error();
}

#[test]
fn test_signals_after_error_are_dropped() {
    let subscriber = TestSubscriber::new();
    Flow::create(|emitter| {
        emitter.emit(1);
        emitter.fail(FlowError::Custom("first".into()));
        emitter.emit(2);
        emitter.fail(FlowError::Custom("second".into()));
    })
    .subscribe(subscriber.clone());

    subscriber.assert_values(&[1]);
    subscriber.assert_error(FlowError::Custom("first".into()));
}

#[test]
fn test_producer_panic_becomes_error_signal() {
    let subscriber = TestSubscriber::<i32>::new();
    Flow::<i32>::create(|_emitter| panic!("kaboom")).subscribe(subscriber.clone());
    subscriber.assert_error(FlowError::Fault("kaboom".into()));
}

#[test]
fn test_cancellation_is_idempotent_and_runs_cleanups_once() {
    let cleanups = Arc::new(AtomicUsize::new(0));
    let subscriber = TestSubscriber::<i32>::new();
    let subscription = Flow::never().subscribe(subscriber.clone());

    let counter = Arc::clone(&cleanups);
    subscription.add_cleanup(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    assert!(!subscription.is_cancelled());
    subscription.cancel();
    subscription.cancel();
    assert!(subscription.is_cancelled());
    assert_eq!(cleanups.load(Ordering::SeqCst), 1);
    subscriber.assert_not_terminated();
}

#[test]
fn test_cleanup_added_after_cancellation_runs_immediately() {
    let subscriber = TestSubscriber::<i32>::new();
    let subscription = Flow::never().subscribe(subscriber.clone());
    subscription.cancel();

    let ran = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&ran);
    subscription.add_cleanup(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(ran.load(Ordering::SeqCst), 1);
}

#[test]
fn test_cancelled_subscription_drops_later_emissions() {
    // The producer checks is_active between emissions, so cancellation from
    // a value handler stops the iteration.
    let subscriber = TestSubscriber::new();
    let flow = Flow::from_iter(vec![1, 2, 3]).take(1);
    flow.subscribe(subscriber.clone());
    subscriber.assert_values(&[1]);
    subscriber.assert_complete();
}

#[test]
fn test_terminal_signal_disposes_subscription() {
    let subscriber = TestSubscriber::new();
    let subscription = Flow::just(1).subscribe(subscriber.clone());
    subscriber.assert_complete();
    assert!(subscription.is_cancelled());
}

#[test]
fn test_defer_builds_flow_per_subscription() {
    let builds = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&builds);
    let flow = Flow::defer(move || {
        let run = counter.fetch_add(1, Ordering::SeqCst);
        Flow::just(run)
    });

    assert_eq!(builds.load(Ordering::SeqCst), 0);

    let first = TestSubscriber::new();
    let second = TestSubscriber::new();
    flow.subscribe(first.clone());
    flow.subscribe(second.clone());

    assert_eq!(builds.load(Ordering::SeqCst), 2);
    first.assert_values(&[0]);
    second.assert_values(&[1]);
}

#[test]
fn test_subscribe_with_closures() {
    let values = Arc::new(std::sync::Mutex::new(Vec::new()));
    let completed = Arc::new(AtomicUsize::new(0));

    let sink = Arc::clone(&values);
    let done = Arc::clone(&completed);
    Flow::from_iter(vec![10, 20]).subscribe_with(
        move |value| sink.lock().unwrap().push(value),
        move || {
            done.fetch_add(1, Ordering::SeqCst);
        },
        |_error| {},
    );

    assert_eq!(*values.lock().unwrap(), vec![10, 20]);
    assert_eq!(completed.load(Ordering::SeqCst), 1);
}

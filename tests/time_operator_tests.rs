use std::sync::Arc;
use std::time::Duration;

use flowrx::{Flow, FlowError, Scheduler, SchedulerHandle, TestSubscriber, VirtualScheduler};

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

fn timed_flow(
    scheduler: &SchedulerHandle,
    events: Vec<(u64, i32)>,
    complete_at: Option<u64>,
) -> Flow<i32> {
    let scheduler = Arc::clone(scheduler);
    Flow::create(move |emitter| {
        for (at, value) in events.clone() {
            let out = emitter.clone();
            scheduler.schedule_once(ms(at), Box::new(move || out.emit(value)));
        }
        if let Some(at) = complete_at {
            let out = emitter.clone();
            scheduler.schedule_once(ms(at), Box::new(move || out.complete()));
        }
    })
}

// ================================
// interval / timer
// ================================

#[test]
fn test_interval_emits_ascending_counter_on_schedule() {
    let scheduler = VirtualScheduler::new();
    let subscriber = TestSubscriber::new();
    let subscription =
        Flow::interval(ms(100), ms(200), scheduler.handle()).subscribe(subscriber.clone());

    subscriber.assert_no_values();
    scheduler.advance_by(ms(100));
    subscriber.assert_values(&[0]);
    scheduler.advance_by(ms(200));
    subscriber.assert_values(&[0, 1]);
    scheduler.advance_by(ms(200));
    subscriber.assert_values(&[0, 1, 2]);
    subscriber.assert_not_terminated();

    // Cancellation stops production without any terminal signal.
    subscription.cancel();
    scheduler.advance_by(ms(1000));
    subscriber.assert_values(&[0, 1, 2]);
    subscriber.assert_not_terminated();
}

#[test]
fn test_timer_emits_zero_once_after_delay() {
    let scheduler = VirtualScheduler::new();
    let subscriber = TestSubscriber::new();
    Flow::timer(ms(250), scheduler.handle()).subscribe(subscriber.clone());

    scheduler.advance_by(ms(249));
    subscriber.assert_no_values();
    scheduler.advance_by(ms(1));
    subscriber.assert_values(&[0]);
    subscriber.assert_complete();
}

// ================================
// delay
// ================================

#[test]
fn test_delay_shifts_values_and_completion() {
    let scheduler = VirtualScheduler::new();
    let handle = scheduler.handle();

    let subscriber = TestSubscriber::new();
    timed_flow(&handle, vec![(10, 1), (20, 2)], Some(30))
        .delay(ms(100), handle.clone())
        .subscribe(subscriber.clone());

    scheduler.advance_by(ms(109));
    subscriber.assert_no_values();
    scheduler.advance_by(ms(1));
    subscriber.assert_values(&[1]);
    scheduler.advance_by(ms(20));
    subscriber.assert_values(&[1, 2]);
    subscriber.assert_complete();
}

#[test]
fn test_delay_shifts_errors_too() {
    let scheduler = VirtualScheduler::new();
    let handle = scheduler.handle();

    let source: Flow<i32> = {
        let handle = handle.clone();
        Flow::create(move |emitter| {
            let out = emitter.clone();
            handle.schedule_once(
                ms(10),
                Box::new(move || out.fail(FlowError::Custom("late".into()))),
            );
        })
    };

    let subscriber = TestSubscriber::new();
    source.delay(ms(50), handle.clone()).subscribe(subscriber.clone());

    scheduler.advance_by(ms(59));
    subscriber.assert_not_terminated();
    scheduler.advance_by(ms(1));
    subscriber.assert_error(FlowError::Custom("late".into()));
}

#[test]
fn test_delay_of_synchronous_source_preserves_order() {
    let scheduler = VirtualScheduler::new();
    let subscriber = TestSubscriber::new();
    Flow::from_iter(vec![1, 2, 3])
        .delay(ms(40), scheduler.handle())
        .subscribe(subscriber.clone());

    subscriber.assert_no_values();
    scheduler.advance_by(ms(40));
    subscriber.assert_values(&[1, 2, 3]);
    subscriber.assert_complete();
}

// ================================
// sample
// ================================

#[test]
fn test_sample_emits_latest_value_per_window() {
    let scheduler = VirtualScheduler::new();
    let handle = scheduler.handle();

    // Windows open at the first value (t=10): boundaries at 110, 210, 310.
    let subscriber = TestSubscriber::new();
    timed_flow(&handle, vec![(10, 1), (40, 2), (90, 3), (150, 4)], Some(320))
        .sample(ms(100), handle.clone())
        .subscribe(subscriber.clone());

    scheduler.advance_by(ms(109));
    subscriber.assert_no_values();
    scheduler.advance_by(ms(1));
    subscriber.assert_values(&[3]);
    scheduler.advance_by(ms(100));
    subscriber.assert_values(&[3, 4]);

    // Window with no new value emits nothing.
    scheduler.advance_by(ms(100));
    subscriber.assert_values(&[3, 4]);
    scheduler.advance_by(ms(10));
    subscriber.assert_complete();
}

#[test]
fn test_sample_passes_error_through_immediately() {
    let scheduler = VirtualScheduler::new();
    let handle = scheduler.handle();

    let source: Flow<i32> = {
        let handle = handle.clone();
        Flow::create(move |emitter| {
            let out = emitter.clone();
            handle.schedule_once(ms(10), Box::new(move || out.emit(1)));
            let out = emitter.clone();
            handle.schedule_once(
                ms(20),
                Box::new(move || out.fail(FlowError::Custom("mid-window".into()))),
            );
        })
    };

    let subscriber = TestSubscriber::new();
    source.sample(ms(100), handle.clone()).subscribe(subscriber.clone());

    scheduler.advance_by(ms(20));
    subscriber.assert_no_values();
    subscriber.assert_error(FlowError::Custom("mid-window".into()));

    // The pending window never fires after the terminal signal.
    scheduler.advance_by(ms(200));
    subscriber.assert_no_values();
}

// ================================
// timeout
// ================================

#[test]
fn test_timeout_fires_after_silent_subscription() {
    let scheduler = VirtualScheduler::new();
    let subscriber = TestSubscriber::new();
    Flow::<i32>::never()
        .timeout(ms(100), scheduler.handle())
        .subscribe(subscriber.clone());

    scheduler.advance_by(ms(99));
    subscriber.assert_not_terminated();
    scheduler.advance_by(ms(1));
    subscriber.assert_error(FlowError::Timeout);
}

#[test]
fn test_timeout_resets_on_every_value() {
    let scheduler = VirtualScheduler::new();
    let handle = scheduler.handle();

    let subscriber = TestSubscriber::new();
    timed_flow(&handle, vec![(50, 1), (100, 2)], None)
        .timeout(ms(80), handle.clone())
        .subscribe(subscriber.clone());

    scheduler.advance_by(ms(100));
    subscriber.assert_values(&[1, 2]);
    subscriber.assert_not_terminated();

    // Last value at t=100; the window expires at t=180.
    scheduler.advance_by(ms(79));
    subscriber.assert_not_terminated();
    scheduler.advance_by(ms(1));
    subscriber.assert_error(FlowError::Timeout);
}

#[test]
fn test_timeout_passes_completion_through_inside_window() {
    let scheduler = VirtualScheduler::new();
    let handle = scheduler.handle();

    let subscriber = TestSubscriber::new();
    timed_flow(&handle, vec![(10, 1)], Some(30))
        .timeout(ms(100), handle.clone())
        .subscribe(subscriber.clone());

    scheduler.advance_by(ms(30));
    subscriber.assert_values(&[1]);
    subscriber.assert_complete();

    // The armed timer is cancelled; advancing past it changes nothing.
    scheduler.advance_by(ms(500));
    subscriber.assert_no_error();
}

// ================================
// subscribe_on / observe_on
// ================================

#[test]
fn test_subscribe_on_defers_producer_to_scheduler() {
    let scheduler = VirtualScheduler::new();
    let subscriber = TestSubscriber::new();
    Flow::from_iter(vec![1, 2])
        .subscribe_on(scheduler.handle())
        .subscribe(subscriber.clone());

    // Nothing runs until the scheduler processes the subscription task.
    subscriber.assert_no_values();
    scheduler.advance_by(Duration::ZERO);
    subscriber.assert_values(&[1, 2]);
    subscriber.assert_complete();
}

#[test]
fn test_subscribe_on_cancel_before_task_runs_is_silent() {
    let scheduler = VirtualScheduler::new();
    let subscriber = TestSubscriber::new();
    let subscription = Flow::from_iter(vec![1, 2])
        .subscribe_on(scheduler.handle())
        .subscribe(subscriber.clone());

    subscription.cancel();
    scheduler.advance_by(Duration::ZERO);
    subscriber.assert_no_values();
    subscriber.assert_not_terminated();
}

#[test]
fn test_observe_on_rehops_deliveries_onto_scheduler() {
    let scheduler = VirtualScheduler::new();
    let subscriber = TestSubscriber::new();
    Flow::from_iter(vec![1, 2, 3])
        .observe_on(scheduler.handle())
        .subscribe(subscriber.clone());

    subscriber.assert_no_values();
    scheduler.advance_by(Duration::ZERO);
    subscriber.assert_values(&[1, 2, 3]);
    subscriber.assert_complete();
}

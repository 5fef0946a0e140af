use flowrx::{Flow, FlowError, TestSubscriber};

#[test]
fn test_on_error_return_swaps_error_for_fallback_value() {
    let subscriber = TestSubscriber::new();
    Flow::create(|emitter| {
        emitter.emit(1);
        emitter.emit(2);
        emitter.emit(3);
        emitter.fail(FlowError::Custom("injected".into()));
    })
    .on_error_return(4)
    .subscribe(subscriber.clone());

    subscriber.assert_values(&[1, 2, 3, 4]);
    subscriber.assert_complete();
    subscriber.assert_no_error();
}

#[test]
fn test_on_error_return_is_transparent_without_errors() {
    let subscriber = TestSubscriber::new();
    Flow::from_iter(vec![1, 2])
        .on_error_return(9)
        .subscribe(subscriber.clone());
    subscriber.assert_values(&[1, 2]);
    subscriber.assert_complete();
}

#[test]
fn test_on_error_resume_with_switches_to_fallback_stream() {
    let source = Flow::create(|emitter| {
        emitter.emit(1);
        emitter.emit(2);
        emitter.fail(FlowError::Custom("injected".into()));
    });

    let subscriber = TestSubscriber::new();
    source
        .on_error_resume_with(&Flow::from_iter(vec![10, 20]))
        .subscribe(subscriber.clone());

    subscriber.assert_values(&[1, 2, 10, 20]);
    subscriber.assert_complete();
    subscriber.assert_no_error();
}

#[test]
fn test_on_error_resume_with_propagates_fallback_error() {
    let subscriber = TestSubscriber::<i32>::new();
    Flow::error(FlowError::Custom("primary".into()))
        .on_error_resume_with(&Flow::error(FlowError::Custom("fallback".into())))
        .subscribe(subscriber.clone());
    subscriber.assert_error(FlowError::Custom("fallback".into()));
}

#[test]
fn test_on_error_resume_with_is_transparent_without_errors() {
    let subscriber = TestSubscriber::new();
    Flow::from_iter(vec![1])
        .on_error_resume_with(&Flow::from_iter(vec![99]))
        .subscribe(subscriber.clone());
    subscriber.assert_values(&[1]);
    subscriber.assert_complete();
}

#[test]
fn test_error_reaches_subscriber_not_the_call_site() {
    // A panicking producer surfaces as an error signal; subscribe itself
    // returns normally.
    let subscriber = TestSubscriber::<i32>::new();
    let subscription = Flow::<i32>::create(|_| panic!("producer fault")).subscribe(subscriber.clone());
    assert!(subscription.is_cancelled());
    subscriber.assert_error(FlowError::Fault("producer fault".into()));
}

#[test]
fn test_operators_compose_across_a_recovery_boundary() {
    let source = Flow::create(|emitter| {
        emitter.emit(1);
        emitter.fail(FlowError::Custom("mid-stream".into()));
    });

    let subscriber = TestSubscriber::new();
    source
        .on_error_return(2)
        .map(|value| value * 10)
        .subscribe(subscriber.clone());

    subscriber.assert_values(&[10, 20]);
    subscriber.assert_complete();
}

//! Tests for the event system.

use super::*;

fn record(step: u64) -> IterationRecord {
    IterationRecord {
        step,
        errors: Vec::new(),
        aggregate_error: 0.5,
        threshold_used: 0.01,
        accepted: step == 0,
    }
}

#[test]
fn test_event_support_new() {
    let support = FittingEventSupport::new();
    assert_eq!(support.listener_count(), 0);
    assert!(!support.has_listeners());
}

#[test]
fn test_event_support_fire_events() {
    let mut support = FittingEventSupport::new();
    let listener = Arc::new(CountingListener::new());
    support.add_listener(listener.clone());

    support.fire_fit_started(3, 0.01);
    support.fire_step_ended(&record(0));
    support.fire_step_ended(&record(1));
    support.fire_threshold_relaxed(1, 0.01, 0.02);

    assert_eq!(listener.started_count(), 1);
    assert_eq!(listener.step_count(), 2);
    assert_eq!(listener.relaxation_count(), 1);
    assert_eq!(listener.ended_count(), 0);
}

#[test]
fn test_event_support_multiple_listeners() {
    let mut support = FittingEventSupport::new();
    let first = Arc::new(CountingListener::new());
    let second = Arc::new(CountingListener::new());
    support.add_listener(first.clone());
    support.add_listener(second.clone());

    support.fire_step_ended(&record(0));

    assert_eq!(first.step_count(), 1);
    assert_eq!(second.step_count(), 1);
}

#[test]
fn test_clear_listeners() {
    let mut support = FittingEventSupport::new();
    support.add_listener(Arc::new(CountingListener::new()));
    support.clear_listeners();
    assert!(!support.has_listeners());
}

#[test]
fn test_channel_listener_streams_records() {
    let (listener, mut receiver) = ChannelListener::channel();
    listener.on_step_ended(&record(0));
    listener.on_step_ended(&record(1));

    assert_eq!(receiver.try_recv().unwrap().step, 0);
    assert_eq!(receiver.try_recv().unwrap().step, 1);
    assert!(receiver.try_recv().is_err());
}

#[test]
fn test_channel_listener_survives_dropped_receiver() {
    let (listener, receiver) = ChannelListener::channel();
    drop(receiver);
    listener.on_step_ended(&record(0));
}

//! Producer/consumer protocol and the pipeline driver

use conveyor::{
    BoundedQueue, CancelToken, Consumer, Error, ExecError, Item, Pipeline, PipelineConfig,
    Producer, Role, RoleStatus,
};
use std::thread;
use std::time::Duration;

/// Destination that sleeps before every append.
struct SlowSink {
    delay: Duration,
    items: Vec<u64>,
}

impl Extend<u64> for SlowSink {
    fn extend<I: IntoIterator<Item = u64>>(&mut self, iter: I) {
        for v in iter {
            thread::sleep(self.delay);
            self.items.push(v);
        }
    }
}

fn config(capacity: i64) -> PipelineConfig {
    PipelineConfig {
        capacity,
        ..Default::default()
    }
}

#[test]
fn test_all_items_move_from_source_to_destination() {
    let source = vec![10, 20, 30, 40, 50];

    for _ in 0..50 {
        let queue = BoundedQueue::new(2).unwrap();
        let mut destination: Vec<i32> = Vec::new();

        let (produced, consumed) = thread::scope(|s| {
            let producer = s.spawn({
                let queue = queue.clone();
                let source = source.clone();
                move || Producer::new(source, queue).run()
            });
            let consumer = s.spawn(|| Consumer::new(queue.clone(), &mut destination).run());
            (
                producer.join().expect("Thread panicked"),
                consumer.join().expect("Thread panicked"),
            )
        });

        assert_eq!(destination, source);
        assert_eq!(produced.status, RoleStatus::Completed);
        assert_eq!(produced.produced, 5);
        assert_eq!(consumed.status, RoleStatus::Completed);
        assert_eq!(consumed.consumed, 5);
        assert!(queue.is_empty(), "marker must be consumed, not left behind");
    }
}

#[test]
fn test_no_loss_or_duplication_for_many_items() {
    const N: u64 = 50_000;
    let run = Pipeline::new(config(8)).run(0..N).expect("pipeline run");

    assert_eq!(run.destination.len() as u64, N);
    assert!(run.destination.iter().copied().eq(0..N));
    assert!(run.report.is_completed());
    assert_eq!(run.report.queue.put, N + 1);
    assert!(run.report.queue.peak_occupancy <= 8);
}

#[test]
fn test_end_of_stream_never_reaches_destination() {
    // `None` payloads pass through untouched; only the marker stops the loop.
    let source = vec![Some(1), None, Some(3), None];
    let run = Pipeline::new(config(1)).run(source.clone()).unwrap();
    assert_eq!(run.destination, source);
    assert_eq!(run.report.consumer.consumed, 4);
}

#[test]
fn test_empty_source_sends_only_the_marker() {
    let run = Pipeline::new(config(1)).run(Vec::<u8>::new()).unwrap();
    assert!(run.destination.is_empty());
    assert!(run.report.is_completed());
    assert_eq!(run.report.queue.put, 1);
}

#[test]
fn test_pipeline_rejects_invalid_capacity() {
    for capacity in [0, -5] {
        let err = Pipeline::new(config(capacity)).run(vec![1]).unwrap_err();
        assert!(
            matches!(err, ExecError::Queue(Error::InvalidCapacity { requested }) if requested == capacity),
            "unexpected error: {}",
            err
        );
    }
}

#[test]
fn test_producer_cancelled_does_not_send_marker() {
    let queue = BoundedQueue::new(1).unwrap();
    let token = CancelToken::new();

    let producer = {
        let (queue, token) = (queue.clone(), token.clone());
        thread::spawn(move || Producer::new(0..10, queue).with_cancel(token).run())
    };

    thread::sleep(Duration::from_millis(100));
    token.cancel();
    let report = producer.join().expect("Thread panicked");

    assert!(report.status.is_cancelled());
    assert_eq!(report.produced, 1);
    assert_eq!(queue.drain(), vec![Item::Value(0)]);
}

#[test]
fn test_consumer_cancelled_keeps_partial_destination() {
    let queue = BoundedQueue::new(4).unwrap();
    queue.put(Item::Value("a")).unwrap();
    queue.put(Item::Value("b")).unwrap();
    let token = CancelToken::new();

    let mut destination: Vec<&str> = Vec::new();
    let report = thread::scope(|s| {
        let consumer = s.spawn(|| {
            Consumer::new(queue.clone(), &mut destination)
                .with_cancel(token.clone())
                .run()
        });
        thread::sleep(Duration::from_millis(100));
        token.cancel();
        consumer.join().expect("Thread panicked")
    });

    assert_eq!(report.status, RoleStatus::Stopped(Error::Cancelled));
    assert_eq!(report.consumed, 2);
    assert_eq!(destination, vec!["a", "b"]);
}

#[test]
fn test_pipeline_cancel_stops_both_roles() {
    let token = CancelToken::new();
    let mut sink = SlowSink {
        delay: Duration::from_millis(2),
        items: Vec::new(),
    };

    let report = thread::scope(|s| {
        let canceller = s.spawn(|| {
            thread::sleep(Duration::from_millis(60));
            token.cancel();
        });
        let report = Pipeline::new(config(2))
            .run_into(0u64.., &mut sink, &token)
            .expect("pipeline run");
        canceller.join().expect("Thread panicked");
        report
    });

    assert!(report.is_cancelled());
    assert!(!report.is_completed());
    assert!(report.consumer.status.is_cancelled());
    assert_eq!(report.consumer.consumed, sink.items.len());
    assert!(sink.items.iter().copied().eq(0..sink.items.len() as u64));
}

#[test]
fn test_producer_timeout_closes_queue_and_consumer_drains() {
    let cfg = PipelineConfig {
        capacity: 1,
        put_timeout_ms: Some(20),
        ..Default::default()
    };
    let mut sink = SlowSink {
        delay: Duration::from_millis(100),
        items: Vec::new(),
    };

    let report = Pipeline::new(cfg)
        .run_into(0u64..5, &mut sink, &CancelToken::new())
        .unwrap();

    assert!(report.producer.status.is_timed_out());
    assert!(report.producer.produced < 5);
    assert!(report.consumer.status.is_completed());
    assert_eq!(sink.items.len(), report.producer.produced);
    assert!(sink.items.iter().copied().eq(0..sink.items.len() as u64));
}

#[test]
fn test_consumer_timeout_is_reported() {
    // The consumer waits on a queue nobody feeds.
    let queue = BoundedQueue::<u8>::new(1).unwrap();
    let mut destination: Vec<u8> = Vec::new();
    let report = Consumer::new(queue, &mut destination)
        .with_take_timeout(Some(Duration::from_millis(30)))
        .run();
    assert!(report.status.is_timed_out());
    assert!(destination.is_empty());
}

#[test]
fn test_consumer_panic_is_reported_and_does_not_hang() {
    struct Exploding(Vec<u32>);
    impl Extend<u32> for Exploding {
        fn extend<I: IntoIterator<Item = u32>>(&mut self, iter: I) {
            for v in iter {
                assert!(v != 3, "refusing {}", v);
                self.0.push(v);
            }
        }
    }

    let mut sink = Exploding(Vec::new());
    let err = Pipeline::new(config(1))
        .run_into(0u32..100, &mut sink, &CancelToken::new())
        .unwrap_err();
    assert!(matches!(err, ExecError::Panicked(Role::Consumer)));
    assert_eq!(sink.0, vec![0, 1, 2]);
}

#[test]
fn test_roles_run_on_named_threads() {
    struct NameRecorder(Option<String>);
    impl Extend<u8> for NameRecorder {
        fn extend<I: IntoIterator<Item = u8>>(&mut self, iter: I) {
            for _ in iter {
                self.0 = thread::current().name().map(str::to_string);
            }
        }
    }

    let cfg = PipelineConfig {
        thread_name_prefix: "relay".into(),
        ..config(2)
    };
    let mut recorder = NameRecorder(None);
    Pipeline::new(cfg)
        .run_into(vec![1u8], &mut recorder, &CancelToken::new())
        .unwrap();
    assert_eq!(recorder.0.as_deref(), Some("relay-consumer"));
}

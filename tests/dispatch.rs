//! Fan-out ordering and shutdown guarantees of the [`Dispatcher`].

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::channel::mpsc;
use linked_hash_map::LinkedHashMap;
use ordeal::{
    collector::ReportTestState,
    message::{Message, RunnerMessage},
    reporter, BlockReporter, Dispatcher, Event, Specification, Status,
    StreamingReporter,
};

#[derive(Clone, Default)]
struct CaptureStream(Arc<Mutex<Vec<String>>>);

#[async_trait]
impl StreamingReporter for CaptureStream {
    async fn update(&mut self, ev: Event) {
        self.0.lock().unwrap().push(ev.to_string());
    }
}

struct FailingBlock;

impl BlockReporter for FailingBlock {
    fn report(
        &mut self,
        _: &[Specification],
        _: &LinkedHashMap<String, ReportTestState>,
        _: &[Message],
    ) -> reporter::Result<()> {
        Err(reporter::Error::Custom("backend unavailable".into()))
    }
}

#[derive(Clone, Default)]
struct CaptureBlock(Arc<Mutex<bool>>);

impl BlockReporter for CaptureBlock {
    fn report(
        &mut self,
        _: &[Specification],
        _: &LinkedHashMap<String, ReportTestState>,
        _: &[Message],
    ) -> reporter::Result<()> {
        *self.0.lock().unwrap() = true;
        Ok(())
    }
}

fn drain(rx: &mut mpsc::UnboundedReceiver<Event>) -> Vec<String> {
    let mut out = Vec::new();
    while let Ok(Some(ev)) = rx.try_next() {
        out.push(ev.to_string());
    }
    out
}

#[tokio::test]
async fn every_subscriber_observes_the_global_push_order() {
    let mut dispatcher = Dispatcher::new();
    let mut a = dispatcher.subscribe("a");
    let mut b = dispatcher.subscribe("b");

    let bus = dispatcher.bus();
    bus.message("start");
    bus.message("running");
    bus.message("end");

    dispatcher.run();
    dispatcher.exit().await;

    let expected = ["start", "running", "end"];
    assert_eq!(drain(&mut a), expected);
    assert_eq!(drain(&mut b), expected);
}

#[tokio::test]
async fn exit_flushes_everything_to_streaming_reporters() {
    let mut dispatcher = Dispatcher::new();
    let capture = CaptureStream::default();
    let seen = Arc::clone(&capture.0);
    dispatcher.add_streaming_reporter("capture", Box::new(capture));

    let bus = dispatcher.bus();
    for i in 0..100 {
        bus.message(format!("m{i}"));
    }

    dispatcher.run();
    dispatcher.exit().await;

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 100);
    assert_eq!(seen.first().map(String::as_str), Some("m0"));
    assert_eq!(seen.last().map(String::as_str), Some("m99"));
}

#[tokio::test]
async fn resubscribing_replaces_the_previous_queue_silently() {
    let mut dispatcher = Dispatcher::new();
    let mut stale = dispatcher.subscribe("a");
    let mut fresh = dispatcher.subscribe("a");

    dispatcher.bus().message("only once");
    dispatcher.run();
    dispatcher.exit().await;

    assert_eq!(drain(&mut stale), Vec::<String>::new());
    assert_eq!(drain(&mut fresh), ["only once"]);
}

#[tokio::test]
async fn collector_accumulates_through_the_pipeline() {
    let mut dispatcher = Dispatcher::new();
    let bus = dispatcher.bus();
    bus.message(RunnerMessage::lifecycle("T", "started", Status::Started, false));
    bus.message(RunnerMessage::lifecycle("T", "finished", Status::Success, false));
    bus.error("T", "a complaint");

    dispatcher.run();
    dispatcher.exit().await;

    let collector = dispatcher.take_collector();
    assert_eq!(collector.states()["T"].steps.len(), 2);
    assert_eq!(collector.states()["T"].status, Status::Success);
    assert_eq!(collector.errors().len(), 1);
}

#[tokio::test]
async fn failing_block_reporter_does_not_suppress_later_ones() {
    let mut dispatcher = Dispatcher::new();
    dispatcher.add_block_reporter(Box::new(FailingBlock));
    let capture = CaptureBlock::default();
    let called = Arc::clone(&capture.0);
    dispatcher.add_block_reporter(Box::new(capture));

    dispatcher.run();
    dispatcher.exit().await;
    dispatcher.report(&[]);

    assert!(*called.lock().unwrap());
}

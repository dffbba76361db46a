// Copyright (c) 2024  ordeal developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Fan-out of execution [`Event`]s to all subscribed reporters.
//!
//! The [`Dispatcher`] owns the single incoming queue all producers push to.
//! One background task drains it and re-publishes every [`Event`] to each
//! subscriber queue; since that task is the queue's only consumer and pushes
//! to all subscribers before taking the next [`Event`], every subscriber
//! observes the exact global push order.
//!
//! Each streaming reporter consumes its private queue from its own task;
//! [`Dispatcher::exit()`] flushes the incoming queue, then grants every
//! reporter a bounded grace period to drain before aborting it.

use std::{
    collections::HashMap,
    mem,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use futures::{
    channel::{mpsc, oneshot},
    StreamExt as _,
};
use tokio::{task::JoinHandle, time};

use crate::{
    collector::Collector,
    message::Event,
    messaging::Bus,
    reporter::{BlockReporter, StreamingReporter, Summary},
    spec::Specification,
};

type Subscribers = Arc<Mutex<HashMap<String, mpsc::UnboundedSender<Event>>>>;

/// Handle of a spawned consumption task, reuniting the reporter with the
/// [`Dispatcher`] on shutdown.
struct Pump<R> {
    name: String,
    stop: oneshot::Sender<()>,
    handle: JoinHandle<R>,
}

/// Owner of the incoming [`Event`] queue, fanning every message out to all
/// subscribers and driving the reporters' lifecycle.
pub struct Dispatcher {
    bus: Bus,
    incoming: Option<mpsc::UnboundedReceiver<Event>>,
    subscribers: Subscribers,
    streaming: Vec<(String, Box<dyn StreamingReporter>)>,
    block: Vec<Box<dyn BlockReporter>>,
    collector: Option<Collector>,
    grace: Duration,
    loop_task: Option<(oneshot::Sender<()>, JoinHandle<()>)>,
    pumps: Vec<Pump<Box<dyn StreamingReporter>>>,
    collector_pump: Option<Pump<Collector>>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    /// Default grace period granted to a streaming reporter to drain its
    /// queue on shutdown.
    pub const DEFAULT_GRACE: Duration = Duration::from_secs(2);

    /// Creates a [`Dispatcher`] with an empty incoming queue and the
    /// built-in [`Collector`] as its only subscriber.
    #[must_use]
    pub fn new() -> Self {
        let (bus, incoming) = Bus::channel();
        Self {
            bus,
            incoming: Some(incoming),
            subscribers: Arc::default(),
            streaming: Vec::new(),
            block: Vec::new(),
            collector: Some(Collector::new()),
            grace: Self::DEFAULT_GRACE,
            loop_task: None,
            pumps: Vec::new(),
            collector_pump: None,
        }
    }

    /// Overrides the shutdown grace period.
    #[must_use]
    pub fn with_grace_period(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Returns a producer handle onto the incoming queue.
    #[must_use]
    pub fn bus(&self) -> Bus {
        self.bus.clone()
    }

    /// Registers a streaming reporter under `name`. Its consumption task is
    /// spawned by [`Dispatcher::run()`].
    pub fn add_streaming_reporter(
        &mut self,
        name: impl Into<String>,
        reporter: Box<dyn StreamingReporter>,
    ) {
        self.streaming.push((name.into(), reporter));
    }

    /// Registers a batch reporter, invoked once by [`Dispatcher::report()`].
    pub fn add_block_reporter(&mut self, reporter: Box<dyn BlockReporter>) {
        self.block.push(reporter);
    }

    /// Allocates a new subscriber queue registered under `identifier`,
    /// returning its consumer end.
    ///
    /// The queue receives every [`Event`] dispatched after subscription, and
    /// only those. Re-subscribing under an existing identifier silently
    /// replaces the previous queue.
    pub fn subscribe(
        &mut self,
        identifier: impl Into<String>,
    ) -> mpsc::UnboundedReceiver<Event> {
        let (tx, rx) = mpsc::unbounded();
        drop(
            self.subscribers
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(identifier.into(), tx),
        );
        rx
    }

    /// Starts every streaming reporter's consumption task (the built-in
    /// [`Collector`] included) and the single background dispatch task.
    ///
    /// Must be called from within a [`tokio`] runtime.
    pub fn run(&mut self) {
        if let Some(collector) = self.collector.take() {
            let rx = self.subscribe("collector");
            let (stop, stop_rx) = oneshot::channel();
            self.collector_pump = Some(Pump {
                name: "collector".into(),
                stop,
                handle: tokio::spawn(pump(collector, rx, stop_rx)),
            });
        }

        for (name, reporter) in mem::take(&mut self.streaming) {
            let rx = self.subscribe(name.as_str());
            let (stop, stop_rx) = oneshot::channel();
            self.pumps.push(Pump {
                name,
                stop,
                handle: tokio::spawn(pump(reporter, rx, stop_rx)),
            });
        }

        if let Some(incoming) = self.incoming.take() {
            let (stop, stop_rx) = oneshot::channel();
            let subscribers = Arc::clone(&self.subscribers);
            self.loop_task = Some((
                stop,
                tokio::spawn(dispatch_loop(incoming, subscribers, stop_rx)),
            ));
        }
    }

    /// Shuts the pipeline down: flushes the incoming queue, then stops every
    /// streaming reporter, granting each the configured grace period to
    /// drain its private queue before its task is aborted.
    ///
    /// No [`Event`] is dropped as long as producers stopped pushing before
    /// this call.
    pub async fn exit(&mut self) {
        if let Some((stop, handle)) = self.loop_task.take() {
            drop(stop.send(()));
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "dispatch task failed");
            }
        }

        for Pump { name, stop, mut handle } in mem::take(&mut self.pumps) {
            drop(stop.send(()));
            match time::timeout(self.grace, &mut handle).await {
                Ok(Ok(reporter)) => self.streaming.push((name, reporter)),
                Ok(Err(e)) => {
                    tracing::error!(reporter = %name, error = %e, "reporter task failed");
                }
                Err(_) => {
                    tracing::warn!(
                        reporter = %name,
                        "reporter didn't drain within the grace period, aborting",
                    );
                    handle.abort();
                }
            }
        }

        if let Some(Pump { name, stop, mut handle }) =
            self.collector_pump.take()
        {
            drop(stop.send(()));
            self.collector =
                match time::timeout(self.grace, &mut handle).await {
                    Ok(Ok(collector)) => Some(collector),
                    Ok(Err(e)) => {
                        tracing::error!(reporter = %name, error = %e, "collector task failed");
                        Some(Collector::new())
                    }
                    Err(_) => {
                        handle.abort();
                        Some(Collector::new())
                    }
                };
        }
    }

    /// Invokes every batch reporter with the accumulated result set, then
    /// unconditionally runs the built-in [`Summary`] reporter last.
    ///
    /// A failing reporter is logged and does not prevent the remaining ones
    /// (the [`Summary`] included) from running.
    pub fn report(&mut self, specs: &[Specification]) {
        let empty = Collector::new();
        let collector = self.collector.as_ref().unwrap_or(&empty);
        let states = collector.states();
        let errors = collector.errors();

        for reporter in &mut self.block {
            if let Err(e) = reporter.report(specs, states, errors) {
                tracing::error!(error = %e, "batch reporter failed");
            }
        }

        let mut summary = Summary::new();
        if let Err(e) = summary.report(specs, states, errors) {
            tracing::error!(error = %e, "summary reporter failed");
        }
    }

    /// Hands out the accumulated result set, replacing it with an empty one.
    ///
    /// Meaningful after [`Dispatcher::exit()`]; before that the
    /// [`Collector`] may still be consuming its queue.
    #[must_use]
    pub fn take_collector(&mut self) -> Collector {
        self.collector.take().unwrap_or_default()
    }
}

/// Drains the incoming queue, re-publishing every [`Event`] to all
/// subscriber queues in arrival order. On the stop signal, flushes whatever
/// is still queued before terminating.
async fn dispatch_loop(
    mut incoming: mpsc::UnboundedReceiver<Event>,
    subscribers: Subscribers,
    mut stop: oneshot::Receiver<()>,
) {
    tracing::debug!("dispatch task started");
    loop {
        tokio::select! {
            ev = incoming.next() => match ev {
                Some(ev) => fan_out(&subscribers, ev),
                None => break,
            },
            _ = &mut stop => {
                while let Ok(Some(ev)) = incoming.try_next() {
                    fan_out(&subscribers, ev);
                }
                break;
            }
        }
    }
    tracing::debug!("dispatch task stopped");
}

fn fan_out(subscribers: &Subscribers, ev: Event) {
    let subscribers = subscribers
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    for tx in subscribers.values() {
        drop(tx.unbounded_send(ev.clone()));
    }
}

/// Consumes a reporter's private queue until the stop signal, then drains
/// the leftovers and hands the reporter back.
async fn pump<R: StreamingReporter + 'static>(
    mut reporter: R,
    mut rx: mpsc::UnboundedReceiver<Event>,
    mut stop: oneshot::Receiver<()>,
) -> R {
    loop {
        tokio::select! {
            ev = rx.next() => match ev {
                Some(ev) => reporter.update(ev).await,
                None => return reporter,
            },
            _ = &mut stop => break,
        }
    }
    while let Ok(Some(ev)) = rx.try_next() {
        reporter.update(ev).await;
    }
    reporter
}

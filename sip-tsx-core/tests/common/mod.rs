//! Shared test harness for the end-to-end scenarios in `spec.md` §8.
//!
//! A `MockTransport` stands in for the real UDP/TCP adapter: it records every
//! encoded send with the paused-clock timestamp it happened at, so a test can
//! assert both *what* went out and *when*. `RecordingTu` stands in for the
//! transaction user and records every callback event in arrival order.

#![allow(dead_code)]

use std::io;
use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::Duration;

use bytes::Bytes;
use sip_tsx_core::transport::{Destination, Encoder, Transport};
use sip_tsx_core::{IncomingRequestHandler, ServerTxHandle, TransactionCallback};
use sip_tsx_types::testing::TestMessage;
use sip_tsx_types::MessageView;

pub fn remote_addr() -> SocketAddr {
    "127.0.0.1:5060".parse().unwrap()
}

/// Wires up `tracing-subscriber`'s fmt layer behind `RUST_LOG`, same as the
/// integration suites in `eisenzopf-rvoip` do. Safe to call from every test;
/// `try_init` just no-ops after the first successful call.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("sip_tsx_core=debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Records every `send` with the (paused) clock time it occurred at.
#[derive(Debug)]
pub struct MockTransport {
    reliable: bool,
    sent: Mutex<Vec<(tokio::time::Instant, String)>>,
}

impl MockTransport {
    pub fn new(reliable: bool) -> std::sync::Arc<Self> {
        std::sync::Arc::new(MockTransport {
            reliable,
            sent: Mutex::new(Vec::new()),
        })
    }

    /// Sent descriptions in order, ignoring timing.
    pub fn descriptions(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(_, d)| d.clone()).collect()
    }

    /// `(elapsed-since-start, description)` pairs.
    pub fn timeline(&self, start: tokio::time::Instant) -> Vec<(Duration, String)> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(t, d)| (t.duration_since(start), d.clone()))
            .collect()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    fn protocol(&self) -> &'static str {
        if self.reliable {
            "TCP"
        } else {
            "UDP"
        }
    }

    fn reliable(&self) -> bool {
        self.reliable
    }

    async fn send(&self, _remote: SocketAddr, bytes: &[u8]) -> io::Result<()> {
        let desc = String::from_utf8_lossy(bytes).into_owned();
        self.sent.lock().unwrap().push((tokio::time::Instant::now(), desc));
        Ok(())
    }
}

pub fn destination(transport: &std::sync::Arc<MockTransport>) -> Destination {
    Destination {
        remote: remote_addr(),
        transport: transport.clone(),
    }
}

/// Renders a [`TestMessage`] to a human-legible wire stand-in, so assertions
/// can just substring-match instead of re-parsing.
pub struct TestEncoder;

impl Encoder<TestMessage> for TestEncoder {
    fn encode(&self, msg: &TestMessage) -> Bytes {
        let desc = match msg.status_code() {
            Some(code) => format!("RESP {} {} branch={}", code.into_u16(), msg.method(), msg.branch()),
            None => format!("REQ {} branch={}", msg.method(), msg.branch()),
        };
        Bytes::from(desc)
    }
}

/// One recorded callback invocation, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Provisional(u16),
    Final(u16),
    Timeout,
    TransportFailure,
    Terminated,
    IncomingRequest(String),
}

#[derive(Debug, Default)]
pub struct RecordingTu {
    events: Mutex<Vec<Event>>,
    handles: Mutex<Vec<ServerTxHandle<TestMessage>>>,
}

impl RecordingTu {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, event: &Event) -> usize {
        self.events.lock().unwrap().iter().filter(|e| *e == event).count()
    }

    /// The most recently handed-out server transaction, if any.
    pub fn last_server_handle(&self) -> Option<ServerTxHandle<TestMessage>> {
        self.handles.lock().unwrap().last().cloned()
    }

    pub fn server_handle_count(&self) -> usize {
        self.handles.lock().unwrap().len()
    }
}

impl TransactionCallback<TestMessage> for RecordingTu {
    fn on_provisional(&self, response: TestMessage) {
        self.events
            .lock()
            .unwrap()
            .push(Event::Provisional(response.status_code().unwrap().into_u16()));
    }

    fn on_final(&self, response: TestMessage) {
        self.events
            .lock()
            .unwrap()
            .push(Event::Final(response.status_code().unwrap().into_u16()));
    }

    fn on_timeout(&self) {
        self.events.lock().unwrap().push(Event::Timeout);
    }

    fn on_transport_failure(&self) {
        self.events.lock().unwrap().push(Event::TransportFailure);
    }

    fn on_terminated(&self) {
        self.events.lock().unwrap().push(Event::Terminated);
    }
}

impl IncomingRequestHandler<TestMessage> for RecordingTu {
    fn incoming_request(&self, request: TestMessage, _remote: SocketAddr, handle: ServerTxHandle<TestMessage>) {
        self.events
            .lock()
            .unwrap()
            .push(Event::IncomingRequest(request.method().to_string()));
        self.handles.lock().unwrap().push(handle);
    }
}

/// Let every currently-runnable task (notably the transaction actors spawned
/// by the manager) make progress before the test inspects shared state.
/// Necessary because `TransactionManager` methods hand events off to an
/// actor's mailbox and return immediately; nothing here `.await`s the actor.
pub async fn settle() {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
}

//! Mock implementations for testing.

use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

use crate::domain::{
    ApiRequest, DomainError, ErrorKind, ObserverError, RequestEvent, RequestObserver,
    RequestResult, Transport,
};

/// Transport that replays queued results and records every request.
///
/// An empty queue answers with an `UNKNOWN_ERROR` failure so a test that
/// under-provisions responses fails loudly instead of hanging.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<RequestResult<Value>>>,
    requests: Mutex<Vec<ApiRequest>>,
    calls: AtomicUsize,
}

impl MockTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, result: RequestResult<Value>) {
        self.responses.lock().unwrap().push_back(result);
    }

    pub fn push_json(&self, data: Value) {
        self.push(RequestResult::success(data, HashMap::new()));
    }

    pub fn push_error(&self, error: DomainError) {
        self.push(RequestResult::failure(error));
    }

    /// Requests seen so far, in call order
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: ApiRequest) -> RequestResult<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);
        self.responses.lock().unwrap().pop_front().unwrap_or_else(|| {
            RequestResult::failure(DomainError::new(
                ErrorKind::UnknownError,
                "MockTransport has no queued response",
            ))
        })
    }
}

/// One observer callback as seen by [`RecordingObserver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedEvent {
    Start {
        request_id: String,
        url: String,
    },
    Response {
        request_id: String,
        status: u16,
    },
    Error {
        request_id: String,
        kind: ErrorKind,
    },
}

/// Observer that keeps every callback for later assertions.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<RecordedEvent>>,
}

impl RecordingObserver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().unwrap().clone()
    }

    fn record(&self, event: RecordedEvent) -> Result<(), ObserverError> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

impl RequestObserver for RecordingObserver {
    fn on_request_start(&self, event: &RequestEvent<'_>) -> Result<(), ObserverError> {
        self.record(RecordedEvent::Start {
            request_id: event.request_id.to_string(),
            url: event.url.to_string(),
        })
    }

    fn on_response(
        &self,
        event: &RequestEvent<'_>,
        status: u16,
        _elapsed_ms: u128,
    ) -> Result<(), ObserverError> {
        self.record(RecordedEvent::Response {
            request_id: event.request_id.to_string(),
            status,
        })
    }

    fn on_error(&self, event: &RequestEvent<'_>, error: &DomainError) -> Result<(), ObserverError> {
        self.record(RecordedEvent::Error {
            request_id: event.request_id.to_string(),
            kind: error.kind(),
        })
    }
}

/// Observer whose every hook fails.
#[derive(Debug, Default)]
pub struct FailingObserver {
    calls: AtomicUsize,
}

impl FailingObserver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fail(&self) -> Result<(), ObserverError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ObserverError("telemetry sink unavailable".to_string()))
    }
}

impl RequestObserver for FailingObserver {
    fn on_request_start(&self, _event: &RequestEvent<'_>) -> Result<(), ObserverError> {
        self.fail()
    }

    fn on_response(
        &self,
        _event: &RequestEvent<'_>,
        _status: u16,
        _elapsed_ms: u128,
    ) -> Result<(), ObserverError> {
        self.fail()
    }

    fn on_error(&self, _event: &RequestEvent<'_>, _error: &DomainError) -> Result<(), ObserverError> {
        self.fail()
    }
}

/// In-memory sink for `tracing` output, installed per thread.
///
/// Pair with `#[tokio::test]` (current-thread runtime) so every event of the
/// test lands in the buffer.
#[derive(Debug, Clone, Default)]
pub struct CapturedLogs {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Route DEBUG and above on this thread into the buffer until the guard drops.
    #[must_use]
    pub fn set_default(&self) -> DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(self.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock().unwrap()).into_owned()
    }
}

pub struct CapturedWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl io::Write for CapturedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CapturedWriter {
            buffer: Arc::clone(&self.buffer),
        }
    }
}

//! Test doubles shared by unit and integration tests.
//!
//! Enabled for `cfg(test)` and for downstream tests through the
//! `test-utils` feature.

pub mod mocks;

pub use mocks::{
    CapturedLogs, FailingObserver, MockTransport, RecordedEvent, RecordingObserver,
};

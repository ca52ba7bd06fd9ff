// ezsign/src/test_support.rs

//! Test support helpers intended for use by unit and integration tests.
//!
//! These helpers centralize the common mock-session setup so tests across
//! the crate and the tests/ directory reuse the same fixtures.
#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use crate::protocol::{Apdu, DeviceInfo};
use crate::session::{Connected, EzSignCard};
use crate::transport::mock::MockTransport;
use crate::transport::NfcTransport;
use crate::{Error, Result};

/// Raw TLV descriptor of a 296×128 4-color panel with serial "12345".
#[doc(hidden)]
pub fn sample_descriptor() -> Vec<u8> {
    vec![
        0xA0, 0x07, 0x00, 0x07, 0x08, 0x01, 0x00, 0x01, 0x28, // panel geometry
        0xC0, 0x05, 0x31, 0x32, 0x33, 0x34, 0x35, // serial "12345"
    ]
}

/// Parsed form of [`sample_descriptor`].
#[doc(hidden)]
pub fn sample_device_info() -> DeviceInfo {
    DeviceInfo::parse(&sample_descriptor()).expect("fixture descriptor parses")
}

/// Mock pre-seeded with the two connect-time exchanges (auth, descriptor).
#[doc(hidden)]
pub fn mock_for_connect() -> MockTransport {
    let mut mock = MockTransport::new();
    mock.push_response(Vec::new());
    mock.push_response(sample_descriptor());
    mock
}

/// Shared handle to a [`MockTransport`] that a session can own while the
/// test keeps inspecting and reseeding it.
#[derive(Clone, Default)]
pub struct SharedMock {
    inner: Rc<RefCell<MockTransport>>,
}

impl SharedMock {
    /// Wrap a mock for shared access.
    pub fn new(mock: MockTransport) -> Self {
        Self {
            inner: Rc::new(RefCell::new(mock)),
        }
    }

    /// Snapshot of every APDU the session has sent so far.
    pub fn sent(&self) -> Vec<Apdu> {
        self.inner.borrow().sent.clone()
    }

    /// Queue a successful response body.
    pub fn push_response(&self, resp: Vec<u8>) {
        self.inner.borrow_mut().push_response(resp);
    }

    /// Queue a failure for the next exchange.
    pub fn push_error(&self, err: Error) {
        self.inner.borrow_mut().push_error(err);
    }

    /// Number of close calls observed by the mock.
    pub fn closes(&self) -> usize {
        self.inner.borrow().closes
    }
}

impl NfcTransport for SharedMock {
    fn open(&mut self) -> Result<()> {
        self.inner.borrow_mut().open()
    }

    fn close(&mut self) {
        self.inner.borrow_mut().close()
    }

    fn send_apdu(&mut self, apdu: &Apdu) -> Result<Vec<u8>> {
        self.inner.borrow_mut().send_apdu(apdu)
    }
}

/// Connected session over a shared mock pre-seeded for connect plus the
/// given additional responses.
#[doc(hidden)]
pub fn connected_session(extra: Vec<Vec<u8>>) -> Result<(EzSignCard<Connected>, SharedMock)> {
    let mut mock = mock_for_connect();
    for resp in extra {
        mock.push_response(resp);
    }
    let shared = SharedMock::new(mock);
    let session = EzSignCard::with_transport(Box::new(shared.clone())).connect()?;
    Ok((session, shared))
}

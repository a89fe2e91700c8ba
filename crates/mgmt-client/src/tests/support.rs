//! Transport doubles for the client suites.

use std::sync::Mutex;

use mockall::mock;
use serde_json::Value;

use crate::errors::TransportError;
use crate::transport::Transport;

mock! {
    pub Gateway {}
    impl Transport for Gateway {
        fn send(&self, body: &Value) -> Result<Value, TransportError>;
    }
}

/// Transport answering every call with a canned body and keeping the last
/// request body.
#[derive(Debug, Default)]
pub struct CannedTransport {
    response: Value,
    sent: Mutex<Option<Value>>,
}

impl CannedTransport {
    pub fn answering(response: Value) -> Self {
        Self {
            response,
            sent: Mutex::new(None),
        }
    }

    pub fn sent(&self) -> Option<Value> {
        self.sent.lock().expect("sent lock").clone()
    }
}

impl Transport for CannedTransport {
    fn send(&self, body: &Value) -> Result<Value, TransportError> {
        *self.sent.lock().expect("sent lock") = Some(body.clone());
        Ok(self.response.clone())
    }
}

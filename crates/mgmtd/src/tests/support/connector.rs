use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;

use mgmt_types::ResourceName;

use crate::directory::{
    Connector, DirectoryConnection, DirectoryError, RemoteConnection, ResourceInfo,
};

use super::InMemoryDirectory;

/// Connector handing out connections onto an in-memory directory.
///
/// Records the environment of the latest connect and counts closes.
pub struct RecordingConnector {
    directory: InMemoryDirectory,
    pub closes: Arc<AtomicUsize>,
    pub connects: AtomicUsize,
    environment: Mutex<BTreeMap<String, Value>>,
    fail_close: bool,
}

impl RecordingConnector {
    pub fn new(directory: InMemoryDirectory) -> Self {
        Self {
            directory,
            closes: Arc::new(AtomicUsize::new(0)),
            connects: AtomicUsize::new(0),
            environment: Mutex::new(BTreeMap::new()),
            fail_close: false,
        }
    }

    /// Makes every connection fail when closed.
    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub fn last_environment(&self) -> BTreeMap<String, Value> {
        self.environment.lock().expect("environment lock").clone()
    }
}

impl Connector for RecordingConnector {
    fn connect(
        &self,
        _url: &str,
        environment: &BTreeMap<String, Value>,
    ) -> Result<Box<dyn RemoteConnection>, DirectoryError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        *self.environment.lock().expect("environment lock") = environment.clone();
        Ok(Box::new(RecordedConnection {
            directory: self.directory.clone(),
            closes: Arc::clone(&self.closes),
            fail_close: self.fail_close,
        }))
    }
}

struct RecordedConnection {
    directory: InMemoryDirectory,
    closes: Arc<AtomicUsize>,
    fail_close: bool,
}

impl DirectoryConnection for RecordedConnection {
    fn get_attribute(
        &self,
        resource: &ResourceName,
        attribute: &str,
    ) -> Result<Value, DirectoryError> {
        self.directory.get_attribute(resource, attribute)
    }

    fn set_attribute(
        &self,
        resource: &ResourceName,
        attribute: &str,
        value: Value,
    ) -> Result<Value, DirectoryError> {
        self.directory.set_attribute(resource, attribute, value)
    }

    fn invoke(
        &self,
        resource: &ResourceName,
        operation: &str,
        arguments: &[Value],
    ) -> Result<Value, DirectoryError> {
        self.directory.invoke(resource, operation, arguments)
    }

    fn query_names(&self, pattern: &ResourceName) -> Result<Vec<ResourceName>, DirectoryError> {
        self.directory.query_names(pattern)
    }

    fn describe(&self, resource: &ResourceName) -> Result<ResourceInfo, DirectoryError> {
        self.directory.describe(resource)
    }
}

impl RemoteConnection for RecordedConnection {
    fn close(&mut self) -> Result<(), DirectoryError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        if self.fail_close {
            Err(DirectoryError::io("connection reset during close", None))
        } else {
            Ok(())
        }
    }
}

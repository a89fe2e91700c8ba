//! In-memory directory used by handler, dispatcher and pipeline tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use serde_json::Value;

use mgmt_types::ResourceName;

use crate::directory::{
    AttributeInfo, DirectoryConnection, DirectoryError, OperationInfo, ResourceInfo,
};

type Operation = Arc<dyn Fn(&[Value]) -> Result<Value, DirectoryError> + Send + Sync>;

#[derive(Default, Clone)]
struct Resource {
    description: String,
    attributes: BTreeMap<String, Value>,
    operations: BTreeMap<String, Operation>,
}

/// Directory backed by a shared map. Clones observe the same resources.
#[derive(Default, Clone)]
pub struct InMemoryDirectory {
    resources: Arc<RwLock<BTreeMap<ResourceName, Resource>>>,
    reads: Arc<AtomicUsize>,
    invocations: Arc<AtomicUsize>,
}

/// Parses a resource name, panicking on invalid test input.
pub fn resource(text: &str) -> ResourceName {
    match ResourceName::parse(text) {
        Ok(name) => name,
        Err(error) => panic!("invalid test resource name '{text}': {error}"),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    fn update(self, name: &str, change: impl FnOnce(&mut Resource)) -> Self {
        {
            let mut resources = self.resources.write().expect("directory lock");
            change(resources.entry(resource(name)).or_default());
        }
        self
    }

    pub fn with_attribute(self, name: &str, attribute: &str, value: Value) -> Self {
        self.update(name, |entry| {
            entry.attributes.insert(attribute.to_owned(), value);
        })
    }

    pub fn with_description(self, name: &str, description: &str) -> Self {
        self.update(name, |entry| entry.description = description.to_owned())
    }

    pub fn with_operation<F>(self, name: &str, operation: &str, body: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, DirectoryError> + Send + Sync + 'static,
    {
        self.update(name, |entry| {
            entry
                .operations
                .insert(operation.to_owned(), Arc::new(body));
        })
    }

    pub fn with_failing_operation(self, name: &str, operation: &str, message: &str) -> Self {
        let message = message.to_owned();
        self.with_operation(name, operation, move |_| {
            Err(DirectoryError::invocation(
                "operation raised an exception",
                Some(message.clone().into()),
            ))
        })
    }

    /// Current value of an attribute, bypassing the read counter.
    pub fn value(&self, name: &str, attribute: &str) -> Option<Value> {
        self.resources
            .read()
            .expect("directory lock")
            .get(&resource(name))
            .and_then(|entry| entry.attributes.get(attribute).cloned())
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }

    fn with_resource<R>(
        &self,
        name: &ResourceName,
        action: impl FnOnce(&mut Resource) -> Result<R, DirectoryError>,
    ) -> Result<R, DirectoryError> {
        let mut resources = self.resources.write().expect("directory lock");
        let entry = resources
            .get_mut(name)
            .ok_or_else(|| DirectoryError::resource_not_found(name))?;
        action(entry)
    }
}

impl DirectoryConnection for InMemoryDirectory {
    fn get_attribute(
        &self,
        resource: &ResourceName,
        attribute: &str,
    ) -> Result<Value, DirectoryError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.with_resource(resource, |entry| {
            entry
                .attributes
                .get(attribute)
                .cloned()
                .ok_or_else(|| DirectoryError::member_not_found(resource, attribute))
        })
    }

    fn set_attribute(
        &self,
        resource: &ResourceName,
        attribute: &str,
        value: Value,
    ) -> Result<Value, DirectoryError> {
        self.with_resource(resource, |entry| {
            let slot = entry
                .attributes
                .get_mut(attribute)
                .ok_or_else(|| DirectoryError::member_not_found(resource, attribute))?;
            Ok(std::mem::replace(slot, value))
        })
    }

    fn invoke(
        &self,
        resource: &ResourceName,
        operation: &str,
        arguments: &[Value],
    ) -> Result<Value, DirectoryError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        let body = self.with_resource(resource, |entry| {
            entry
                .operations
                .get(operation)
                .cloned()
                .ok_or_else(|| DirectoryError::member_not_found(resource, operation))
        })?;
        body(arguments)
    }

    fn query_names(&self, pattern: &ResourceName) -> Result<Vec<ResourceName>, DirectoryError> {
        Ok(self
            .resources
            .read()
            .expect("directory lock")
            .keys()
            .filter(|name| pattern.matches(name))
            .cloned()
            .collect())
    }

    fn describe(&self, resource: &ResourceName) -> Result<ResourceInfo, DirectoryError> {
        self.with_resource(resource, |entry| {
            Ok(ResourceInfo {
                description: entry.description.clone(),
                attributes: entry
                    .attributes
                    .iter()
                    .map(|(name, value)| {
                        (
                            name.clone(),
                            AttributeInfo {
                                value_type: kind_of(value).to_owned(),
                                description: String::new(),
                                writable: true,
                            },
                        )
                    })
                    .collect(),
                operations: entry
                    .operations
                    .keys()
                    .map(|name| {
                        (
                            name.clone(),
                            OperationInfo {
                                args: Vec::new(),
                                return_type: String::from("object"),
                                description: String::new(),
                            },
                        )
                    })
                    .collect(),
            })
        })
    }
}

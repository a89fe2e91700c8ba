//! Behavioural tests for bulk response reconstruction.

use std::cell::RefCell;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::{Value, json};

use mgmt_types::ResourceName;

use super::support::CannedTransport;
use crate::client::{ClientResponse, ManagementClient};
use crate::errors::ClientError;
use crate::request::ClientRequest;

#[derive(Default)]
struct ClientWorld {
    requests: Vec<ClientRequest>,
    response: Option<Value>,
    result: Option<Result<Vec<ClientResponse>, ClientError>>,
}

impl ClientWorld {
    fn bulk_error(&self) -> &crate::errors::BulkRemoteError {
        match self.result.as_ref() {
            Some(Err(ClientError::Bulk(bulk))) => bulk,
            other => panic!("expected a bulk error, got {other:?}"),
        }
    }
}

fn envelope(kind: &str) -> Value {
    match kind {
        "success" => json!({"value": 1, "status": 200}),
        "access denied" => json!({
            "status": 403,
            "error": "access denied",
            "errorType": "AccessDenied"
        }),
        other => panic!("unknown envelope kind '{other}'"),
    }
}

#[fixture]
fn world() -> RefCell<ClientWorld> {
    RefCell::new(ClientWorld::default())
}

#[given("three read requests")]
fn given_requests(world: &RefCell<ClientWorld>) {
    let resource = ResourceName::parse("app:type=cache").expect("valid resource name");
    world.borrow_mut().requests = ["Size", "Hits", "Evictions"]
        .into_iter()
        .map(|attribute| ClientRequest::read(&resource, attribute))
        .collect();
}

#[given("a gateway answering {first}, {second} and {third}")]
fn given_answers(world: &RefCell<ClientWorld>, first: String, second: String, third: String) {
    world.borrow_mut().response = Some(Value::Array(
        [first, second, third]
            .iter()
            .map(|kind| envelope(kind))
            .collect(),
    ));
}

#[when("the requests are executed in bulk")]
fn when_executed(world: &RefCell<ClientWorld>) {
    let mut world = world.borrow_mut();
    let response = world.response.clone().expect("gateway answer configured");
    let client = ManagementClient::new(CannedTransport::answering(response));
    let result = client.execute_bulk(&world.requests);
    world.result = Some(result);
}

#[then("the call fails with a bulk error")]
fn then_bulk_error(world: &RefCell<ClientWorld>) {
    assert_eq!(world.borrow().bulk_error().outcomes().len(), 3);
}

#[then("outcome {position} is a success")]
fn then_success(world: &RefCell<ClientWorld>, position: usize) {
    let world = world.borrow();
    let outcome = &world.bulk_error().outcomes()[position - 1];
    assert!(outcome.is_success(), "outcome {position}: {outcome:?}");
}

#[then("outcome {position} is a failure with status {status}")]
fn then_failure(world: &RefCell<ClientWorld>, position: usize, status: u16) {
    let world = world.borrow();
    let outcome = &world.bulk_error().outcomes()[position - 1];
    assert_eq!(outcome.error().map(|error| error.status), Some(status));
}

#[then("the call returns {count} responses")]
fn then_responses(world: &RefCell<ClientWorld>, count: usize) {
    match world.borrow().result.as_ref() {
        Some(Ok(responses)) => assert_eq!(responses.len(), count),
        other => panic!("expected success, got {other:?}"),
    }
}

#[scenario(path = "tests/features/bulk_reconstruction.feature")]
fn bulk_reconstruction(#[from(world)] world: RefCell<ClientWorld>) {
    drop(world);
}

//! Behavioural tests for JSON bulk execution.

use std::cell::RefCell;
use std::sync::Arc;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::{Value, json};

use crate::frontend::JsonFrontend;
use crate::history::HistoryKey;
use crate::pipeline::ExecutionPipeline;
use crate::tests::support::{InMemoryDirectory, SelectiveRestrictor, resource};

const CACHE: &str = "app:type=cache";

#[derive(Default)]
struct BulkWorld {
    frontend: Option<JsonFrontend>,
    response: Option<Value>,
}

impl BulkWorld {
    fn install(&mut self, restrictor: SelectiveRestrictor) {
        let directory = InMemoryDirectory::new()
            .with_attribute(CACHE, "Size", json!(10))
            .with_attribute(CACHE, "Hits", json!(7))
            .with_attribute(CACHE, "Evictions", json!(2));
        let pipeline = ExecutionPipeline::builder()
            .restrictor(Arc::new(restrictor))
            .directory(Arc::new(directory))
            .build()
            .expect("pipeline builds");
        self.frontend = Some(JsonFrontend::new(Arc::new(pipeline)));
    }

    fn frontend(&self) -> &JsonFrontend {
        self.frontend.as_ref().expect("gateway installed")
    }

    fn send(&mut self, body: Value) {
        let response = self.frontend().handle_value(body).expect("no fatal errors");
        self.response = Some(response);
    }

    fn envelopes(&self) -> Vec<Value> {
        match self.response.as_ref().expect("response recorded") {
            Value::Array(envelopes) => envelopes.clone(),
            single => vec![single.clone()],
        }
    }

    fn envelope(&self, position: usize) -> Value {
        let envelopes = self.envelopes();
        envelopes
            .get(position - 1)
            .cloned()
            .unwrap_or_else(|| panic!("no envelope at {position}: {envelopes:?}"))
    }
}

fn read(attribute: &str) -> Value {
    json!({"type": "read", "resource": CACHE, "attribute": attribute})
}

#[fixture]
fn world() -> RefCell<BulkWorld> {
    RefCell::new(BulkWorld::default())
}

#[given("a gateway that refuses reads of {member}")]
fn given_refusing_gateway(world: &RefCell<BulkWorld>, member: String) {
    let member = member.trim_matches('"');
    world
        .borrow_mut()
        .install(SelectiveRestrictor::denying_member(member));
}

#[given("a gateway that refuses nothing")]
fn given_open_gateway(world: &RefCell<BulkWorld>) {
    world.borrow_mut().install(SelectiveRestrictor::default());
}

#[given("history tracking of {count} values for {attribute}")]
fn given_history(world: &RefCell<BulkWorld>, count: usize, attribute: String) {
    let key = HistoryKey::attribute(resource(CACHE), attribute.trim_matches('"'), None, None);
    world
        .borrow()
        .frontend()
        .pipeline()
        .history()
        .configure(key, count);
}

#[when("a bulk request reads {first}, {second} and {third}")]
fn when_bulk_read(world: &RefCell<BulkWorld>, first: String, second: String, third: String) {
    let body = Value::Array(
        [first, second, third]
            .iter()
            .map(|attribute| read(attribute.trim_matches('"')))
            .collect(),
    );
    world.borrow_mut().send(body);
}

#[when("a bulk request mixes a malformed element between two version requests")]
fn when_mixed_bulk(world: &RefCell<BulkWorld>) {
    world.borrow_mut().send(json!([
        {"type": "version"},
        {"type": "read"},
        {"type": "version"}
    ]));
}

#[when("the {attribute} attribute is read twice")]
fn when_read_twice(world: &RefCell<BulkWorld>, attribute: String) {
    let request = read(attribute.trim_matches('"'));
    let mut world = world.borrow_mut();
    world.send(request.clone());
    world.send(request);
}

#[then("the response holds {count} envelopes")]
fn then_envelope_count(world: &RefCell<BulkWorld>, count: usize) {
    assert_eq!(world.borrow().envelopes().len(), count);
}

#[then("envelope {position} succeeds with value {value}")]
fn then_succeeds_with(world: &RefCell<BulkWorld>, position: usize, value: i64) {
    let envelope = world.borrow().envelope(position);
    assert_eq!(envelope["status"], json!(200), "envelope: {envelope}");
    assert_eq!(envelope["value"], json!(value));
}

#[then("envelope {position} reports status {status}")]
fn then_reports_status(world: &RefCell<BulkWorld>, position: usize, status: u16) {
    let envelope = world.borrow().envelope(position);
    assert_eq!(envelope["status"], json!(status), "envelope: {envelope}");
}

#[then("envelope {position} fails with status {status}")]
fn then_fails_with(world: &RefCell<BulkWorld>, position: usize, status: u16) {
    let envelope = world.borrow().envelope(position);
    assert_eq!(envelope["status"], json!(status), "envelope: {envelope}");
    assert!(envelope.get("error").is_some());
}

#[then("the aggregate result code is {status}")]
fn then_result_code(world: &RefCell<BulkWorld>, status: u16) {
    let world = world.borrow();
    let response = world.response.as_ref().expect("response recorded");
    assert_eq!(
        JsonFrontend::result_code(response).expect("statuses present"),
        status
    );
}

#[then("the latest envelope carries {count} previous value")]
fn then_history_length(world: &RefCell<BulkWorld>, count: usize) {
    let envelope = world.borrow().envelope(1);
    let history = envelope["history"].as_array().cloned().unwrap_or_default();
    assert_eq!(history.len(), count, "envelope: {envelope}");
}

#[scenario(path = "tests/features/bulk_execution.feature")]
fn bulk_execution(#[from(world)] world: RefCell<BulkWorld>) {
    drop(world);
}

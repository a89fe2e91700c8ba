//! Unit tests for single and bulk execution through the pipeline.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use rstest::{fixture, rstest};
use serde_json::{Value, json};

use mgmt_config::{Config, RestrictorKind};
use mgmt_types::{RequestType, ResourceName};

use crate::directory::DirectoryConnection;
use crate::dispatch::{DispatchOutcome, Dispatcher};
use crate::errors::GatewayError;
use crate::history::HistoryKey;
use crate::pipeline::ExecutionPipeline;
use crate::request::{ManagementRequest, RemoteTarget};
use crate::tests::support::{
    InMemoryDirectory, MockPolicy, RecordingConnector, SelectiveRestrictor, resource,
};

const CACHE: &str = "app:type=cache";

fn directory() -> InMemoryDirectory {
    InMemoryDirectory::new()
        .with_attribute(CACHE, "Size", json!(10))
        .with_attribute(CACHE, "Hits", json!(3))
        .with_attribute(CACHE, "Limits", json!({"soft": 5, "hard": 8}))
        .with_operation(CACHE, "clear", |_| Ok(json!("cleared")))
}

#[fixture]
fn pipeline() -> ExecutionPipeline {
    ExecutionPipeline::builder()
        .directory(Arc::new(directory()))
        .build()
        .expect("pipeline builds")
}

fn cache() -> ResourceName {
    resource(CACHE)
}

/// Dispatcher failing every request it accepts with a fixed error.
struct FailingDispatcher {
    fatal: bool,
}

impl Dispatcher for FailingDispatcher {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn can_handle(&self, request: &ManagementRequest) -> bool {
        request.request_type() == RequestType::Search
    }

    fn dispatch(&self, request: &ManagementRequest) -> Result<DispatchOutcome, GatewayError> {
        if self.fatal {
            Err(GatewayError::unsupported_operation(request.request_type()))
        } else {
            Err(GatewayError::invocation("search backend offline"))
        }
    }
}

#[rstest]
fn successful_envelopes_carry_status_and_timestamp(pipeline: ExecutionPipeline) {
    let envelope = pipeline
        .execute_one(&ManagementRequest::read(cache(), "Size"))
        .expect("non-fatal");
    assert_eq!(envelope.value, json!(10));
    assert_eq!(envelope.status, 200);
    assert!(envelope.timestamp.is_some());
    assert!(envelope.error.is_none());
}

#[rstest]
fn paths_narrow_read_results(pipeline: ExecutionPipeline) {
    let envelope = pipeline
        .execute_one(&ManagementRequest::read(cache(), "Limits").with_path("hard"))
        .expect("non-fatal");
    assert_eq!(envelope.value, json!(8));
}

#[rstest]
fn validation_failures_become_envelopes(pipeline: ExecutionPipeline) {
    let request = ManagementRequest::read_many(cache(), Vec::<String>::new());
    let envelope = pipeline.execute_one(&request).expect("non-fatal");
    assert_eq!(envelope.status, 400);
    assert_eq!(envelope.error_type.as_deref(), Some("MalformedRequest"));
    assert!(envelope.stacktrace.is_none());
}

#[rstest]
#[case(ManagementRequest::read(resource("app:type=missing"), "Size"), 404, "ResourceNotFound")]
#[case(ManagementRequest::read(resource(CACHE), "Nope"), 404, "MemberNotFound")]
#[case(ManagementRequest::exec(resource(CACHE), "explode", vec![]), 404, "MemberNotFound")]
fn handler_failures_are_translated(
    pipeline: ExecutionPipeline,
    #[case] request: ManagementRequest,
    #[case] status: u16,
    #[case] error_type: &str,
) {
    let envelope = pipeline.execute_one(&request).expect("non-fatal");
    assert_eq!(envelope.status, status);
    assert_eq!(envelope.error_type.as_deref(), Some(error_type));
    assert_eq!(envelope.value, Value::Null);
}

#[rstest]
fn denied_requests_yield_forbidden() {
    let pipeline = ExecutionPipeline::builder()
        .restrictor(Arc::new(SelectiveRestrictor::denying_member("Hits")))
        .directory(Arc::new(directory()))
        .build()
        .expect("pipeline builds");
    let envelope = pipeline
        .execute_one(&ManagementRequest::read(cache(), "Hits"))
        .expect("non-fatal");
    assert_eq!(envelope.status, 403);
    assert_eq!(envelope.error_type.as_deref(), Some("AccessDenied"));
}

#[rstest]
fn debug_mode_attaches_error_chain() {
    let pipeline = ExecutionPipeline::builder()
        .directory(Arc::new(
            directory().with_failing_operation(CACHE, "compact", "disk full"),
        ))
        .debug(true)
        .build()
        .expect("pipeline builds");
    assert!(pipeline.is_debug());

    let envelope = pipeline
        .execute_one(&ManagementRequest::exec(cache(), "compact", vec![]))
        .expect("non-fatal");
    assert_eq!(envelope.status, 500);
    let stacktrace = envelope.stacktrace.expect("debug stacktrace");
    assert!(stacktrace.contains("disk full"), "got {stacktrace}");
}

#[rstest]
fn bulk_execution_preserves_order_and_length() {
    let pipeline = ExecutionPipeline::builder()
        .restrictor(Arc::new(SelectiveRestrictor::denying_member("Hits")))
        .directory(Arc::new(directory()))
        .build()
        .expect("pipeline builds");
    let requests = vec![
        ManagementRequest::read(cache(), "Size"),
        ManagementRequest::read(cache(), "Hits"),
        ManagementRequest::version(),
        ManagementRequest::read(resource("app:type=missing"), "Size"),
    ];

    let envelopes = pipeline.execute_many(&requests).expect("no fatal errors");
    let statuses: Vec<u16> = envelopes.iter().map(|envelope| envelope.status).collect();
    assert_eq!(statuses, vec![200, 403, 200, 404]);

    for (request, bulk) in requests.iter().zip(&envelopes) {
        let single = pipeline.execute_one(request).expect("non-fatal");
        assert_eq!(single.status, bulk.status);
        assert_eq!(single.value, bulk.value);
        assert_eq!(single.error_type, bulk.error_type);
    }
}

#[rstest]
fn empty_bulk_yields_no_envelopes(pipeline: ExecutionPipeline) {
    assert!(pipeline.execute_many(&[]).expect("no fatal errors").is_empty());
}

#[rstest]
fn non_fatal_dispatcher_errors_are_translated() {
    let pipeline = ExecutionPipeline::builder()
        .dispatcher(Box::new(FailingDispatcher { fatal: false }))
        .build()
        .expect("pipeline builds");
    let envelope = pipeline
        .execute_one(&ManagementRequest::search(resource("app:*")))
        .expect("non-fatal");
    assert_eq!(envelope.status, 500);
    assert_eq!(envelope.error_type.as_deref(), Some("InvocationFailure"));
}

#[rstest]
fn fatal_errors_abort_bulk_execution() {
    let pipeline = ExecutionPipeline::builder()
        .directory(Arc::new(directory()))
        .dispatcher(Box::new(FailingDispatcher { fatal: true }))
        .build()
        .expect("pipeline builds");
    let requests = vec![
        ManagementRequest::read(cache(), "Size"),
        ManagementRequest::search(resource("app:*")),
    ];

    let error = pipeline.execute_many(&requests).expect_err("fatal error");
    assert!(matches!(error, GatewayError::UnsupportedOperation { .. }));
}

#[rstest]
fn targeted_requests_route_to_the_remote_dispatcher() {
    let remote = InMemoryDirectory::new().with_attribute(CACHE, "Size", json!(99));
    let connector = Arc::new(RecordingConnector::new(remote));
    let pipeline = ExecutionPipeline::builder()
        .directory(Arc::new(directory()))
        .connector(connector.clone())
        .dispatcher_token("remote")
        .build()
        .expect("pipeline builds");
    assert_eq!(pipeline.dispatcher_names(), vec!["remote", "local"]);

    let local = pipeline
        .execute_one(&ManagementRequest::read(cache(), "Size"))
        .expect("non-fatal");
    let proxied = pipeline
        .execute_one(
            &ManagementRequest::read(cache(), "Size")
                .with_target(RemoteTarget::new("service:remote://host:9999")),
        )
        .expect("non-fatal");

    assert_eq!(local.value, json!(10));
    assert_eq!(proxied.value, json!(99));
    assert_eq!(connector.connects.load(Ordering::SeqCst), 1);
    assert_eq!(connector.closes.load(Ordering::SeqCst), 1);
}

#[rstest]
fn unknown_dispatcher_tokens_fail_construction() {
    let error = ExecutionPipeline::builder()
        .dispatcher_token("carrier-pigeon")
        .build()
        .err()
        .expect("unknown token");
    assert!(error.is_fatal());
    assert_eq!(error.error_type(), "UnknownDispatcher");
}

#[rstest]
fn remote_token_without_connector_is_a_configuration_error() {
    let error = ExecutionPipeline::builder()
        .dispatcher_token("remote")
        .build()
        .err()
        .expect("connector missing");
    assert_eq!(error.error_type(), "Configuration");
}

#[rstest]
fn tracked_reads_attach_prior_values(pipeline: ExecutionPipeline) {
    let key = HistoryKey::attribute(cache(), "Size", None, None);
    pipeline.history().configure(key.clone(), 3);
    let request = ManagementRequest::read(cache(), "Size");

    let first = pipeline.execute_one(&request).expect("non-fatal");
    let second = pipeline.execute_one(&request).expect("non-fatal");

    assert_eq!(first.history, Some(json!([])));
    let history = second.history.expect("history attached");
    assert_eq!(history.as_array().map(Vec::len), Some(1));
    assert_eq!(history[0]["value"], json!(10));
    assert_eq!(pipeline.history().values(&key).len(), 2);
}

#[rstest]
fn untracked_reads_carry_no_history(pipeline: ExecutionPipeline) {
    let envelope = pipeline
        .execute_one(&ManagementRequest::read(cache(), "Size"))
        .expect("non-fatal");
    assert!(envelope.history.is_none());
    assert!(pipeline.history().is_empty());
}

#[rstest]
fn failed_requests_are_not_recorded(pipeline: ExecutionPipeline) {
    let key = HistoryKey::attribute(cache(), "Nope", None, None);
    pipeline.history().configure(key.clone(), 3);
    pipeline
        .execute_one(&ManagementRequest::read(cache(), "Nope"))
        .expect("non-fatal");
    assert!(pipeline.history().values(&key).is_empty());
}

#[rstest]
fn tracked_operations_record_results(pipeline: ExecutionPipeline) {
    let key = HistoryKey::operation(cache(), "clear", None);
    pipeline.history().configure(key.clone(), 2);
    let request = ManagementRequest::exec(cache(), "clear", vec![]);

    pipeline.execute_one(&request).expect("non-fatal");
    let second = pipeline.execute_one(&request).expect("non-fatal");

    assert_eq!(second.history.expect("history")[0]["value"], json!("cleared"));
}

#[rstest]
fn from_config_applies_settings() {
    let config = Config {
        debug: true,
        history_max_entries: 4,
        restrictor: RestrictorKind::DenyAll,
        ..Config::default()
    };
    let directories: Vec<Arc<dyn DirectoryConnection>> = vec![Arc::new(directory())];
    let pipeline =
        ExecutionPipeline::from_config(&config, directories, None).expect("pipeline builds");

    assert!(pipeline.is_debug());
    assert_eq!(pipeline.history().global_ceiling(), 4);
    assert!(!pipeline.is_remote_access_allowed("localhost", "127.0.0.1"));

    let envelope = pipeline
        .execute_one(&ManagementRequest::read(cache(), "Size"))
        .expect("non-fatal");
    assert_eq!(envelope.status, 403);
    assert!(envelope.stacktrace.is_some());
}

#[rstest]
fn restrictor_is_consulted_for_the_request_type() {
    let mut policy = MockPolicy::new();
    policy
        .expect_is_type_allowed()
        .withf(|request_type| *request_type == RequestType::Version)
        .times(1)
        .return_const(false);
    let pipeline = ExecutionPipeline::builder()
        .restrictor(Arc::new(policy))
        .build()
        .expect("pipeline builds");

    let envelope = pipeline
        .execute_one(&ManagementRequest::version())
        .expect("non-fatal");
    assert_eq!(envelope.status, 403);
}

#[rstest]
fn denied_request_types_fail_without_touching_the_directory() {
    let directory = directory();
    let pipeline = ExecutionPipeline::builder()
        .restrictor(Arc::new(SelectiveRestrictor::denying_type(RequestType::Read)))
        .directory(Arc::new(directory.clone()))
        .build()
        .expect("pipeline builds");

    let envelope = pipeline
        .execute_one(&ManagementRequest::read(cache(), "Size"))
        .expect("non-fatal");
    assert_eq!(envelope.status, 403);
    assert_eq!(directory.reads(), 0);
}

#[rstest]
fn version_is_served_without_directories() {
    let pipeline = ExecutionPipeline::builder()
        .build()
        .expect("pipeline builds");

    let envelope = pipeline
        .execute_one(&ManagementRequest::version())
        .expect("non-fatal");
    assert_eq!(envelope.status, 200);
    assert_eq!(envelope.value["protocol"], json!("1.0"));
}

use catalog_hooks::{
    DeployRequest, DeploymentClient, HookDispatchError, RestClientConfig, RestDeploymentClient,
};
use catalog_types::EntityId;
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn make_client(server: &MockServer) -> RestDeploymentClient {
    RestDeploymentClient::new(RestClientConfig {
        base_url: format!("{}/api/v1/", server.uri()),
        timeout_secs: 5,
    })
    .unwrap()
}

fn make_request() -> DeployRequest {
    DeployRequest {
        entity_type: "ingestionPipeline".into(),
        id: EntityId::new(),
        name: "svc-a".into(),
        fully_qualified_name: "airflow.svc-a".into(),
        entity: json!({"name": "svc-a", "airflowConfig": {"forceDeploy": true}}),
    }
}

// ── Config ──────────────────────────────────────────────────────

#[test]
fn rest_config_default() {
    let cfg = RestClientConfig::default();
    assert_eq!(cfg.base_url, "http://localhost:8080/api/v1");
    assert_eq!(cfg.timeout_secs, 30);
}

#[test]
fn rest_config_serde_fills_missing_fields() {
    let cfg: RestClientConfig = serde_json::from_str(r#"{"base_url": "http://orch"}"#).unwrap();
    assert_eq!(cfg.base_url, "http://orch");
    assert_eq!(cfg.timeout_secs, 30);
}

// ── Deploy ──────────────────────────────────────────────────────

#[tokio::test]
async fn deploy_posts_entity_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/deploy"))
        .and(body_json(json!({"name": "svc-a", "airflowConfig": {"forceDeploy": true}})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    make_client(&server).deploy(&make_request()).await.unwrap();
}

#[tokio::test]
async fn deploy_error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/deploy"))
        .respond_with(ResponseTemplate::new(500).set_body_string("scheduler down"))
        .mount(&server)
        .await;

    let err = make_client(&server).deploy(&make_request()).await.unwrap_err();
    match err {
        HookDispatchError::Status { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "scheduler down");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn deploy_to_unreachable_host_is_http_error() {
    let client = RestDeploymentClient::new(RestClientConfig {
        base_url: "http://127.0.0.1:1".into(),
        timeout_secs: 1,
    })
    .unwrap();
    let err = client.deploy(&make_request()).await.unwrap_err();
    assert!(matches!(err, HookDispatchError::Http(_)));
}

// ── Undeploy ────────────────────────────────────────────────────

#[tokio::test]
async fn undeploy_sends_delete_with_dag_id() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/delete"))
        .and(query_param("dag_id", "svc a"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    make_client(&server).undeploy("svc a").await.unwrap();
}

#[tokio::test]
async fn undeploy_of_unknown_name_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/delete"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    make_client(&server).undeploy("ghost").await.unwrap();
}

#[tokio::test]
async fn undeploy_server_error_fails() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/delete"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = make_client(&server).undeploy("svc-a").await.unwrap_err();
    assert!(matches!(err, HookDispatchError::Status { status: 503, .. }));
}

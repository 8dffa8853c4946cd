use async_trait::async_trait;
use catalog_hooks::{
    DeployRequest, DeploymentClient, HookAction, HookDispatchError, HookDispatcher, HookReport,
    HookResult, RetryConfig,
};
use catalog_types::EntityId;
use serde_json::json;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Records calls and fails the first `failures` of them.
#[derive(Default)]
struct FlakyClient {
    failures: u32,
    calls: AtomicU32,
    deployed: Mutex<Vec<String>>,
    undeployed: Mutex<Vec<String>>,
}

impl FlakyClient {
    fn failing(failures: u32) -> Self {
        Self {
            failures,
            ..Default::default()
        }
    }

    fn fail_if_due(&self) -> HookResult<()> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.failures {
            return Err(HookDispatchError::Client(format!("attempt {call} refused")));
        }
        Ok(())
    }
}

#[async_trait]
impl DeploymentClient for FlakyClient {
    async fn deploy(&self, request: &DeployRequest) -> HookResult<()> {
        self.fail_if_due()?;
        self.deployed.lock().unwrap().push(request.name.clone());
        Ok(())
    }

    async fn undeploy(&self, name: &str) -> HookResult<()> {
        self.fail_if_due()?;
        self.undeployed.lock().unwrap().push(name.to_string());
        Ok(())
    }
}

fn make_request(name: &str) -> DeployRequest {
    DeployRequest {
        entity_type: "ingestionPipeline".into(),
        id: EntityId::new(),
        name: name.into(),
        fully_qualified_name: format!("airflow.{name}"),
        entity: json!({"name": name}),
    }
}

fn fast_retry(max_attempts: u32) -> RetryConfig {
    RetryConfig {
        max_attempts,
        backoff_ms: 1,
    }
}

// ── RetryConfig ──────────────────────────────────────────────────

#[test]
fn retry_config_defaults() {
    let cfg = RetryConfig::default();
    assert_eq!(cfg.max_attempts, 3);
    assert_eq!(cfg.backoff_ms, 200);
}

#[test]
fn retry_config_partial_json_uses_defaults() {
    let cfg: RetryConfig = serde_json::from_str(r#"{"max_attempts": 5}"#).unwrap();
    assert_eq!(cfg.max_attempts, 5);
    assert_eq!(cfg.backoff_ms, 200);
}

#[test]
fn backoff_doubles_per_attempt() {
    let cfg = RetryConfig::default();
    assert_eq!(cfg.delay_after(1), Duration::from_millis(200));
    assert_eq!(cfg.delay_after(2), Duration::from_millis(400));
    assert_eq!(cfg.delay_after(3), Duration::from_millis(800));
    assert_eq!(RetryConfig::no_retry().delay_after(1), Duration::ZERO);
}

// ── Dispatch ─────────────────────────────────────────────────────

#[tokio::test]
async fn dispatch_without_client_is_skipped() {
    let dispatcher = HookDispatcher::disabled();
    assert!(!dispatcher.has_client());
    let report = dispatcher.dispatch(HookAction::Deploy(make_request("p1"))).await;
    assert!(matches!(report, HookReport::Skipped));
    assert!(!report.was_dispatched());
}

#[tokio::test]
async fn deploy_succeeds_first_try() {
    let client = Arc::new(FlakyClient::default());
    let dispatcher = HookDispatcher::new(client.clone(), fast_retry(3));

    let report = dispatcher.dispatch(HookAction::Deploy(make_request("p1"))).await;
    assert!(matches!(report, HookReport::Succeeded { attempts: 1 }));
    assert_eq!(*client.deployed.lock().unwrap(), vec!["p1".to_string()]);
}

#[tokio::test]
async fn undeploy_goes_to_client_by_name() {
    let client = Arc::new(FlakyClient::default());
    let dispatcher = HookDispatcher::new(client.clone(), fast_retry(1));

    let report = dispatcher
        .dispatch(HookAction::Undeploy { name: "p1".into() })
        .await;
    assert!(report.was_dispatched());
    assert_eq!(*client.undeployed.lock().unwrap(), vec!["p1".to_string()]);
    assert!(client.deployed.lock().unwrap().is_empty());
}

#[tokio::test]
async fn transient_failures_are_retried() {
    let client = Arc::new(FlakyClient::failing(2));
    let dispatcher = HookDispatcher::new(client.clone(), fast_retry(3));

    let report = dispatcher.dispatch(HookAction::Deploy(make_request("p1"))).await;
    assert!(matches!(report, HookReport::Succeeded { attempts: 3 }));
    assert_eq!(client.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn exhausted_retries_report_failure() {
    let client = Arc::new(FlakyClient::failing(10));
    let dispatcher = HookDispatcher::new(client.clone(), fast_retry(2));

    let report = dispatcher.dispatch(HookAction::Deploy(make_request("p1"))).await;
    assert!(report.is_failed());
    match report {
        HookReport::Failed { error, attempts } => {
            assert_eq!(attempts, 2);
            assert!(error.to_string().contains("attempt 2 refused"));
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(client.deployed.lock().unwrap().is_empty());
}

#[tokio::test]
async fn zero_attempts_still_calls_once() {
    let client = Arc::new(FlakyClient::default());
    let dispatcher = HookDispatcher::new(client.clone(), fast_retry(0));
    let report = dispatcher.dispatch(HookAction::Deploy(make_request("p1"))).await;
    assert!(matches!(report, HookReport::Succeeded { attempts: 1 }));
}

#[tokio::test(start_paused = true)]
async fn retries_wait_for_backoff() {
    let client = Arc::new(FlakyClient::failing(1));
    let dispatcher = HookDispatcher::new(client.clone(), RetryConfig::default());

    let start = tokio::time::Instant::now();
    let report = dispatcher.dispatch(HookAction::Deploy(make_request("p1"))).await;
    assert!(matches!(report, HookReport::Succeeded { attempts: 2 }));
    assert!(start.elapsed() >= Duration::from_millis(200));
}

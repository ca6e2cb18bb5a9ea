//! Routing policy tests: which backend serves which request, and when none
//! is called at all.

use std::fs;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;

use modelgate_service::locator::ModelLocator;
use modelgate_service::providers::{BackendError, ChatProvider, ChatProviderDyn};
use modelgate_service::router::{ChatRouter, RouteError, RouteRequest};

enum Behavior {
    Answer(&'static str),
    ProcessFailure(&'static str),
}

/// Records every call and returns a canned outcome.
struct RecordingProvider {
    tag: &'static str,
    behavior: Behavior,
    calls: AtomicU32,
    last_args: Mutex<Option<(String, String, Option<String>)>>,
}

impl RecordingProvider {
    fn new(tag: &'static str, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            tag,
            behavior,
            calls: AtomicU32::new(0),
            last_args: Mutex::new(None),
        })
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ChatProvider for RecordingProvider {
    fn name(&self) -> &'static str {
        self.tag
    }

    async fn chat(
        &self,
        model: &str,
        content: &str,
        system_prompt: Option<&str>,
    ) -> Result<String, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_args.lock().unwrap() = Some((
            model.to_string(),
            content.to_string(),
            system_prompt.map(str::to_string),
        ));
        match &self.behavior {
            Behavior::Answer(answer) => Ok(answer.to_string()),
            Behavior::ProcessFailure(stderr) => Err(BackendError::Process {
                model: model.to_string(),
                stderr: stderr.to_string(),
            }),
        }
    }
}

struct Fixture {
    _base: TempDir,
    process: Arc<RecordingProvider>,
    server: Arc<RecordingProvider>,
    managed: Arc<RecordingProvider>,
    router: ChatRouter,
}

fn fixture(local_models: &[&str], server_configured: bool) -> Fixture {
    fixture_with(local_models, server_configured, Behavior::Answer("cli answer"))
}

fn fixture_with(local_models: &[&str], server_configured: bool, process: Behavior) -> Fixture {
    let base = TempDir::new().unwrap();
    for model in local_models {
        let dir = base.path().join(model);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("weights.gguf"), b"gguf").unwrap();
    }

    let process = RecordingProvider::new("process", process);
    let server = RecordingProvider::new("server", Behavior::Answer("server answer"));
    let managed = RecordingProvider::new("managed", Behavior::Answer("managed answer"));

    let router = ChatRouter::new(
        ModelLocator::new(base.path()),
        process.clone() as Arc<dyn ChatProviderDyn>,
        server_configured.then(|| server.clone() as Arc<dyn ChatProviderDyn>),
        managed.clone() as Arc<dyn ChatProviderDyn>,
    );

    Fixture {
        _base: base,
        process,
        server,
        managed,
        router,
    }
}

fn request(model: &str, mode: &str) -> RouteRequest {
    RouteRequest {
        model: model.to_string(),
        content: "hello".to_string(),
        llama_mode: mode.to_string(),
        system_prompt: None,
    }
}

#[tokio::test]
async fn cli_mode_with_local_artifact_uses_process_backend() {
    let fx = fixture(&["local-model"], true);

    let answer = fx.router.route(&request("local-model", "cli")).await.unwrap();

    assert_eq!(answer, "cli answer");
    assert_eq!(fx.process.calls(), 1);
    assert_eq!(fx.server.calls(), 0);
    assert_eq!(fx.managed.calls(), 0);
}

#[tokio::test]
async fn server_mode_with_local_artifact_uses_http_backend() {
    let fx = fixture(&["local-model"], true);

    let answer = fx
        .router
        .route(&request("local-model", "server"))
        .await
        .unwrap();

    assert_eq!(answer, "server answer");
    assert_eq!(fx.server.calls(), 1);
    assert_eq!(fx.process.calls(), 0);
    assert_eq!(fx.managed.calls(), 0);
}

#[tokio::test]
async fn remote_model_goes_to_managed_backend_in_any_mode() {
    for mode in ["cli", "server"] {
        let fx = fixture(&[], true);

        let answer = fx.router.route(&request("remote-only", mode)).await.unwrap();

        assert_eq!(answer, "managed answer");
        assert_eq!(fx.managed.calls(), 1);
        assert_eq!(fx.process.calls(), 0);
        assert_eq!(fx.server.calls(), 0);
    }
}

#[tokio::test]
async fn server_mode_without_url_is_a_configuration_error() {
    let fx = fixture(&["local-model"], false);

    let err = fx
        .router
        .route(&request("local-model", "server"))
        .await
        .unwrap_err();

    assert!(matches!(err, RouteError::ServerUrlNotConfigured));
    assert_eq!(fx.process.calls(), 0);
    assert_eq!(fx.managed.calls(), 0);
}

#[tokio::test]
async fn unknown_mode_is_rejected_before_any_backend_call() {
    let fx = fixture(&["local-model"], true);

    let err = fx
        .router
        .route(&request("local-model", "invalid"))
        .await
        .unwrap_err();

    assert!(matches!(err, RouteError::InvalidMode(_)));
    assert_eq!(
        err.to_string(),
        "Invalid llama_mode: 'invalid'. Must be 'cli' or 'server'"
    );
    assert_eq!(fx.process.calls(), 0);
    assert_eq!(fx.server.calls(), 0);
    assert_eq!(fx.managed.calls(), 0);
}

#[tokio::test]
async fn blank_content_is_rejected_before_routing() {
    let fx = fixture(&["local-model"], true);
    let mut req = request("local-model", "cli");
    req.content = "   ".to_string();

    let err = fx.router.route(&req).await.unwrap_err();

    assert!(matches!(err, RouteError::MissingContent));
    assert_eq!(err.to_string(), "Missing prompt content");
    assert_eq!(fx.process.calls(), 0);
    assert_eq!(fx.managed.calls(), 0);
}

#[tokio::test]
async fn process_failure_propagates_without_managed_fallback() {
    let fx = fixture_with(
        &["local-model"],
        true,
        Behavior::ProcessFailure("CUDA out of memory"),
    );

    let err = fx
        .router
        .route(&request("local-model", "cli"))
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "llama.cpp failed for local-model: CUDA out of memory"
    );
    assert_eq!(fx.process.calls(), 1);
    assert_eq!(fx.managed.calls(), 0);
}

#[tokio::test]
async fn outcomes_are_counted_under_the_provider_label() {
    let fx = fixture_with(&["local-model"], true, Behavior::ProcessFailure("boom"));

    fx.router
        .route(&request("local-model", "cli"))
        .await
        .unwrap_err();

    // Counters and logs share one vocabulary: the provider's own name.
    // The collector is process-wide and monotonic, so only lower bounds.
    let snapshot = modelgate_service::metrics::snapshot();
    let entry = snapshot
        .iter()
        .find(|m| m.backend == "process")
        .expect("failing provider counted under its own label");
    assert!(entry.requests_total >= 1);
    assert!(entry.requests_failed >= 1);
}

#[tokio::test]
async fn system_prompt_is_forwarded_to_the_selected_backend() {
    let fx = fixture(&["local-model"], true);
    let mut req = request("local-model", "cli");
    req.system_prompt = Some("You are terse.".to_string());

    fx.router.route(&req).await.unwrap();

    let args = fx.process.last_args.lock().unwrap().clone().unwrap();
    assert_eq!(args.0, "local-model");
    assert_eq!(args.1, "hello");
    assert_eq!(args.2.as_deref(), Some("You are terse."));
}

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use modelgate_service::auth::{ApiKeyStore, RedisKeyStore};
use modelgate_service::config::{normalize_addr, normalize_base_url, parse_model_list, Config};
use modelgate_service::locator::ModelLocator;
use modelgate_service::providers::{
    ChatProviderDyn, LlamaCliConfig, LlamaCliProvider, LlamaServerProvider, OllamaProvider,
};
use modelgate_service::router::ChatRouter;
use modelgate_service::server;

#[tokio::main]
async fn main() {
    let config = Config::parse();
    init_logging(&config.log_format);

    let Some(redis_url) = config.redis_url.clone() else {
        error!("a credential store URL is required (--redis-url or MODELGATE_REDIS_URL)");
        std::process::exit(1);
    };

    let key_store: Arc<dyn ApiKeyStore> = match RedisKeyStore::connect(&redis_url).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!(error = %e, "failed to connect to credential store");
            std::process::exit(1);
        }
    };

    let locator = ModelLocator::new(config.model_base_dir.clone());

    let request_timeout = Duration::from_secs(config.cli_timeout_secs);
    let process: Arc<dyn ChatProviderDyn> = Arc::new(LlamaCliProvider::new(
        LlamaCliConfig {
            cli_path: config.llama_cli_path.clone(),
            gpu_layers: config.gpu_layers,
            timeout: request_timeout,
            large_model_timeout: Duration::from_secs(config.cli_timeout_large_secs),
            large_models: config
                .large_models
                .as_deref()
                .map(parse_model_list)
                .unwrap_or_default(),
        },
        locator.clone(),
    ));

    let server_backend: Option<Arc<dyn ChatProviderDyn>> =
        config.llama_server_url.as_deref().map(|raw| {
            let base_url = normalize_base_url(raw);
            info!(url = %base_url, "llama-server backend enabled");
            Arc::new(LlamaServerProvider::new(base_url, request_timeout))
                as Arc<dyn ChatProviderDyn>
        });

    let managed: Arc<dyn ChatProviderDyn> = Arc::new(OllamaProvider::new(
        normalize_base_url(&config.ollama_url),
        request_timeout,
    ));

    let chat_router = Arc::new(ChatRouter::new(locator, process, server_backend, managed));
    let app = server::build_router(chat_router, key_store, config.default_model.clone());

    let addr = normalize_addr(&config.addr);
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr, error = %e, "failed to bind");
            std::process::exit(1);
        }
    };

    info!(
        addr,
        model_base_dir = %config.model_base_dir.display(),
        default_model = %config.default_model,
        "gateway starting"
    );

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!(error = %e, "server error");
        std::process::exit(1);
    }

    info!("gateway stopped");
}

fn init_logging(format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        "json" => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        _ => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install ctrl-c handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => error!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received ctrl-c, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}

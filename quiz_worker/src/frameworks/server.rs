// Framework bootstrap for the quiz worker runtime.

use crate::frameworks::config::{self, WorkerSettings};
use crate::interface_adapters::clients::{ChatCompletionsClient, JwksClient, WebhookClient};
use crate::interface_adapters::routes::app;
use crate::interface_adapters::state::AppState;
use crate::use_cases::{GenerationTask, KeySetCache, QuizDispatcher, TokenVerifier};

use std::net::SocketAddr;
use std::{io::Result, sync::Arc};

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    if wants_json_logs(std::env::var("LOG_FORMAT").ok().as_deref()) {
        builder.json().with_current_span(true).init();
    } else {
        builder.compact().init();
    }

    // Background generations run on worker threads; name the thread so a panic
    // can be matched to its `generation` span.
    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        let thread = std::thread::current();
        let thread = thread.name().unwrap_or("unnamed");
        tracing::error!(%info, thread, ?backtrace, "panic");
    }));

    tracing::info!(
        service = env!("CARGO_PKG_NAME"),
        version = env!("CARGO_PKG_VERSION"),
        "quiz worker starting"
    );
}

fn wants_json_logs(log_format: Option<&str>) -> bool {
    log_format.is_some_and(|format| format.trim().eq_ignore_ascii_case("json"))
}

pub async fn run(listener: tokio::net::TcpListener, settings: WorkerSettings) -> Result<()> {
    let address = listener.local_addr()?;
    let state = build_state(settings)?;
    let app = app(state);

    tracing::info!(%address, "listening");

    // Serve app and report errors rather than panicking
    axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    })
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let settings = WorkerSettings::from_env().map_err(|e| {
        tracing::error!(error = %e, "invalid configuration");
        std::io::Error::other(e)
    })?;

    let address = SocketAddr::from(([0, 0, 0, 0], config::http_port()));

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener, settings).await
}

fn build_state(settings: WorkerSettings) -> Result<Arc<AppState>> {
    if settings.trusted_domains.is_empty() {
        tracing::warn!("no trusted issuer domains configured; every token will be rejected");
    }

    let jwks_client = JwksClient::new(
        settings.jwks_url_template.clone(),
        settings.jwks_fetch_timeout,
    )
    .map_err(|e| std::io::Error::other(format!("failed to initialize key set client: {e}")))?;
    tracing::debug!(
        jwks_url_template = %settings.jwks_url_template,
        jwks_fetch_timeout_ms = settings.jwks_fetch_timeout.as_millis(),
        jwks_min_refresh_secs = settings.jwks_min_refresh_interval.as_secs(),
        trusted_domains = ?settings.trusted_domains,
        "key set client configured"
    );

    let generator = ChatCompletionsClient::new(
        settings.llm_base_url.clone(),
        settings.llm_model.clone(),
        settings.llm_api_key,
    );
    tracing::debug!(
        llm_base_url = %settings.llm_base_url,
        llm_model = %settings.llm_model,
        generation_timeout_secs = settings.generation_timeout.as_secs(),
        "model client configured"
    );

    let notifier = WebhookClient::new(settings.webhook_timeout)
        .map_err(|e| std::io::Error::other(format!("failed to initialize webhook client: {e}")))?;

    let verifier = TokenVerifier {
        trusted_domains: settings.trusted_domains,
        audience: settings.audience,
        algorithms: settings.algorithms,
        cache: Arc::new(KeySetCache::with_min_refresh_interval(
            settings.jwks_min_refresh_interval,
        )),
        source: Arc::new(jwks_client),
    };

    let dispatcher = QuizDispatcher {
        task: GenerationTask {
            generator: Arc::new(generator),
            notifier: Arc::new(notifier),
            generation_timeout: settings.generation_timeout,
        },
    };

    Ok(Arc::new(AppState {
        verifier,
        dispatcher,
    }))
}

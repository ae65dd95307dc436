use axum::{middleware, Router};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use triage_api::{
    config::{Config, StoreBackend},
    middleware::logging,
    state::AppState,
};
use triage_core::{
    CommandRunner, ExecutionMode, LoopController, ShellRunner, StructuredReasoner,
};
use triage_llm::{GeminiClient, GenerationClient};
use triage_store::{MemoryStore, MongoStore, ThreadStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Load configuration; missing secrets abort here
    let config = Config::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config);

    tracing::info!("Starting Triage API server");
    tracing::info!("Config loaded: {}:{}", config.server.host, config.server.port);

    // Reasoner boundary
    let generation_client: Arc<dyn GenerationClient> =
        Arc::new(GeminiClient::new(config.gemini_api_key.clone())?);
    let reasoner = StructuredReasoner::new(generation_client, config.llm.model.clone())
        .with_max_retries(config.llm.max_retries);

    // Turn-loop collaborators
    let controller = LoopController::new(config.executor.mode);
    if config.executor.mode == ExecutionMode::Autonomous {
        tracing::info!("Autonomous mode: proposed commands execute server-side");
    }
    let runner: Arc<dyn CommandRunner> = Arc::new(
        ShellRunner::new().with_timeout(Duration::from_secs(config.executor.timeout_secs)),
    );

    // Thread store
    let store: Arc<dyn ThreadStore> = match config.store.backend {
        StoreBackend::Mongodb => {
            tracing::info!("Connecting to MongoDB");
            let store = MongoStore::connect(&config.mongodb_uri, &config.store.database).await?;
            tracing::info!("MongoDB connected");
            Arc::new(store)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory thread store; threads will not survive restarts");
            Arc::new(MemoryStore::new())
        }
    };

    let state = Arc::new(AppState::new(
        config.clone(),
        store,
        reasoner,
        controller,
        runner,
    ));

    let app = build_router(state.clone());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(triage_api::routes::router(state.clone()))
        .layer(middleware::from_fn(logging::log_request))
        .layer(TimeoutLayer::new(Duration::from_secs(120)))
        .layer(build_cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
}

fn build_cors_layer(config: &Config) -> CorsLayer {
    if config.cors.enabled {
        let mut cors = CorsLayer::new()
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::DELETE,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers(Any);

        if config.cors.origins.iter().any(|o| o == "*") {
            cors = cors.allow_origin(Any);
        } else {
            for origin in &config.cors.origins {
                if let Ok(parsed_origin) = origin.parse::<axum::http::HeaderValue>() {
                    cors = cors.allow_origin(parsed_origin);
                }
            }
        }

        cors
    } else {
        CorsLayer::permissive()
    }
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }
}

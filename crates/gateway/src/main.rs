//! Inkpress API Gateway
//!
//! The main entry point for all external requests.
//! Handles:
//! - Authentication and actor resolution
//! - Rate limiting
//! - Request routing
//! - Observability (logging, metrics, tracing)

mod extract;
mod handlers;
mod middleware;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};
use inkpress_common::{
    assistant::{Assistant, DisabledAssistant, GenerativeAssistant},
    auth::JwtManager,
    config::AppConfig,
    db::DbPool,
    metrics,
    storage::{FsImageStore, ImageStore},
};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{info, warn};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DbPool,
    pub jwt: Arc<JwtManager>,
    pub images: Arc<dyn ImageStore>,
    pub assistant: Arc<dyn Assistant>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration first so logging and every component below can
    // honor it; no ambient globals past this point
    let config = AppConfig::load().inspect_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
    })?;

    init_tracing(&config);

    info!("Starting Inkpress API Gateway v{}", inkpress_common::VERSION);

    // Initialize metrics (exporter first so descriptions register against it)
    if config.observability.metrics_port != 0 {
        let addr = SocketAddr::from(([0, 0, 0, 0], config.observability.metrics_port));
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()?;
        info!("Prometheus exporter listening on {}", addr);
    }
    metrics::register_metrics();

    // Initialize database connection
    info!("Connecting to database...");
    let db = DbPool::new(&config.database).await?;

    // Token manager
    let jwt_secret = config.auth.jwt_secret.clone().unwrap_or_else(|| {
        warn!("auth.jwt_secret is not set, using a development-only default");
        "inkpress-dev-secret".to_string()
    });
    let jwt = Arc::new(JwtManager::new(
        &jwt_secret,
        config.auth.jwt_expiration_secs,
    ));

    // Image store
    let images: Arc<dyn ImageStore> = Arc::new(
        FsImageStore::new(&config.uploads.dir, config.uploads.max_image_bytes).await?,
    );
    info!(dir = %config.uploads.dir, "Image store ready");

    // Assistant client; a missing key disables it and chat degrades
    let assistant: Arc<dyn Assistant> = match GenerativeAssistant::from_config(&config.assistant) {
        Ok(client) => {
            info!(model = client.model_name(), "Assistant client ready");
            Arc::new(client)
        }
        Err(e) => {
            warn!(error = %e, "Assistant disabled, chat requests will degrade");
            Arc::new(DisabledAssistant)
        }
    };

    let config = Arc::new(config);

    // Create app state
    let state = AppState {
        config: config.clone(),
        db,
        jwt,
        images,
        assistant,
    };

    // Build the router
    let app = create_router(state);

    // Start the server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize the tracing subscriber from configuration
fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.observability.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if config.observability.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    // API routes
    let api_routes = Router::new()
        // Health endpoints (no auth)
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))

        // Account endpoints
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))

        // Article endpoints
        .route(
            "/articles",
            get(handlers::articles::list_articles).post(handlers::articles::create_article),
        )
        .route(
            "/articles/{id}",
            get(handlers::articles::get_article)
                .put(handlers::articles::update_article)
                .delete(handlers::articles::delete_article),
        )

        // Engagement endpoints
        .route("/articles/{id}/comments", post(handlers::comments::add_comment))
        .route("/comments/{id}", delete(handlers::comments::delete_comment))
        .route("/articles/{id}/like", post(handlers::likes::toggle_like))

        // Profile endpoints
        .route("/users/me", put(handlers::users::update_profile))
        .route("/users/me/picture", put(handlers::users::update_picture))
        .route("/users/{username}", get(handlers::users::get_profile))

        // Admin endpoints
        .route("/admin/users", get(handlers::admin::list_users))
        .route(
            "/admin/users/{id}/toggle-admin",
            post(handlers::admin::toggle_admin),
        )

        // Assistant endpoint
        .route("/assistant", post(handlers::assistant::chat));

    // Compose the app; stored images are served as static files. The body
    // limit leaves headroom over the image cap for the other form fields;
    // the store enforces the exact cap.
    let mut app = Router::new()
        .merge(api_routes)
        .nest_service("/uploads", ServeDir::new(&state.config.uploads.dir))
        .layer(DefaultBodyLimit::max(
            state.config.uploads.max_image_bytes + 64 * 1024,
        ));

    if state.config.rate_limit.enabled {
        let limiter = middleware::rate_limit::create_rate_limiter(
            state.config.rate_limit.requests_per_second,
            state.config.rate_limit.burst,
        );
        app = app.layer(axum::middleware::from_fn(move |request, next| {
            let limiter = limiter.clone();
            async move { middleware::rate_limit::rate_limit_middleware(request, next, limiter).await }
        }));
    }

    app.layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(request_id)
        .layer(propagate_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

mod api;
mod auth;
mod config;
mod error;
mod handlers;
mod middleware;
mod store;

use auth::{CredentialStore, InMemoryUsers};
use store::{CardStore, MemoryCardStore, PgCardStore};

/// Shared per-process state: the store handle and the credential directory,
/// both read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CardStore>,
    pub users: Arc<dyn CredentialStore>,
}

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL etc.
    let _ = dotenvy::dotenv();

    // Initialize configuration (this loads the config singleton)
    let config = crate::config::config();

    tracing_subscriber::fmt::init();
    tracing::info!("Starting CashCard API in {:?} mode", config.environment);

    let store: Arc<dyn CardStore> = match std::env::var("DATABASE_URL") {
        Ok(url) => {
            let store = PgCardStore::connect(&url)
                .await
                .unwrap_or_else(|e| panic!("failed to connect to database: {}", e));
            tracing::info!("Using Postgres card store");
            Arc::new(store)
        }
        Err(_) => {
            tracing::info!("DATABASE_URL not set, using in-memory card store");
            Arc::new(MemoryCardStore::new())
        }
    };

    let users = InMemoryUsers::fixture(config.security.bcrypt_cost)
        .unwrap_or_else(|e| panic!("failed to initialize credential fixture: {}", e));

    let app = app(AppState { store, users: Arc::new(users) });

    // Allow tests or deployments to override port via env
    let port = std::env::var("CASHCARD_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(config.server.port);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    println!("🚀 CashCard API server listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

fn app(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Authenticated resource
        .merge(cashcard_routes(&state))
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cashcard_routes(state: &AppState) -> Router<AppState> {
    use handlers::cashcard;

    Router::new()
        .route("/cashcard", get(cashcard::card_list).post(cashcard::card_create))
        .route(
            "/cashcard/:id",
            get(cashcard::card_get)
                .put(cashcard::card_put)
                .delete(cashcard::card_delete),
        )
        // Every cashcard route re-authenticates per request (HTTP Basic)
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::basic_auth_middleware,
        ))
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "name": "CashCard API",
        "version": version,
        "description": "Authenticated REST API for per-owner cash card records",
        "endpoints": {
            "home": "/ (public)",
            "health": "/health (public)",
            "cashcard": "/cashcard[/:id] (HTTP Basic, card-owner role)",
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match state.store.ping().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "store": "ok"
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "degraded",
                "timestamp": now,
                "store_error": e.to_string()
            })),
        ),
    }
}

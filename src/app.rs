use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Json},
    routing::{get, post, put},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::database::{DatabaseManager, PgBackend, TenantBackend};
use crate::error::ApiError;
use crate::handlers::{protected, public};
use crate::middleware::{jwt_auth_middleware, validate_tenant_middleware};
use crate::services::{EmailService, PushService, TenantService};

/// Shared application state, built once at startup
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub tenants: Arc<TenantService>,
    pub database: Arc<DatabaseManager>,
    pub mail: EmailService,
    pub push: PushService,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let backend = PgBackend::new(
            config.database.clone(),
            config.provisioning.clone(),
            config.security.bcrypt_cost,
        );
        Self::with_backend(config, Arc::new(backend))
    }

    /// State over an arbitrary storage backend
    pub fn with_backend(config: AppConfig, backend: Arc<dyn TenantBackend>) -> Self {
        let client = reqwest::Client::new();

        Self {
            tenants: Arc::new(TenantService::new(config.tenant.clone())),
            database: Arc::new(DatabaseManager::new(backend, config.provisioning.clone())),
            mail: EmailService::new(&config.mail, client.clone()),
            push: PushService::new(config.push.clone(), client),
            config: Arc::new(config),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        // Public, outside the tenant gate
        .route("/", get(root))
        .route("/health", get(health))
        .merge(tenant_routes(state.clone()))
        // Global middleware
        .layer(cors_layer(&state.config.security.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Everything behind the tenant gate
fn tenant_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(auth_routes())
        .merge(protected_routes(state.clone()))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state, validate_tenant_middleware))
}

fn auth_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/auth/token", post(auth::login))
        .route("/auth/reset-password", post(auth::reset_password))
        .route("/auth/confirm-password-reset", post(auth::confirm_password_reset))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use protected::{animals, conditions, events, notes, notifications, trips, users};

    Router::new()
        .route("/users", get(users::list).post(users::create))
        .route("/users/:id", axum::routing::delete(users::delete))
        // Static segments take priority over `:id`
        .route("/animals", get(animals::list).post(animals::create))
        .route("/animals/count", get(animals::count))
        .route("/animals/note", get(notes::list).post(notes::create))
        .route("/animals/note/:id", put(notes::update).delete(notes::delete))
        .route(
            "/animals/:id",
            get(animals::get).put(animals::update).delete(animals::delete),
        )
        .route("/animals/:id/:condition_type", put(animals::toggle_condition))
        .route("/events", get(events::list).post(events::create))
        .route("/events/count", get(events::count))
        .route("/events/:id", get(events::get).delete(events::delete))
        .route("/conditions", get(conditions::list))
        .route("/trips", get(trips::list).post(trips::create))
        .route("/notifications", post(notifications::broadcast))
        .route(
            "/notifications/subscribe",
            post(notifications::subscribe).put(notifications::resubscribe),
        )
        .route("/notifications/test", get(notifications::test))
        .route_layer(middleware::from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}

async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Pooper API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Multi-tenant pet care tracking API",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "auth": "/auth/token, /auth/reset-password, /auth/confirm-password-reset (tenant)",
                "users": "/users[/:id] (tenant + bearer)",
                "animals": "/animals[/count|/note|/:id[/:condition_type]] (tenant + bearer)",
                "events": "/events[/count|/:id] (tenant + bearer)",
                "conditions": "/conditions (tenant + bearer)",
                "trips": "/trips (tenant + bearer)",
                "notifications": "/notifications[/subscribe|/test] (tenant + bearer)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();
    let tenants = state.database.provisioned_count().await;

    match state.database.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok",
                    "provisioned_tenants": tenants
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "provisioned_tenants": tenants
                    }
                })),
            )
        }
    }
}

async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}

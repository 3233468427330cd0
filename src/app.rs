use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use chrono::Duration;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::auth::{CredentialVerifier, OwnerStore, OwnershipGuard, PrincipalStore, SecretHasher, TokenCodec};
use crate::database::{AddressRepository, UserRepository};
use crate::handlers;
use crate::middleware::require_auth;

/// Shared, read-only application state cloned into every request
#[derive(Clone)]
pub struct AppState {
    pub tokens: Arc<TokenCodec>,
    pub token_ttl: Duration,
    pub hasher: Arc<dyn SecretHasher>,
    pub credentials: CredentialVerifier,
    pub users: Arc<dyn UserRepository>,
    pub addresses: Arc<dyn AddressRepository>,
    pub address_owners: OwnershipGuard,
    /// Wrap the router in an HTTP `TraceLayer`
    pub request_logging: bool,
}

impl AppState {
    /// Wire the auth core to concrete repositories
    pub fn new<U, A>(
        tokens: TokenCodec,
        token_ttl: Duration,
        hasher: Arc<dyn SecretHasher>,
        users: Arc<U>,
        addresses: Arc<A>,
    ) -> Self
    where
        U: UserRepository + PrincipalStore + 'static,
        A: AddressRepository + OwnerStore + 'static,
    {
        let principals: Arc<dyn PrincipalStore> = users.clone();
        let owners: Arc<dyn OwnerStore> = addresses.clone();

        Self {
            tokens: Arc::new(tokens),
            token_ttl,
            credentials: CredentialVerifier::new(principals, hasher.clone()),
            hasher,
            users,
            addresses,
            address_owners: OwnershipGuard::new("address", owners),
            request_logging: true,
        }
    }

    pub fn with_request_logging(mut self, enabled: bool) -> Self {
        self.request_logging = enabled;
        self
    }
}

pub fn app(state: AppState) -> Router {
    let router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_public_routes())
        // Protected
        .merge(protected_routes(&state));

    let router = if state.request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    };
    router.with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    use handlers::public::auth;

    Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
}

fn protected_routes(state: &AppState) -> Router<AppState> {
    use handlers::protected::{account, address};

    Router::new()
        .route("/api/accounts/me", get(account::me_get).put(account::me_put))
        .route("/api/addresses", get(address::list).post(address::create))
        .route(
            "/api/addresses/:id",
            get(address::show).put(address::update).delete(address::delete),
        )
        .route_layer(from_fn_with_state(state.tokens.clone(), require_auth))
}

async fn root() -> Json<Value> {
    Json(json!({
        "name": "Storefront API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "auth": "/api/auth/register, /api/auth/login (public)",
            "accounts": "/api/accounts/me (protected)",
            "addresses": "/api/addresses[/:id] (protected, owner only)",
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.users.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "database": "unavailable"
                })),
            )
        }
    }
}

#![forbid(unsafe_code)]
//! HTTP service of the storefront: router, shared state, authentication and
//! the handlers behind every endpoint.

use axum::extract::{DefaultBodyLimit, FromRequest, FromRequestParts};
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, post, put};
use axum::Router;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use tienda_store::{Store, StoreError};

mod auth;
mod config;
mod error;
mod http;
mod security;

pub use auth::{AdminUser, CurrentUser};
pub use config::{BootstrapAdmin, ServerConfig, CONFIG_SCHEMA_VERSION};
pub use error::AppError;
pub use security::{hash_password, verify_password, Claims, SecurityError, TokenSigner};

pub const CRATE_NAME: &str = "tienda-server";

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub config: Arc<ServerConfig>,
    pub tokens: Arc<TokenSigner>,
    pub(crate) request_id_seed: Arc<AtomicU64>,
}

impl AppState {
    #[must_use]
    pub fn new(store: Store, config: ServerConfig) -> Self {
        let tokens = TokenSigner::new(config.jwt_secret.clone(), config.token_ttl);
        Self {
            store,
            config: Arc::new(config),
            tokens: Arc::new(tokens),
            request_id_seed: Arc::new(AtomicU64::new(1)),
        }
    }
}

/// Runs store work on the blocking pool; SQLite calls never run on the
/// async workers.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(f).await??)
}

/// `axum::Json` with rejections rendered as the API error envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub(crate) struct ApiJson<T>(pub T);

#[derive(FromRequest)]
#[from_request(via(axum::Form), rejection(AppError))]
pub(crate) struct ApiForm<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub(crate) struct ApiPath<T>(pub T);

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(http::public::landing_handler))
        .route("/healthz", get(http::public::healthz_handler))
        .route("/favicon.ico", get(http::public::favicon_handler))
        .route("/api/register", post(http::public::register_handler))
        .route("/api/login", post(http::public::login_handler))
        .route("/api/products", get(http::catalog::list_products_handler))
        .route(
            "/api/profile",
            get(http::account::get_profile_handler).put(http::account::update_profile_handler),
        )
        .route("/api/cart", get(http::cart::get_cart_handler))
        .route("/api/cart/add", post(http::cart::add_to_cart_handler))
        .route(
            "/api/cart/update/:product_id",
            put(http::cart::update_cart_item_handler),
        )
        .route(
            "/api/cart/remove/:product_id",
            delete(http::cart::remove_cart_item_handler),
        )
        .route("/api/cart/checkout", post(http::cart::checkout_handler))
        .route(
            "/api/admin/sales",
            get(http::admin::list_sales_handler).post(http::admin::record_sale_handler),
        )
        .route(
            "/api/admin/sales/:sale_id",
            get(http::admin::sale_detail_handler),
        )
        .route(
            "/api/admin/products",
            post(http::catalog::create_product_handler),
        )
        .route(
            "/api/admin/products/:product_id",
            get(http::catalog::get_product_handler)
                .put(http::catalog::update_product_handler)
                .delete(http::catalog::delete_product_handler),
        )
        .route(
            "/api/admin/clients",
            get(http::admin::list_clients_handler).post(http::admin::create_client_handler),
        )
        .route(
            "/api/admin/clients/:client_id",
            get(http::admin::get_client_handler)
                .put(http::admin::update_client_handler)
                .delete(http::admin::delete_client_handler),
        )
        .fallback(http::public::not_found_handler)
        .layer(DefaultBodyLimit::max(state.config.max_body_bytes))
        .layer(from_fn_with_state(
            state.clone(),
            http::request_tracing::request_tracing_middleware,
        ))
        .with_state(state)
}

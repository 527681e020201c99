use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use tienda_api::{
    ApiError, LoginForm, MessageResponse, RegisterRequest, RegisterResponse, TokenResponse,
};
use tienda_model::{Email, NewUser};
use tracing::{info, warn};

use crate::security::{hash_password, verify_password};
use crate::{blocking, ApiForm, ApiJson, AppError, AppState};

pub(crate) async fn landing_handler() -> Json<MessageResponse> {
    Json(MessageResponse::new("Welcome to the store API"))
}

pub(crate) async fn healthz_handler() -> &'static str {
    "ok"
}

pub(crate) async fn favicon_handler() -> StatusCode {
    StatusCode::NO_CONTENT
}

pub(crate) async fn not_found_handler() -> AppError {
    ApiError::not_found("route not found").into()
}

pub(crate) async fn register_handler(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let registration = req.validate()?;
    let iterations = state.config.password_hash_iterations;
    let store = state.store.clone();
    let user = blocking(move || {
        let password_hash = hash_password(&registration.password, iterations);
        store.create_user(&NewUser {
            full_name: registration.full_name,
            email: registration.email,
            password_hash,
            address: registration.address,
        })
    })
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "user created".to_string(),
            user_id: user.id,
            email: user.email.into_inner(),
        }),
    ))
}

pub(crate) async fn login_handler(
    State(state): State<AppState>,
    ApiForm(form): ApiForm<LoginForm>,
) -> Result<Json<TokenResponse>, AppError> {
    let rejected = || ApiError::unauthorized("incorrect email or password");
    let Ok(email) = Email::parse(&form.username) else {
        return Err(rejected().into());
    };
    let store = state.store.clone();
    let password = form.password;
    let verified = blocking(move || {
        Ok(store
            .credentials_for(&email)?
            .filter(|(_, hash)| verify_password(&password, hash))
            .map(|(user, _)| user))
    })
    .await?;
    let Some(user) = verified else {
        warn!("login rejected");
        return Err(rejected().into());
    };
    let token = state.tokens.issue(&user, Utc::now())?;
    info!(user_id = %user.id, "login succeeded");
    Ok(Json(TokenResponse::bearer(token, user.is_admin)))
}

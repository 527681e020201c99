// SPDX-License-Identifier: Apache-2.0

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use chrono::Utc;
use tienda_api::ApiError;
use tienda_model::{User, UserId};
use tracing::debug;

use crate::{blocking, AppError, AppState};

/// The authenticated caller, loaded fresh from the store on every request.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// An authenticated caller holding the admin flag.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let raw = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = raw.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| ApiError::unauthorized("not authenticated"))?;
        let claims = state.tokens.verify(token, Utc::now()).map_err(|e| {
            debug!(error = %e, "bearer token rejected");
            ApiError::unauthorized("could not validate credentials")
        })?;
        let store = state.store.clone();
        let user = blocking(move || store.user_by_id(UserId(claims.id)))
            .await?
            .ok_or_else(|| ApiError::not_found("user not found"))?;
        Ok(Self(user))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_admin {
            return Err(ApiError::forbidden("administrator privileges required").into());
        }
        Ok(Self(user))
    }
}

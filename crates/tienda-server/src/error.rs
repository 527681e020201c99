// SPDX-License-Identifier: Apache-2.0

use axum::extract::rejection::{FormRejection, JsonRejection, PathRejection};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tienda_api::{map_error, ApiError, ApiErrorEnvelope, FieldError};
use tienda_store::StoreError;
use tracing::error;

use crate::security::SecurityError;

/// Everything a handler can fail with. Converted to the JSON error envelope
/// at the response boundary.
#[derive(Debug)]
pub enum AppError {
    Api(ApiError),
    Store(StoreError),
    Security(SecurityError),
    Join(String),
}

impl From<ApiError> for AppError {
    fn from(value: ApiError) -> Self {
        Self::Api(value)
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<SecurityError> for AppError {
    fn from(value: SecurityError) -> Self {
        Self::Security(value)
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(value: tokio::task::JoinError) -> Self {
        Self::Join(value.to_string())
    }
}

fn store_error(err: StoreError) -> ApiError {
    match err {
        StoreError::NotFound(msg) => ApiError::not_found(msg),
        StoreError::Duplicate(msg) => ApiError::email_taken(msg),
        StoreError::Conflict(msg) => ApiError::conflict(msg),
        StoreError::Invalid(msg) => ApiError::invalid_request(msg),
        StoreError::InsufficientStock(msg) => ApiError::insufficient_stock(msg),
        StoreError::EmptyCart => ApiError::empty_cart(),
        other => {
            error!(error = %other, "store failure");
            ApiError::internal()
        }
    }
}

impl AppError {
    #[must_use]
    pub fn into_api_error(self) -> ApiError {
        match self {
            Self::Api(err) => err,
            Self::Store(err) => store_error(err),
            Self::Security(err) => {
                error!(error = %err, "security failure");
                ApiError::internal()
            }
            Self::Join(msg) => {
                error!(error = %msg, "blocking task failed");
                ApiError::internal()
            }
        }
    }
}

/// Renders an API error as `{"error": ...}` with the mapped status. The
/// error is also left in the response extensions so the tracing middleware
/// can stamp the request id onto it.
pub(crate) fn api_error_response(err: ApiError) -> Response {
    let mapping = map_error(&err);
    let status =
        StatusCode::from_u16(mapping.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response = (
        status,
        Json(ApiErrorEnvelope {
            error: err.clone(),
        }),
    )
        .into_response();
    if mapping.www_authenticate_bearer {
        response
            .headers_mut()
            .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    }
    response.extensions_mut().insert(err);
    response
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        api_error_response(self.into_api_error())
    }
}

fn rejection_error(status: StatusCode, field: &str, body_text: String) -> ApiError {
    match status {
        StatusCode::PAYLOAD_TOO_LARGE => ApiError::payload_too_large(),
        StatusCode::UNPROCESSABLE_ENTITY => {
            ApiError::validation_failed(vec![FieldError::new(field, body_text)])
        }
        _ => ApiError::invalid_request(body_text),
    }
}

impl From<JsonRejection> for AppError {
    fn from(value: JsonRejection) -> Self {
        Self::Api(rejection_error(value.status(), "body", value.body_text()))
    }
}

impl From<FormRejection> for AppError {
    fn from(value: FormRejection) -> Self {
        Self::Api(rejection_error(value.status(), "form", value.body_text()))
    }
}

impl From<PathRejection> for AppError {
    fn from(value: PathRejection) -> Self {
        Self::Api(ApiError::validation_failed(vec![FieldError::new(
            "path",
            value.body_text(),
        )]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tienda_api::ApiErrorCode;

    #[test]
    fn store_errors_map_to_api_codes() {
        let cases = [
            (StoreError::not_found("product"), ApiErrorCode::NotFound),
            (
                StoreError::Duplicate("email already registered".to_string()),
                ApiErrorCode::EmailTaken,
            ),
            (StoreError::Conflict("x".to_string()), ApiErrorCode::Conflict),
            (
                StoreError::InsufficientStock("x".to_string()),
                ApiErrorCode::InsufficientStock,
            ),
            (StoreError::EmptyCart, ApiErrorCode::EmptyCart),
            (StoreError::Sqlite("disk".to_string()), ApiErrorCode::Internal),
        ];
        for (store, code) in cases {
            assert_eq!(AppError::from(store).into_api_error().code, code);
        }
    }

    #[test]
    fn internal_errors_hide_their_cause() {
        let err = AppError::from(StoreError::Sqlite("database is locked".to_string()))
            .into_api_error();
        assert!(!err.message.contains("locked"));
    }

    #[test]
    fn unauthorized_response_asks_for_bearer() {
        let response = api_error_response(ApiError::unauthorized("not authenticated"));
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE),
            Some(&HeaderValue::from_static("Bearer"))
        );
        assert!(response.extensions().get::<ApiError>().is_some());
    }
}

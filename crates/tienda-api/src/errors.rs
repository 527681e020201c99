// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ApiErrorCode {
    InvalidRequest,
    ValidationFailed,
    Unauthorized,
    Forbidden,
    NotFound,
    EmailTaken,
    Conflict,
    InsufficientStock,
    EmptyCart,
    PayloadTooLarge,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldError {
    pub field: String,
    pub reason: String,
}

impl FieldError {
    #[must_use]
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
    pub details: Value,
    pub request_id: String,
}

/// Body of every error response: `{"error": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiErrorEnvelope {
    pub error: ApiError,
}

impl ApiError {
    #[must_use]
    pub fn new(
        code: ApiErrorCode,
        message: impl Into<String>,
        details: Value,
        request_id: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            request_id: request_id.into(),
        }
    }

    fn plain(code: ApiErrorCode, message: impl Into<String>) -> Self {
        Self::new(code, message, json!({}), "req-unknown")
    }

    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    #[must_use]
    pub fn validation_failed(field_errors: Vec<FieldError>) -> Self {
        Self::new(
            ApiErrorCode::ValidationFailed,
            "validation failed",
            json!({ "field_errors": field_errors }),
            "req-unknown",
        )
    }

    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::plain(ApiErrorCode::InvalidRequest, message)
    }

    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::plain(ApiErrorCode::Unauthorized, message)
    }

    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::plain(ApiErrorCode::Forbidden, message)
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::plain(ApiErrorCode::NotFound, message)
    }

    #[must_use]
    pub fn email_taken(message: impl Into<String>) -> Self {
        Self::plain(ApiErrorCode::EmailTaken, message)
    }

    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::plain(ApiErrorCode::Conflict, message)
    }

    #[must_use]
    pub fn insufficient_stock(message: impl Into<String>) -> Self {
        Self::plain(ApiErrorCode::InsufficientStock, message)
    }

    #[must_use]
    pub fn empty_cart() -> Self {
        Self::plain(ApiErrorCode::EmptyCart, "cart is empty")
    }

    #[must_use]
    pub fn payload_too_large() -> Self {
        Self::plain(ApiErrorCode::PayloadTooLarge, "request body too large")
    }

    /// Internal failures never leak their cause to the client; callers log it.
    #[must_use]
    pub fn internal() -> Self {
        Self::plain(ApiErrorCode::Internal, "internal server error")
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

const _: fn() = || {
    fn assert_traits<T: Serialize + for<'de> Deserialize<'de>>() {}
    assert_traits::<ApiErrorCode>();
    assert_traits::<ApiErrorEnvelope>();
};

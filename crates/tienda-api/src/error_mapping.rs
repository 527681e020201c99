// SPDX-License-Identifier: Apache-2.0

use crate::{ApiError, ApiErrorCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiErrorMapping {
    pub status_code: u16,
    /// Login and bearer failures ask the client to authenticate.
    pub www_authenticate_bearer: bool,
}

#[must_use]
pub fn map_error(error: &ApiError) -> ApiErrorMapping {
    let status_code = match error.code {
        ApiErrorCode::InvalidRequest
        | ApiErrorCode::EmailTaken
        | ApiErrorCode::InsufficientStock
        | ApiErrorCode::EmptyCart => 400,
        ApiErrorCode::Unauthorized => 401,
        ApiErrorCode::Forbidden => 403,
        ApiErrorCode::NotFound => 404,
        ApiErrorCode::Conflict => 409,
        ApiErrorCode::PayloadTooLarge => 413,
        ApiErrorCode::ValidationFailed => 422,
        ApiErrorCode::Internal => 500,
    };
    ApiErrorMapping {
        status_code,
        www_authenticate_bearer: error.code == ApiErrorCode::Unauthorized,
    }
}

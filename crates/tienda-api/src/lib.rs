#![forbid(unsafe_code)]
//! HTTP wire contract of the storefront: error envelope and codes, request
//! and response DTOs, and validation of requests into model values.

mod convert;
mod dto;
mod error_mapping;
mod errors;

pub use convert::{
    cart_quantity, Registration, PASSWORD_MAX_LEN, PASSWORD_MIN_LEN, PRODUCT_NAME_MAX_LEN,
};
pub use dto::{
    AddressFields, CartItemRequest, CartQuantityRequest, ClientRequest, LoginForm,
    MessageResponse, ProductRequest, ProfileUpdateRequest, RegisterRequest, RegisterResponse,
    SaleItemRequest, SaleRequest, TokenResponse,
};
pub use error_mapping::{map_error, ApiErrorMapping};
pub use errors::{ApiError, ApiErrorCode, ApiErrorEnvelope, FieldError};

pub const CRATE_NAME: &str = "tienda-api";

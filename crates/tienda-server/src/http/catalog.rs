use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tienda_api::{ApiError, MessageResponse, ProductRequest};
use tienda_model::{Product, ProductId};
use tracing::info;

use crate::{blocking, AdminUser, ApiJson, ApiPath, AppError, AppState, CurrentUser};

pub(crate) async fn list_products_handler(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> Result<Json<Vec<Product>>, AppError> {
    let store = state.store.clone();
    Ok(Json(blocking(move || store.list_products()).await?))
}

pub(crate) async fn create_product_handler(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiJson(req): ApiJson<ProductRequest>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    let draft = req.validate()?;
    let store = state.store.clone();
    let product = blocking(move || store.create_product(&draft)).await?;
    info!(admin_id = %admin.id, product_id = %product.id, "admin created product");
    Ok((StatusCode::CREATED, Json(product)))
}

pub(crate) async fn get_product_handler(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    ApiPath(product_id): ApiPath<i64>,
) -> Result<Json<Product>, AppError> {
    let store = state.store.clone();
    blocking(move || store.product_by_id(ProductId(product_id)))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("product not found").into())
}

pub(crate) async fn update_product_handler(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    ApiPath(product_id): ApiPath<i64>,
    ApiJson(req): ApiJson<ProductRequest>,
) -> Result<Json<Product>, AppError> {
    let draft = req.validate()?;
    let store = state.store.clone();
    let product = blocking(move || store.update_product(ProductId(product_id), &draft)).await?;
    Ok(Json(product))
}

pub(crate) async fn delete_product_handler(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiPath(product_id): ApiPath<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    let store = state.store.clone();
    blocking(move || store.delete_product(ProductId(product_id))).await?;
    info!(admin_id = %admin.id, product_id, "admin deleted product");
    Ok(Json(MessageResponse::new("product deleted")))
}

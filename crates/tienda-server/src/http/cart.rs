use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tienda_api::{cart_quantity, ApiError, CartItemRequest, CartQuantityRequest};
use tienda_model::{Cart, ProductId, Quantity, Sale};

use crate::{blocking, ApiJson, ApiPath, AppError, AppState, CurrentUser};

/// A bad quantity for an unknown product reports the missing product first.
async fn requested_quantity(
    state: &AppState,
    product_id: ProductId,
    raw: i64,
) -> Result<Quantity, AppError> {
    let invalid = match cart_quantity(raw) {
        Ok(quantity) => return Ok(quantity),
        Err(err) => err,
    };
    let store = state.store.clone();
    if blocking(move || store.product_by_id(product_id)).await?.is_none() {
        return Err(ApiError::not_found("product not found").into());
    }
    Err(invalid.into())
}

pub(crate) async fn get_cart_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Cart>, AppError> {
    let store = state.store.clone();
    Ok(Json(blocking(move || store.cart_for_user(user.id)).await?))
}

pub(crate) async fn add_to_cart_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(req): ApiJson<CartItemRequest>,
) -> Result<Json<Cart>, AppError> {
    let product_id = ProductId(req.product_id);
    let quantity = requested_quantity(&state, product_id, req.quantity).await?;
    let store = state.store.clone();
    let cart = blocking(move || store.add_to_cart(user.id, product_id, quantity)).await?;
    Ok(Json(cart))
}

pub(crate) async fn update_cart_item_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(product_id): ApiPath<i64>,
    ApiJson(req): ApiJson<CartQuantityRequest>,
) -> Result<Json<Cart>, AppError> {
    let product_id = ProductId(product_id);
    let quantity = requested_quantity(&state, product_id, req.quantity).await?;
    let store = state.store.clone();
    let cart = blocking(move || store.update_cart_item(user.id, product_id, quantity)).await?;
    Ok(Json(cart))
}

pub(crate) async fn remove_cart_item_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(product_id): ApiPath<i64>,
) -> Result<Json<Cart>, AppError> {
    let store = state.store.clone();
    let cart = blocking(move || store.remove_cart_item(user.id, ProductId(product_id))).await?;
    Ok(Json(cart))
}

pub(crate) async fn checkout_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<(StatusCode, Json<Sale>), AppError> {
    let store = state.store.clone();
    let sale = blocking(move || store.checkout(user.id)).await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

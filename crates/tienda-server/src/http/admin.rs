use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tienda_api::{ApiError, ClientRequest, MessageResponse, SaleRequest};
use tienda_model::{Client, ClientId, Sale, SaleId, SaleLine};
use tracing::info;

use crate::{blocking, AdminUser, ApiJson, ApiPath, AppError, AppState};

pub(crate) async fn list_sales_handler(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> Result<Json<Vec<Sale>>, AppError> {
    let store = state.store.clone();
    let sales = blocking(move || store.list_sales()).await?;
    info!(admin_id = %admin.id, count = sales.len(), "admin listed sales");
    Ok(Json(sales))
}

pub(crate) async fn record_sale_handler(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    ApiJson(req): ApiJson<SaleRequest>,
) -> Result<(StatusCode, Json<Sale>), AppError> {
    let (client_id, lines) = req.validate()?;
    let store = state.store.clone();
    let sale = blocking(move || store.record_sale(client_id, &lines)).await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

pub(crate) async fn sale_detail_handler(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    ApiPath(sale_id): ApiPath<i64>,
) -> Result<Json<Vec<SaleLine>>, AppError> {
    let store = state.store.clone();
    Ok(Json(blocking(move || store.sale_lines(SaleId(sale_id))).await?))
}

pub(crate) async fn list_clients_handler(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<Vec<Client>>, AppError> {
    let store = state.store.clone();
    Ok(Json(blocking(move || store.list_clients()).await?))
}

pub(crate) async fn get_client_handler(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    ApiPath(client_id): ApiPath<i64>,
) -> Result<Json<Client>, AppError> {
    let store = state.store.clone();
    blocking(move || store.client_by_id(ClientId(client_id)))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("client not found").into())
}

pub(crate) async fn create_client_handler(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    ApiJson(req): ApiJson<ClientRequest>,
) -> Result<(StatusCode, Json<Client>), AppError> {
    let draft = req.validate()?;
    let store = state.store.clone();
    let client = blocking(move || store.create_client(&draft)).await?;
    Ok((StatusCode::CREATED, Json(client)))
}

pub(crate) async fn update_client_handler(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    ApiPath(client_id): ApiPath<i64>,
    ApiJson(req): ApiJson<ClientRequest>,
) -> Result<Json<Client>, AppError> {
    let draft = req.validate()?;
    let store = state.store.clone();
    let client = blocking(move || store.update_client(ClientId(client_id), &draft)).await?;
    Ok(Json(client))
}

pub(crate) async fn delete_client_handler(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiPath(client_id): ApiPath<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    let store = state.store.clone();
    blocking(move || store.delete_client(ClientId(client_id))).await?;
    info!(admin_id = %admin.id, client_id, "admin deleted client");
    Ok(Json(MessageResponse::new("client deleted")))
}

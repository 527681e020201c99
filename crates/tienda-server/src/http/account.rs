use axum::extract::State;
use axum::Json;
use tienda_api::ProfileUpdateRequest;
use tienda_model::User;

use crate::{blocking, ApiJson, AppError, AppState, CurrentUser};

pub(crate) async fn get_profile_handler(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}

pub(crate) async fn update_profile_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(req): ApiJson<ProfileUpdateRequest>,
) -> Result<Json<User>, AppError> {
    let changes = req.validate()?;
    let store = state.store.clone();
    let updated = blocking(move || store.update_profile(user.id, &changes)).await?;
    Ok(Json(updated))
}

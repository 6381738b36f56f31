//! Registration, login and profile handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use postforge_common::{
    auth::AuthUser,
    errors::Result,
    services::{AuthResponse, LoginInput, ProfileUpdate, RegisterInput, UserProfile},
};

use crate::AppState;

/// Create a viewer account and sign it in
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let response = state.services.accounts.register(input).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> Result<Json<AuthResponse>> {
    Ok(Json(state.services.accounts.login(input).await?))
}

/// The caller's own profile
pub async fn me(State(state): State<AppState>, caller: AuthUser) -> Result<Json<UserProfile>> {
    Ok(Json(state.services.accounts.me(&caller).await?))
}

pub async fn profile(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<UserProfile>> {
    Ok(Json(state.services.accounts.profile(user_id).await?))
}

/// Edit the caller's display name and signature
pub async fn update_profile(
    State(state): State<AppState>,
    caller: AuthUser,
    Json(input): Json<ProfileUpdate>,
) -> Result<Json<UserProfile>> {
    Ok(Json(state.services.accounts.update_profile(&caller, input).await?))
}

//! Follow handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use postforge_common::{
    auth::AuthUser,
    errors::Result,
    services::{FollowEntry, FollowStats, Page, PageParams},
};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct FollowingResponse {
    pub following: bool,
}

pub async fn follow(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(user_id): Path<i64>,
) -> Result<StatusCode> {
    state.services.follows.follow(&caller, user_id).await?;
    Ok(StatusCode::CREATED)
}

pub async fn unfollow(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(user_id): Path<i64>,
) -> Result<StatusCode> {
    state.services.follows.unfollow(&caller, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn is_following(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(user_id): Path<i64>,
) -> Result<Json<FollowingResponse>> {
    let following = state.services.follows.is_following(&caller, user_id).await?;
    Ok(Json(FollowingResponse { following }))
}

pub async fn following(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<FollowEntry>>> {
    let (page, size) = params.resolve();
    Ok(Json(state.services.follows.following(user_id, page, size).await?))
}

pub async fn followers(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<FollowEntry>>> {
    let (page, size) = params.resolve();
    Ok(Json(state.services.follows.followers(user_id, page, size).await?))
}

pub async fn stats(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<FollowStats>> {
    Ok(Json(state.services.follows.stats(user_id).await?))
}

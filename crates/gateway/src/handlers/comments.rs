//! Comment handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use postforge_common::{
    auth::AuthUser,
    errors::Result,
    services::{CommentInput, CommentView, Page, PageParams},
};

use crate::AppState;

pub async fn create(
    State(state): State<AppState>,
    caller: AuthUser,
    Json(input): Json<CommentInput>,
) -> Result<(StatusCode, Json<CommentView>)> {
    let comment = state.services.engagement.create_comment(&caller, input).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn delete(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    state.services.engagement.delete_comment(&caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Comments of one article, oldest first
pub async fn list(
    State(state): State<AppState>,
    Path(article_id): Path<i64>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<CommentView>>> {
    let (page, size) = params.resolve();
    let comments = state
        .services
        .engagement
        .list_comments(article_id, page, size)
        .await?;
    Ok(Json(comments))
}

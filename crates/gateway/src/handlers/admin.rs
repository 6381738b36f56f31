//! Administration handlers; every route requires a blogger token

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use postforge_common::{
    auth::AuthUser,
    db::models::Article,
    errors::Result,
    services::{AdminArticleRow, AdminUserView, Page, PageParams, RegisterInput, RoleChange},
};

use crate::AppState;

pub async fn list_users(
    State(state): State<AppState>,
    caller: AuthUser,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<AdminUserView>>> {
    let (page, size) = params.resolve();
    Ok(Json(state.services.admin.list_users(&caller, page, size).await?))
}

pub async fn set_role(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(user_id): Path<i64>,
    Json(change): Json<RoleChange>,
) -> Result<Json<AdminUserView>> {
    Ok(Json(state.services.admin.set_role(&caller, user_id, change).await?))
}

pub async fn delete_user(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(user_id): Path<i64>,
) -> Result<StatusCode> {
    state.services.admin.delete_user(&caller, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_blogger(
    State(state): State<AppState>,
    caller: AuthUser,
    Json(input): Json<RegisterInput>,
) -> Result<(StatusCode, Json<AdminUserView>)> {
    let user = state.services.admin.create_blogger(&caller, input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Every article, drafts included
pub async fn list_articles(
    State(state): State<AppState>,
    caller: AuthUser,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<AdminArticleRow>>> {
    let (page, size) = params.resolve();
    Ok(Json(state.services.admin.list_articles(&caller, page, size).await?))
}

pub async fn delete_article(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(article_id): Path<i64>,
) -> Result<StatusCode> {
    state.services.admin.delete_article(&caller, article_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn toggle_publish(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(article_id): Path<i64>,
) -> Result<Json<Article>> {
    Ok(Json(state.services.admin.toggle_publish(&caller, article_id).await?))
}

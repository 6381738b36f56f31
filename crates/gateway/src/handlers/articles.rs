//! Article handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use postforge_common::{
    auth::{AuthUser, MaybeAuthUser},
    db::models::Article,
    errors::Result,
    services::{
        ArticleDetail, ArticleInput, ArticleStats, ArticleSummary, ArticleUpdate, DraftSummary,
        ListParams, ListRequest, Page, PageParams,
    },
};

use crate::AppState;

/// Published articles; `sort_by` is `time` (default), `oldest` or `hot`
pub async fn list(
    State(state): State<AppState>,
    MaybeAuthUser(caller): MaybeAuthUser,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<ArticleSummary>>> {
    let request = ListRequest::from(params);
    let page = state.services.articles.list(&request, caller.as_ref()).await?;
    Ok(Json(page))
}

pub async fn detail(
    State(state): State<AppState>,
    MaybeAuthUser(caller): MaybeAuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ArticleDetail>> {
    let detail = state.services.articles.detail(id, caller.as_ref()).await?;
    Ok(Json(detail))
}

pub async fn create(
    State(state): State<AppState>,
    caller: AuthUser,
    Json(input): Json<ArticleInput>,
) -> Result<(StatusCode, Json<Article>)> {
    let article = state.services.articles.create(&caller, input).await?;
    Ok((StatusCode::CREATED, Json(article)))
}

pub async fn update(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i64>,
    Json(input): Json<ArticleUpdate>,
) -> Result<Json<Article>> {
    Ok(Json(state.services.articles.update(&caller, id, input).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    state.services.articles.delete(&caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn toggle_publish(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Article>> {
    Ok(Json(state.services.articles.toggle_publish(&caller, id).await?))
}

/// The caller's unpublished articles
pub async fn drafts(
    State(state): State<AppState>,
    caller: AuthUser,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<DraftSummary>>> {
    let (page, size) = params.resolve();
    Ok(Json(state.services.articles.drafts(&caller, page, size).await?))
}

pub async fn stats(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ArticleStats>> {
    Ok(Json(state.services.articles.stats(id).await?))
}

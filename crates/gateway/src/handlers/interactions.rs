//! Like and favorite handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use postforge_common::{
    auth::AuthUser,
    errors::{AppError, Result},
    services::{FavoriteItem, InteractionState, Page, PageParams},
};
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::AppState;

/// `?article_ids=1,2,3`
#[derive(Debug, Deserialize)]
pub struct BatchStatusQuery {
    #[serde(default)]
    pub article_ids: String,
}

impl BatchStatusQuery {
    fn ids(&self) -> Result<Vec<i64>> {
        self.article_ids
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<i64>().map_err(|_| {
                    AppError::validation("article_ids", format!("Invalid article id: {}", s))
                })
            })
            .collect()
    }
}

pub async fn toggle_like(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(article_id): Path<i64>,
) -> Result<Json<InteractionState>> {
    Ok(Json(state.services.engagement.toggle_like(&caller, article_id).await?))
}

pub async fn toggle_favorite(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(article_id): Path<i64>,
) -> Result<Json<InteractionState>> {
    Ok(Json(state.services.engagement.toggle_favorite(&caller, article_id).await?))
}

pub async fn status(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(article_id): Path<i64>,
) -> Result<Json<InteractionState>> {
    Ok(Json(state.services.engagement.status(&caller, article_id).await?))
}

/// States keyed by article id; unknown ids are left out
pub async fn batch_status(
    State(state): State<AppState>,
    caller: AuthUser,
    Query(query): Query<BatchStatusQuery>,
) -> Result<Json<BTreeMap<i64, InteractionState>>> {
    let ids = query.ids()?;
    Ok(Json(state.services.engagement.batch_status(&caller, &ids).await?))
}

/// The caller's favorited articles
pub async fn favorites(
    State(state): State<AppState>,
    caller: AuthUser,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<FavoriteItem>>> {
    let (page, size) = params.resolve();
    Ok(Json(state.services.engagement.my_favorites(&caller, page, size).await?))
}

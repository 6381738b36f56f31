//! Direct message handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use postforge_common::{
    auth::AuthUser,
    errors::Result,
    services::{ConversationView, MarkReadInput, MessageView, Page, PageParams, SendMessageInput},
};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct UnreadCount {
    pub count: u64,
}

#[derive(Serialize)]
pub struct MarkedRead {
    pub updated: u64,
}

pub async fn send(
    State(state): State<AppState>,
    caller: AuthUser,
    Json(input): Json<SendMessageInput>,
) -> Result<(StatusCode, Json<MessageView>)> {
    let message = state.services.messages.send(&caller, input).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// Messages exchanged with one user, newest first
pub async fn conversation(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(user_id): Path<i64>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<MessageView>>> {
    let (page, size) = params.resolve();
    Ok(Json(
        state.services.messages.conversation(&caller, user_id, page, size).await?,
    ))
}

pub async fn conversations(
    State(state): State<AppState>,
    caller: AuthUser,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<ConversationView>>> {
    let (page, size) = params.resolve();
    Ok(Json(state.services.messages.conversations(&caller, page, size).await?))
}

pub async fn mark_read(
    State(state): State<AppState>,
    caller: AuthUser,
    Json(input): Json<MarkReadInput>,
) -> Result<Json<MarkedRead>> {
    let updated = state.services.messages.mark_read(&caller, input).await?;
    Ok(Json(MarkedRead { updated }))
}

pub async fn unread_count(State(state): State<AppState>, caller: AuthUser) -> Result<Json<UnreadCount>> {
    let count = state.services.messages.unread_count(&caller).await?;
    Ok(Json(UnreadCount { count }))
}

pub async fn recall(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(message_id): Path<i64>,
) -> Result<StatusCode> {
    state.services.messages.recall(&caller, message_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// src/handlers/inbox.rs

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::{
    common::error::AppError,
    config::AppState,
    models::whatsapp::{ConversationView, InboundMessage, MessageType},
};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MessagesQuery {
    /// Número do remetente, com código do país
    pub phone: Option<String>,
    #[serde(rename = "type")]
    pub message_type: Option<MessageType>,
    /// Padrão 100, máximo 1000
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessagesResponse {
    pub count: usize,
    pub messages: Vec<InboundMessage>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConversationsResponse {
    pub count: usize,
    pub conversations: Vec<ConversationView>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MarkReadPayload {
    #[schema(example = "919876543210")]
    pub phone_number: Option<String>,
}

// GET /api/whatsapp/messages
#[utoipa::path(
    get,
    path = "/api/whatsapp/messages",
    tag = "WhatsApp",
    params(MessagesQuery),
    responses(
        (status = 200, description = "Mensagens recebidas, mais recentes primeiro", body = MessagesResponse),
        (status = 400, description = "Parâmetros de consulta inválidos")
    )
)]
pub async fn list_messages(
    State(app_state): State<AppState>,
    query: Result<Query<MessagesQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(query) = query?;

    let messages = app_state
        .inbox_service
        .list_messages(query.phone, query.message_type, query.limit)
        .await?;

    Ok(Json(MessagesResponse {
        count: messages.len(),
        messages,
    }))
}

// GET /api/whatsapp/conversations
#[utoipa::path(
    get,
    path = "/api/whatsapp/conversations",
    tag = "WhatsApp",
    responses(
        (status = 200, description = "Conversas mais recentes com as últimas mensagens", body = ConversationsResponse)
    )
)]
pub async fn list_conversations(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conversations = app_state.inbox_service.list_conversations().await?;

    Ok(Json(ConversationsResponse {
        count: conversations.len(),
        conversations,
    }))
}

// POST /api/whatsapp/mark-read
#[utoipa::path(
    post,
    path = "/api/whatsapp/mark-read",
    tag = "WhatsApp",
    request_body = MarkReadPayload,
    responses(
        (status = 200, description = "Conversa marcada como lida"),
        (status = 400, description = "phone_number ausente"),
        (status = 404, description = "Conversa não encontrada")
    )
)]
pub async fn mark_read(
    State(app_state): State<AppState>,
    payload: Result<Json<MarkReadPayload>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;

    let phone_number = payload
        .phone_number
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or(AppError::MissingField("phone_number"))?;

    let updated = app_state.inbox_service.mark_read(phone_number).await?;

    Ok(Json(json!({ "status": "success", "updated": updated })))
}

// src/services/inbox_service.rs

use std::sync::Arc;

use crate::{
    common::error::AppError,
    db::WhatsAppStore,
    models::whatsapp::{ConversationView, InboundMessage, MessageFilter, MessageType},
};

pub const DEFAULT_MESSAGE_LIMIT: i64 = 100;
pub const MAX_MESSAGE_LIMIT: i64 = 1000;
pub const CONVERSATION_LIMIT: i64 = 50;
// Quantas mensagens recentes vão junto de cada conversa
pub const LATEST_MESSAGES_PER_CONVERSATION: i64 = 10;

#[derive(Clone)]
pub struct InboxService {
    store: Arc<dyn WhatsAppStore>,
}

impl InboxService {
    pub fn new(store: Arc<dyn WhatsAppStore>) -> Self {
        Self { store }
    }

    pub async fn list_messages(
        &self,
        phone: Option<String>,
        message_type: Option<MessageType>,
        limit: Option<i64>,
    ) -> Result<Vec<InboundMessage>, AppError> {
        let filter = MessageFilter {
            phone: phone.filter(|p| !p.is_empty()),
            message_type,
            limit: limit
                .unwrap_or(DEFAULT_MESSAGE_LIMIT)
                .clamp(1, MAX_MESSAGE_LIMIT),
        };

        self.store.list_messages(&filter).await
    }

    pub async fn list_conversations(&self) -> Result<Vec<ConversationView>, AppError> {
        let conversations = self.store.list_conversations(CONVERSATION_LIMIT).await?;

        let mut views = Vec::with_capacity(conversations.len());
        for conversation in conversations {
            let latest_messages = self
                .store
                .latest_messages(&conversation.phone_number, LATEST_MESSAGES_PER_CONVERSATION)
                .await?;
            views.push(ConversationView { conversation, latest_messages });
        }

        Ok(views)
    }

    /// Marca a conversa como lida. Retorna quantas mensagens saíram de `received`.
    pub async fn mark_read(&self, phone_number: &str) -> Result<u64, AppError> {
        let updated = self
            .store
            .mark_conversation_read(phone_number)
            .await?
            .ok_or(AppError::ConversationNotFound)?;

        tracing::info!(phone_number, updated, "Conversa marcada como lida");
        Ok(updated)
    }
}

// src/db/memory.rs
//
// Store em memória para os testes. Reproduz as mesmas regras do Postgres:
// message_id único, conversa criada/incrementada junto com a mensagem, etc.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{BillingStore, ContactStore, WhatsAppStore},
    models::{
        billing::{BillingItem, BillingSlip, NewSlip, SlipWithItems},
        contact::{ContactSubmission, NewContactSubmission},
        whatsapp::{
            Conversation, InboundMessage, MessageFilter, MessageStatus, MessageStatusUpdate,
            NewInboundMessage, NewStatusUpdate,
        },
    },
};

#[derive(Default)]
struct Tables {
    messages: Vec<InboundMessage>,
    statuses: Vec<MessageStatusUpdate>,
    conversations: Vec<Conversation>,
    slips: Vec<SlipWithItems>,
    contacts: Vec<ContactSubmission>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<InboundMessage> {
        self.tables.lock().unwrap().messages.clone()
    }

    pub fn statuses(&self) -> Vec<MessageStatusUpdate> {
        self.tables.lock().unwrap().statuses.clone()
    }

    pub fn conversation(&self, phone_number: &str) -> Option<Conversation> {
        self.tables
            .lock()
            .unwrap()
            .conversations
            .iter()
            .find(|c| c.phone_number == phone_number)
            .cloned()
    }

    pub fn slips(&self) -> Vec<SlipWithItems> {
        self.tables.lock().unwrap().slips.clone()
    }

    pub fn contacts(&self) -> Vec<ContactSubmission> {
        self.tables.lock().unwrap().contacts.clone()
    }
}

fn newest_first(messages: &mut [InboundMessage]) {
    messages.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

#[async_trait]
impl WhatsAppStore for MemoryStore {
    async fn record_message(
        &self,
        message: &NewInboundMessage,
    ) -> Result<Option<InboundMessage>, AppError> {
        let mut guard = self.tables.lock().unwrap();
        let tables = &mut *guard;

        if tables
            .messages
            .iter()
            .any(|m| m.message_id == message.message_id || m.wamid.as_deref() == Some(message.wamid.as_str()))
        {
            return Ok(None);
        }

        let cols = message.content.columns();
        let stored = InboundMessage {
            id: Uuid::new_v4(),
            message_id: message.message_id.clone(),
            wamid: Some(message.wamid.clone()),
            from_number: message.from_number.clone(),
            from_name: message.from_name.clone(),
            message_type: message.content.message_type(),
            text_body: cols.text_body,
            media_id: cols.media_id,
            media_mime_type: cols.media_mime_type,
            media_url: None,
            media_caption: cols.media_caption,
            latitude: cols.latitude,
            longitude: cols.longitude,
            location_name: cols.location_name,
            location_address: cols.location_address,
            timestamp: message.timestamp,
            received_at: Utc::now(),
            status: MessageStatus::Received,
            raw_payload: Some(message.raw_payload.clone()),
            context_message_id: message.context_message_id.clone(),
        };
        tables.messages.push(stored.clone());

        let now = Utc::now();
        match tables
            .conversations
            .iter_mut()
            .find(|c| c.phone_number == message.from_number)
        {
            Some(conversation) => {
                conversation.last_message_at = message.timestamp;
                conversation.message_count += 1;
                conversation.unread_count += 1;
                if conversation.contact_name.is_none() {
                    conversation.contact_name = message.from_name.clone();
                }
                conversation.updated_at = now;
            }
            None => tables.conversations.push(Conversation {
                id: Uuid::new_v4(),
                phone_number: message.from_number.clone(),
                contact_name: message.from_name.clone(),
                last_message_at: message.timestamp,
                message_count: 1,
                unread_count: 1,
                customer_email: None,
                notes: None,
                created_at: now,
                updated_at: now,
            }),
        }

        Ok(Some(stored))
    }

    async fn record_status(&self, status: &NewStatusUpdate) -> Result<MessageStatusUpdate, AppError> {
        let row = MessageStatusUpdate {
            id: Uuid::new_v4(),
            message_id: status.message_id.clone(),
            recipient_number: status.recipient_number.clone(),
            status: status.status,
            timestamp: status.timestamp,
            received_at: Utc::now(),
            error_code: status.error_code.clone(),
            error_message: status.error_message.clone(),
            raw_payload: Some(status.raw_payload.clone()),
        };
        self.tables.lock().unwrap().statuses.push(row.clone());
        Ok(row)
    }

    async fn attach_media_url(&self, message_id: &str, media_url: &str) -> Result<(), AppError> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(message) = tables.messages.iter_mut().find(|m| m.message_id == message_id) {
            message.media_url = Some(media_url.to_string());
        }
        Ok(())
    }

    async fn list_messages(&self, filter: &MessageFilter) -> Result<Vec<InboundMessage>, AppError> {
        let mut messages: Vec<InboundMessage> = self
            .messages()
            .into_iter()
            .filter(|m| filter.phone.as_deref().is_none_or(|p| m.from_number == p))
            .filter(|m| filter.message_type.is_none_or(|t| m.message_type == t))
            .collect();
        newest_first(&mut messages);
        messages.truncate(filter.limit.max(0) as usize);
        Ok(messages)
    }

    async fn list_conversations(&self, limit: i64) -> Result<Vec<Conversation>, AppError> {
        let mut conversations = self.tables.lock().unwrap().conversations.clone();
        conversations.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));
        conversations.truncate(limit.max(0) as usize);
        Ok(conversations)
    }

    async fn latest_messages(
        &self,
        phone_number: &str,
        limit: i64,
    ) -> Result<Vec<InboundMessage>, AppError> {
        let filter = MessageFilter {
            phone: Some(phone_number.to_string()),
            message_type: None,
            limit,
        };
        self.list_messages(&filter).await
    }

    async fn mark_conversation_read(&self, phone_number: &str) -> Result<Option<u64>, AppError> {
        let mut guard = self.tables.lock().unwrap();
        let tables = &mut *guard;

        let Some(conversation) = tables
            .conversations
            .iter_mut()
            .find(|c| c.phone_number == phone_number)
        else {
            return Ok(None);
        };
        conversation.unread_count = 0;

        let mut updated = 0;
        for message in tables
            .messages
            .iter_mut()
            .filter(|m| m.from_number == phone_number && m.status == MessageStatus::Received)
        {
            message.status = MessageStatus::Read;
            updated += 1;
        }

        Ok(Some(updated))
    }
}

#[async_trait]
impl BillingStore for MemoryStore {
    async fn create_slip(&self, new_slip: &NewSlip) -> Result<SlipWithItems, AppError> {
        let slip = BillingSlip {
            id: Uuid::new_v4(),
            slip_no: new_slip.slip_no.clone(),
            date: new_slip.date,
            due_date: new_slip.due_date,
            address: new_slip.address.clone(),
            phone: new_slip.phone.clone(),
            amount: new_slip.amount,
            created_at: Utc::now(),
        };
        let items = new_slip
            .items
            .iter()
            .map(|item| BillingItem {
                id: Uuid::new_v4(),
                slip_id: slip.id,
                item_name: item.item_name.clone(),
                service: item.service.clone(),
                quantity: item.quantity,
                price_per_unit: item.price_per_unit,
            })
            .collect();

        let created = SlipWithItems { slip, items };
        self.tables.lock().unwrap().slips.push(created.clone());
        Ok(created)
    }
}

#[async_trait]
impl ContactStore for MemoryStore {
    async fn create_submission(
        &self,
        submission: &NewContactSubmission,
    ) -> Result<ContactSubmission, AppError> {
        let row = ContactSubmission {
            id: Uuid::new_v4(),
            name: submission.name.clone(),
            phone: submission.phone.clone(),
            subject: submission.subject.clone(),
            message: submission.message.clone(),
            created_at: Utc::now(),
        };
        self.tables.lock().unwrap().contacts.push(row.clone());
        Ok(row)
    }
}

// src/models/whatsapp.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- ENUMS ---

// Mapeia o CREATE TYPE whatsapp_message_type do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "whatsapp_message_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Text,
    Image,
    Audio,
    Video,
    Document,
    Location,
    Contacts,
    Interactive,
    Unknown,
}

impl MessageType {
    /// Tag de tipo como vem no webhook. Qualquer valor fora da lista vira `Unknown`.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "text" => Self::Text,
            "image" => Self::Image,
            "audio" => Self::Audio,
            "video" => Self::Video,
            "document" => Self::Document,
            "location" => Self::Location,
            "contacts" => Self::Contacts,
            "interactive" => Self::Interactive,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "whatsapp_message_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Received,
    Read,
    Replied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "whatsapp_delivery_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sent,
    Delivered,
    Read,
    Failed,
}

// --- CONTEÚDO DA MENSAGEM ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Audio,
    Video,
    Document,
}

/// Conteúdo de uma mensagem recebida, já resolvido pelo tipo.
/// Campos que vieram ausentes ou com tipo errado ficam `None`.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageContent {
    Text {
        body: Option<String>,
    },
    Media {
        kind: MediaKind,
        media_id: Option<String>,
        mime_type: Option<String>,
        caption: Option<String>,
    },
    Location {
        latitude: Option<f64>,
        longitude: Option<f64>,
        name: Option<String>,
        address: Option<String>,
    },
    // Título do botão ou item de lista escolhido (se o subtipo for conhecido)
    Interactive {
        title: Option<String>,
    },
    Contacts,
    Unknown,
}

impl MessageContent {
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::Text { .. } => MessageType::Text,
            Self::Media { kind, .. } => match kind {
                MediaKind::Image => MessageType::Image,
                MediaKind::Audio => MessageType::Audio,
                MediaKind::Video => MessageType::Video,
                MediaKind::Document => MessageType::Document,
            },
            Self::Location { .. } => MessageType::Location,
            Self::Interactive { .. } => MessageType::Interactive,
            Self::Contacts => MessageType::Contacts,
            Self::Unknown => MessageType::Unknown,
        }
    }

    pub fn media_id(&self) -> Option<&str> {
        match self {
            Self::Media { media_id, .. } => media_id.as_deref(),
            _ => None,
        }
    }

    /// Achata o conteúdo nas colunas da tabela `whatsapp_messages`.
    pub fn columns(&self) -> ContentColumns {
        let mut cols = ContentColumns::default();
        match self {
            Self::Text { body } => cols.text_body = body.clone(),
            Self::Interactive { title } => cols.text_body = title.clone(),
            Self::Media { media_id, mime_type, caption, .. } => {
                cols.media_id = media_id.clone();
                cols.media_mime_type = mime_type.clone();
                cols.media_caption = caption.clone();
            }
            Self::Location { latitude, longitude, name, address } => {
                cols.latitude = *latitude;
                cols.longitude = *longitude;
                cols.location_name = name.clone();
                cols.location_address = address.clone();
            }
            Self::Contacts | Self::Unknown => {}
        }
        cols
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentColumns {
    pub text_body: Option<String>,
    pub media_id: Option<String>,
    pub media_mime_type: Option<String>,
    pub media_caption: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_name: Option<String>,
    pub location_address: Option<String>,
}

// --- LINHAS DO BANCO ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InboundMessage {
    pub id: Uuid,
    #[schema(example = "wamid.HBgMOTE5ODc2NTQzMjEwFQIAEhgg")]
    pub message_id: String,
    pub wamid: Option<String>,
    #[schema(example = "919876543210")]
    pub from_number: String,
    pub from_name: Option<String>,
    pub message_type: MessageType,
    pub text_body: Option<String>,
    pub media_id: Option<String>,
    pub media_mime_type: Option<String>,
    pub media_url: Option<String>,
    pub media_caption: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_name: Option<String>,
    pub location_address: Option<String>,
    // Horário informado pelo provedor (não o de recebimento)
    pub timestamp: DateTime<Utc>,
    pub received_at: DateTime<Utc>,
    pub status: MessageStatus,
    #[schema(value_type = Option<Object>)]
    pub raw_payload: Option<Value>,
    pub context_message_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageStatusUpdate {
    pub id: Uuid,
    pub message_id: String,
    pub recipient_number: String,
    pub status: DeliveryStatus,
    pub timestamp: DateTime<Utc>,
    pub received_at: DateTime<Utc>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub raw_payload: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: Uuid,
    #[schema(example = "919876543210")]
    pub phone_number: String,
    pub contact_name: Option<String>,
    pub last_message_at: DateTime<Utc>,
    pub message_count: i32,
    pub unread_count: i32,
    pub customer_email: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConversationView {
    #[serde(flatten)]
    pub conversation: Conversation,
    pub latest_messages: Vec<InboundMessage>,
}

// --- ENTRADAS PARA O STORE ---

#[derive(Debug, Clone)]
pub struct NewInboundMessage {
    pub message_id: String,
    pub wamid: String,
    pub from_number: String,
    pub from_name: Option<String>,
    pub content: MessageContent,
    pub timestamp: DateTime<Utc>,
    pub context_message_id: Option<String>,
    pub raw_payload: Value,
}

#[derive(Debug, Clone)]
pub struct NewStatusUpdate {
    pub message_id: String,
    pub recipient_number: String,
    pub status: DeliveryStatus,
    pub timestamp: DateTime<Utc>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    pub raw_payload: Value,
}

#[derive(Debug, Clone)]
pub struct MessageFilter {
    pub phone: Option<String>,
    pub message_type: Option<MessageType>,
    pub limit: i64,
}

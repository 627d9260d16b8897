// src/models/webhook.rs
//
// Formato dos eventos que a WhatsApp Cloud API envia ao webhook.
// O envelope é tipado; cada mensagem/status fica como `Value` até ser
// interpretado individualmente, para que um item ruim não derrube o lote.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    common::error::AppError,
    models::whatsapp::{
        DeliveryStatus, MediaKind, MessageContent, MessageType, NewInboundMessage,
        NewStatusUpdate,
    },
};

/// Único valor de `object` que dispara processamento.
pub const WHATSAPP_OBJECT: &str = "whatsapp_business_account";

#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookEntry {
    #[serde(default)]
    pub changes: Vec<WebhookChange>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookChange {
    #[serde(default)]
    pub value: ChangeValue,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChangeValue {
    pub messages: Option<Vec<Value>>,
    pub statuses: Option<Vec<Value>>,
    // Só serve para achar o nome do remetente; entradas fora do formato são ignoradas
    #[serde(default)]
    pub contacts: Vec<Value>,
    pub metadata: Option<Value>,
}

// --- Itens individuais ---

// O provedor manda o timestamp Unix como string, mas aceitamos número também.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProviderTimestamp {
    Text(String),
    Number(i64),
}

impl ProviderTimestamp {
    fn to_datetime(&self) -> Result<DateTime<Utc>, AppError> {
        let secs = match self {
            Self::Text(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| malformed(format!("timestamp inválido: {s}")))?,
            Self::Number(n) => *n,
        };
        DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| malformed(format!("timestamp fora do intervalo: {secs}")))
    }
}

// Só o envelope da mensagem é obrigatório. O conteúdo de cada tipo é lido
// direto do `Value`, campo a campo.
#[derive(Debug, Deserialize)]
struct RawMessage {
    id: String,
    from: String,
    timestamp: ProviderTimestamp,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawStatus {
    id: String,
    recipient_id: String,
    status: DeliveryStatus,
    timestamp: ProviderTimestamp,
    #[serde(default)]
    errors: Vec<Value>,
}

fn malformed(reason: impl Into<String>) -> AppError {
    AppError::MalformedEvent(reason.into())
}

/// `wamid` derivado do id externo: o próprio id quando já vem com o prefixo.
pub fn derive_wamid(message_id: &str) -> String {
    if message_id.starts_with("wamid.") {
        message_id.to_string()
    } else {
        format!("wamid.{message_id}")
    }
}

/// Nome de exibição do remetente, procurado na lista `contacts` que acompanha as mensagens.
pub fn resolve_contact_name(contacts: &[Value], from: &str) -> Option<String> {
    contacts
        .iter()
        .find(|c| c.get("wa_id").and_then(Value::as_str) == Some(from))
        .and_then(|c| string_at(c, &["profile", "name"]))
}

fn string_at(value: &Value, path: &[&str]) -> Option<String> {
    path.iter()
        .try_fold(value, |v, key| v.get(key))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn number_at(value: &Value, path: &[&str]) -> Option<f64> {
    path.iter()
        .try_fold(value, |v, key| v.get(key))
        .and_then(Value::as_f64)
}

/// Interpreta uma mensagem do lote. Só `id`, `from` e `timestamp` são obrigatórios;
/// campos do tipo ausentes ou malformados ficam `None` e a mensagem é gravada assim mesmo.
pub fn parse_message(raw: &Value, contacts: &[Value]) -> Result<NewInboundMessage, AppError> {
    let msg: RawMessage =
        serde_json::from_value(raw.clone()).map_err(|e| malformed(e.to_string()))?;

    let timestamp = msg.timestamp.to_datetime()?;

    let message_type = msg
        .kind
        .as_deref()
        .map(MessageType::from_tag)
        .unwrap_or(MessageType::Unknown);

    let content = match message_type {
        MessageType::Text => MessageContent::Text {
            body: string_at(raw, &["text", "body"]),
        },
        MessageType::Image => media_content(raw, MediaKind::Image, "image"),
        MessageType::Audio => media_content(raw, MediaKind::Audio, "audio"),
        MessageType::Video => media_content(raw, MediaKind::Video, "video"),
        MessageType::Document => media_content(raw, MediaKind::Document, "document"),
        MessageType::Location => MessageContent::Location {
            latitude: number_at(raw, &["location", "latitude"]),
            longitude: number_at(raw, &["location", "longitude"]),
            name: string_at(raw, &["location", "name"]),
            address: string_at(raw, &["location", "address"]),
        },
        MessageType::Interactive => {
            let title = match string_at(raw, &["interactive", "type"]).as_deref() {
                Some("button_reply") => string_at(raw, &["interactive", "button_reply", "title"]),
                Some("list_reply") => string_at(raw, &["interactive", "list_reply", "title"]),
                _ => None,
            };
            MessageContent::Interactive { title }
        }
        MessageType::Contacts => MessageContent::Contacts,
        MessageType::Unknown => MessageContent::Unknown,
    };

    Ok(NewInboundMessage {
        wamid: derive_wamid(&msg.id),
        from_name: resolve_contact_name(contacts, &msg.from),
        context_message_id: string_at(raw, &["context", "id"]),
        message_id: msg.id,
        from_number: msg.from,
        content,
        timestamp,
        raw_payload: raw.clone(),
    })
}

fn media_content(raw: &Value, kind: MediaKind, key: &str) -> MessageContent {
    MessageContent::Media {
        kind,
        media_id: string_at(raw, &[key, "id"]),
        mime_type: string_at(raw, &[key, "mime_type"]),
        caption: string_at(raw, &[key, "caption"]),
    }
}

/// Interpreta uma atualização de status. Em `failed`, só o primeiro erro é guardado.
pub fn parse_status(raw: &Value) -> Result<NewStatusUpdate, AppError> {
    let status: RawStatus =
        serde_json::from_value(raw.clone()).map_err(|e| malformed(e.to_string()))?;

    let timestamp = status.timestamp.to_datetime()?;

    let (error_code, error_message) = match status.status {
        DeliveryStatus::Failed => status
            .errors
            .into_iter()
            .next()
            .map(|e| {
                let code = e.get("code").filter(|c| !c.is_null()).map(value_to_string);
                (code, string_at(&e, &["title"]))
            })
            .unwrap_or((None, None)),
        _ => (None, None),
    };

    Ok(NewStatusUpdate {
        message_id: status.id,
        recipient_number: status.recipient_id,
        status: status.status,
        timestamp,
        error_code,
        error_message,
        raw_payload: raw.clone(),
    })
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// src/models/outbound.rs
//
// Corpo do POST /{phone_number_id}/messages da Cloud API.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct OutboundMessage {
    pub messaging_product: &'static str,
    pub to: String,
    #[serde(flatten)]
    pub body: OutboundBody,
}

impl OutboundMessage {
    pub fn new(to: String, body: OutboundBody) -> Self {
        Self {
            messaging_product: "whatsapp",
            to,
            body,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutboundBody {
    Text { text: TextBody },
    Template { template: Template },
}

#[derive(Debug, Clone, Serialize)]
pub struct TextBody {
    pub body: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Template {
    pub name: String,
    pub language: TemplateLanguage,
    pub components: Vec<TemplateComponent>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateLanguage {
    pub code: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateComponent {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub parameters: Vec<TemplateParameter>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateParameter {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub parameter_name: String,
    pub text: String,
}

impl TemplateParameter {
    pub fn named(name: &str, text: impl Into<String>) -> Self {
        Self {
            kind: "text",
            parameter_name: name.to_string(),
            text: text.into(),
        }
    }
}

impl TemplateComponent {
    pub fn header(parameters: Vec<TemplateParameter>) -> Self {
        Self { kind: "header", parameters }
    }

    pub fn body(parameters: Vec<TemplateParameter>) -> Self {
        Self { kind: "body", parameters }
    }
}

/// Resposta de GET /{media_id}. Só a URL (de curta duração) nos interessa.
#[derive(Debug, Deserialize)]
pub struct MediaInfo {
    pub url: Option<String>,
}

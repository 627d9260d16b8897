// src/services/notifier.rs
//
// Envio de mensagens pela WhatsApp Cloud API (confirmação de pedido e
// encaminhamento do formulário de contato) e resolução de URLs de mídia.

use std::{sync::Arc, time::Duration};

use reqwest::StatusCode;
use thiserror::Error;

use crate::{
    common::phone::normalize_phone,
    config::WhatsAppConfig,
    models::{
        billing::SlipWithItems,
        contact::ContactSubmission,
        outbound::{
            MediaInfo, OutboundBody, OutboundMessage, Template, TemplateComponent,
            TemplateLanguage, TemplateParameter, TextBody,
        },
    },
};

/// Tempo máximo de uma chamada ao provedor antes de ser tratada como falha.
pub const SEND_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("credenciais do WhatsApp não configuradas")]
    NotConfigured,

    #[error("falha de rede: {0}")]
    Network(#[from] reqwest::Error),

    #[error("a API respondeu {status}: {body}")]
    Api { status: StatusCode, body: String },
}

#[derive(Clone)]
pub struct WhatsAppNotifier {
    client: reqwest::Client,
    config: Arc<WhatsAppConfig>,
}

impl WhatsAppNotifier {
    pub fn new(config: WhatsAppConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(SEND_TIMEOUT).build()?;
        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &WhatsAppConfig {
        &self.config
    }

    /// Envia a mensagem e reduz o resultado a um booleano.
    /// Falhas são logadas aqui e nunca propagadas para quem chamou.
    pub async fn send(&self, message: &OutboundMessage) -> bool {
        match self.try_send(message).await {
            Ok(()) => {
                tracing::info!(to = %message.to, "📤 Mensagem WhatsApp enviada");
                true
            }
            Err(e) => {
                tracing::error!(to = %message.to, error = %e, "Falha ao enviar mensagem WhatsApp");
                false
            }
        }
    }

    async fn try_send(&self, message: &OutboundMessage) -> Result<(), NotifyError> {
        let (Some(token), Some(phone_number_id)) =
            (&self.config.access_token, &self.config.phone_number_id)
        else {
            return Err(NotifyError::NotConfigured);
        };

        let url = format!("{}/{}/messages", self.config.api_base_url, phone_number_id);
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(message)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::OK {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(NotifyError::Api { status, body })
        }
    }

    /// Confirmação de pedido para o telefone da nota.
    /// Usa o template configurado; sem template, vai como texto livre.
    pub async fn notify_slip_created(&self, slip: &SlipWithItems) -> bool {
        let to = normalize_phone(&slip.slip.phone, &self.config.default_country_code);

        let body = match &self.config.order_template {
            Some(name) => OutboundBody::Template {
                template: slip_template(slip, name, &self.config.template_language),
            },
            None => OutboundBody::Text {
                text: TextBody { body: slip_text(slip) },
            },
        };

        self.send(&OutboundMessage::new(to, body)).await
    }

    /// Encaminha o formulário de contato para o número da loja.
    pub async fn forward_contact(&self, submission: &ContactSubmission) -> bool {
        let Some(recipient) = &self.config.recipient_number else {
            tracing::error!("WHATSAPP_RECIPIENT_NUMBER não configurado; contato não encaminhado");
            return false;
        };
        let to = normalize_phone(recipient, &self.config.default_country_code);

        let template = contact_template(
            submission,
            &self.config.contact_template,
            &self.config.template_language,
        );

        self.send(&OutboundMessage::new(to, OutboundBody::Template { template }))
            .await
    }

    /// Busca a URL temporária de uma mídia recebida.
    pub async fn fetch_media_url(&self, media_id: &str) -> Result<Option<String>, NotifyError> {
        let Some(token) = &self.config.access_token else {
            return Err(NotifyError::NotConfigured);
        };

        let url = format!("{}/{}", self.config.api_base_url, media_id);
        let response = self.client.get(url).bearer_auth(token).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Api { status, body });
        }

        let info: MediaInfo = response.json().await?;
        Ok(info.url)
    }
}

// =============================================================================
//  FORMATAÇÃO
// =============================================================================

fn format_date(date: chrono::NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

fn item_lines(slip: &SlipWithItems) -> Vec<String> {
    slip.items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            format!(
                "{}. {} ({}) x {} @ ₹{:.2} = ₹{:.2}",
                i + 1,
                item.item_name,
                item.service,
                item.quantity,
                item.price_per_unit,
                item.line_total()
            )
        })
        .collect()
}

pub fn slip_text(slip: &SlipWithItems) -> String {
    let header = &slip.slip;
    format!(
        "Hello! Your dry-cleaning order {} has been booked.\n\n\
         Date: {}\n\
         Due date: {}\n\
         Address: {}\n\n\
         Items:\n{}\n\n\
         Total: ₹{:.2}\n\n\
         Thank you for choosing us!",
        header.slip_no,
        format_date(header.date),
        format_date(header.due_date),
        header.address,
        item_lines(slip).join("\n"),
        slip.total()
    )
}

// Parâmetros de template não aceitam quebra de linha, então os itens vão numa linha só
pub fn slip_template(slip: &SlipWithItems, name: &str, language: &str) -> Template {
    let header = &slip.slip;
    Template {
        name: name.to_string(),
        language: TemplateLanguage { code: language.to_string() },
        components: vec![TemplateComponent::body(vec![
            TemplateParameter::named("order_id", header.slip_no.clone()),
            TemplateParameter::named("date", format_date(header.date)),
            TemplateParameter::named("due_date", format_date(header.due_date)),
            TemplateParameter::named("address", header.address.clone()),
            TemplateParameter::named("items", item_lines(slip).join("; ")),
            TemplateParameter::named("total", format!("₹{:.2}", slip.total())),
        ])],
    }
}

pub fn contact_template(submission: &ContactSubmission, name: &str, language: &str) -> Template {
    Template {
        name: name.to_string(),
        language: TemplateLanguage { code: language.to_string() },
        components: vec![
            TemplateComponent::header(vec![TemplateParameter::named(
                "subject",
                submission.subject.clone(),
            )]),
            TemplateComponent::body(vec![
                TemplateParameter::named("name", submission.name.clone()),
                TemplateParameter::named("phone", submission.phone.clone()),
                TemplateParameter::named("message", submission.message.clone()),
            ]),
        ],
    }
}

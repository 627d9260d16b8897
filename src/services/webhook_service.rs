// src/services/webhook_service.rs

use std::sync::Arc;

use hmac::{Hmac, Mac};
use serde::Serialize;
use serde_json::Value;
use sha2::Sha256;

use crate::{
    common::error::AppError,
    db::WhatsAppStore,
    models::webhook::{self, ChangeValue, WebhookPayload, WHATSAPP_OBJECT},
    services::notifier::WhatsAppNotifier,
};

type HmacSha256 = Hmac<Sha256>;

/// `hub.mode` esperado no handshake de verificação.
pub const VERIFY_MODE: &str = "subscribe";
const SIGNATURE_PREFIX: &[u8] = b"sha256=";

/// Contagem do que aconteceu com um POST do webhook.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct WebhookSummary {
    pub stored: usize,
    pub duplicates: usize,
    pub statuses: usize,
    pub failed: usize,
}

/// Mídia a ser resolvida fora do ciclo da requisição.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaFetch {
    pub message_id: String,
    pub media_id: String,
}

#[derive(Debug, Default)]
pub struct WebhookOutcome {
    pub summary: WebhookSummary,
    pub media: Vec<MediaFetch>,
}

#[derive(Clone)]
pub struct WebhookService {
    store: Arc<dyn WhatsAppStore>,
    notifier: WhatsAppNotifier,
}

impl WebhookService {
    pub fn new(store: Arc<dyn WhatsAppStore>, notifier: WhatsAppNotifier) -> Self {
        Self { store, notifier }
    }

    // =========================================================================
    //  VERIFICAÇÃO
    // =========================================================================

    /// Handshake GET: devolve o challenge se modo e token conferem.
    pub fn verify_subscription(
        &self,
        mode: Option<&str>,
        token: Option<&str>,
        challenge: Option<&str>,
    ) -> Option<String> {
        let expected = self.notifier.config().verify_token.as_deref()?;

        if mode == Some(VERIFY_MODE) && token == Some(expected) {
            challenge.map(str::to_string)
        } else {
            None
        }
    }

    /// Confere o `X-Hub-Signature-256` contra o corpo bruto.
    /// Sem cabeçalho ou sem segredo configurado, passa.
    pub fn verify_signature(&self, signature: Option<&[u8]>, body: &[u8]) -> bool {
        let Some(signature) = signature.filter(|s| !s.is_empty()) else {
            return true;
        };
        let Some(secret) = self.notifier.config().app_secret.as_deref() else {
            return true;
        };

        signature_matches(secret, signature, body)
    }

    // =========================================================================
    //  PROCESSAMENTO
    // =========================================================================

    /// Interpreta o corpo e processa cada mensagem e status.
    /// Só falha se o corpo inteiro não for o JSON esperado; erros por item
    /// são logados e contados em `failed`.
    pub async fn process(&self, body: &[u8]) -> Result<WebhookOutcome, AppError> {
        let payload: WebhookPayload = serde_json::from_slice(body)?;
        let mut outcome = WebhookOutcome::default();

        if payload.object.as_deref() != Some(WHATSAPP_OBJECT) {
            tracing::info!(object = ?payload.object, "Webhook ignorado: objeto inesperado");
            return Ok(outcome);
        }

        for entry in &payload.entry {
            for change in &entry.changes {
                let value = &change.value;

                if let Some(messages) = &value.messages {
                    self.handle_messages(value, messages, &mut outcome).await;
                }
                if let Some(statuses) = &value.statuses {
                    self.handle_statuses(statuses, &mut outcome).await;
                }
            }
        }

        Ok(outcome)
    }

    async fn handle_messages(
        &self,
        value: &ChangeValue,
        messages: &[Value],
        outcome: &mut WebhookOutcome,
    ) {
        tracing::debug!(metadata = ?value.metadata, count = messages.len(), "Processando mensagens");

        for raw in messages {
            let parsed = match webhook::parse_message(raw, &value.contacts) {
                Ok(parsed) => parsed,
                Err(e) => {
                    tracing::error!(error = %e, "Erro ao interpretar mensagem do webhook");
                    outcome.summary.failed += 1;
                    continue;
                }
            };

            match self.store.record_message(&parsed).await {
                Ok(Some(stored)) => {
                    tracing::info!(
                        message_id = %stored.message_id,
                        from = %stored.from_number,
                        message_type = ?stored.message_type,
                        "💬 Mensagem salva"
                    );
                    outcome.summary.stored += 1;

                    if let Some(media_id) = parsed.content.media_id() {
                        outcome.media.push(MediaFetch {
                            message_id: stored.message_id.clone(),
                            media_id: media_id.to_string(),
                        });
                    }
                }
                Ok(None) => {
                    tracing::warn!(message_id = %parsed.message_id, "Mensagem já processada, ignorando");
                    outcome.summary.duplicates += 1;
                }
                Err(e) => {
                    tracing::error!(message_id = %parsed.message_id, error = %e, "Erro ao salvar mensagem");
                    outcome.summary.failed += 1;
                }
            }
        }
    }

    async fn handle_statuses(&self, statuses: &[Value], outcome: &mut WebhookOutcome) {
        for raw in statuses {
            let result = match webhook::parse_status(raw) {
                Ok(status) => self.store.record_status(&status).await,
                Err(e) => Err(e),
            };

            match result {
                Ok(saved) => {
                    tracing::info!(message_id = %saved.message_id, status = ?saved.status, "Status atualizado");
                    outcome.summary.statuses += 1;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Erro ao processar status do webhook");
                    outcome.summary.failed += 1;
                }
            }
        }
    }

    // =========================================================================
    //  MÍDIA (fora da requisição)
    // =========================================================================

    /// Dispara a resolução das mídias em tasks separadas; a resposta do webhook
    /// não espera por elas. Falhas não são re-tentadas.
    pub fn spawn_media_fetches(&self, jobs: Vec<MediaFetch>) {
        for job in jobs {
            let store = self.store.clone();
            let notifier = self.notifier.clone();
            tokio::spawn(async move {
                resolve_media(store.as_ref(), &notifier, &job).await;
            });
        }
    }
}

pub(crate) async fn resolve_media(
    store: &dyn WhatsAppStore,
    notifier: &WhatsAppNotifier,
    job: &MediaFetch,
) -> bool {
    let url = match notifier.fetch_media_url(&job.media_id).await {
        Ok(Some(url)) => url,
        Ok(None) => {
            tracing::warn!(media_id = %job.media_id, "Resposta de mídia sem URL");
            return false;
        }
        Err(e) => {
            tracing::error!(media_id = %job.media_id, error = %e, "Erro ao baixar mídia");
            return false;
        }
    };

    match store.attach_media_url(&job.message_id, &url).await {
        Ok(()) => {
            tracing::info!(media_id = %job.media_id, "Mídia resolvida");
            true
        }
        Err(e) => {
            tracing::error!(media_id = %job.media_id, error = %e, "Erro ao salvar URL da mídia");
            false
        }
    }
}

/// HMAC-SHA256 do corpo com o app secret, comparado em tempo constante.
pub fn signature_matches(secret: &str, signature: &[u8], body: &[u8]) -> bool {
    let Some(hex_digest) = signature.strip_prefix(SIGNATURE_PREFIX) else {
        return false;
    };
    let Ok(expected) = hex::decode(hex_digest) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };

    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

// src/handlers/whatsapp.rs

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::IntoParams;

use crate::{common::error::AppError, config::AppState};

pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct VerifyQuery {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

// GET /api/whatsapp/webhook
#[utoipa::path(
    get,
    path = "/api/whatsapp/webhook",
    tag = "WhatsApp",
    params(VerifyQuery),
    responses(
        (status = 200, description = "Challenge devolvido como texto", body = String),
        (status = 403, description = "Modo ou token não conferem")
    )
)]
pub async fn verify_webhook(
    State(app_state): State<AppState>,
    Query(query): Query<VerifyQuery>,
) -> Response {
    let challenge = app_state.webhook_service.verify_subscription(
        query.mode.as_deref(),
        query.verify_token.as_deref(),
        query.challenge.as_deref(),
    );

    match challenge {
        Some(challenge) => {
            tracing::info!("✅ Webhook verificado");
            (StatusCode::OK, challenge).into_response()
        }
        None => {
            tracing::warn!(mode = ?query.mode, "Falha na verificação do webhook");
            (StatusCode::FORBIDDEN, Json(json!({ "error": "Falha na verificação." }))).into_response()
        }
    }
}

// POST /api/whatsapp/webhook
#[utoipa::path(
    post,
    path = "/api/whatsapp/webhook",
    tag = "WhatsApp",
    request_body(content = Object, description = "Evento da WhatsApp Cloud API"),
    params(
        ("X-Hub-Signature-256" = Option<String>, Header, description = "sha256=<hex> do corpo com o app secret")
    ),
    responses(
        (status = 200, description = "Evento aceito; o corpo traz o resumo ou a descrição do erro"),
        (status = 403, description = "Assinatura inválida")
    )
)]
pub async fn receive_webhook(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let service = &app_state.webhook_service;

    let signature = headers.get(SIGNATURE_HEADER).map(|value| value.as_bytes());
    if !service.verify_signature(signature, &body) {
        tracing::warn!("Assinatura do webhook não confere, evento rejeitado");
        return AppError::InvalidSignature.into_response();
    }

    // Qualquer falha aqui ainda responde 200, senão o provedor reenvia o lote sem parar.
    match service.process(&body).await {
        Ok(outcome) => {
            service.spawn_media_fetches(outcome.media);
            let summary = outcome.summary;
            Json(json!({
                "status": "success",
                "stored": summary.stored,
                "duplicates": summary.duplicates,
                "statuses": summary.statuses,
                "failed": summary.failed,
            }))
            .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Erro ao processar webhook");
            Json(json!({ "status": "error", "message": e.to_string() })).into_response()
        }
    }
}

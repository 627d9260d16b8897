// src/handlers/contact.rs

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::{error::AppError, phone::validate_local_phone},
    config::AppState,
    models::contact::{ContactSubmission, NewContactSubmission},
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ContactPayload {
    #[validate(length(min = 1, max = 200, message = "O nome deve ter entre 1 e 200 caracteres."))]
    #[schema(example = "Priya Sharma")]
    pub name: String,

    #[validate(custom(function = "validate_local_phone"))]
    #[schema(example = "9876543210")]
    pub phone: String,

    #[validate(length(min = 1, max = 300, message = "O assunto deve ter entre 1 e 300 caracteres."))]
    #[schema(example = "Stain on silk saree")]
    pub subject: String,

    #[validate(length(min = 1, message = "A mensagem é obrigatória."))]
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactResponse {
    pub message: String,
    pub submission: ContactSubmission,
    pub whatsapp_sent: bool,
}

// POST /api/contact
#[utoipa::path(
    post,
    path = "/api/contact",
    tag = "Contact",
    request_body = ContactPayload,
    responses(
        (status = 201, description = "Formulário salvo e encaminhado", body = ContactResponse),
        (status = 400, description = "Dados inválidos")
    )
)]
pub async fn submit_contact(
    State(app_state): State<AppState>,
    payload: Result<Json<ContactPayload>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let forwarded = app_state
        .contact_service
        .submit(NewContactSubmission {
            name: payload.name.trim().to_string(),
            phone: payload.phone,
            subject: payload.subject.trim().to_string(),
            message: payload.message,
        })
        .await?;

    let message = if forwarded.whatsapp_sent {
        "Obrigado! Sua mensagem foi enviada."
    } else {
        "Sua mensagem foi salva, mas não foi possível encaminhá-la agora."
    };

    Ok((
        StatusCode::CREATED,
        Json(ContactResponse {
            message: message.to_string(),
            submission: forwarded.submission,
            whatsapp_sent: forwarded.whatsapp_sent,
        }),
    ))
}

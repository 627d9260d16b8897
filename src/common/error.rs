// src/common/error.rs

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Corpo da requisição inválido: {0}")]
    InvalidBody(#[from] JsonRejection),

    #[error("Parâmetros de consulta inválidos: {0}")]
    InvalidQuery(#[from] QueryRejection),

    #[error("Campo obrigatório ausente: {0}")]
    MissingField(&'static str),

    #[error("Assinatura do webhook inválida")]
    InvalidSignature,

    #[error("Conversa não encontrada")]
    ConversationNotFound,

    // Um item isolado do lote (mensagem ou status) que não pôde ser interpretado.
    // Nunca chega ao cliente: é logado e o lote continua.
    #[error("Evento malformado: {0}")]
    MalformedEvent(String),

    #[error("Payload do webhook inválido: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let details = validation_details(&errors);
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::InvalidBody(rejection) => {
                let body = Json(json!({
                    "error": "Corpo da requisição inválido.",
                    "details": rejection.body_text(),
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::InvalidQuery(rejection) => {
                let body = Json(json!({
                    "error": "Parâmetros de consulta inválidos.",
                    "details": rejection.body_text(),
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::MissingField(field) => {
                let body = Json(json!({ "error": format!("O campo {field} é obrigatório.") }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::InvalidSignature => (StatusCode::FORBIDDEN, "Assinatura inválida."),
            AppError::ConversationNotFound => (StatusCode::NOT_FOUND, "Conversa não encontrada."),
            AppError::MalformedEvent(_) | AppError::MalformedPayload(_) => {
                (StatusCode::BAD_REQUEST, "Payload malformado.")
            }

            // Banco e erros inesperados viram 500. O detalhe fica só no log.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Ocorreu um erro inesperado.")
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

/// Achata `ValidationErrors` (inclusive os aninhados em listas, ex: `items[1].quantity`)
/// num mapa campo -> mensagens.
fn validation_details(errors: &validator::ValidationErrors) -> serde_json::Map<String, serde_json::Value> {
    let mut details = serde_json::Map::new();
    collect_errors(errors, String::new(), &mut details);
    details
}

fn collect_errors(
    errors: &validator::ValidationErrors,
    prefix: String,
    out: &mut serde_json::Map<String, serde_json::Value>,
) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                let messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                out.insert(path, json!(messages));
            }
            ValidationErrorsKind::Struct(inner) => collect_errors(inner, path, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_errors(inner, format!("{path}[{index}]"), out);
                }
            }
        }
    }
}

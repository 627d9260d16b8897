// src/docs.rs

use utoipa::OpenApi;
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Bills ---
        handlers::bills::create_bill,

        // --- Contact ---
        handlers::contact::submit_contact,

        // --- WhatsApp ---
        handlers::whatsapp::verify_webhook,
        handlers::whatsapp::receive_webhook,
        handlers::inbox::list_messages,
        handlers::inbox::list_conversations,
        handlers::inbox::mark_read,
    ),
    components(
        schemas(
            // --- Billing ---
            models::billing::BillingSlip,
            models::billing::BillingItem,
            models::billing::SlipWithItems,
            handlers::bills::CreateSlipPayload,
            handlers::bills::CreateItemPayload,
            handlers::bills::SlipCreatedResponse,

            // --- Contact ---
            models::contact::ContactSubmission,
            handlers::contact::ContactPayload,
            handlers::contact::ContactResponse,

            // --- WhatsApp ---
            models::whatsapp::MessageType,
            models::whatsapp::MessageStatus,
            models::whatsapp::DeliveryStatus,
            models::whatsapp::InboundMessage,
            models::whatsapp::MessageStatusUpdate,
            models::whatsapp::Conversation,
            models::whatsapp::ConversationView,
            handlers::inbox::MessagesResponse,
            handlers::inbox::ConversationsResponse,
            handlers::inbox::MarkReadPayload,
        )
    ),
    tags(
        (name = "Bills", description = "Notas de serviço da lavanderia"),
        (name = "Contact", description = "Formulário de contato do site"),
        (name = "WhatsApp", description = "Webhook e caixa de entrada do WhatsApp")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/bills",
            "/api/contact",
            "/api/whatsapp/webhook",
            "/api/whatsapp/messages",
            "/api/whatsapp/conversations",
            "/api/whatsapp/mark-read",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path} sem documentação");
        }
    }
}

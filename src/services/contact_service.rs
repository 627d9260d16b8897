// src/services/contact_service.rs

use std::sync::Arc;

use crate::{
    common::error::AppError,
    db::ContactStore,
    models::contact::{ContactSubmission, NewContactSubmission},
    services::notifier::WhatsAppNotifier,
};

#[derive(Debug)]
pub struct ContactForwarded {
    pub submission: ContactSubmission,
    pub whatsapp_sent: bool,
}

#[derive(Clone)]
pub struct ContactService {
    store: Arc<dyn ContactStore>,
    notifier: WhatsAppNotifier,
}

impl ContactService {
    pub fn new(store: Arc<dyn ContactStore>, notifier: WhatsAppNotifier) -> Self {
        Self { store, notifier }
    }

    pub async fn submit(&self, submission: NewContactSubmission) -> Result<ContactForwarded, AppError> {
        let submission = self.store.create_submission(&submission).await?;

        let whatsapp_sent = self.notifier.forward_contact(&submission).await;
        if whatsapp_sent {
            tracing::info!(id = %submission.id, "📨 Formulário de contato encaminhado");
        } else {
            tracing::error!(id = %submission.id, "Falha ao encaminhar formulário de contato");
        }

        Ok(ContactForwarded { submission, whatsapp_sent })
    }
}

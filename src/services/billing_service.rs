// src/services/billing_service.rs

use std::sync::Arc;

use crate::{
    common::error::AppError,
    db::BillingStore,
    models::billing::{NewSlip, SlipWithItems},
    services::notifier::WhatsAppNotifier,
};

#[derive(Debug)]
pub struct SlipCreated {
    pub slip: SlipWithItems,
    pub whatsapp_sent: bool,
}

#[derive(Clone)]
pub struct BillingService {
    store: Arc<dyn BillingStore>,
    notifier: WhatsAppNotifier,
}

impl BillingService {
    pub fn new(store: Arc<dyn BillingStore>, notifier: WhatsAppNotifier) -> Self {
        Self { store, notifier }
    }

    /// Grava a nota com os itens e depois envia a confirmação ao cliente.
    /// A nota continua gravada mesmo se o envio falhar.
    pub async fn create_slip(&self, new_slip: NewSlip) -> Result<SlipCreated, AppError> {
        let slip = self.store.create_slip(&new_slip).await?;
        tracing::info!(slip_no = %slip.slip.slip_no, items = slip.items.len(), "🧾 Nota criada");

        let whatsapp_sent = self.notifier.notify_slip_created(&slip).await;
        if !whatsapp_sent {
            tracing::warn!(slip_no = %slip.slip.slip_no, "Nota salva, mas a confirmação não foi enviada");
        }

        Ok(SlipCreated { slip, whatsapp_sent })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::memory::MemoryStore,
        models::billing::NewBillingItem,
        services::notifier::tests::test_config,
    };
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn new_slip() -> NewSlip {
        NewSlip {
            slip_no: "B-77".into(),
            date: NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2025, 10, 4).unwrap(),
            address: "4th Cross, Indiranagar".into(),
            phone: "9876543210".into(),
            amount: None,
            items: vec![NewBillingItem {
                item_name: "Blazer".into(),
                service: "Dry Clean".into(),
                quantity: 1,
                price_per_unit: Decimal::new(25000, 2),
            }],
        }
    }

    async fn service_against(status: u16) -> (BillingService, Arc<MemoryStore>, MockServer) {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::new());
        let notifier = WhatsAppNotifier::new(test_config(&server.uri())).unwrap();
        (BillingService::new(store.clone(), notifier), store, server)
    }

    #[tokio::test]
    async fn slip_is_persisted_and_confirmed() {
        let (service, store, _server) = service_against(200).await;

        let created = service.create_slip(new_slip()).await.unwrap();

        assert!(created.whatsapp_sent);
        assert_eq!(created.slip.items.len(), 1);
        assert_eq!(created.slip.items[0].slip_id, created.slip.slip.id);
        assert_eq!(store.slips().len(), 1);
    }

    #[tokio::test]
    async fn provider_failure_keeps_the_slip() {
        let (service, store, _server) = service_against(500).await;

        let created = service.create_slip(new_slip()).await.unwrap();

        assert!(!created.whatsapp_sent);
        assert_eq!(store.slips().len(), 1);
        assert_eq!(store.slips()[0].slip.slip_no, "B-77");
    }
}

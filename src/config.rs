// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{
        BillingRepository, BillingStore, ContactRepository, ContactStore, WhatsAppRepository,
        WhatsAppStore,
    },
    services::{
        billing_service::BillingService, contact_service::ContactService,
        inbox_service::InboxService, notifier::WhatsAppNotifier,
        webhook_service::WebhookService,
    },
};

pub const DEFAULT_API_BASE_URL: &str = "https://graph.facebook.com/v21.0";

/// Credenciais e parâmetros da WhatsApp Cloud API.
/// Montado uma única vez na subida do processo e compartilhado via `Arc`.
#[derive(Debug, Clone)]
pub struct WhatsAppConfig {
    pub api_base_url: String,
    pub access_token: Option<String>,
    pub phone_number_id: Option<String>,
    pub verify_token: Option<String>,
    pub app_secret: Option<String>,
    // Template de confirmação de pedido. Sem ele a nota sai como texto livre.
    pub order_template: Option<String>,
    pub contact_template: String,
    pub template_language: String,
    // Quem recebe os formulários de contato
    pub recipient_number: Option<String>,
    pub default_country_code: String,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            access_token: None,
            phone_number_id: None,
            verify_token: None,
            app_secret: None,
            order_template: None,
            contact_template: "contact_query".to_string(),
            template_language: "en".to_string(),
            recipient_number: None,
            default_country_code: "91".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub whatsapp: WhatsAppConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Constrói a configuração a partir de uma função de busca qualquer.
    /// Valores em branco contam como ausentes.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let database_url = get("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let defaults = WhatsAppConfig::default();

        let whatsapp = WhatsAppConfig {
            api_base_url: get("WHATSAPP_API_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base_url),
            access_token: get("WHATSAPP_ACCESS_TOKEN"),
            phone_number_id: get("WHATSAPP_PHONE_NUMBER_ID"),
            verify_token: get("WHATSAPP_WEBHOOK_VERIFY_TOKEN"),
            app_secret: get("WHATSAPP_APP_SECRET"),
            order_template: get("WHATSAPP_ORDER_TEMPLATE"),
            contact_template: get("WHATSAPP_CONTACT_TEMPLATE").unwrap_or(defaults.contact_template),
            template_language: get("WHATSAPP_TEMPLATE_LANGUAGE")
                .unwrap_or(defaults.template_language),
            recipient_number: get("WHATSAPP_RECIPIENT_NUMBER"),
            default_country_code: get("WHATSAPP_DEFAULT_COUNTRY_CODE")
                .unwrap_or(defaults.default_country_code),
        };

        Ok(Self {
            database_url,
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            whatsapp,
        })
    }

    pub async fn connect(&self) -> anyhow::Result<PgPool> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&self.database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");
        Ok(pool)
    }
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub billing_service: BillingService,
    pub contact_service: ContactService,
    pub webhook_service: WebhookService,
    pub inbox_service: InboxService,
}

impl AppState {
    pub fn new(config: AppConfig, db_pool: PgPool) -> anyhow::Result<Self> {
        let whatsapp_repo = Arc::new(WhatsAppRepository::new(db_pool.clone()));
        let billing_repo = Arc::new(BillingRepository::new(db_pool.clone()));
        let contact_repo = Arc::new(ContactRepository::new(db_pool));

        Self::with_stores(config, billing_repo, contact_repo, whatsapp_repo)
    }

    /// Monta o gráfico de dependências sobre os stores informados.
    pub fn with_stores(
        config: AppConfig,
        billing_store: Arc<dyn BillingStore>,
        contact_store: Arc<dyn ContactStore>,
        whatsapp_store: Arc<dyn WhatsAppStore>,
    ) -> anyhow::Result<Self> {
        let notifier = WhatsAppNotifier::new(config.whatsapp)?;

        Ok(Self {
            billing_service: BillingService::new(billing_store, notifier.clone()),
            contact_service: ContactService::new(contact_store, notifier.clone()),
            webhook_service: WebhookService::new(whatsapp_store.clone(), notifier),
            inbox_service: InboxService::new(whatsapp_store),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn database_url_is_required() {
        assert!(AppConfig::from_lookup(lookup(&[])).is_err());
    }

    #[test]
    fn defaults_are_applied() {
        let config = AppConfig::from_lookup(lookup(&[("DATABASE_URL", "postgres://db")])).unwrap();

        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.whatsapp.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.whatsapp.contact_template, "contact_query");
        assert_eq!(config.whatsapp.default_country_code, "91");
        assert!(config.whatsapp.app_secret.is_none());
    }

    #[test]
    fn blank_values_count_as_absent() {
        let config = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db"),
            ("WHATSAPP_APP_SECRET", "   "),
            ("WHATSAPP_ACCESS_TOKEN", "token"),
            ("WHATSAPP_API_BASE_URL", "http://localhost:9000/"),
        ]))
        .unwrap();

        assert!(config.whatsapp.app_secret.is_none());
        assert_eq!(config.whatsapp.access_token.as_deref(), Some("token"));
        assert_eq!(config.whatsapp.api_base_url, "http://localhost:9000");
    }
}

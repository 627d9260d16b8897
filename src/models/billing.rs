// src/models/billing.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Nota de serviço (o "slip" entregue ao cliente no balcão) ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BillingSlip {
    pub id: Uuid,
    #[schema(example = "A-1024")]
    pub slip_no: String,
    pub date: NaiveDate,
    pub due_date: NaiveDate,
    #[schema(example = "12, MG Road, Bengaluru")]
    pub address: String,
    // Número local de 10 dígitos, sem código do país
    #[schema(example = "9876543210")]
    pub phone: String,
    #[schema(example = "450.00")]
    pub amount: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BillingItem {
    pub id: Uuid,
    pub slip_id: Uuid,
    #[schema(example = "Shirt")]
    pub item_name: String,
    #[schema(example = "Dry Clean")]
    pub service: String,
    #[schema(example = 2)]
    pub quantity: i32,
    #[schema(example = "75.00")]
    pub price_per_unit: Decimal,
}

impl BillingItem {
    pub fn line_total(&self) -> Decimal {
        self.price_per_unit * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SlipWithItems {
    #[serde(flatten)]
    pub slip: BillingSlip,
    pub items: Vec<BillingItem>,
}

impl SlipWithItems {
    /// Total informado na nota; se ausente, a soma dos itens.
    pub fn total(&self) -> Decimal {
        self.slip
            .amount
            .unwrap_or_else(|| self.items.iter().map(BillingItem::line_total).sum())
    }
}

// --- Dados de entrada já validados, prontos para persistir ---

#[derive(Debug, Clone)]
pub struct NewSlip {
    pub slip_no: String,
    pub date: NaiveDate,
    pub due_date: NaiveDate,
    pub address: String,
    pub phone: String,
    pub amount: Option<Decimal>,
    pub items: Vec<NewBillingItem>,
}

#[derive(Debug, Clone)]
pub struct NewBillingItem {
    pub item_name: String,
    pub service: String,
    pub quantity: i32,
    pub price_per_unit: Decimal,
}

// src/db/billing_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    models::billing::{BillingItem, BillingSlip, NewSlip, SlipWithItems},
};

#[async_trait]
pub trait BillingStore: Send + Sync {
    /// Grava a nota e todos os itens de forma atômica.
    async fn create_slip(&self, slip: &NewSlip) -> Result<SlipWithItems, AppError>;
}

#[derive(Clone)]
pub struct BillingRepository {
    pool: PgPool,
}

impl BillingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BillingStore for BillingRepository {
    async fn create_slip(&self, new_slip: &NewSlip) -> Result<SlipWithItems, AppError> {
        let mut tx = self.pool.begin().await?;

        let slip = sqlx::query_as::<_, BillingSlip>(
            r#"
            INSERT INTO billing_slips (slip_no, date, due_date, address, phone, amount)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&new_slip.slip_no)
        .bind(new_slip.date)
        .bind(new_slip.due_date)
        .bind(&new_slip.address)
        .bind(&new_slip.phone)
        .bind(new_slip.amount)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(new_slip.items.len());
        for item in &new_slip.items {
            let row = sqlx::query_as::<_, BillingItem>(
                r#"
                INSERT INTO billing_items (slip_id, item_name, service, quantity, price_per_unit)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
                "#,
            )
            .bind(slip.id)
            .bind(&item.item_name)
            .bind(&item.service)
            .bind(item.quantity)
            .bind(item.price_per_unit)
            .fetch_one(&mut *tx)
            .await?;

            items.push(row);
        }

        tx.commit().await?;

        Ok(SlipWithItems { slip, items })
    }
}

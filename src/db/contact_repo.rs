// src/db/contact_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    models::contact::{ContactSubmission, NewContactSubmission},
};

#[async_trait]
pub trait ContactStore: Send + Sync {
    async fn create_submission(
        &self,
        submission: &NewContactSubmission,
    ) -> Result<ContactSubmission, AppError>;
}

#[derive(Clone)]
pub struct ContactRepository {
    pool: PgPool,
}

impl ContactRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContactStore for ContactRepository {
    async fn create_submission(
        &self,
        submission: &NewContactSubmission,
    ) -> Result<ContactSubmission, AppError> {
        let row = sqlx::query_as::<_, ContactSubmission>(
            r#"
            INSERT INTO contact_submissions (name, phone, subject, message)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&submission.name)
        .bind(&submission.phone)
        .bind(&submission.subject)
        .bind(&submission.message)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }
}

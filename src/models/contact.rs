// src/models/contact.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactSubmission {
    pub id: Uuid,
    #[schema(example = "Priya Sharma")]
    pub name: String,
    #[schema(example = "9876543210")]
    pub phone: String,
    #[schema(example = "Stain on silk saree")]
    pub subject: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewContactSubmission {
    pub name: String,
    pub phone: String,
    pub subject: String,
    pub message: String,
}

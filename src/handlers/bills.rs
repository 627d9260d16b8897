// src/handlers/bills.rs

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::{
    common::{error::AppError, phone::validate_local_phone},
    config::AppState,
    models::billing::{NewBillingItem, NewSlip, SlipWithItems},
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_amount"))]
pub struct CreateSlipPayload {
    #[validate(length(min = 1, max = 20, message = "O número da nota deve ter entre 1 e 20 caracteres."))]
    #[schema(example = "A-1024")]
    pub slip_no: String,

    #[schema(value_type = String, format = Date, example = "2025-10-01")]
    pub date: NaiveDate,

    #[schema(value_type = String, format = Date, example = "2025-10-04")]
    pub due_date: NaiveDate,

    #[validate(length(min = 1, max = 255, message = "O endereço deve ter entre 1 e 255 caracteres."))]
    #[schema(example = "12, MG Road, Bengaluru")]
    pub address: String,

    #[validate(custom(function = "validate_local_phone"))]
    #[schema(example = "9876543210")]
    pub phone: String,

    #[schema(value_type = Option<f64>, example = 450.0)]
    pub amount: Option<Decimal>,

    #[validate(length(min = 1, message = "Informe pelo menos um item."), nested)]
    pub items: Vec<CreateItemPayload>,
}

// Serialize: o `length` do validator no Vec<CreateItemPayload> exige
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemPayload {
    #[validate(length(min = 1, max = 50, message = "O nome do item deve ter entre 1 e 50 caracteres."))]
    #[schema(example = "Shirt")]
    pub item_name: String,

    #[validate(length(min = 1, max = 50, message = "O serviço deve ter entre 1 e 50 caracteres."))]
    #[schema(example = "Dry Clean")]
    pub service: String,

    #[validate(range(min = 0, message = "A quantidade não pode ser negativa."))]
    #[schema(example = 2)]
    pub quantity: i32,

    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = f64, example = 75.0)]
    pub price_per_unit: Decimal,
}

fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() && !val.is_zero() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

fn validate_amount(payload: &CreateSlipPayload) -> Result<(), ValidationError> {
    match &payload.amount {
        Some(amount) => validate_not_negative(amount),
        None => Ok(()),
    }
}

impl From<CreateSlipPayload> for NewSlip {
    fn from(payload: CreateSlipPayload) -> Self {
        NewSlip {
            slip_no: payload.slip_no.trim().to_string(),
            date: payload.date,
            due_date: payload.due_date,
            address: payload.address,
            phone: payload.phone,
            amount: payload.amount,
            items: payload
                .items
                .into_iter()
                .map(|item| NewBillingItem {
                    item_name: item.item_name,
                    service: item.service,
                    quantity: item.quantity,
                    price_per_unit: item.price_per_unit,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SlipCreatedResponse {
    pub message: String,
    pub bill: SlipWithItems,
    pub whatsapp_sent: bool,
}

// POST /api/bills
#[utoipa::path(
    post,
    path = "/api/bills",
    tag = "Bills",
    request_body = CreateSlipPayload,
    responses(
        (status = 201, description = "Nota criada (com ou sem confirmação no WhatsApp)", body = SlipCreatedResponse),
        (status = 400, description = "Dados inválidos")
    )
)]
pub async fn create_bill(
    State(app_state): State<AppState>,
    payload: Result<Json<CreateSlipPayload>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let created = app_state.billing_service.create_slip(payload.into()).await?;

    let message = if created.whatsapp_sent {
        "Nota criada e confirmação enviada pelo WhatsApp."
    } else {
        "Nota criada, mas não foi possível enviar a confirmação pelo WhatsApp."
    };

    Ok((
        StatusCode::CREATED,
        Json(SlipCreatedResponse {
            message: message.to_string(),
            bill: created.slip,
            whatsapp_sent: created.whatsapp_sent,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn payload(amount: Value, items: Value) -> CreateSlipPayload {
        serde_json::from_value(json!({
            "slipNo": " A-1024 ",
            "date": "2025-10-01",
            "dueDate": "2025-10-04",
            "address": "12, MG Road, Bengaluru",
            "phone": "9876543210",
            "amount": amount,
            "items": items,
        }))
        .unwrap()
    }

    fn shirt(quantity: i32, price: &str) -> Value {
        json!({ "itemName": "Shirt", "service": "Dry Clean", "quantity": quantity, "pricePerUnit": price })
    }

    #[test]
    fn slip_needs_at_least_one_item() {
        let errors = payload(Value::Null, json!([])).validate().unwrap_err();
        assert!(errors.field_errors().contains_key("items"));
    }

    #[test]
    fn item_errors_are_reported_per_item() {
        let errors = payload(Value::Null, json!([shirt(1, "10.00"), shirt(1, "-5.00")]))
            .validate()
            .unwrap_err();
        assert!(errors.errors().contains_key("items"));
    }

    #[test]
    fn negative_amount_is_rejected() {
        let result = payload(json!("-1.00"), json!([shirt(2, "75.00")])).validate();
        assert!(result.is_err());
    }

    #[test]
    fn valid_payload_becomes_new_slip() {
        let payload = payload(json!("150.00"), json!([shirt(2, "75.00")]));
        assert!(payload.validate().is_ok());

        let slip: NewSlip = payload.into();
        assert_eq!(slip.slip_no, "A-1024");
        assert_eq!(slip.items.len(), 1);
        assert_eq!(slip.items[0].price_per_unit, Decimal::new(7500, 2));
        assert_eq!(slip.amount, Some(Decimal::new(15000, 2)));
    }
}

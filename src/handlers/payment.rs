use std::collections::BTreeMap;

use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;
use crate::gateway::InitiatePayment;
use crate::AppState;

// ── Request / response DTOs ──────────────────────────────────────────────────

/// Relay contract: the order summary the storefront posts before redirecting
/// the shopper to the gateway.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InitiatePaymentRequest {
    pub order_id: Uuid,
    /// Decimal amount as a string, e.g. "1800.00"
    pub amount: String,
    pub customer_id: String,
    pub callback_url: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InitiatePaymentResponse {
    pub redirect_url: String,
    /// Gateway form fields, checksum included.
    pub fields: BTreeMap<String, String>,
}

// ── Handler ──────────────────────────────────────────────────────────────────

/// POST /api/payment/initiate
///
/// Computes the signed request for the third-party gateway. The signing
/// secret never leaves this process; the caller only ever sees the finished
/// field map.
#[utoipa::path(
    post,
    path = "/api/payment/initiate",
    request_body = InitiatePaymentRequest,
    responses(
        (status = 200, description = "Signed gateway request", body = InitiatePaymentResponse),
        (status = 400, description = "Invalid amount or missing field"),
    ),
    tag = "payment"
)]
pub async fn initiate(
    state: web::Data<AppState>,
    body: web::Json<InitiatePaymentRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();

    let amount = BigDecimal::from_str(&body.amount)
        .map_err(|e| AppError::Validation(format!("Invalid amount '{}': {}", body.amount, e)))?;

    let request = state.gateway.prepare(&InitiatePayment {
        order_id: body.order_id,
        amount,
        customer_id: body.customer_id,
        callback_url: body.callback_url,
        email: body.email,
        phone: body.phone,
    })?;

    Ok(HttpResponse::Ok().json(InitiatePaymentResponse {
        redirect_url: request.redirect_url,
        fields: request.fields,
    }))
}

use std::collections::BTreeMap;

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::order::{Customer, PaymentMethod};
use crate::errors::AppError;
use crate::gateway::CallbackParams;
use crate::AppState;

use super::orders::OrderResponse;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct QuoteParams {
    /// "cash_on_delivery" or "online"
    pub method: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct QuoteResponse {
    pub subtotal: String,
    pub discount: String,
    pub total: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CustomerRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl From<CustomerRequest> for Customer {
    fn from(c: CustomerRequest) -> Self {
        Customer {
            name: c.name,
            email: c.email,
            phone: c.phone,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OnlineCheckoutResponse {
    pub order: OrderResponse,
    /// The gateway-hosted page the storefront should auto-submit a form to.
    pub redirect_url: String,
    /// Form fields for that page, checksum included.
    pub fields: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CallbackQuery {
    pub status: String,
    #[serde(rename = "orderId")]
    pub order_id: Uuid,
    #[serde(rename = "txnId")]
    pub txn_id: Option<String>,
    pub checksum: String,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /checkout/{shopper_id}/quote
///
/// Totals for the current cart under a payment method. Pure recomputation;
/// switching methods back and forth yields the same values.
#[utoipa::path(
    get,
    path = "/checkout/{shopper_id}/quote",
    params(
        ("shopper_id" = Uuid, Path, description = "Shopper UUID"),
        ("method" = String, Query, description = "Payment method"),
    ),
    responses(
        (status = 200, description = "Quote for the cart", body = QuoteResponse),
        (status = 400, description = "Unknown payment method"),
    ),
    tag = "checkout"
)]
pub async fn quote(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    query: web::Query<QuoteParams>,
) -> Result<HttpResponse, AppError> {
    let shopper_id = path.into_inner();
    let method: PaymentMethod = query.into_inner().method.parse()?;
    let state = state.into_inner();

    let quote = web::block(move || state.checkout.quote(shopper_id, method))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(QuoteResponse {
        subtotal: quote.subtotal.to_string(),
        discount: quote.discount.to_string(),
        total: quote.total.to_string(),
    }))
}

/// POST /checkout/{shopper_id}/cash
///
/// Cash-on-delivery checkout: writes a `pending` order and clears the cart.
#[utoipa::path(
    post,
    path = "/checkout/{shopper_id}/cash",
    params(("shopper_id" = Uuid, Path, description = "Shopper UUID")),
    request_body = CustomerRequest,
    responses(
        (status = 201, description = "Order placed", body = OrderResponse),
        (status = 400, description = "Empty cart or missing customer field"),
    ),
    tag = "checkout"
)]
pub async fn place_cash_order(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<CustomerRequest>,
) -> Result<HttpResponse, AppError> {
    let shopper_id = path.into_inner();
    let customer: Customer = body.into_inner().into();
    let state = state.into_inner();

    let order = web::block(move || state.checkout.place_cash_order(shopper_id, customer))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(OrderResponse::from(order)))
}

/// POST /checkout/{shopper_id}/online
///
/// Online checkout: pre-commits a `pending` order, then returns the signed
/// gateway redirect. If the gateway step fails the order stays `pending`
/// and a 502 is returned; there is no retry here.
#[utoipa::path(
    post,
    path = "/checkout/{shopper_id}/online",
    params(("shopper_id" = Uuid, Path, description = "Shopper UUID")),
    request_body = CustomerRequest,
    responses(
        (status = 201, description = "Order pending, redirect prepared", body = OnlineCheckoutResponse),
        (status = 400, description = "Empty cart or missing customer field"),
        (status = 502, description = "Gateway preparation failed; order stays pending"),
    ),
    tag = "checkout"
)]
pub async fn initiate_online_payment(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<CustomerRequest>,
) -> Result<HttpResponse, AppError> {
    let shopper_id = path.into_inner();
    let customer: Customer = body.into_inner().into();
    let state = state.into_inner();

    let (order, request) =
        web::block(move || state.checkout.initiate_online_payment(shopper_id, customer))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(OnlineCheckoutResponse {
        order: OrderResponse::from(order),
        redirect_url: request.redirect_url,
        fields: request.fields,
    }))
}

/// GET /checkout/callback
///
/// Browser-redirected return from the gateway. The checksum is verified
/// before the status parameter is trusted; a mismatch is a 400 and the order
/// is left untouched.
#[utoipa::path(
    get,
    path = "/checkout/callback",
    params(
        ("status" = String, Query, description = "Gateway-reported outcome"),
        ("orderId" = Uuid, Query, description = "Order UUID"),
        ("txnId" = Option<String>, Query, description = "Gateway transaction id"),
        ("checksum" = String, Query, description = "Integrity checksum over the callback fields"),
    ),
    responses(
        (status = 200, description = "Order updated", body = OrderResponse),
        (status = 400, description = "Checksum mismatch"),
        (status = 404, description = "Order not found"),
    ),
    tag = "checkout"
)]
pub async fn payment_callback(
    state: web::Data<AppState>,
    query: web::Query<CallbackQuery>,
) -> Result<HttpResponse, AppError> {
    let q = query.into_inner();
    let callback = CallbackParams {
        status: q.status,
        order_id: q.order_id,
        txn_id: q.txn_id,
        checksum: q.checksum,
    };
    let state = state.into_inner();

    let order = web::block(move || state.checkout.handle_callback(&callback))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::order::{Order, OrderStatus};
use crate::errors::AppError;
use crate::AppState;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub product_id: Uuid,
    pub name: String,
    pub unit_price: String,
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerResponse {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub status: String,
    pub payment_method: String,
    pub total: String,
    pub txn_id: Option<String>,
    pub customer: CustomerResponse,
    pub items: Vec<OrderItemResponse>,
    pub placed_at: String,
}

impl From<Order> for OrderResponse {
    fn from(o: Order) -> Self {
        Self {
            id: o.id,
            status: o.status.to_string(),
            payment_method: o.payment_method.to_string(),
            total: o.total.to_string(),
            txn_id: o.txn_id,
            customer: CustomerResponse {
                name: o.customer.name,
                email: o.customer.email,
                phone: o.customer.phone,
            },
            items: o
                .items
                .into_iter()
                .map(|i| OrderItemResponse {
                    product_id: i.product_id,
                    name: i.name,
                    unit_price: i.unit_price.to_string(),
                    quantity: i.quantity,
                })
                .collect(),
            placed_at: o.placed_at.to_rfc3339(),
        }
    }
}

// ── Pagination ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListOrdersParams {
    /// Page number (1-based). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of items per page. Defaults to 20, maximum 100.
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListOrdersResponse {
    pub items: Vec<OrderResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    /// One of: pending, paid, failed, cancelled, delivered
    pub status: String,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /orders
///
/// Paginated ledger view, newest first. Items are omitted on the list view.
#[utoipa::path(
    get,
    path = "/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 20, max 100)"),
    ),
    responses(
        (status = 200, description = "Paginated list of orders", body = ListOrdersResponse),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    state: web::Data<AppState>,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let page = params.page.max(1);
    let limit = params.limit.clamp(1, 100);
    let state = state.into_inner();

    let ledger_page = web::block(move || state.ledger.list(page, limit))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(ListOrdersResponse {
        items: ledger_page.items.into_iter().map(Into::into).collect(),
        total: ledger_page.total,
        page,
        limit,
    }))
}

/// GET /orders/{id}
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(("id" = Uuid, Path, description = "Order UUID")),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let state = state.into_inner();

    let order = web::block(move || state.ledger.find_by_id(id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    match order {
        Some(o) => Ok(HttpResponse::Ok().json(OrderResponse::from(o))),
        None => Err(AppError::NotFound),
    }
}

/// PUT /orders/{id}/status
///
/// Admin status override. Last-writer-wins; there is no optimistic locking
/// for the single-admin use case this serves.
#[utoipa::path(
    put,
    path = "/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order UUID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Updated order", body = OrderResponse),
        (status = 400, description = "Unknown status"),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn update_status(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let status: OrderStatus = body.into_inner().status.parse()?;
    let state = state.into_inner();

    let order = web::block(move || {
        state.ledger.update_status(id, status)?;
        state.ledger.find_by_id(id)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    match order {
        Some(o) => Ok(HttpResponse::Ok().json(OrderResponse::from(o))),
        None => Err(AppError::NotFound),
    }
}

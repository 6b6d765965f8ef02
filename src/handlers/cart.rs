use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::cart::Cart;
use crate::errors::AppError;
use crate::AppState;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddItemRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateQuantityRequest {
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartLineResponse {
    pub product_id: Uuid,
    pub name: String,
    pub unit_price: String,
    pub image_url: Option<String>,
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartResponse {
    pub lines: Vec<CartLineResponse>,
    pub subtotal: String,
}

impl CartResponse {
    fn from_cart(cart: &Cart) -> Self {
        Self {
            lines: cart
                .lines
                .iter()
                .map(|l| CartLineResponse {
                    product_id: l.product_id,
                    name: l.name.clone(),
                    unit_price: l.unit_price.to_string(),
                    image_url: l.image_url.clone(),
                    quantity: l.quantity,
                })
                .collect(),
            subtotal: cart.subtotal().to_string(),
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /cart/{shopper_id}
///
/// Reading the cart reconciles it against live stock first: quantities only
/// ever clamp downward.
#[utoipa::path(
    get,
    path = "/cart/{shopper_id}",
    params(("shopper_id" = Uuid, Path, description = "Shopper UUID")),
    responses(
        (status = 200, description = "Current cart", body = CartResponse),
    ),
    tag = "cart"
)]
pub async fn view_cart(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let shopper_id = path.into_inner();
    let state = state.into_inner();

    let cart = web::block(move || state.carts.view(shopper_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(CartResponse::from_cart(&cart)))
}

/// POST /cart/{shopper_id}/items
#[utoipa::path(
    post,
    path = "/cart/{shopper_id}/items",
    params(("shopper_id" = Uuid, Path, description = "Shopper UUID")),
    request_body = AddItemRequest,
    responses(
        (status = 200, description = "Updated cart", body = CartResponse),
        (status = 400, description = "Invalid quantity or product out of stock"),
        (status = 404, description = "Product not found"),
    ),
    tag = "cart"
)]
pub async fn add_item(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<AddItemRequest>,
) -> Result<HttpResponse, AppError> {
    let shopper_id = path.into_inner();
    let body = body.into_inner();
    let state = state.into_inner();

    let cart = web::block(move || state.carts.add_item(shopper_id, body.product_id, body.quantity))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(CartResponse::from_cart(&cart)))
}

/// PUT /cart/{shopper_id}/items/{product_id}
///
/// A quantity below 1 removes the line; a quantity above stock clamps to
/// stock.
#[utoipa::path(
    put,
    path = "/cart/{shopper_id}/items/{product_id}",
    params(
        ("shopper_id" = Uuid, Path, description = "Shopper UUID"),
        ("product_id" = Uuid, Path, description = "Product UUID"),
    ),
    request_body = UpdateQuantityRequest,
    responses(
        (status = 200, description = "Updated cart", body = CartResponse),
        (status = 404, description = "Line not in cart"),
    ),
    tag = "cart"
)]
pub async fn update_quantity(
    state: web::Data<AppState>,
    path: web::Path<(Uuid, Uuid)>,
    body: web::Json<UpdateQuantityRequest>,
) -> Result<HttpResponse, AppError> {
    let (shopper_id, product_id) = path.into_inner();
    let body = body.into_inner();
    let state = state.into_inner();

    let cart =
        web::block(move || state.carts.update_quantity(shopper_id, product_id, body.quantity))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(CartResponse::from_cart(&cart)))
}

/// DELETE /cart/{shopper_id}/items/{product_id}
#[utoipa::path(
    delete,
    path = "/cart/{shopper_id}/items/{product_id}",
    params(
        ("shopper_id" = Uuid, Path, description = "Shopper UUID"),
        ("product_id" = Uuid, Path, description = "Product UUID"),
    ),
    responses(
        (status = 200, description = "Updated cart", body = CartResponse),
    ),
    tag = "cart"
)]
pub async fn remove_item(
    state: web::Data<AppState>,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, AppError> {
    let (shopper_id, product_id) = path.into_inner();
    let state = state.into_inner();

    let cart = web::block(move || state.carts.remove_item(shopper_id, product_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(CartResponse::from_cart(&cart)))
}

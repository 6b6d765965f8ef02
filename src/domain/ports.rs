use std::collections::BTreeMap;

use uuid::Uuid;

use super::cart::Cart;
use super::errors::DomainError;
use super::order::{LedgerPage, Order, OrderStatus};
use super::product::Product;

/// Product store read by the cart for live stock and by the admin surface.
pub trait ProductCatalog: Send + Sync + 'static {
    fn insert(&self, product: &Product) -> Result<(), DomainError>;
    fn find(&self, id: Uuid) -> Result<Option<Product>, DomainError>;
    fn list(&self) -> Result<Vec<Product>, DomainError>;
    /// Adjust stock by `delta` (negative when an order is placed), clamped at
    /// zero. Concurrent shoppers are not coordinated here.
    fn adjust_stock(&self, id: Uuid, delta: i32) -> Result<(), DomainError>;
}

/// Load/save adapter for the shopper's cart. Loading an unknown shopper
/// yields an empty cart.
pub trait CartStore: Send + Sync + 'static {
    fn load(&self, shopper_id: Uuid) -> Result<Cart, DomainError>;
    fn save(&self, shopper_id: Uuid, cart: &Cart) -> Result<(), DomainError>;
}

/// Append-only record of placed orders; the status field is the only
/// mutation. Last-writer-wins on concurrent status updates.
pub trait OrderLedger: Send + Sync + 'static {
    fn append(&self, order: &Order) -> Result<(), DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError>;
    fn list(&self, page: i64, limit: i64) -> Result<LedgerPage, DomainError>;
    fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<(), DomainError>;
    /// Mark the order `paid` and attach the gateway transaction id.
    fn record_payment(&self, id: Uuid, txn_id: &str) -> Result<(), DomainError>;
}

/// Pluggable integrity scheme mandated by the payment gateway's protocol.
///
/// `fields` never includes the checksum itself; callers strip it before
/// verifying.
pub trait GatewaySigner: Send + Sync + 'static {
    fn sign(&self, fields: &BTreeMap<String, String>) -> String;
    fn verify(&self, fields: &BTreeMap<String, String>, checksum: &str) -> bool;
}

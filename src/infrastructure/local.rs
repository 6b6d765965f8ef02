use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::cart::Cart;
use crate::domain::errors::DomainError;
use crate::domain::order::{LedgerPage, Order, OrderStatus};
use crate::domain::ports::{CartStore, OrderLedger, ProductCatalog};
use crate::domain::product::Product;

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    products: Vec<Product>,
    carts: HashMap<Uuid, Cart>,
    orders: Vec<Order>,
}

/// Local fallback repository: everything in memory, with an optional JSON
/// snapshot file written after every mutation (last-write-wins, one writer).
///
/// One `LocalStore` serves as product catalog, cart store and order ledger,
/// mirroring the single local-storage namespace it stands in for.
pub struct LocalStore {
    path: Option<PathBuf>,
    state: Mutex<Snapshot>,
}

impl LocalStore {
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: Mutex::new(Snapshot::default()),
        }
    }

    /// Open a snapshot-backed store. A missing file starts empty; a present
    /// file must parse.
    pub fn open(path: PathBuf) -> std::io::Result<Self> {
        let snapshot = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("corrupt local store {}: {}", path.display(), e),
                )
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Snapshot::default(),
            Err(e) => return Err(e),
        };
        Ok(Self {
            path: Some(path),
            state: Mutex::new(snapshot),
        })
    }

    fn with_state<T>(
        &self,
        f: impl FnOnce(&mut Snapshot) -> Result<T, DomainError>,
    ) -> Result<T, DomainError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| DomainError::Internal("local store lock poisoned".to_string()))?;
        let result = f(&mut state)?;
        self.persist(&state)?;
        Ok(result)
    }

    fn read_state<T>(
        &self,
        f: impl FnOnce(&Snapshot) -> Result<T, DomainError>,
    ) -> Result<T, DomainError> {
        let state = self
            .state
            .lock()
            .map_err(|_| DomainError::Internal("local store lock poisoned".to_string()))?;
        f(&state)
    }

    fn persist(&self, state: &Snapshot) -> Result<(), DomainError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let raw = serde_json::to_string_pretty(state)
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        fs::write(path, raw).map_err(|e| DomainError::Internal(e.to_string()))
    }
}

impl ProductCatalog for LocalStore {
    fn insert(&self, product: &Product) -> Result<(), DomainError> {
        self.with_state(|s| {
            // Re-inserting an existing id replaces the product.
            s.products.retain(|p| p.id != product.id);
            s.products.push(product.clone());
            Ok(())
        })
    }

    fn find(&self, id: Uuid) -> Result<Option<Product>, DomainError> {
        self.read_state(|s| Ok(s.products.iter().find(|p| p.id == id).cloned()))
    }

    fn list(&self) -> Result<Vec<Product>, DomainError> {
        self.read_state(|s| Ok(s.products.clone()))
    }

    fn adjust_stock(&self, id: Uuid, delta: i32) -> Result<(), DomainError> {
        self.with_state(|s| {
            let product = s
                .products
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or(DomainError::NotFound)?;
            product.stock = product.stock.saturating_add(delta).max(0);
            Ok(())
        })
    }
}

impl CartStore for LocalStore {
    fn load(&self, shopper_id: Uuid) -> Result<Cart, DomainError> {
        self.read_state(|s| Ok(s.carts.get(&shopper_id).cloned().unwrap_or_default()))
    }

    fn save(&self, shopper_id: Uuid, cart: &Cart) -> Result<(), DomainError> {
        self.with_state(|s| {
            s.carts.insert(shopper_id, cart.clone());
            Ok(())
        })
    }
}

impl OrderLedger for LocalStore {
    fn append(&self, order: &Order) -> Result<(), DomainError> {
        self.with_state(|s| {
            if s.orders.iter().any(|o| o.id == order.id) {
                return Err(DomainError::Conflict(format!(
                    "order {} already exists",
                    order.id
                )));
            }
            s.orders.push(order.clone());
            Ok(())
        })
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError> {
        self.read_state(|s| Ok(s.orders.iter().find(|o| o.id == id).cloned()))
    }

    fn list(&self, page: i64, limit: i64) -> Result<LedgerPage, DomainError> {
        self.read_state(|s| {
            let mut items = s.orders.clone();
            items.sort_by(|a, b| b.placed_at.cmp(&a.placed_at));

            let total = items.len() as i64;
            let offset = ((page - 1) * limit).max(0) as usize;
            let items = items
                .into_iter()
                .skip(offset)
                .take(limit.max(0) as usize)
                .collect();

            Ok(LedgerPage { items, total })
        })
    }

    fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<(), DomainError> {
        self.with_state(|s| {
            let order = s
                .orders
                .iter_mut()
                .find(|o| o.id == id)
                .ok_or(DomainError::NotFound)?;
            order.status = status;
            Ok(())
        })
    }

    fn record_payment(&self, id: Uuid, txn_id: &str) -> Result<(), DomainError> {
        self.with_state(|s| {
            let order = s
                .orders
                .iter_mut()
                .find(|o| o.id == id)
                .ok_or(DomainError::NotFound)?;
            order.status = OrderStatus::Paid;
            order.txn_id = Some(txn_id.to_string());
            Ok(())
        })
    }
}

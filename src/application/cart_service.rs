use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::domain::cart::Cart;
use crate::domain::errors::DomainError;
use crate::domain::ports::{CartStore, ProductCatalog};

/// Cart aggregator: business logic over a pluggable cart store and the live
/// product catalog.
#[derive(Clone)]
pub struct CartService {
    carts: Arc<dyn CartStore>,
    catalog: Arc<dyn ProductCatalog>,
}

impl CartService {
    pub fn new(carts: Arc<dyn CartStore>, catalog: Arc<dyn ProductCatalog>) -> Self {
        Self { carts, catalog }
    }

    pub fn add_item(
        &self,
        shopper_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<Cart, DomainError> {
        let product = self
            .catalog
            .find(product_id)?
            .ok_or(DomainError::NotFound)?;

        let mut cart = self.carts.load(shopper_id)?;
        cart.add(&product, quantity)?;
        self.carts.save(shopper_id, &cart)?;
        Ok(cart)
    }

    pub fn update_quantity(
        &self,
        shopper_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<Cart, DomainError> {
        // An unknown product behaves like zero stock: the line is dropped.
        let stock = self
            .catalog
            .find(product_id)?
            .map(|p| p.stock)
            .unwrap_or(0);

        let mut cart = self.carts.load(shopper_id)?;
        cart.update_quantity(product_id, quantity, stock)?;
        self.carts.save(shopper_id, &cart)?;
        Ok(cart)
    }

    pub fn remove_item(&self, shopper_id: Uuid, product_id: Uuid) -> Result<Cart, DomainError> {
        let mut cart = self.carts.load(shopper_id)?;
        cart.remove(product_id);
        self.carts.save(shopper_id, &cart)?;
        Ok(cart)
    }

    /// Read the cart, clamping any line whose product stock dropped since it
    /// was added. Corrections are persisted before the cart is returned.
    pub fn view(&self, shopper_id: Uuid) -> Result<Cart, DomainError> {
        let mut cart = self.carts.load(shopper_id)?;

        let mut stocks = HashMap::with_capacity(cart.lines.len());
        for line in &cart.lines {
            if let Some(product) = self.catalog.find(line.product_id)? {
                stocks.insert(line.product_id, product.stock);
            }
        }

        if cart.reconcile(&stocks) {
            self.carts.save(shopper_id, &cart)?;
        }
        Ok(cart)
    }

    pub fn clear(&self, shopper_id: Uuid) -> Result<(), DomainError> {
        self.carts.save(shopper_id, &Cart::default())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;

    use super::*;
    use crate::domain::product::Product;
    use crate::infrastructure::local::LocalStore;

    fn service() -> (CartService, Arc<LocalStore>) {
        let store = Arc::new(LocalStore::in_memory());
        let service = CartService::new(store.clone(), store.clone());
        (service, store)
    }

    fn seed_product(store: &LocalStore, stock: i32) -> Product {
        let product = Product {
            id: Uuid::new_v4(),
            name: "Clay mug".to_string(),
            price: BigDecimal::from_str("15.00").unwrap(),
            image_url: None,
            stock,
        };
        store.insert(&product).expect("insert product");
        product
    }

    #[test]
    fn add_unknown_product_is_not_found() {
        let (service, _) = service();
        let err = service
            .add_item(Uuid::new_v4(), Uuid::new_v4(), 1)
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound));
    }

    #[test]
    fn add_persists_and_merges_lines() {
        let (service, store) = service();
        let product = seed_product(&store, 10);
        let shopper = Uuid::new_v4();

        service.add_item(shopper, product.id, 1).expect("add");
        let cart = service.add_item(shopper, product.id, 1).expect("add");

        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines[0].quantity, 2);

        let reloaded = service.view(shopper).expect("view");
        assert_eq!(reloaded.lines[0].quantity, 2);
    }

    #[test]
    fn view_clamps_line_when_stock_dropped() {
        let (service, store) = service();
        let product = seed_product(&store, 5);
        let shopper = Uuid::new_v4();
        service.add_item(shopper, product.id, 3).expect("add");

        // Stock drops to 1 after the line was created.
        store.adjust_stock(product.id, -4).expect("adjust");

        let cart = service.view(shopper).expect("view");
        assert_eq!(cart.lines[0].quantity, 1);

        // The correction was persisted, not just computed.
        let reloaded = service.view(shopper).expect("view again");
        assert_eq!(reloaded.lines[0].quantity, 1);
    }

    #[test]
    fn view_drops_line_when_stock_hits_zero() {
        let (service, store) = service();
        let product = seed_product(&store, 2);
        let shopper = Uuid::new_v4();
        service.add_item(shopper, product.id, 2).expect("add");

        store.adjust_stock(product.id, -2).expect("adjust");

        let cart = service.view(shopper).expect("view");
        assert!(cart.is_empty());
    }

    #[test]
    fn update_quantity_clamps_and_removes() {
        let (service, store) = service();
        let product = seed_product(&store, 4);
        let shopper = Uuid::new_v4();
        service.add_item(shopper, product.id, 2).expect("add");

        let cart = service
            .update_quantity(shopper, product.id, 10)
            .expect("update");
        assert_eq!(cart.lines[0].quantity, 4);

        let cart = service
            .update_quantity(shopper, product.id, 0)
            .expect("update to zero");
        assert!(cart.is_empty());
    }
}

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::cart::Cart;
use crate::domain::checkout::{CheckoutFlow, Quote};
use crate::domain::errors::DomainError;
use crate::domain::order::{Customer, Order, OrderItem, OrderStatus, PaymentMethod};
use crate::domain::ports::{OrderLedger, ProductCatalog};
use crate::gateway::{CallbackParams, GatewayRequest, InitiatePayment, PaymentGateway};

use super::cart_service::CartService;

#[derive(Debug, Clone)]
pub struct CheckoutSettings {
    /// Percentage knocked off the subtotal on the online payment path.
    pub online_discount_percent: u32,
    /// Where the gateway redirects the browser after payment.
    pub callback_url: String,
}

/// Orchestrates the checkout state machine over the cart, the order ledger
/// and the payment gateway.
#[derive(Clone)]
pub struct CheckoutService {
    carts: CartService,
    catalog: Arc<dyn ProductCatalog>,
    ledger: Arc<dyn OrderLedger>,
    gateway: Arc<PaymentGateway>,
    settings: CheckoutSettings,
}

impl CheckoutService {
    pub fn new(
        carts: CartService,
        catalog: Arc<dyn ProductCatalog>,
        ledger: Arc<dyn OrderLedger>,
        gateway: Arc<PaymentGateway>,
        settings: CheckoutSettings,
    ) -> Self {
        Self {
            carts,
            catalog,
            ledger,
            gateway,
            settings,
        }
    }

    /// Totals for the shopper's current cart under the given payment method.
    pub fn quote(&self, shopper_id: Uuid, method: PaymentMethod) -> Result<Quote, DomainError> {
        let cart = self.carts.view(shopper_id)?;
        let mut flow = CheckoutFlow::new(cart.subtotal(), self.settings.online_discount_percent);
        Ok(flow.select_method(method)?.clone())
    }

    /// Cash-on-delivery path: append a `pending` order, decrement stock and
    /// clear the cart. Terminal; no external call.
    pub fn place_cash_order(
        &self,
        shopper_id: Uuid,
        customer: Customer,
    ) -> Result<Order, DomainError> {
        let (order, _flow) =
            self.commit_pending_order(shopper_id, customer, PaymentMethod::CashOnDelivery)?;
        log::info!("order {} placed (cash on delivery)", order.id);
        Ok(order)
    }

    /// Online path: pre-commit a `pending` order so an abandoned gateway
    /// session stays auditable, then build the signed gateway redirect.
    ///
    /// If the gateway preparation fails the pre-committed order is NOT rolled
    /// back; it stays `pending` for admin reconciliation.
    pub fn initiate_online_payment(
        &self,
        shopper_id: Uuid,
        customer: Customer,
    ) -> Result<(Order, GatewayRequest), DomainError> {
        let (order, _flow) =
            self.commit_pending_order(shopper_id, customer, PaymentMethod::Online)?;

        let request = self
            .gateway
            .prepare(&InitiatePayment {
                order_id: order.id,
                amount: order.total.clone(),
                customer_id: shopper_id.to_string(),
                callback_url: self.settings.callback_url.clone(),
                email: order.customer.email.clone(),
                phone: order.customer.phone.clone(),
            })
            .map_err(|e| {
                log::warn!(
                    "gateway preparation failed for order {}; order stays pending: {}",
                    order.id,
                    e
                );
                DomainError::Gateway(e.to_string())
            })?;

        log::info!("order {} pending, redirecting to gateway", order.id);
        Ok((order, request))
    }

    /// Apply a redirect callback from the gateway. The checksum is verified
    /// before anything else: an unverified callback never touches the ledger.
    pub fn handle_callback(&self, callback: &CallbackParams) -> Result<Order, DomainError> {
        if !self.gateway.verify_callback(callback) {
            log::warn!(
                "rejected callback for order {}: checksum mismatch",
                callback.order_id
            );
            return Err(DomainError::Integrity);
        }

        let order = self
            .ledger
            .find_by_id(callback.order_id)?
            .ok_or(DomainError::NotFound)?;

        // Replayed callbacks for settled orders are left untouched.
        if order.status != OrderStatus::Pending {
            return Ok(order);
        }

        if callback.is_success() {
            let txn_id = callback.txn_id.as_deref().ok_or_else(|| {
                DomainError::InvalidInput("success callback is missing txnId".to_string())
            })?;
            self.ledger.record_payment(order.id, txn_id)?;
            log::info!("order {} paid (txn {})", order.id, txn_id);
        } else {
            self.ledger.update_status(order.id, OrderStatus::Failed)?;
            log::info!("order {} marked failed by gateway callback", order.id);
        }

        self.ledger
            .find_by_id(callback.order_id)?
            .ok_or(DomainError::NotFound)
    }

    /// Shared tail of both checkout paths: walk the state machine, snapshot
    /// the cart into a `pending` order, append it, decrement stock and clear
    /// the cart.
    fn commit_pending_order(
        &self,
        shopper_id: Uuid,
        customer: Customer,
        method: PaymentMethod,
    ) -> Result<(Order, CheckoutFlow), DomainError> {
        validate_customer(&customer)?;

        let cart = self.carts.view(shopper_id)?;
        if cart.is_empty() {
            return Err(DomainError::InvalidInput("cart is empty".to_string()));
        }

        let mut flow = CheckoutFlow::new(cart.subtotal(), self.settings.online_discount_percent);
        flow.select_method(method)?;
        flow.confirm()?;

        let order = snapshot_order(&cart, flow.quote(), method, customer);
        self.ledger.append(&order)?;

        for item in &order.items {
            self.catalog.adjust_stock(item.product_id, -item.quantity)?;
        }
        self.carts.clear(shopper_id)?;
        flow.place()?;

        Ok((order, flow))
    }
}

fn validate_customer(customer: &Customer) -> Result<(), DomainError> {
    if customer.name.trim().is_empty() {
        return Err(DomainError::InvalidInput("name is required".to_string()));
    }
    if customer.email.trim().is_empty() {
        return Err(DomainError::InvalidInput("email is required".to_string()));
    }
    if customer.phone.trim().is_empty() {
        return Err(DomainError::InvalidInput("phone is required".to_string()));
    }
    Ok(())
}

fn snapshot_order(
    cart: &Cart,
    quote: &Quote,
    method: PaymentMethod,
    customer: Customer,
) -> Order {
    Order {
        id: Uuid::new_v4(),
        items: cart
            .lines
            .iter()
            .map(|l| OrderItem {
                product_id: l.product_id,
                name: l.name.clone(),
                unit_price: l.unit_price.clone(),
                quantity: l.quantity,
            })
            .collect(),
        total: quote.total.clone(),
        payment_method: method,
        status: OrderStatus::Pending,
        customer,
        txn_id: None,
        placed_at: Utc::now(),
    }
}

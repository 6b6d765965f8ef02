use bigdecimal::{BigDecimal, RoundingMode, Zero};

use super::errors::DomainError;
use super::order::PaymentMethod;

/// Computed totals for the cart under a given payment method.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub subtotal: BigDecimal,
    pub discount: BigDecimal,
    pub total: BigDecimal,
}

/// Discount for a payment method, as a pure function of the method and the
/// subtotal. Cash on delivery carries no discount; the online path gets
/// `percent`% off, rounded half-up at the currency minor unit.
pub fn discount_for(method: PaymentMethod, subtotal: &BigDecimal, percent: u32) -> BigDecimal {
    match method {
        PaymentMethod::CashOnDelivery => BigDecimal::zero(),
        PaymentMethod::Online => (subtotal * BigDecimal::from(percent)
            / BigDecimal::from(100))
        .with_scale_round(2, RoundingMode::HalfUp),
    }
}

pub fn quote(method: PaymentMethod, subtotal: BigDecimal, percent: u32) -> Quote {
    let discount = discount_for(method, &subtotal, percent);
    let total = &subtotal - &discount;
    Quote {
        subtotal,
        discount,
        total,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutState {
    SelectingPayment,
    CashConfirmed,
    OnlineRedirecting,
    Placed,
}

/// Checkout state machine:
/// `SelectingPayment -> {CashConfirmed | OnlineRedirecting} -> Placed`.
///
/// The quote is recomputed whenever the payment method changes; switching back
/// and forth yields the same totals for the same subtotal.
#[derive(Debug, Clone)]
pub struct CheckoutFlow {
    state: CheckoutState,
    method: PaymentMethod,
    subtotal: BigDecimal,
    discount_percent: u32,
    quote: Quote,
}

impl CheckoutFlow {
    pub fn new(subtotal: BigDecimal, discount_percent: u32) -> Self {
        let quote = quote(PaymentMethod::CashOnDelivery, subtotal.clone(), discount_percent);
        Self {
            state: CheckoutState::SelectingPayment,
            method: PaymentMethod::CashOnDelivery,
            subtotal,
            discount_percent,
            quote,
        }
    }

    pub fn state(&self) -> CheckoutState {
        self.state
    }

    pub fn method(&self) -> PaymentMethod {
        self.method
    }

    pub fn quote(&self) -> &Quote {
        &self.quote
    }

    /// Change the payment method and recompute the quote. Only valid while
    /// still selecting.
    pub fn select_method(&mut self, method: PaymentMethod) -> Result<&Quote, DomainError> {
        if self.state != CheckoutState::SelectingPayment {
            return Err(DomainError::Conflict(format!(
                "cannot change payment method in state {:?}",
                self.state
            )));
        }
        self.method = method;
        self.quote = quote(method, self.subtotal.clone(), self.discount_percent);
        Ok(&self.quote)
    }

    /// Commit to the selected method: cash moves to `CashConfirmed`, online
    /// to `OnlineRedirecting`.
    pub fn confirm(&mut self) -> Result<(), DomainError> {
        if self.state != CheckoutState::SelectingPayment {
            return Err(DomainError::Conflict(format!(
                "cannot confirm payment in state {:?}",
                self.state
            )));
        }
        self.state = match self.method {
            PaymentMethod::CashOnDelivery => CheckoutState::CashConfirmed,
            PaymentMethod::Online => CheckoutState::OnlineRedirecting,
        };
        Ok(())
    }

    /// Terminal transition once the order record has been written.
    pub fn place(&mut self) -> Result<(), DomainError> {
        match self.state {
            CheckoutState::CashConfirmed | CheckoutState::OnlineRedirecting => {
                self.state = CheckoutState::Placed;
                Ok(())
            }
            _ => Err(DomainError::Conflict(format!(
                "cannot place order in state {:?}",
                self.state
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).expect("valid decimal")
    }

    #[test]
    fn cash_discount_is_zero() {
        assert_eq!(
            discount_for(PaymentMethod::CashOnDelivery, &dec("2000"), 10),
            BigDecimal::zero()
        );
    }

    #[test]
    fn online_discount_is_configured_percentage() {
        // 2 x 1000 at 10% => discount 200, total 1800.
        let q = quote(PaymentMethod::Online, dec("2000"), 10);
        assert_eq!(q.discount, dec("200.00"));
        assert_eq!(q.total, dec("1800.00"));

        let q = quote(PaymentMethod::CashOnDelivery, dec("2000"), 10);
        assert_eq!(q.discount, BigDecimal::zero());
        assert_eq!(q.total, dec("2000"));
    }

    #[test]
    fn online_discount_rounds_half_up_to_minor_unit() {
        // 10% of 0.05 is 0.005, which rounds up to 0.01.
        let d = discount_for(PaymentMethod::Online, &dec("0.05"), 10);
        assert_eq!(d, dec("0.01"));
    }

    #[test]
    fn switching_methods_recomputes_the_same_values() {
        let mut flow = CheckoutFlow::new(dec("2000"), 10);

        let online = flow.select_method(PaymentMethod::Online).unwrap().clone();
        flow.select_method(PaymentMethod::CashOnDelivery).unwrap();
        let online_again = flow.select_method(PaymentMethod::Online).unwrap().clone();

        assert_eq!(online, online_again);
        assert_eq!(online.discount, dec("200.00"));
    }

    #[test]
    fn cash_flow_walks_to_placed() {
        let mut flow = CheckoutFlow::new(dec("100"), 10);
        flow.select_method(PaymentMethod::CashOnDelivery).unwrap();
        flow.confirm().unwrap();
        assert_eq!(flow.state(), CheckoutState::CashConfirmed);
        flow.place().unwrap();
        assert_eq!(flow.state(), CheckoutState::Placed);
    }

    #[test]
    fn online_flow_walks_through_redirecting() {
        let mut flow = CheckoutFlow::new(dec("100"), 10);
        flow.select_method(PaymentMethod::Online).unwrap();
        flow.confirm().unwrap();
        assert_eq!(flow.state(), CheckoutState::OnlineRedirecting);
        flow.place().unwrap();
        assert_eq!(flow.state(), CheckoutState::Placed);
    }

    #[test]
    fn out_of_order_transitions_are_conflicts() {
        let mut flow = CheckoutFlow::new(dec("100"), 10);
        assert!(flow.place().is_err(), "cannot place before confirming");

        flow.confirm().unwrap();
        assert!(
            flow.select_method(PaymentMethod::Online).is_err(),
            "cannot change method after confirming"
        );
        assert!(flow.confirm().is_err(), "cannot confirm twice");

        flow.place().unwrap();
        assert!(flow.place().is_err(), "placed is terminal");
    }
}

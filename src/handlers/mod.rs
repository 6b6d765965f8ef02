pub mod cart;
pub mod checkout;
pub mod orders;
pub mod payment;
pub mod products;

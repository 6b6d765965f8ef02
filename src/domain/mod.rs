pub mod cart;
pub mod checkout;
pub mod errors;
pub mod order;
pub mod ports;
pub mod product;

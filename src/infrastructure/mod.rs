pub mod catalog_repo;
pub mod ledger_repo;
pub mod local;
pub mod models;

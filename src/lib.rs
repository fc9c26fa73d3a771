pub mod chain;
pub mod config;
pub mod error;
pub mod ledger;
pub mod storage;
pub mod validation;

pub use error::LedgerError;

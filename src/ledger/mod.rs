//! Ledger Hierarchy
//!
//! Registry of department, class and student records, each owning one hash
//! chain, plus the service layer that makes every mutation atomic with
//! snapshot persistence.

pub mod entity;
pub mod hierarchy;
pub mod service;

pub use entity::{project_meta, EntityLevel, EntityListing, EntityRecord};
pub use hierarchy::{generate_id, Ledger};
pub use service::LedgerService;

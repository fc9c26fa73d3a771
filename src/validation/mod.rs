//! Validators
//!
//! Re-derive and check every chain invariant, producing structured reports
//! instead of errors: callers get the full list of issues in one pass.

pub mod chain;
pub mod hierarchy;

pub use chain::{validate_chain, ChainValidation};
pub use hierarchy::{validate_hierarchy, HierarchyValidation, LinkageIssue};

//! Single-Chain Validation
//!
//! Walks one chain in index order, recomputing every digest and checking the
//! proof-of-work predicate and predecessor linkage. Pure and idempotent; the
//! first violation found is reported with its block index.

use serde::Serialize;

use crate::chain::{Block, Difficulty};

/// Outcome of validating one chain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainValidation {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ChainValidation {
    fn ok() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    fn fail(reason: String) -> Self {
        Self {
            valid: false,
            reason: Some(reason),
        }
    }

    pub fn reason(&self) -> &str {
        self.reason.as_deref().unwrap_or("")
    }
}

/// Check every block of `chain` against the difficulty predicate, its own
/// recomputed digest, index contiguity and predecessor linkage.
pub fn validate_chain(chain: &[Block], difficulty: Difficulty) -> ChainValidation {
    if chain.is_empty() {
        return ChainValidation::fail("chain is empty".to_string());
    }
    if chain[0].index != 0 {
        return ChainValidation::fail(format!(
            "genesis block has index {}, expected 0",
            chain[0].index
        ));
    }

    for (i, block) in chain.iter().enumerate() {
        if !block.verify_hash() {
            return ChainValidation::fail(format!("block {} hash mismatch", i));
        }
        if !difficulty.is_satisfied(&block.hash) {
            return ChainValidation::fail(format!("block {} proof-of-work not met", i));
        }
        if i > 0 {
            let prev = &chain[i - 1];
            if block.index != prev.index + 1 {
                return ChainValidation::fail(format!(
                    "block {} index not contiguous ({} after {})",
                    i, block.index, prev.index
                ));
            }
            if block.prev_hash != prev.hash {
                return ChainValidation::fail(format!("block {} prev_hash mismatch", i));
            }
        }
    }

    ChainValidation::ok()
}

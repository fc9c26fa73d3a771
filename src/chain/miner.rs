//! Proof-of-Work Miner
//!
//! Bounded nonce search plus the two block constructors (`create_genesis_block`,
//! `create_next_block`). Neither constructor touches an existing chain;
//! appending the mined block is the caller's responsibility.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chain::block::{block_digest, now_iso8601, Block, Difficulty};
use crate::chain::transaction::Transaction;
use crate::error::LedgerError;

/// Default nonce budget. Expected attempts at the default difficulty are
/// ~65,536, so exhausting this budget without a hit is effectively a
/// misconfiguration signal rather than bad luck.
pub const DEFAULT_MINING_BUDGET: u64 = 10_000_000;

/// Static mining parameters: difficulty predicate plus iteration budget.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MiningPolicy {
    pub difficulty: Difficulty,
    pub max_iterations: u64,
}

impl Default for MiningPolicy {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::default(),
            max_iterations: DEFAULT_MINING_BUDGET,
        }
    }
}

impl MiningPolicy {
    pub fn with_difficulty(difficulty: usize) -> Self {
        Self {
            difficulty: Difficulty(difficulty),
            ..Self::default()
        }
    }
}

/// Search nonces from zero until the digest satisfies the difficulty
/// predicate, or fail with a retryable [`LedgerError::MiningExhausted`]
/// once the budget runs out.
pub fn mine_block(
    index: u64,
    timestamp: String,
    transaction: Transaction,
    prev_hash: String,
    policy: &MiningPolicy,
) -> Result<Block, LedgerError> {
    for nonce in 0..policy.max_iterations {
        let hash = block_digest(&timestamp, &transaction, &prev_hash, nonce);
        if policy.difficulty.is_satisfied(&hash) {
            debug!(index, nonce, %hash, "mined block");
            return Ok(Block {
                index,
                timestamp,
                transaction,
                prev_hash,
                nonce,
                hash,
            });
        }
    }
    Err(LedgerError::MiningExhausted {
        attempts: policy.max_iterations,
    })
}

/// Mine a new chain's first block. `parent_hash` is the owning chain's head
/// hash at creation time, or [`crate::chain::ROOT_HASH`] for departments.
pub fn create_genesis_block(
    transaction: Transaction,
    parent_hash: &str,
    policy: &MiningPolicy,
) -> Result<Block, LedgerError> {
    mine_block(0, now_iso8601(), transaction, parent_hash.to_string(), policy)
}

/// Mine the successor of `prev` carrying `transaction`.
pub fn create_next_block(
    prev: &Block,
    transaction: Transaction,
    policy: &MiningPolicy,
) -> Result<Block, LedgerError> {
    mine_block(
        prev.index + 1,
        now_iso8601(),
        transaction,
        prev.hash.clone(),
        policy,
    )
}

//! Blocks and Canonical Hashing
//!
//! A block commits to its timestamp, canonical transaction payload,
//! predecessor hash and nonce via a single SHA-256 digest. The difficulty
//! predicate over that digest is what makes the log expensive to rewrite.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::chain::transaction::Transaction;

/// Sentinel `prev_hash` for top-level (department) genesis blocks.
pub const ROOT_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// One immutable, mined record in an entity's chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    /// ISO-8601 UTC timestamp with millisecond precision.
    pub timestamp: String,
    pub transaction: Transaction,
    /// Hash of the predecessor block; for genesis blocks, the parent
    /// chain's head hash at creation time (or [`ROOT_HASH`]).
    pub prev_hash: String,
    pub nonce: u64,
    pub hash: String,
}

impl Block {
    /// Recompute this block's digest from its own fields.
    pub fn compute_hash(&self) -> String {
        block_digest(&self.timestamp, &self.transaction, &self.prev_hash, self.nonce)
    }

    /// Verify the stored hash against a recomputation.
    pub fn verify_hash(&self) -> bool {
        self.hash == self.compute_hash()
    }
}

/// Digest rule shared by the miner and the validator:
/// `SHA-256(timestamp ++ canonical(transaction) ++ prev_hash ++ decimal(nonce))`,
/// lowercase hex.
pub fn block_digest(timestamp: &str, transaction: &Transaction, prev_hash: &str, nonce: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(timestamp.as_bytes());
    hasher.update(transaction.canonical().as_bytes());
    hasher.update(prev_hash.as_bytes());
    hasher.update(nonce.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

/// Proof-of-work predicate: the digest must start with this many `'0'`
/// hex digits. A fixed global parameter, never retargeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Difficulty(pub usize);

impl Difficulty {
    pub fn is_satisfied(&self, hash: &str) -> bool {
        hash.len() >= self.0 && hash.bytes().take(self.0).all(|b| b == b'0')
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        // Four leading zero hex digits: ~65,536 expected attempts.
        Difficulty(4)
    }
}

/// Current UTC time in the ledger's timestamp format.
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

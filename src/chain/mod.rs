//! Chain Engine
//!
//! Block construction, canonical transaction hashing, the proof-of-work
//! difficulty predicate and the bounded nonce search. Everything above this
//! module (hierarchy bookkeeping, persistence, CLI) is plumbing; the
//! tamper-evidence guarantees live here.

pub mod block;
pub mod miner;
pub mod transaction;

pub use block::{block_digest, now_iso8601, Block, Difficulty, ROOT_HASH};
pub use miner::{create_genesis_block, create_next_block, mine_block, MiningPolicy};
pub use transaction::{
    canonical_json, AttendanceRecord, AttendanceStatus, Attributes, Transaction,
};

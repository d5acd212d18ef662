//! Append-only ballot ledger with multi-validator block admission.
//!
//! Each block carries one signed vote. The [`Ledger`] admits it only after
//! voter eligibility, position policy, freshness, validator quorum and
//! hash-chain linkage all check out, in that order.

pub mod api;
pub mod block;
pub mod config;
pub mod crypto;
pub mod eligibility;
pub mod error;
pub mod keys;
pub mod ledger;
pub mod models;
pub mod policy;
pub mod vote;

use std::time::{SystemTime, UNIX_EPOCH};

pub use block::{Block, ValidatorSignature};
pub use eligibility::{VoterEligibility, VoterRegistry, VoterStanding};
pub use error::{CryptoError, RejectionReason};
pub use keys::Wallet;
pub use ledger::{format_results, Accepted, Ledger, LedgerConfig, SharedLedger, Tally};
pub use policy::{PositionPolicy, Scope};
pub use vote::Vote;

/// Wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}

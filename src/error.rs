use openssl::error::ErrorStack;
use serde::Serialize;
use thiserror::Error;

/// Why the ledger refused a candidate block.
///
/// These are ordinary outcomes of `Ledger::submit_block`: the block is
/// discarded, the ledger is left untouched and the caller decides whether
/// to retry with a corrected block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RejectionReason {
    /// The voter is unknown to the eligibility store or not yet verified.
    #[error("unregistered voter")]
    UnregisteredVoter,

    /// A local-scope position was voted from outside the voter's own department.
    #[error("vote department does not match the voter's registered locality")]
    LocalityMismatch,

    /// The declared department is not on the position's allow-list.
    #[error("department is not allowed for this position")]
    DisallowedLocality,

    #[error("expired vote")]
    ExpiredVote,

    /// Fewer valid signatures from authorized validators than the quorum.
    #[error("insufficient validator signatures")]
    InsufficientSignatures,

    /// The block does not reference the current tip.
    #[error("invalid chain link")]
    InvalidChainLink,
}

/// Faults raised by the signing and verification helpers.
///
/// Unlike [`RejectionReason`] these point at misuse (a malformed key, a
/// broken primitive) and are propagated as hard errors.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("malformed {kind} key: {source}")]
    MalformedKey {
        kind: &'static str,
        #[source]
        source: ErrorStack,
    },

    #[error("signing failed: {0}")]
    Signing(#[source] ErrorStack),

    #[error("verification fault: {0}")]
    Verification(#[source] ErrorStack),

    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    #[error("key file error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {var}")]
    InvalidValue { var: &'static str, value: String },
}

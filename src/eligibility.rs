use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Lookup of who may vote and where they are registered.
///
/// Both calls are fast, synchronous and infallible: a voter that cannot be
/// found is simply not eligible and has no locality.
pub trait VoterEligibility: Send + Sync {
    fn is_eligible(&self, voter_key: &str) -> bool;

    fn locality_of(&self, voter_key: &str) -> Option<String>;

    /// Both answers from a single read of the store. Implementations that
    /// can change concurrently should override this so the two cannot come
    /// from different states.
    fn standing_of(&self, voter_key: &str) -> VoterStanding {
        VoterStanding {
            eligible: self.is_eligible(voter_key),
            locality: self.locality_of(voter_key),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VoterStanding {
    pub eligible: bool,
    pub locality: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct VoterRecord {
    department: String,
    verified: bool,
}

/// In-memory voter roll keyed by voter public key.
///
/// A voter becomes eligible once registered and KYC-verified.
#[derive(Debug, Default)]
pub struct VoterRegistry {
    voters: RwLock<HashMap<String, VoterRecord>>,
}

impl VoterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or re-registers) a voter pending verification.
    pub fn register(&self, voter_key: &str, department: &str) {
        self.insert(voter_key, department, false);
    }

    pub fn register_verified(&self, voter_key: &str, department: &str) {
        self.insert(voter_key, department, true);
    }

    /// Returns `false` when the voter is not registered.
    pub fn mark_verified(&self, voter_key: &str) -> bool {
        let mut voters = self.voters.write().unwrap_or_else(PoisonError::into_inner);
        match voters.get_mut(voter_key) {
            Some(record) => {
                record.verified = true;
                true
            }
            None => false,
        }
    }

    /// Removes a voter; returns whether one was registered.
    pub fn revoke(&self, voter_key: &str) -> bool {
        self.voters
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(voter_key)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.voters.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(&self, voter_key: &str, department: &str, verified: bool) {
        let record = VoterRecord {
            department: department.to_owned(),
            verified,
        };
        self.voters
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(voter_key.to_owned(), record);
    }
}

impl VoterEligibility for VoterRegistry {
    fn is_eligible(&self, voter_key: &str) -> bool {
        self.voters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(voter_key)
            .map_or(false, |record| record.verified)
    }

    fn locality_of(&self, voter_key: &str) -> Option<String> {
        self.voters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(voter_key)
            .map(|record| record.department.clone())
    }

    fn standing_of(&self, voter_key: &str) -> VoterStanding {
        let voters = self.voters.read().unwrap_or_else(PoisonError::into_inner);
        match voters.get(voter_key) {
            Some(record) => VoterStanding {
                eligible: record.verified,
                locality: Some(record.department.clone()),
            },
            None => VoterStanding::default(),
        }
    }
}

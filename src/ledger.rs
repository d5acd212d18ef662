use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt::Write;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::RwLock;

use crate::block::Block;
use crate::crypto;
use crate::eligibility::VoterEligibility;
use crate::error::RejectionReason;
use crate::policy::PositionPolicy;

pub const DEFAULT_QUORUM: usize = 2;
pub const DEFAULT_MAX_VOTE_AGE: Duration = Duration::from_secs(5 * 60);

/// Position → candidate → number of accepted votes.
pub type Tally = BTreeMap<String, BTreeMap<String, u64>>;

/// A ledger shared between tasks. Submissions hold the write lock for the
/// whole admission pipeline; reads share the read lock.
pub type SharedLedger = Arc<RwLock<Ledger>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Distinct authorized validator signatures required per block.
    pub quorum: usize,
    pub max_vote_age: Duration,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            quorum: DEFAULT_QUORUM,
            max_vote_age: DEFAULT_MAX_VOTE_AGE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Accepted {
    pub index: usize,
    pub hash: String,
}

/// Append-only sequence of admitted vote blocks.
///
/// Index 0 always holds the genesis block, and every later block links to
/// the content hash of the block before it.
pub struct Ledger {
    blocks: Vec<Block>,
    tip_hash: String,
    validators: HashMap<String, bool>,
    policies: Vec<PositionPolicy>,
    config: LedgerConfig,
    eligibility: Arc<dyn VoterEligibility>,
}

impl Ledger {
    /// A configured quorum below [`DEFAULT_QUORUM`] is raised to it.
    pub fn new(eligibility: Arc<dyn VoterEligibility>, mut config: LedgerConfig) -> Self {
        if config.quorum < DEFAULT_QUORUM {
            log::warn!(
                "quorum {} is below the minimum, using {}",
                config.quorum,
                DEFAULT_QUORUM
            );
            config.quorum = DEFAULT_QUORUM;
        }
        let genesis = Block::genesis();
        let tip_hash = genesis.content_hash();
        log::debug!("ledger created with genesis {}", tip_hash);
        Self {
            blocks: vec![genesis],
            tip_hash,
            validators: HashMap::new(),
            policies: Vec::new(),
            config,
            eligibility,
        }
    }

    pub fn into_shared(self) -> SharedLedger {
        Arc::new(RwLock::new(self))
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn tip(&self) -> &Block {
        // The genesis block is never removed.
        &self.blocks[self.blocks.len() - 1]
    }

    pub fn tip_hash(&self) -> &str {
        &self.tip_hash
    }

    /// Number of blocks, genesis included.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always `false`: genesis is present from construction.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn register_validator(&mut self, public_key: &str) {
        self.validators.insert(public_key.to_owned(), true);
    }

    /// Signatures from a revoked validator stop counting towards quorum on
    /// the next submission. Already accepted blocks are untouched.
    pub fn revoke_validator(&mut self, public_key: &str) {
        self.validators.insert(public_key.to_owned(), false);
    }

    pub fn is_validator(&self, public_key: &str) -> bool {
        self.validators.get(public_key).copied().unwrap_or(false)
    }

    pub fn validator_count(&self) -> usize {
        self.validators.values().filter(|authorized| **authorized).count()
    }

    /// Appends without deduplicating; lookups use the first policy with a
    /// matching name.
    pub fn configure_position(&mut self, policy: PositionPolicy) {
        self.policies.push(policy);
    }

    pub fn policy_for(&self, position: &str) -> Option<&PositionPolicy> {
        self.policies.iter().find(|policy| policy.name == position)
    }

    pub fn submit_block(&mut self, candidate: Block) -> Result<Accepted, RejectionReason> {
        self.submit_block_at(candidate, crate::now_millis())
    }

    /// Runs the admission pipeline with `now_ms` as the current time and
    /// appends the block if every check passes.
    pub fn submit_block_at(
        &mut self,
        candidate: Block,
        now_ms: u64,
    ) -> Result<Accepted, RejectionReason> {
        if let Err(reason) = self.admit(&candidate, now_ms) {
            log::warn!("block rejected: {}", reason);
            return Err(reason);
        }

        let hash = candidate.content_hash();
        self.blocks.push(candidate);
        self.tip_hash = hash.clone();

        let index = self.blocks.len() - 1;
        log::info!("block {} added: {}", index, hash);
        Ok(Accepted { index, hash })
    }

    fn admit(&self, candidate: &Block, now_ms: u64) -> Result<(), RejectionReason> {
        let vote = candidate.vote();

        // One snapshot of the voter for both the eligibility and policy checks.
        let standing = self.eligibility.standing_of(vote.voter_public_key());
        if !standing.eligible {
            return Err(RejectionReason::UnregisteredVoter);
        }

        if let Some(policy) = self.policy_for(vote.position()) {
            policy.check(vote.department(), standing.locality.as_deref())?;
        }

        let age = now_ms.saturating_sub(vote.timestamp());
        if u128::from(age) > self.config.max_vote_age.as_millis() {
            return Err(RejectionReason::ExpiredVote);
        }

        let valid = self.count_valid_signatures(candidate);
        if valid < self.config.quorum {
            log::debug!(
                "{} of {} required validator signatures are valid",
                valid,
                self.config.quorum
            );
            return Err(RejectionReason::InsufficientSignatures);
        }

        if candidate.previous_hash() != self.tip_hash {
            return Err(RejectionReason::InvalidChainLink);
        }

        Ok(())
    }

    /// Counts distinct authorized validators whose signature verifies.
    /// Anything else is skipped, never an error.
    fn count_valid_signatures(&self, block: &Block) -> usize {
        let content = block.canonical_content();
        let mut counted = HashSet::new();

        for entry in block.signatures() {
            if !self.is_validator(&entry.validator) || counted.contains(entry.validator.as_str()) {
                continue;
            }
            match crypto::verify(content.as_bytes(), &entry.signature, &entry.validator) {
                Ok(true) => {
                    counted.insert(entry.validator.as_str());
                }
                Ok(false) => log::debug!("skipping signature that does not verify"),
                Err(e) => log::warn!("skipping unverifiable validator signature: {}", e),
            }
        }

        counted.len()
    }

    /// Re-checks that every block links to its predecessor's hash.
    pub fn verify_links(&self) -> bool {
        self.blocks
            .windows(2)
            .all(|pair| pair[1].previous_hash() == pair[0].content_hash())
    }

    pub fn tally(&self) -> Tally {
        let mut tally = Tally::new();
        for block in self.blocks.iter().skip(1) {
            let vote = block.vote();
            *tally
                .entry(vote.position().to_owned())
                .or_default()
                .entry(vote.candidate().to_owned())
                .or_default() += 1;
        }
        tally
    }

    /// Candidate → votes across all positions.
    pub fn tally_by_candidate(&self) -> BTreeMap<String, u64> {
        let mut tally: BTreeMap<String, u64> = BTreeMap::new();
        for block in self.blocks.iter().skip(1) {
            *tally.entry(block.vote().candidate().to_owned()).or_default() += 1;
        }
        tally
    }
}

/// Human-readable election results, one section per position.
pub fn format_results(tally: &Tally) -> String {
    let mut out = String::from("Election Results:\n-----------------\n");
    for (position, candidates) in tally {
        let _ = writeln!(out, "{}", position);
        for (candidate, votes) in candidates {
            let plural = if *votes == 1 { "" } else { "s" };
            let _ = writeln!(out, "  {}: {} vote{}", candidate, votes, plural);
        }
    }
    out.push_str("-----------------\n");
    out
}

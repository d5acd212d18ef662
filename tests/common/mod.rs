#![allow(dead_code)]

use std::sync::{Arc, OnceLock};

use ballot_ledger::{Block, Ledger, LedgerConfig, VoterRegistry, Wallet};

pub const NOW: u64 = 1_700_000_000_000;

/// voter A, voter B, three validators, one outsider.
pub fn wallets() -> &'static [Wallet] {
    static WALLETS: OnceLock<Vec<Wallet>> = OnceLock::new();
    WALLETS.get_or_init(|| {
        (0..6)
            .map(|_| Wallet::generate_with_bits(1024).unwrap())
            .collect()
    })
}

pub fn voter_a() -> &'static Wallet {
    &wallets()[0]
}

pub fn voter_b() -> &'static Wallet {
    &wallets()[1]
}

pub fn validators() -> &'static [Wallet] {
    &wallets()[2..5]
}

pub fn outsider() -> &'static Wallet {
    &wallets()[5]
}

/// Ledger with voter A registered in department "X" and all three
/// validators authorized.
pub fn ledger() -> (Arc<VoterRegistry>, Ledger) {
    let registry = Arc::new(VoterRegistry::new());
    registry.register_verified(&voter_a().public_key, "X");

    let mut ledger = Ledger::new(registry.clone(), LedgerConfig::default());
    for validator in validators() {
        ledger.register_validator(&validator.public_key);
    }
    (registry, ledger)
}

pub fn signed_block(
    previous_hash: &str,
    voter: &Wallet,
    candidate: &str,
    position: &str,
    department: &str,
    signers: &[&Wallet],
) -> Block {
    let vote = voter
        .create_vote_at(candidate, position, department, NOW - 2_000)
        .unwrap();
    let mut block = Block::with_timestamp(previous_hash, vote, NOW - 1_000);
    for signer in signers {
        signer.cosign(&mut block).unwrap();
    }
    block
}

pub fn two_validators() -> [&'static Wallet; 2] {
    [&validators()[0], &validators()[1]]
}

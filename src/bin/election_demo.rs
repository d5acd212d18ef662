//! End-to-end walk through an election: validators co-sign voter blocks,
//! an unregistered attacker and a stale resubmission are turned away, and
//! the results are printed.

use std::error::Error;
use std::sync::Arc;

use ballot_ledger::{
    format_results, Block, Ledger, LedgerConfig, PositionPolicy, VoterRegistry, Wallet,
};

fn cast(
    ledger: &mut Ledger,
    voter: &Wallet,
    candidate: &str,
    position: &str,
    department: &str,
    signers: &[&Wallet],
) -> Result<(), Box<dyn Error>> {
    let vote = voter.create_vote(candidate, position, department)?;
    let mut block = Block::new(ledger.tip_hash(), vote);
    for signer in signers {
        signer.cosign(&mut block)?;
    }
    match ledger.submit_block(block) {
        Ok(accepted) => println!("accepted block {}: {}", accepted.index, accepted.hash),
        Err(reason) => println!("rejected vote for {}: {}", candidate, reason),
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let registry = Arc::new(VoterRegistry::new());
    let mut ledger = Ledger::new(registry.clone(), LedgerConfig::default());
    ledger.configure_position(PositionPolicy::global("President"));
    ledger.configure_position(PositionPolicy::local("Mayor"));

    let validator1 = Wallet::generate()?;
    let validator2 = Wallet::generate()?;
    let validator3 = Wallet::generate()?;
    for validator in [&validator1, &validator2, &validator3] {
        ledger.register_validator(&validator.public_key);
    }

    let alice = Wallet::generate()?;
    let bob = Wallet::generate()?;
    let charlie = Wallet::generate()?;
    registry.register_verified(&alice.public_key, "Cebu");
    registry.register_verified(&bob.public_key, "Davao");
    registry.register_verified(&charlie.public_key, "Cebu");

    cast(&mut ledger, &alice, "Candidate A", "President", "Cebu", &[&validator1, &validator2])?;
    cast(&mut ledger, &bob, "Candidate B", "President", "Davao", &[&validator2, &validator3])?;
    cast(&mut ledger, &alice, "Candidate M", "Mayor", "Cebu", &[&validator1, &validator3])?;

    // Bob is registered in Davao and cannot vote for the Cebu mayor.
    cast(&mut ledger, &bob, "Candidate M", "Mayor", "Cebu", &[&validator1, &validator2])?;

    let attacker = Wallet::generate()?;
    cast(&mut ledger, &attacker, "Candidate Hacker", "President", "Cebu", &[&validator1])?;

    // Charlie's block is co-signed by one validator only.
    cast(&mut ledger, &charlie, "Candidate A", "President", "Cebu", &[&validator3])?;

    let stale_tip = ledger.tip_hash().to_owned();
    cast(&mut ledger, &charlie, "Candidate A", "President", "Cebu", &[&validator1, &validator3])?;
    let mut stale = Block::new(&stale_tip, charlie.create_vote("Candidate A", "President", "Cebu")?);
    validator1.cosign(&mut stale)?;
    validator2.cosign(&mut stale)?;
    if let Err(reason) = ledger.submit_block(stale) {
        println!("rejected resubmission on old tip: {}", reason);
    }

    println!();
    print!("{}", format_results(&ledger.tally()));
    println!("chain length: {}, links valid: {}", ledger.len(), ledger.verify_links());
    Ok(())
}

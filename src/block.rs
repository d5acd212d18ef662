use serde::{Deserialize, Serialize};

use crate::crypto::{self, json_string};
use crate::error::CryptoError;
use crate::vote::Vote;

/// One validator's signature over a block's canonical content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorSignature {
    pub validator: String,
    #[serde(with = "crypto::base64_bytes")]
    pub signature: Vec<u8>,
}

/// A single vote linked to its predecessor and co-signed by validators.
///
/// The content hash covers the signature set, so it only identifies the
/// block once signature collection is finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    previous_hash: String,
    vote: Vote,
    timestamp: u64,
    #[serde(default)]
    signatures: Vec<ValidatorSignature>,
}

impl Block {
    pub fn new(previous_hash: &str, vote: Vote) -> Self {
        Self::with_timestamp(previous_hash, vote, crate::now_millis())
    }

    pub fn with_timestamp(previous_hash: &str, vote: Vote, timestamp: u64) -> Self {
        Self {
            previous_hash: previous_hash.to_owned(),
            vote,
            timestamp,
            signatures: Vec::new(),
        }
    }

    /// The synthetic first block: no predecessor, a sentinel vote, time zero.
    pub fn genesis() -> Self {
        let vote = Vote::with_timestamp("system", "genesis", "genesis", "", 0);
        Self::with_timestamp("", vote, 0)
    }

    pub fn previous_hash(&self) -> &str {
        &self.previous_hash
    }

    pub fn vote(&self) -> &Vote {
        &self.vote
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Signatures in the order their validators first signed.
    pub fn signatures(&self) -> &[ValidatorSignature] {
        &self.signatures
    }

    /// What validators sign: previous hash, the vote's canonical form and
    /// the block timestamp, in that order. Signatures are not part of it.
    pub fn canonical_content(&self) -> String {
        format!(
            "{{\"previousHash\":{},\"vote\":{},\"timestamp\":{}}}",
            json_string(&self.previous_hash),
            json_string(&self.vote.canonical_form()),
            self.timestamp,
        )
    }

    /// Signs the canonical content and stores it under `validator_key`.
    pub fn add_validator_signature(
        &mut self,
        validator_key: &str,
        private_key_pem: &str,
    ) -> Result<(), CryptoError> {
        let signature = crypto::sign(self.canonical_content().as_bytes(), private_key_pem)?;
        self.attach_signature(validator_key, signature);
        Ok(())
    }

    /// Stores a signature produced elsewhere. A second signature under the
    /// same key replaces the first and keeps its original position.
    pub fn attach_signature(&mut self, validator_key: &str, signature: Vec<u8>) {
        match self
            .signatures
            .iter_mut()
            .find(|entry| entry.validator == validator_key)
        {
            Some(entry) => entry.signature = signature,
            None => self.signatures.push(ValidatorSignature {
                validator: validator_key.to_owned(),
                signature,
            }),
        }
    }

    /// SHA-256 over the canonical content followed by the signature list.
    /// Recomputed on every call.
    pub fn content_hash(&self) -> String {
        let signatures = self
            .signatures
            .iter()
            .map(|entry| {
                format!(
                    "[{},{}]",
                    json_string(&entry.validator),
                    json_string(&base64::encode(&entry.signature)),
                )
            })
            .collect::<Vec<_>>()
            .join(",");
        let material = format!(
            "{{\"content\":{},\"signatures\":[{}]}}",
            json_string(&self.canonical_content()),
            signatures,
        );
        crypto::digest_hex(material.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::testing::wallets;

    fn sample_block() -> Block {
        let voter = &wallets()[0];
        let vote = voter.create_vote_at("C1", "P1", "X", 1_000).unwrap();
        Block::with_timestamp("abc", vote, 2_000)
    }

    #[test]
    fn genesis_has_empty_previous_hash_and_stable_hash() {
        let genesis = Block::genesis();
        assert_eq!(genesis.previous_hash(), "");
        assert_eq!(genesis.vote().candidate(), "genesis");
        assert_eq!(genesis.content_hash(), Block::genesis().content_hash());
    }

    #[test]
    fn canonical_content_nests_the_vote_form() {
        let block = sample_block();
        let content = block.canonical_content();
        assert!(content.starts_with("{\"previousHash\":\"abc\",\"vote\":\"{\\\"voterPublicKey\\\""));
        assert!(content.ends_with(",\"timestamp\":2000}"));
    }

    #[test]
    fn content_hash_is_deterministic() {
        let block = sample_block();
        assert_eq!(block.content_hash(), block.clone().content_hash());
        assert_eq!(block.content_hash().len(), 64);
    }

    #[test]
    fn every_added_signature_changes_the_hash() {
        let mut block = sample_block();
        let mut seen = vec![block.content_hash()];

        for validator in &wallets()[1..4] {
            validator.cosign(&mut block).unwrap();
            let hash = block.content_hash();
            assert!(!seen.contains(&hash));
            seen.push(hash);
        }
    }

    #[test]
    fn signing_does_not_change_canonical_content() {
        let mut block = sample_block();
        let before = block.canonical_content();
        wallets()[1].cosign(&mut block).unwrap();
        assert_eq!(before, block.canonical_content());
    }

    #[test]
    fn same_validator_overwrites_in_place() {
        let mut block = sample_block();
        let first = &wallets()[1];
        let second = &wallets()[2];
        first.cosign(&mut block).unwrap();
        second.cosign(&mut block).unwrap();

        block.attach_signature(&first.public_key, vec![1, 2, 3]);
        assert_eq!(block.signatures().len(), 2);
        assert_eq!(block.signatures()[0].validator, first.public_key);
        assert_eq!(block.signatures()[0].signature, vec![1, 2, 3]);

        first.cosign(&mut block).unwrap();
        assert_eq!(block.signatures().len(), 2);
        assert!(crypto::verify(
            block.canonical_content().as_bytes(),
            &block.signatures()[0].signature,
            &first.public_key,
        )
        .unwrap());
    }

    #[test]
    fn signature_order_affects_the_hash() {
        let base = sample_block();
        let a = &wallets()[1];
        let b = &wallets()[2];

        let mut ab = base.clone();
        a.cosign(&mut ab).unwrap();
        b.cosign(&mut ab).unwrap();

        let mut ba = base;
        b.cosign(&mut ba).unwrap();
        a.cosign(&mut ba).unwrap();

        assert_ne!(ab.content_hash(), ba.content_hash());
    }

    #[test]
    fn json_round_trip_preserves_hash() {
        let mut block = sample_block();
        wallets()[1].cosign(&mut block).unwrap();

        let json = serde_json::to_string(&block).unwrap();
        let decoded: Block = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.content_hash(), block.content_hash());
    }
}

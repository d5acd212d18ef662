use serde::{Deserialize, Serialize};

use crate::crypto::{self, json_string};
use crate::error::CryptoError;

/// A voter's choice for one position, signed by the voter.
///
/// Fields are only readable once constructed; the signature is the one
/// thing `sign` may set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    voter_public_key: String,
    candidate: String,
    position: String,
    department: String,
    timestamp: u64,
    #[serde(
        default,
        with = "crypto::base64_opt",
        skip_serializing_if = "Option::is_none"
    )]
    signature: Option<Vec<u8>>,
}

impl Vote {
    /// Unsigned vote stamped with the current time.
    pub fn new(voter_public_key: &str, candidate: &str, position: &str, department: &str) -> Self {
        Self::with_timestamp(
            voter_public_key,
            candidate,
            position,
            department,
            crate::now_millis(),
        )
    }

    pub fn with_timestamp(
        voter_public_key: &str,
        candidate: &str,
        position: &str,
        department: &str,
        timestamp: u64,
    ) -> Self {
        Self {
            voter_public_key: voter_public_key.to_owned(),
            candidate: candidate.to_owned(),
            position: position.to_owned(),
            department: department.to_owned(),
            timestamp,
            signature: None,
        }
    }

    pub fn voter_public_key(&self) -> &str {
        &self.voter_public_key
    }

    pub fn candidate(&self) -> &str {
        &self.candidate
    }

    pub fn position(&self) -> &str {
        &self.position
    }

    pub fn department(&self) -> &str {
        &self.department
    }

    /// Creation time in milliseconds since the Unix epoch.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn signature(&self) -> Option<&[u8]> {
        self.signature.as_deref()
    }

    /// The exact bytes a voter signs.
    ///
    /// Field order is fixed: voter key, candidate, position, department,
    /// timestamp. Changing it invalidates every signature and block hash
    /// produced so far.
    pub fn canonical_form(&self) -> String {
        format!(
            "{{\"voterPublicKey\":{},\"candidate\":{},\"position\":{},\"department\":{},\"timestamp\":{}}}",
            json_string(&self.voter_public_key),
            json_string(&self.candidate),
            json_string(&self.position),
            json_string(&self.department),
            self.timestamp,
        )
    }

    /// Signs the canonical form; signing again replaces the previous signature.
    pub fn sign(&mut self, private_key_pem: &str) -> Result<(), CryptoError> {
        let signature = crypto::sign(self.canonical_form().as_bytes(), private_key_pem)?;
        self.signature = Some(signature);
        Ok(())
    }

    /// `Ok(false)` for unsigned votes and signatures that do not match the
    /// voter key; `Err` only when the voter key itself is unusable.
    pub fn verify_signature(&self) -> Result<bool, CryptoError> {
        match &self.signature {
            Some(signature) => crypto::verify(
                self.canonical_form().as_bytes(),
                signature,
                &self.voter_public_key,
            ),
            None => Ok(false),
        }
    }
}

//! Signing, verification and hashing used by votes, blocks and the ledger.
//!
//! Keys travel as PEM strings. Signatures are RSA PKCS#1 v1.5 over SHA-256,
//! content hashes are SHA-256 rendered as lowercase hex.

use openssl::hash::MessageDigest;
use openssl::pkey::{PKey, Private, Public};
use openssl::rsa::Rsa;
use openssl::sign::{Signer, Verifier};
use sha2::{Digest, Sha256};

use crate::error::CryptoError;

const PKCS1_PUBLIC_HEADER: &str = "-----BEGIN RSA PUBLIC KEY-----";

pub(crate) fn parse_private_key(pem: &str) -> Result<PKey<Private>, CryptoError> {
    PKey::private_key_from_pem(pem.as_bytes()).map_err(|source| CryptoError::MalformedKey {
        kind: "private",
        source,
    })
}

/// Accepts both SPKI (`BEGIN PUBLIC KEY`) and PKCS#1 (`BEGIN RSA PUBLIC KEY`) PEM.
pub(crate) fn parse_public_key(pem: &str) -> Result<PKey<Public>, CryptoError> {
    let parsed = if pem.contains(PKCS1_PUBLIC_HEADER) {
        Rsa::public_key_from_pem_pkcs1(pem.as_bytes()).and_then(PKey::from_rsa)
    } else {
        PKey::public_key_from_pem(pem.as_bytes())
    };
    parsed.map_err(|source| CryptoError::MalformedKey {
        kind: "public",
        source,
    })
}

pub fn sign(data: &[u8], private_key_pem: &str) -> Result<Vec<u8>, CryptoError> {
    let key = parse_private_key(private_key_pem)?;
    let mut signer = Signer::new(MessageDigest::sha256(), &key).map_err(CryptoError::Signing)?;
    signer.update(data).map_err(CryptoError::Signing)?;
    signer.sign_to_vec().map_err(CryptoError::Signing)
}

/// Returns `Ok(false)` for a signature that does not match; errors are
/// reserved for keys or primitives that cannot be used at all.
pub fn verify(data: &[u8], signature: &[u8], public_key_pem: &str) -> Result<bool, CryptoError> {
    let key = parse_public_key(public_key_pem)?;
    let mut verifier =
        Verifier::new(MessageDigest::sha256(), &key).map_err(CryptoError::Verification)?;
    verifier.update(data).map_err(CryptoError::Verification)?;
    verifier.verify(signature).map_err(CryptoError::Verification)
}

pub fn digest_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// JSON string literal for `value`, escaped the way serde_json escapes it.
pub(crate) fn json_string(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}

pub(crate) mod base64_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&base64::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        base64::decode(text).map_err(serde::de::Error::custom)
    }
}

pub(crate) mod base64_opt {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        bytes: &Option<Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(bytes) => serializer.serialize_some(&base64::encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<u8>>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|text| base64::decode(text).map_err(serde::de::Error::custom))
            .transpose()
    }
}

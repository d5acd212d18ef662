use std::fmt;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use rand::rngs::OsRng;
use rsa::{
    pkcs1::{ToRsaPrivateKey, ToRsaPublicKey},
    RsaPrivateKey, RsaPublicKey,
};

use crate::block::Block;
use crate::crypto;
use crate::error::CryptoError;
use crate::vote::Vote;

pub const PUBLIC_KEY_FILE: &str = "public_key.pem";
pub const PRIVATE_KEY_FILE: &str = "private_key.pem";

const DEFAULT_MODULUS_BITS: usize = 2048;

/// An RSA key pair held as PKCS#1 PEM strings.
///
/// The public PEM doubles as the participant's identity: voters sign votes
/// with it, validators co-sign blocks with it.
#[derive(Clone)]
pub struct Wallet {
    pub public_key: String,
    pub private_key: String,
}

impl Wallet {
    pub fn generate() -> Result<Self, CryptoError> {
        Self::generate_with_bits(DEFAULT_MODULUS_BITS)
    }

    pub fn generate_with_bits(bits: usize) -> Result<Self, CryptoError> {
        let mut rng = OsRng;
        let private_key = RsaPrivateKey::new(&mut rng, bits)
            .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;
        let public_key = RsaPublicKey::from(&private_key);

        let private_pem = private_key
            .to_pkcs1_pem()
            .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;
        let public_pem = public_key
            .to_pkcs1_pem()
            .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;

        Ok(Self {
            public_key: public_pem.to_string(),
            private_key: private_pem.to_string(),
        })
    }

    /// Loads the key pair kept in `dir`, generating and saving a fresh one
    /// when either file is missing.
    pub fn load_or_generate(dir: impl AsRef<Path>) -> Result<Self, CryptoError> {
        let dir = dir.as_ref();
        let public_path = dir.join(PUBLIC_KEY_FILE);
        let private_path = dir.join(PRIVATE_KEY_FILE);

        if public_path.exists() && private_path.exists() {
            let wallet = Self {
                public_key: read_key_file(&public_path)?,
                private_key: read_key_file(&private_path)?,
            };
            crypto::parse_public_key(&wallet.public_key)?;
            crypto::parse_private_key(&wallet.private_key)?;
            log::info!("loaded validator key pair from {}", dir.display());
            return Ok(wallet);
        }

        let wallet = Self::generate()?;
        fs::create_dir_all(dir)?;
        save_key_to_file(&private_path, &wallet.private_key)?;
        save_key_to_file(&public_path, &wallet.public_key)?;
        log::info!("generated validator key pair in {}", dir.display());
        Ok(wallet)
    }

    /// Creates a vote stamped with the current time and signs it.
    pub fn create_vote(
        &self,
        candidate: &str,
        position: &str,
        department: &str,
    ) -> Result<Vote, CryptoError> {
        self.create_vote_at(candidate, position, department, crate::now_millis())
    }

    pub fn create_vote_at(
        &self,
        candidate: &str,
        position: &str,
        department: &str,
        timestamp: u64,
    ) -> Result<Vote, CryptoError> {
        let mut vote = Vote::with_timestamp(
            &self.public_key,
            candidate,
            position,
            department,
            timestamp,
        );
        vote.sign(&self.private_key)?;
        Ok(vote)
    }

    /// Attaches this wallet's validator signature to `block`.
    pub fn cosign(&self, block: &mut Block) -> Result<(), CryptoError> {
        block.add_validator_signature(&self.public_key, &self.private_key)
    }
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

fn read_key_file(path: &Path) -> Result<String, CryptoError> {
    let mut file = File::open(path)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    Ok(contents)
}

fn save_key_to_file(path: &Path, key: &str) -> Result<(), CryptoError> {
    let mut file = File::create(path)?;
    file.write_all(key.as_bytes())?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::OnceLock;

    use super::Wallet;

    const FIXTURE_BITS: usize = 1024;
    const FIXTURE_COUNT: usize = 6;

    /// Key pairs shared by every test in the crate; RSA generation is slow.
    pub fn wallets() -> &'static [Wallet] {
        static WALLETS: OnceLock<Vec<Wallet>> = OnceLock::new();
        WALLETS.get_or_init(|| {
            (0..FIXTURE_COUNT)
                .map(|_| Wallet::generate_with_bits(FIXTURE_BITS).unwrap())
                .collect()
        })
    }
}

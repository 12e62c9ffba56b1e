//! Ed25519 transaction signer in Sui wire format.
//!
//! - Key input: base64 of `flag || secret` as written by the Sui keystore
//!   (a bare 32-byte secret is accepted too).
//! - Address: `0x` + hex(blake2b-256(`0x00 || public_key`)).
//! - Signature: base64 of `0x00 || ed25519(blake2b-256([0,0,0] || tx)) || public_key`.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use blake2::{digest::consts::U32, Blake2b, Digest};
use ed25519_dalek::{Signer, SigningKey};
use secrecy::{ExposeSecret, Secret};
use thiserror::Error;

type Blake2b256 = Blake2b<U32>;

/// Signature scheme flag for Ed25519.
const ED25519_FLAG: u8 = 0x00;

/// Intent prefix for a transaction-data message (scope, version, app id).
const TRANSACTION_INTENT: [u8; 3] = [0, 0, 0];

/// Errors loading a signing key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignerError {
    #[error("signing key is not valid base64")]
    InvalidEncoding,

    #[error("signing key has {0} bytes, expected 32 or 33")]
    InvalidLength(usize),

    #[error("unsupported signature scheme flag {0:#04x}; only Ed25519 is supported")]
    UnsupportedScheme(u8),
}

/// Holds the process's signing credential.
pub struct SuiSigner {
    key: SigningKey,
    address: String,
}

impl SuiSigner {
    /// Loads a key from its keystore encoding.
    pub fn from_keystore(encoded: &Secret<String>) -> Result<Self, SignerError> {
        let raw = BASE64
            .decode(encoded.expose_secret().trim())
            .map_err(|_| SignerError::InvalidEncoding)?;

        let secret: [u8; 32] = match raw.len() {
            33 => {
                if raw[0] != ED25519_FLAG {
                    return Err(SignerError::UnsupportedScheme(raw[0]));
                }
                raw[1..]
                    .try_into()
                    .map_err(|_| SignerError::InvalidLength(raw.len()))?
            }
            32 => raw
                .as_slice()
                .try_into()
                .map_err(|_| SignerError::InvalidLength(raw.len()))?,
            other => return Err(SignerError::InvalidLength(other)),
        };

        Ok(Self::from_secret_bytes(&secret))
    }

    pub fn from_secret_bytes(secret: &[u8; 32]) -> Self {
        let key = SigningKey::from_bytes(secret);
        let address = derive_address(&key.verifying_key().to_bytes());
        Self { key, address }
    }

    /// Account address derived from the public key.
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn public_key(&self) -> [u8; 32] {
        self.key.verifying_key().to_bytes()
    }

    /// Signs raw transaction bytes, returning the serialized signature.
    pub fn sign_transaction(&self, tx_bytes: &[u8]) -> String {
        let digest = intent_digest(tx_bytes);
        let signature = self.key.sign(&digest);

        let mut serialized = Vec::with_capacity(1 + 64 + 32);
        serialized.push(ED25519_FLAG);
        serialized.extend_from_slice(&signature.to_bytes());
        serialized.extend_from_slice(&self.public_key());
        BASE64.encode(serialized)
    }
}

impl std::fmt::Debug for SuiSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuiSigner")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

fn derive_address(public_key: &[u8; 32]) -> String {
    let mut hasher = Blake2b256::new();
    hasher.update([ED25519_FLAG]);
    hasher.update(public_key);
    format!("0x{}", hex::encode(hasher.finalize()))
}

fn intent_digest(tx_bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(TRANSACTION_INTENT);
    hasher.update(tx_bytes);
    hasher.finalize().into()
}

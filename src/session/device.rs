//! Linked-device credentials.
//!
//! A linked device owns a Noise static key, an identity key and an
//! advertisement secret. The public halves are what the phone reads from
//! the QR code; the whole set is what the session artifact persists.

use base64::{engine::general_purpose::STANDARD, Engine};
use rand::RngCore;
use x25519_dalek::{PublicKey, StaticSecret};

use crate::session::SessionError;

/// A Curve25519 key pair.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyPair {
    /// Public key (32 bytes)
    pub public: [u8; 32],
    /// Private key (32 bytes)
    pub private: [u8; 32],
}

impl KeyPair {
    /// Generate a new random key pair.
    pub fn generate() -> Self {
        let mut private = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut private);

        private[0] &= 248;
        private[31] &= 127;
        private[31] |= 64;

        Self::from_private_key(private)
    }

    /// Create a key pair from an existing private key.
    pub fn from_private_key(private: [u8; 32]) -> Self {
        let secret = StaticSecret::from(private);
        let public = PublicKey::from(&secret);

        Self {
            public: *public.as_bytes(),
            private,
        }
    }

    /// Short hex fingerprint of the public key, safe to log.
    pub fn fingerprint(&self) -> String {
        hex::encode(&self.public[..8])
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &hex::encode(self.public))
            .field("private", &"[REDACTED]")
            .finish()
    }
}

/// Credentials of this bot as a linked WhatsApp Web device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedDevice {
    /// Noise Protocol static key pair
    pub noise_key: KeyPair,
    /// Signal identity key pair
    pub identity_key: KeyPair,
    /// Advertisement secret key
    pub adv_secret_key: [u8; 32],
    /// Registration ID (14 bits)
    pub registration_id: u32,
}

impl LinkedDevice {
    /// Generate a device with fresh keys.
    pub fn generate() -> Self {
        Self {
            noise_key: KeyPair::generate(),
            identity_key: KeyPair::generate(),
            adv_secret_key: rand::random(),
            registration_id: (rand::random::<u32>() & 0x3FFF).max(1),
        }
    }

    /// Build the payload encoded in a pairing QR code.
    ///
    /// Format: `ref,noisePublicKey,identityPublicKey,advSecretKey`.
    pub fn qr_payload(&self, reference: &str) -> String {
        format!(
            "{},{},{},{}",
            reference,
            STANDARD.encode(self.noise_key.public),
            STANDARD.encode(self.identity_key.public),
            STANDARD.encode(self.adv_secret_key),
        )
    }
}

pub(crate) fn encode_key(key: &[u8; 32]) -> String {
    STANDARD.encode(key)
}

pub(crate) fn decode_key(field: &'static str, value: &str) -> Result<[u8; 32], SessionError> {
    let bytes = STANDARD
        .decode(value)
        .map_err(|e| SessionError::InvalidKey(field, e.to_string()))?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| SessionError::InvalidKey(field, format!("expected 32 bytes, got {}", b.len())))
}

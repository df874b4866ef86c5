//! Keyed signatures shared with the payment gateway.

use constant_time_eq::constant_time_eq;
use sha2::{Digest, Sha256};

/// Signs and verifies gateway payloads.
///
/// `signature = UPPER(hex(SHA-256(field_1 ‖ … ‖ field_n ‖ UPPER(hex(SHA-256(secret))))))`
#[derive(Clone)]
pub struct Sha256Signer {
    secret_digest: String,
}

impl std::fmt::Debug for Sha256Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sha256Signer").finish_non_exhaustive()
    }
}

impl Sha256Signer {
    pub fn new(merchant_secret: &str) -> Self {
        Self {
            secret_digest: upper_hex_sha256(merchant_secret.as_bytes()),
        }
    }

    /// Signature over `fields` in order.
    pub fn sign(&self, fields: &[&str]) -> String {
        let mut hasher = Sha256::new();
        for field in fields {
            hasher.update(field.as_bytes());
        }
        hasher.update(self.secret_digest.as_bytes());
        hex::encode_upper(hasher.finalize())
    }

    /// Constant-time check of a received signature. Case-insensitive.
    pub fn verify(&self, fields: &[&str], signature: &str) -> bool {
        let expected = self.sign(fields);
        let received = signature.trim().to_ascii_uppercase();
        constant_time_eq(expected.as_bytes(), received.as_bytes())
    }
}

fn upper_hex_sha256(input: &[u8]) -> String {
    hex::encode_upper(Sha256::digest(input))
}

//! Code generation and keyed hashing.

use hmac::{Hmac, Mac};
use rand::RngExt;
use sha2::Sha256;

use vigil_domain::id::UserId;
use vigil_domain::purpose::OtpPurpose;

use crate::domain::types::CodeSpec;

type HmacSha256 = Hmac<Sha256>;

/// Draw `spec.length` characters uniformly from `spec.alphabet` using the thread-local CSPRNG.
///
/// `spec` must already be validated (non-empty ASCII alphabet).
pub fn generate_code(spec: &CodeSpec) -> String {
    let alphabet = spec.alphabet.as_bytes();
    let mut rng = rand::rng();
    (0..spec.length)
        .map(|_| alphabet[rng.random_range(0..alphabet.len())] as char)
        .collect()
}

/// HMAC-SHA-256 over `(user_id, purpose, code)` keyed by a server secret.
/// A stored hash only ever matches for the pair it was issued to.
#[derive(Clone)]
pub struct CodeHasher {
    mac: HmacSha256,
}

impl CodeHasher {
    pub fn new(secret: &[u8]) -> Result<Self, hmac::digest::InvalidLength> {
        Ok(Self {
            mac: HmacSha256::new_from_slice(secret)?,
        })
    }

    pub fn hash(&self, user_id: UserId, purpose: OtpPurpose, code: &str) -> Vec<u8> {
        self.keyed(user_id, purpose, code)
            .finalize()
            .into_bytes()
            .to_vec()
    }

    /// Constant-time comparison of the submitted code's hash against `stored`.
    pub fn matches(&self, user_id: UserId, purpose: OtpPurpose, code: &str, stored: &[u8]) -> bool {
        self.keyed(user_id, purpose, code)
            .verify_slice(stored)
            .is_ok()
    }

    fn keyed(&self, user_id: UserId, purpose: OtpPurpose, code: &str) -> HmacSha256 {
        let mut mac = self.mac.clone();
        mac.update(user_id.0.as_bytes());
        mac.update(purpose.as_str().as_bytes());
        mac.update(&[0]);
        mac.update(code.as_bytes());
        mac
    }
}

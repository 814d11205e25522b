//! PBKDF2-HMAC-SHA256 password hashes.
//!
//! Encoded as `pbkdf2-sha256$iterations$salt_hex$digest_hex` with a random
//! 16-byte salt. Verification reads the iteration count and salt back from the
//! stored hash, so hashes made with an older work factor keep verifying.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use uuid::Uuid;

use crate::domain::PasswordHash;

/// Iteration count for new hashes (OWASP recommendation for PBKDF2-HMAC-SHA256)
pub const DEFAULT_ITERATIONS: u32 = 600_000;

const SCHEME: &str = "pbkdf2-sha256";
const DIGEST_LEN: usize = 32;

/// Hashes and verifies user passwords.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    iterations: u32,
}

impl PasswordHasher {
    pub fn new() -> Self {
        Self::with_iterations(DEFAULT_ITERATIONS)
    }

    /// Hasher with a custom work factor. Values below 1 are raised to 1.
    pub fn with_iterations(iterations: u32) -> Self {
        Self {
            iterations: iterations.max(1),
        }
    }

    /// Hash `password` with a fresh random salt.
    pub fn hash(&self, password: &str) -> PasswordHash {
        let salt = Uuid::new_v4().into_bytes();
        let digest = derive(password, &salt, self.iterations);
        PasswordHash::from_encoded(format!(
            "{SCHEME}${}${}${}",
            self.iterations,
            hex::encode(salt),
            hex::encode(digest)
        ))
    }

    /// Check `password` against a stored hash.
    pub fn verify(&self, password: &str, hash: &PasswordHash) -> bool {
        let Some((iterations, salt, expected)) = parse(hash.as_str()) else {
            return false;
        };
        constant_time_eq(&derive(password, &salt, iterations), &expected)
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

fn derive(password: &str, salt: &[u8], iterations: u32) -> [u8; DIGEST_LEN] {
    let mut out = [0u8; DIGEST_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut out);
    out
}

fn parse(encoded: &str) -> Option<(u32, Vec<u8>, Vec<u8>)> {
    let mut parts = encoded.split('$');
    if parts.next()? != SCHEME {
        return None;
    }
    let iterations = parts.next()?.parse::<u32>().ok().filter(|n| *n > 0)?;
    let salt = hex::decode(parts.next()?).ok()?;
    let digest = hex::decode(parts.next()?).ok()?;
    if parts.next().is_some() || digest.len() != DIGEST_LEN {
        return None;
    }
    Some((iterations, salt, digest))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

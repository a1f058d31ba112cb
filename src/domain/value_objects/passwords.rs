use anyhow::{Result, bail};
use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha512};

use crate::domain::value_objects::random_codes::{SALT_LEN, random_salt};

pub const DIGEST_LEN: usize = 64;
pub const PASSWORD_HASH_LEN: usize = SALT_LEN + DIGEST_LEN;

/// Stored credential: `salt (32 bytes) || SHA-512(salt || utf8(password))`.
///
/// The layout must stay byte-compatible with credentials already stored.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash([u8; PASSWORD_HASH_LEN]);

impl PasswordHash {
    pub fn new<R: RngCore + CryptoRng + ?Sized>(rng: &mut R, cleartext: &str) -> Self {
        let salt = random_salt(rng);
        Self::with_salt(&salt, cleartext)
    }

    fn with_salt(salt: &[u8; SALT_LEN], cleartext: &str) -> Self {
        let mut blob = [0u8; PASSWORD_HASH_LEN];
        blob[..SALT_LEN].copy_from_slice(salt);
        blob[SALT_LEN..].copy_from_slice(&digest(salt, cleartext));
        Self(blob)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let blob: [u8; PASSWORD_HASH_LEN] = match bytes.try_into() {
            Ok(blob) => blob,
            Err(_) => bail!(
                "password hash must be {} bytes, got {}",
                PASSWORD_HASH_LEN,
                bytes.len()
            ),
        };
        Ok(Self(blob))
    }

    pub fn from_hex(encoded: &str) -> Result<Self> {
        Self::from_bytes(&hex::decode(encoded)?)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn salt(&self) -> &[u8] {
        &self.0[..SALT_LEN]
    }

    pub fn verify(&self, cleartext: &str) -> bool {
        let (salt, stored_digest) = self.0.split_at(SALT_LEN);
        digest(salt, cleartext)[..] == *stored_digest
    }
}

impl std::fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PasswordHash(..)")
    }
}

/// Checks `cleartext` against a stored hex blob. Anything that does not decode
/// to exactly 96 bytes never matches.
pub fn verify_stored_password(stored_hex: &str, cleartext: &str) -> bool {
    PasswordHash::from_hex(stored_hex)
        .map(|hash| hash.verify(cleartext))
        .unwrap_or(false)
}

fn digest(salt: &[u8], cleartext: &str) -> [u8; DIGEST_LEN] {
    let mut hasher = Sha512::new();
    hasher.update(salt);
    hasher.update(cleartext.as_bytes());

    let mut out = [0u8; DIGEST_LEN];
    out.copy_from_slice(&hasher.finalize());
    out
}

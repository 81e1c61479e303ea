//! Salted password hashing.
//!
//! The stored hash is `HMAC-SHA256(key = salt, message = password)` with a
//! random 16-byte salt per user. Verification compares in constant time.

use agora_types::PasswordHash;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

const SALT_LEN: usize = 16;

pub fn hash_password(password: &str) -> PasswordHash {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    PasswordHash {
        salt: hex::encode(salt),
        hash: hex::encode(digest(&salt, password)),
    }
}

/// False on mismatch or on a malformed stored hash.
pub fn verify_password(password: &str, stored: &PasswordHash) -> bool {
    let (Ok(salt), Ok(expected)) = (hex::decode(&stored.salt), hex::decode(&stored.hash)) else {
        return false;
    };
    let actual = digest(&salt, password);
    actual.ct_eq(expected.as_slice()).into()
}

fn digest(salt: &[u8], password: &str) -> Vec<u8> {
    // HMAC accepts keys of any length.
    let mut mac = match HmacSha256::new_from_slice(salt) {
        Ok(mac) => mac,
        Err(_) => return Vec::new(),
    };
    mac.update(password.as_bytes());
    mac.finalize().into_bytes().to_vec()
}

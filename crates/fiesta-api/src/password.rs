//! Credential hashing. One scheme project-wide: Argon2id over the
//! plaintext with a fresh 16-byte salt, stored as
//! `digest_hex + "." + salt_hex`. Credentials hashed under any other
//! scheme fail verification and must be re-hashed through the
//! password-change endpoint.

use argon2::Argon2;
use rand::RngCore;
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::ApiError;

const SALT_LEN: usize = 16;
const DIGEST_LEN: usize = 32;

#[derive(Debug, Error)]
#[error("password hashing failed")]
pub struct HashError;

impl From<HashError> for ApiError {
    fn from(err: HashError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

/// Hash `plaintext` with a fresh random salt. Two calls on the same input
/// produce different stored forms.
pub fn hash_password(plaintext: &str) -> Result<String, HashError> {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);

    let digest = derive(plaintext.as_bytes(), &salt)?;
    Ok(format!("{}.{}", hex::encode(digest), hex::encode(salt)))
}

/// Verify `plaintext` against a stored `digest.salt` form.
///
/// Fails closed: a missing separator, undecodable hex, an unexpected
/// digest length, or a KDF failure all return `false` rather than
/// surfacing an error the caller could mistake for anything other than a
/// failed verification. The digest comparison is constant-time.
pub fn verify_password(plaintext: &str, stored: &str) -> bool {
    let Some((digest_hex, salt_hex)) = stored.split_once('.') else {
        return false;
    };
    let Ok(stored_digest) = hex::decode(digest_hex) else {
        return false;
    };
    let Ok(salt) = hex::decode(salt_hex) else {
        return false;
    };
    let Ok(computed) = derive(plaintext.as_bytes(), &salt) else {
        return false;
    };

    if stored_digest.len() != computed.len() {
        return false;
    }
    computed.as_slice().ct_eq(stored_digest.as_slice()).into()
}

fn derive(plaintext: &[u8], salt: &[u8]) -> Result<[u8; DIGEST_LEN], HashError> {
    let mut out = [0u8; DIGEST_LEN];
    Argon2::default()
        .hash_password_into(plaintext, salt, &mut out)
        .map_err(|_| HashError)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_roundtrips() {
        let stored = hash_password("adminpass").unwrap();
        assert!(verify_password("adminpass", &stored));
    }

    #[test]
    fn wrong_password_fails() {
        let stored = hash_password("adminpass").unwrap();
        assert!(!verify_password("adminpass2", &stored));
        assert!(!verify_password("", &stored));
    }

    #[test]
    fn same_password_hashes_to_distinct_stored_forms() {
        let a = hash_password("adminpass").unwrap();
        let b = hash_password("adminpass").unwrap();
        assert_ne!(a, b);

        // Distinct salts, yet both verify.
        assert!(verify_password("adminpass", &a));
        assert!(verify_password("adminpass", &b));
    }

    #[test]
    fn stored_form_shape() {
        let stored = hash_password("adminpass").unwrap();
        let (digest_hex, salt_hex) = stored.split_once('.').unwrap();
        assert_eq!(digest_hex.len(), DIGEST_LEN * 2);
        assert_eq!(salt_hex.len(), SALT_LEN * 2);
        assert!(stored.chars().all(|c| c.is_ascii_hexdigit() || c == '.'));
    }

    #[test]
    fn malformed_stored_forms_fail_closed() {
        // No separator.
        assert!(!verify_password("adminpass", "deadbeef"));
        // Undecodable hex on either side.
        assert!(!verify_password("adminpass", "zzzz.00112233445566778899aabbccddeeff"));
        assert!(!verify_password("adminpass", "deadbeef.zzzz"));
        // Empty halves.
        assert!(!verify_password("adminpass", "."));
        assert!(!verify_password("adminpass", ""));
    }

    #[test]
    fn truncated_digest_is_a_non_match_not_a_crash() {
        let stored = hash_password("adminpass").unwrap();
        let (digest_hex, salt_hex) = stored.split_once('.').unwrap();
        let truncated = format!("{}.{}", &digest_hex[..digest_hex.len() - 2], salt_hex);
        assert!(!verify_password("adminpass", &truncated));
    }
}

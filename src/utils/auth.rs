//! Authentication utilities

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::core::AuthError;

const HASH_LENGTH: usize = 32;
const SALT_LENGTH: usize = 16;
const SCHEME: &str = "pbkdf2-sha256";

/// pbkdf2-sha256 password hashing with a random salt per hash.
///
/// Hashes are stored as `pbkdf2-sha256$<iterations>$<salt hex>$<hash hex>`, so
/// changing the configured iteration count does not invalidate existing ones.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    iterations: u32,
}

impl PasswordHasher {
    pub fn new(iterations: u32) -> Self {
        Self {
            iterations: iterations.max(1),
        }
    }

    /// hash a password using pbkdf2-sha256
    pub fn hash(&self, password: &str) -> String {
        let mut salt = [0u8; SALT_LENGTH];
        rand::thread_rng().fill_bytes(&mut salt);

        let hash = derive(password, &salt, self.iterations);
        format!(
            "{}${}${}${}",
            SCHEME,
            self.iterations,
            hex::encode(salt),
            hex::encode(hash)
        )
    }

    /// verify a password against a stored hash using constant-time comparison
    pub fn verify(&self, password: &str, stored: &str) -> Result<bool, AuthError> {
        let malformed = || AuthError::Hashing("stored password hash is malformed".to_string());

        let mut parts = stored.split('$');
        let (scheme, iterations, salt, hash) =
            match (parts.next(), parts.next(), parts.next(), parts.next(), parts.next()) {
                (Some(s), Some(i), Some(salt), Some(h), None) => (s, i, salt, h),
                _ => return Err(malformed()),
            };

        if scheme != SCHEME {
            return Err(malformed());
        }
        let iterations: u32 = iterations.parse().map_err(|_| malformed())?;
        let salt = hex::decode(salt).map_err(|_| malformed())?;
        let expected = hex::decode(hash).map_err(|_| malformed())?;

        let computed = derive(password, &salt, iterations);
        Ok(computed[..].ct_eq(&expected[..]).into())
    }
}

fn derive(password: &str, salt: &[u8], iterations: u32) -> [u8; HASH_LENGTH] {
    let mut hash = [0u8; HASH_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut hash);
    hash
}

/// generate a random string of the given length
pub fn generate_random_string(length: usize) -> String {
    use rand::Rng;
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_string() {
        let s1 = generate_random_string(32);
        let s2 = generate_random_string(32);

        assert_eq!(s1.len(), 32);
        assert_ne!(s1, s2);
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = PasswordHasher::new(1_000);
        let stored = hasher.hash("hunter2");

        assert!(stored.starts_with("pbkdf2-sha256$1000$"));
        assert!(!stored.contains("hunter2"));
        assert!(hasher.verify("hunter2", &stored).unwrap());
        assert!(!hasher.verify("hunter3", &stored).unwrap());
    }

    #[test]
    fn test_salt_differs_per_hash() {
        let hasher = PasswordHasher::new(1_000);
        assert_ne!(hasher.hash("same"), hasher.hash("same"));
    }

    #[test]
    fn test_verify_honours_stored_iterations() {
        let stored = PasswordHasher::new(500).hash("pw");
        assert!(PasswordHasher::new(2_000).verify("pw", &stored).unwrap());
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        let hasher = PasswordHasher::new(1_000);
        for stored in ["", "plain", "md5$1$00$00", "pbkdf2-sha256$x$00$00", "pbkdf2-sha256$1$zz$00"] {
            assert!(matches!(
                hasher.verify("pw", stored),
                Err(AuthError::Hashing(_))
            ));
        }
    }
}

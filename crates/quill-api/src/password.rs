use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};

/// Hash a password with Argon2id and a fresh random salt. The result is a
/// PHC string carrying its own parameters and salt.
pub fn hash_password(plaintext: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?;
    Ok(hash.to_string())
}

/// A digest that does not parse is treated as a mismatch.
pub fn verify_password(plaintext: &str, digest: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(digest) else {
        return false;
    };
    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_salted() {
        let a = hash_password("secret").unwrap();
        let b = hash_password("secret").unwrap();
        assert_ne!(a, "secret");
        assert_ne!(a, b);
    }

    #[test]
    fn verify_roundtrip() {
        let digest = hash_password("secret").unwrap();
        assert!(verify_password("secret", &digest));
        assert!(!verify_password("Secret", &digest));
        assert!(!verify_password("", &digest));
    }

    #[test]
    fn garbage_digest_never_verifies() {
        assert!(!verify_password("secret", "secret"));
        assert!(!verify_password("", ""));
    }
}

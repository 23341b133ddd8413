//! Password hashing and verification using bcrypt

use crate::core::error::{Result, ShelfError};

/// Longest password bcrypt will fully consume; anything past this is silently dropped
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Salted adaptive password hasher with a fixed work factor
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a password; the salt and cost are embedded in the result
    pub fn hash(&self, password: &str) -> Result<String> {
        bcrypt::hash(password, self.cost)
            .map_err(|e| ShelfError::HashingError(e.to_string()))
    }

    /// Verify a password against a stored hash.
    ///
    /// A hash that cannot be parsed counts as a mismatch, and so does a
    /// password longer than [`MAX_PASSWORD_BYTES`], which bcrypt would
    /// otherwise compare on its first 72 bytes only.
    pub fn verify(&self, hash: &str, password: &str) -> bool {
        if password.len() > MAX_PASSWORD_BYTES {
            return false;
        }

        match bcrypt::verify(password, hash) {
            Ok(matches) => matches,
            Err(e) => {
                tracing::warn!(error = %e, "Stored password hash could not be verified");
                false
            }
        }
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(4)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(8))]

        #[test]
        fn prop_hash_then_verify(password in "[ -~]{8,64}") {
            let h = hasher();
            let hash = h.hash(&password).unwrap();
            prop_assert!(h.verify(&hash, &password));
        }

        #[test]
        fn prop_different_password_fails(a in "[a-z]{8,32}", b in "[A-Z]{8,32}") {
            let h = hasher();
            let hash = h.hash(&a).unwrap();
            prop_assert!(!h.verify(&hash, &b));
        }
    }

    #[test]
    fn test_hash_is_not_plaintext_and_is_salted() {
        let h = hasher();
        let first = h.hash("longenough1").unwrap();
        let second = h.hash("longenough1").unwrap();
        assert_ne!(first, "longenough1");
        assert_ne!(first, second);
        assert!(first.starts_with("$2b$04$"));
    }

    #[test]
    fn test_suffix_past_byte_limit_is_mismatch() {
        let h = hasher();
        let stored = "a".repeat(MAX_PASSWORD_BYTES);
        let hash = h.hash(&stored).unwrap();

        assert!(h.verify(&hash, &stored));
        assert!(!h.verify(&hash, &format!("{}EXTRA", stored)));
    }

    #[test]
    fn test_malformed_hash_is_mismatch() {
        assert!(!hasher().verify("not-a-bcrypt-hash", "longenough1"));
        assert!(!hasher().verify("", "longenough1"));
    }

    #[test]
    fn test_invalid_cost_is_hashing_error() {
        let err = PasswordHasher::new(2).hash("longenough1").unwrap_err();
        assert!(matches!(err, ShelfError::HashingError(_)));
    }

    #[test]
    fn test_default_cost() {
        assert_eq!(PasswordHasher::default().cost(), bcrypt::DEFAULT_COST);
    }
}

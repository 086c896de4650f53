//! Password hashing with Argon2id.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};

use crate::{AuthError, AuthResult};

/// Fixed salt for the decoy hash computed when a login names no account.
const DECOY_SALT: &str = "ZXZlbnQtbWFuYWdlci1kZWNveQ";

/// Hashes and verifies user passwords.
#[derive(Debug, Clone)]
pub struct PasswordManager {
    params: Params,
}

impl Default for PasswordManager {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

impl PasswordManager {
    /// Creates a password manager with the recommended Argon2id parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a password manager with explicit cost parameters.
    pub fn with_params(memory_kib: u32, iterations: u32, parallelism: u32) -> AuthResult<Self> {
        let params = Params::new(memory_kib, iterations, parallelism, None)?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hashes a password into a PHC string with a fresh random salt.
    pub fn hash(&self, password: &str) -> AuthResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self.argon2().hash_password(password.as_bytes(), &salt)?;
        Ok(hash.to_string())
    }

    /// Checks a password against a stored PHC string.
    ///
    /// A malformed stored hash never matches.
    pub fn verify(&self, password: &str, stored_hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(stored_hash) else {
            tracing::warn!("Stored password hash could not be parsed");
            return false;
        };

        self.argon2()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    /// Checks a password for a login. `None` stands for an unknown account:
    /// the password is still hashed once so the reply takes as long as a
    /// real mismatch, and the result is always `false`.
    pub fn verify_login(&self, password: &str, stored_hash: Option<&str>) -> bool {
        match stored_hash {
            Some(stored_hash) => self.verify(password, stored_hash),
            None => {
                if let Ok(salt) = SaltString::from_b64(DECOY_SALT) {
                    let _ = self.argon2().hash_password(password.as_bytes(), &salt);
                }
                false
            }
        }
    }

    /// Runs [`hash`](Self::hash) on the blocking thread pool.
    pub async fn hash_blocking(&self, password: String) -> AuthResult<String> {
        let manager = self.clone();
        tokio::task::spawn_blocking(move || manager.hash(&password))
            .await
            .map_err(|e| AuthError::PasswordHash(format!("hashing task failed: {e}")))?
    }

    /// Runs [`verify_login`](Self::verify_login) on the blocking thread pool.
    pub async fn verify_login_blocking(
        &self,
        password: String,
        stored_hash: Option<String>,
    ) -> AuthResult<bool> {
        let manager = self.clone();
        tokio::task::spawn_blocking(move || manager.verify_login(&password, stored_hash.as_deref()))
            .await
            .map_err(|e| AuthError::PasswordHash(format!("verification task failed: {e}")))
    }
}

use std::fmt;
use subtle::ConstantTimeEq;
use thiserror::Error;

/// The single admin username/password pair, loaded once at startup.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

// Enum for all possible login failures. The messages are shown to the user as-is
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum LoginError {
    #[error("Invalid username")]
    InvalidUsername,

    #[error("Invalid password")]
    InvalidPassword,
}

impl Credentials {
    #[must_use]
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    /// Compares a login attempt against the configured pair, username first.
    ///
    /// # Errors
    ///
    /// Returns `LoginError::InvalidUsername` or `LoginError::InvalidPassword`
    /// for the first field that doesn't match.
    pub fn verify(&self, username: &str, password: &str) -> Result<(), LoginError> {
        if !bool::from(self.username.as_bytes().ct_eq(username.as_bytes())) {
            Err(LoginError::InvalidUsername)
        } else if !bool::from(self.password.as_bytes().ct_eq(password.as_bytes())) {
            Err(LoginError::InvalidPassword)
        } else {
            Ok(())
        }
    }
}

// Never print the password
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

//! Authentication state for the shell.
//!
//! Credentials are checked by an external [`Authenticator`]; the shell only
//! records whether someone is signed in. [`MockAuthenticator`] accepts any
//! well-formed email, which is all the companion app needs today.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Email address used to sign in
    pub email: String,
}

/// Whether pages may be opened.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    /// Only the login and signup forms are available
    #[default]
    Anonymous,
    /// All pages are available
    Authenticated(User),
}

impl AuthState {
    /// Returns the signed-in user, if any.
    pub fn user(&self) -> Option<&User> {
        match self {
            AuthState::Authenticated(user) => Some(user),
            AuthState::Anonymous => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }
}

/// Errors from the authentication collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The email address is empty or malformed.
    #[error("invalid email address: {0:?}")]
    InvalidEmail(String),

    /// The credentials were rejected.
    #[error("credentials rejected for {0}")]
    Rejected(String),
}

/// Checks credentials on behalf of the shell.
pub trait Authenticator {
    /// Signs in an existing account.
    fn login(&self, email: &str, password: &str) -> Result<User, AuthError>;

    /// Creates an account and signs it in.
    fn signup(&self, email: &str, password: &str) -> Result<User, AuthError>;
}

/// Accepts any well-formed email with any password.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockAuthenticator;

impl MockAuthenticator {
    fn accept(email: &str) -> Result<User, AuthError> {
        let email = email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(AuthError::InvalidEmail(email.to_string()));
        }
        Ok(User {
            email: email.to_string(),
        })
    }
}

impl Authenticator for MockAuthenticator {
    fn login(&self, email: &str, _password: &str) -> Result<User, AuthError> {
        Self::accept(email)
    }

    fn signup(&self, email: &str, _password: &str) -> Result<User, AuthError> {
        Self::accept(email)
    }
}

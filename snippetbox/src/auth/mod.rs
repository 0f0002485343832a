//! Authentication state and password handling
//!
//! The `authenticate` middleware resolves an [`AuthState`] for every dynamic
//! request from the user id kept in the session. Protected routes require
//! [`AuthState::Authenticated`].

pub mod password;

use crate::models::User;

/// The logged-in user, as resolved for the current request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// User id
    pub id: i64,
    /// Display name
    pub name: String,
    /// Login e-mail address
    pub email: String,
}

impl From<User> for Identity {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}

/// Whether the current request comes from a logged-in user
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthState {
    /// No user, or the session's user no longer exists
    #[default]
    Unauthenticated,
    /// Session refers to an existing account
    Authenticated(Identity),
}

impl AuthState {
    /// The identity, when authenticated
    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Authenticated(identity) => Some(identity),
            Self::Unauthenticated => None,
        }
    }

    /// True when a user is logged in
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

//! Server-side sessions
//!
//! A visitor's session is a set of JSON values stored under an opaque token
//! that travels in a cookie. [`SessionManager`] loads and saves sessions
//! through a pluggable [`SessionStore`] and makes sure only one request per
//! token runs at a time. Handlers work with the request-scoped [`Session`].

pub mod handle;
pub mod manager;
pub mod memory;
pub mod record;
pub mod sqlite;
pub mod store;

pub use handle::{Session, SessionStatus};
pub use manager::{CookieUpdate, SessionConfig, SessionLock, SessionManager};
pub use memory::MemoryStore;
pub use record::{SessionError, SessionId, SessionRecord};
pub use sqlite::SqliteStore;
pub use store::SessionStore;

/// Well-known session keys
pub mod keys {
    /// Id of the logged-in user
    pub const AUTHENTICATED_USER_ID: &str = "authenticatedUserID";
    /// One-shot message shown on the next rendered page
    pub const FLASH: &str = "flash";
    /// Anti-forgery token
    pub const CSRF_TOKEN: &str = "csrf_token";
    /// Page a visitor asked for before being sent to log in
    pub const REDIRECT_PATH_AFTER_LOGIN: &str = "redirectPathAfterLogin";
}

//! Middleware layers for snippetbox
//!
//! Provides middleware for:
//! - Panic recovery (generic 500, server keeps running)
//! - Request logging
//! - Security headers (fixed header set on every response)
//! - Session management (cookie-based sessions, per-token serialization)
//! - CSRF protection (session-scoped token validation)
//! - Authentication (identity resolution and route protection)
//!
//! [`chain`] assembles them in their fixed order.

pub mod auth;
pub mod chain;
pub mod csrf;
pub mod logging;
pub mod recover;
pub mod security_headers;
pub mod session;

pub use auth::{authenticate, require_authentication};
pub use csrf::{CsrfLayer, CsrfMiddleware, CSRF_FORM_FIELD, CSRF_HEADER_NAME};
pub use security_headers::{SecurityHeadersLayer, SecurityHeadersMiddleware};
pub use session::{SessionLayer, SessionMiddleware};

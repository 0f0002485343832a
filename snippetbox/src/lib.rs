//! snippetbox: publish and browse short text snippets
//!
//! A server-rendered web application with accounts and cookie sessions,
//! built on axum, sqlx (SQLite) and askama.
//!
//! Every request passes through an ordered middleware chain before reaching
//! a handler:
//!
//! 1. panic recovery
//! 2. request logging
//! 3. security headers
//! 4. session load and save (page routes)
//! 5. CSRF validation (page routes)
//! 6. identity resolution (page routes)
//! 7. login requirement (account routes)
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use snippetbox::{config::SnippetboxConfig, routes::routes, state::AppState};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = SnippetboxConfig::load(None)?;
//!     let addr = config.server.addr.clone();
//!     let state = AppState::connect(config).await?;
//!
//!     let listener = tokio::net::TcpListener::bind(addr).await?;
//!     axum::serve(listener, routes(state)).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod extractors;
pub mod forms;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod routes;
pub mod session;
pub mod state;
pub mod template;

//! Configuration management for snippetbox
//!
//! Configuration is loaded from several sources with clear precedence:
//!
//! 1. Command-line flags (highest priority, applied by the binary)
//! 2. Environment variables (`SNIPPETBOX_` prefix, `__` for nesting)
//! 3. `./config.toml`, or the file passed with `--config`
//! 4. Hardcoded defaults (fallback)
//!
//! # Example Configuration
//!
//! ```toml
//! [server]
//! addr = "0.0.0.0:4000"
//! static_dir = "./ui/static"
//!
//! [database]
//! url = "sqlite://snippetbox.db?mode=rwc"
//! max_connections = 5
//!
//! [session]
//! lifetime_secs = 43200
//! idle_timeout_secs = 1800
//! store = "sqlite"
//! ```
//!
//! Environment example: `SNIPPETBOX_SESSION__STORE=memory`.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Socket address to listen on
    pub addr: String,

    /// Directory served under `/static`
    pub static_dir: PathBuf,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:4000".to_string(),
            static_dir: PathBuf::from("./ui/static"),
        }
    }
}

/// Database connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// sqlx connection URL
    pub url: String,

    /// Pool size
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: "sqlite://snippetbox.db?mode=rwc".to_string(),
            max_connections: 5,
        }
    }
}

/// Where session records are kept
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    /// In-process map, lost on restart
    Memory,
    /// `sessions` table in the application database
    #[default]
    Sqlite,
}

/// SameSite cookie policy
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
    /// Strict same-site policy
    Strict,
    /// Lax same-site policy (recommended)
    #[default]
    Lax,
    /// No same-site restriction (requires Secure)
    None,
}

impl SameSite {
    /// Convert to cookie attribute string
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "Strict",
            Self::Lax => "Lax",
            Self::None => "None",
        }
    }
}

/// Session cookie and lifetime settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Name of the session cookie
    pub cookie_name: String,

    /// Absolute session lifetime in seconds
    pub lifetime_secs: u64,

    /// Inactivity timeout in seconds, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idle_timeout_secs: Option<u64>,

    /// Mark the cookie `Secure` (HTTPS only)
    pub secure: bool,

    /// SameSite policy of the cookie
    pub same_site: SameSite,

    /// Seconds between sweeps of expired sessions
    pub cleanup_interval_secs: u64,

    /// Backing store
    pub store: SessionBackend,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            cookie_name: "session".to_string(),
            lifetime_secs: 12 * 60 * 60,
            idle_timeout_secs: None,
            secure: !cfg!(debug_assertions),
            same_site: SameSite::Lax,
            cleanup_interval_secs: 5 * 60,
            store: SessionBackend::Sqlite,
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SnippetboxConfig {
    /// HTTP listener
    pub server: ServerSettings,

    /// Database
    pub database: DatabaseSettings,

    /// Sessions
    pub session: SessionSettings,
}

impl SnippetboxConfig {
    /// Load configuration from defaults, a TOML file and the environment
    ///
    /// `path` defaults to `./config.toml`; a missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is not valid TOML or a value has the
    /// wrong type.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use snippetbox::config::SnippetboxConfig;
    ///
    /// # fn example() -> anyhow::Result<()> {
    /// let config = SnippetboxConfig::load(None)?;
    /// println!("listening on {}", config.server.addr);
    /// # Ok(())
    /// # }
    /// ```
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = path.unwrap_or_else(|| Path::new("./config.toml"));
        let config = Figment::new()
            .merge(Toml::string(&toml::to_string(&Self::default())?))
            .merge(Toml::file(path))
            .merge(Env::prefixed("SNIPPETBOX_").split("__").lowercase(true))
            .extract()?;

        Ok(config)
    }

    /// Configuration for tests: in-memory database and session store
    #[must_use]
    pub fn for_tests() -> Self {
        Self {
            server: ServerSettings::default(),
            database: DatabaseSettings {
                url: "sqlite::memory:".to_string(),
                max_connections: 1,
            },
            session: SessionSettings {
                store: SessionBackend::Memory,
                secure: false,
                ..SessionSettings::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = SnippetboxConfig::default();
        assert_eq!(config.server.addr, "127.0.0.1:4000");
        assert_eq!(config.session.lifetime_secs, 43_200);
        assert_eq!(config.session.idle_timeout_secs, None);
        assert_eq!(config.session.store, SessionBackend::Sqlite);
        assert_eq!(config.session.same_site, SameSite::Lax);

        #[cfg(debug_assertions)]
        assert!(!config.session.secure);
    }

    #[test]
    fn test_defaults_survive_toml_round_trip() {
        let rendered = toml::to_string(&SnippetboxConfig::default()).unwrap();
        let parsed: SnippetboxConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.database.url, SnippetboxConfig::default().database.url);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[server]\naddr = \"0.0.0.0:8080\"\n\n[session]\nstore = \"memory\"\nidle_timeout_secs = 900"
        )
        .unwrap();

        let config = SnippetboxConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.server.addr, "0.0.0.0:8080");
        assert_eq!(config.session.store, SessionBackend::Memory);
        assert_eq!(config.session.idle_timeout_secs, Some(900));
        assert_eq!(config.database.max_connections, 5);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = SnippetboxConfig::load(Some(Path::new("/nonexistent/snippetbox.toml"))).unwrap();
        assert_eq!(config.session.cookie_name, "session");
    }

    #[test]
    fn test_same_site_as_str() {
        assert_eq!(SameSite::Strict.as_str(), "Strict");
        assert_eq!(SameSite::Lax.as_str(), "Lax");
        assert_eq!(SameSite::None.as_str(), "None");
    }
}

//! Server configuration module.
//!
//! This module provides configuration loading for the Conduit server from
//! environment variables.
//!
//! # Environment Variables
//!
//! - `CONDUIT_SECRET`: Shared secret used to sign and verify session tokens (required)
//! - `CONDUIT_LISTEN_PORT`: Port to listen on (default: `3000`)
//!
//! # Invariants
//!
//! - `secret` is never empty
//! - `listen_port` is always a valid port number
//! - Configuration is read once at startup and never changes afterwards

/// Server configuration.
///
/// # Pre-conditions
///
/// When constructed via `from_env()`:
/// - All required environment variables must be set
/// - All values must be valid for their respective types
#[derive(Clone)]
pub struct ServerConfig {
    /// Shared HS256 secret for session tokens.
    pub secret: Vec<u8>,
    /// Port to listen on for HTTP connections.
    pub listen_port: u16,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("secret", &"<redacted>")
            .field("listen_port", &self.listen_port)
            .finish()
    }
}

/// Error returned when loading configuration fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable is missing.
    MissingEnvVar(String),
    /// An environment variable has an invalid value.
    InvalidValue { name: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingEnvVar(name) => {
                write!(f, "missing required environment variable: {name}")
            }
            Self::InvalidValue { name, message } => {
                write!(f, "invalid value for {name}: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl ServerConfig {
    /// Default port for the server.
    pub const DEFAULT_PORT: u16 = 3000;

    const SECRET_VAR: &'static str = "CONDUIT_SECRET";
    const PORT_VAR: &'static str = "CONDUIT_LISTEN_PORT";

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `CONDUIT_SECRET` is not set or is empty
    /// - `CONDUIT_LISTEN_PORT` is set but not a valid port number
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup` instead of the process environment.
    ///
    /// # Errors
    ///
    /// Same as [`ServerConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let secret = Self::parse_secret(lookup(Self::SECRET_VAR))?;
        let listen_port = Self::parse_listen_port(lookup(Self::PORT_VAR))?;

        Ok(Self {
            secret,
            listen_port,
        })
    }

    /// The secret is required and must not be empty.
    fn parse_secret(value: Option<String>) -> Result<Vec<u8>, ConfigError> {
        let secret = value.ok_or_else(|| ConfigError::MissingEnvVar(Self::SECRET_VAR.to_string()))?;

        if secret.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: Self::SECRET_VAR.to_string(),
                message: "must not be empty".to_string(),
            });
        }

        Ok(secret.into_bytes())
    }

    /// Returns the default if not set.
    fn parse_listen_port(value: Option<String>) -> Result<u16, ConfigError> {
        match value {
            Some(value) => match value.parse::<u16>() {
                Ok(port) if port != 0 => Ok(port),
                _ => Err(ConfigError::InvalidValue {
                    name: Self::PORT_VAR.to_string(),
                    message: format!("'{value}' is not a valid port number (must be 1-65535)"),
                }),
            },
            None => Ok(Self::DEFAULT_PORT),
        }
    }
}

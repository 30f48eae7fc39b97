use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::account::otp::DEFAULT_OTP_TTL_SECS;
use crate::session::DEFAULT_TOKEN_TTL_SECS;

pub const DEFAULT_JWT_SECRET: &str = "dev-secret-change-me";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid value for {key}: {value}")]
    InvalidEnv { key: &'static str, value: String },
    #[error("{key} must be between 1 and {max} seconds, got {value}")]
    TtlOutOfRange {
        key: &'static str,
        value: u64,
        max: u64,
    },
}

/// Upper bound for any configured lifetime: ten years
pub const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub hashing: HashingConfig,
    pub mail: MailConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Echo OTPs in API responses. Local testing only.
    pub expose_otp: bool,
    pub otp_ttl_secs: u64,
    pub token_ttl_secs: u64,
}

/// Argon2id cost parameters
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct HashingConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

/// Mail relay settings. Without a `relay_url` OTPs only go to the log.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct MailConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relay_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    pub service: String,
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            expose_otp: false,
            otp_ttl_secs: DEFAULT_OTP_TTL_SECS,
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
        }
    }
}

impl Default for HashingConfig {
    fn default() -> Self {
        // argon2 crate defaults (OWASP minimum)
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            relay_url: None,
            from: None,
            service: "gmail".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Where the loaded configuration came from
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigOrigin {
    File(PathBuf),
    CreatedDefault(PathBuf),
    Defaults,
}

impl ApiConfig {
    /// Read `path` if it exists, otherwise write a default config there.
    /// A file that exists but does not parse is an error.
    pub fn load_or_default(path: &Path) -> Result<(Self, ConfigOrigin), ConfigError> {
        if path.exists() {
            let s = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            let config = toml::from_str(&s).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
            Ok((config, ConfigOrigin::File(path.to_path_buf())))
        } else {
            let config = Self::default();
            let origin = match toml::to_string_pretty(&config) {
                Ok(s) if std::fs::write(path, &s).is_ok() => {
                    ConfigOrigin::CreatedDefault(path.to_path_buf())
                }
                _ => ConfigOrigin::Defaults,
            };
            Ok((config, origin))
        }
    }

    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Environment-style overrides from any lookup function
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            self.server.port = port.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                key: "PORT",
                value: port,
            })?;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.server.log_level = level;
        }
        if let Some(secret) = lookup("JWT_SECRET").filter(|s| !s.is_empty()) {
            self.auth.jwt_secret = secret;
        }
        if let Some(expose) = lookup("EXPOSE_OTP") {
            // Only the exact string "true" turns it on
            self.auth.expose_otp = expose == "true";
        }
        if let Some(url) = lookup("EMAIL_RELAY_URL").filter(|s| !s.is_empty()) {
            self.mail.relay_url = Some(url);
        }
        if let Some(from) = lookup("EMAIL_FROM").or_else(|| lookup("EMAIL_USER")) {
            self.mail.from = Some(from);
        }
        if let Some(service) = lookup("EMAIL_SERVICE") {
            self.mail.service = service;
        }
        Ok(())
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("auth.otp_ttl_secs", self.auth.otp_ttl_secs),
            ("auth.token_ttl_secs", self.auth.token_ttl_secs),
        ] {
            if value == 0 || value > MAX_TTL_SECS {
                return Err(ConfigError::TtlOutOfRange {
                    key,
                    value,
                    max: MAX_TTL_SECS,
                });
            }
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.bind, self.server.port)
    }

    pub fn uses_default_secret(&self) -> bool {
        self.auth.jwt_secret == DEFAULT_JWT_SECRET
    }
}

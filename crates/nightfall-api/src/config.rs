//! Process configuration read from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;

use nightfall_roles::application::wake_order_source::{BASE_VARIANT, YamlWakeOrderSource};
use tracing::warn;

use crate::error::AppError;

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// PostgreSQL URL; the in-memory snapshot store is used without one.
    pub database_url: Option<String>,
    /// YAML document of per-variant wake orders.
    pub wake_order_file: Option<PathBuf>,
    /// Variant used when a start request names none.
    pub game_variant: String,
    /// Merge base-role wake orders under the variant's.
    pub include_base_roles: bool,
}

impl AppConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `PORT` or `INCLUDE_BASE_ROLES` does not
    /// parse.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `PORT` or `INCLUDE_BASE_ROLES` does not
    /// parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match non_empty("PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|e| AppError::Config(format!("PORT must be a valid u16: {e}")))?,
            None => 3000,
        };
        let include_base_roles = match non_empty("INCLUDE_BASE_ROLES") {
            Some(raw) => raw.parse().map_err(|e| {
                AppError::Config(format!("INCLUDE_BASE_ROLES must be true or false: {e}"))
            })?,
            None => true,
        };

        Ok(Self {
            host: non_empty("HOST").unwrap_or_else(|| "0.0.0.0".to_owned()),
            port,
            database_url: non_empty("DATABASE_URL"),
            wake_order_file: non_empty("WAKE_ORDER_FILE").map(PathBuf::from),
            game_variant: non_empty("GAME_VARIANT").unwrap_or_else(|| BASE_VARIANT.to_owned()),
            include_base_roles,
        })
    }

    /// Address to listen on.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `HOST:PORT` is not a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }

    /// Wake-order source for this process. A missing, unreadable or
    /// malformed `WAKE_ORDER_FILE` yields an empty source, so every variant
    /// falls back to the canonical order.
    #[must_use]
    pub fn wake_order_source(&self) -> YamlWakeOrderSource {
        let Some(path) = &self.wake_order_file else {
            warn!("WAKE_ORDER_FILE not set, every variant uses the canonical wake order");
            return YamlWakeOrderSource::default();
        };
        YamlWakeOrderSource::from_path(path).unwrap_or_else(|e| {
            warn!(
                path = %path.display(),
                error = %e,
                "wake order file unusable, every variant uses the canonical wake order"
            );
            YamlWakeOrderSource::default()
        })
    }
}

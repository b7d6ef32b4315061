//! Configuration sources for connections opened without an explicit
//! [`Config`].
//!
//! The client runs inside other processes, so the loaders here never read the
//! host's command line. Settings come from configuration files and `IRODS_*`
//! environment variables layered over the built-in defaults.

use std::ffi::OsString;

use irods_config::Config;
use ortho_config::OrthoConfig;

use crate::ClientError;

const PROGRAM_NAME: &str = env!("CARGO_PKG_NAME");

/// Source of the [`Config`] used to open a session.
pub trait ConfigLoader {
    /// Produces the configuration for a new session.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::LoadConfiguration`] when a configuration layer
    /// is malformed.
    fn load(&self) -> Result<Config, ClientError>;
}

/// Loads configuration through `ortho_config` from files and environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct OrthoConfigLoader;

impl ConfigLoader for OrthoConfigLoader {
    fn load(&self) -> Result<Config, ClientError> {
        Config::load_from_iter([OsString::from(PROGRAM_NAME)])
            .map_err(ClientError::LoadConfiguration)
    }
}

/// Hands out a fixed configuration.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps `config`.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, ClientError> {
        Ok(self.config.clone())
    }
}

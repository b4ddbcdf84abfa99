//! CLI configuration

use crate::error::{CliError, CliResult};
use daydream_fakeapi::ResponderConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// CLI verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Verbosity {
    /// Quiet - errors only
    Quiet,
    /// Normal - default output
    #[default]
    Normal,
    /// Verbose - every intercepted request
    Verbose,
    /// Debug - maximum output
    Debug,
}

impl Verbosity {
    /// Map `-q` and the `-v` count to a level
    #[must_use]
    pub const fn from_flags(quiet: bool, verbose: u8) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Debug,
        }
    }

    /// Default tracing filter for this level
    #[must_use]
    pub const fn filter(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "info",
            Self::Verbose => "info,daydream_fakeapi=debug",
            Self::Debug => "debug",
        }
    }
}

/// Settings read from a YAML file; every key is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Responder settings
    pub responder: ResponderConfig,
    /// Port the fake homeserver listens on
    pub port: Option<u16>,
    /// Directory the wasm asset is served from
    pub assets: Option<PathBuf>,
}

impl FileConfig {
    /// Parse YAML text
    pub fn from_yaml(text: &str) -> CliResult<Self> {
        Ok(serde_yaml_ng::from_str(text)?)
    }

    /// Load from a file
    pub fn load(path: &Path) -> CliResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            CliError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml(&text)
    }

    /// Load from a file if a path was given, defaults otherwise
    pub fn load_optional(path: Option<&Path>) -> CliResult<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    /// Render as YAML
    pub fn to_yaml(&self) -> CliResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }
}

/// Flag overrides applied on top of the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Homeserver base URL
    pub homeserver: Option<String>,
    /// Sync delay in milliseconds
    pub delay_ms: Option<u64>,
    /// Listen port
    pub port: Option<u16>,
    /// Assets directory
    pub assets: Option<PathBuf>,
}

impl FileConfig {
    /// Apply flag overrides and validate the result
    pub fn with_overrides(mut self, overrides: Overrides) -> CliResult<Self> {
        if let Some(homeserver) = overrides.homeserver {
            self.responder.homeserver_url = homeserver;
        }
        if let Some(delay_ms) = overrides.delay_ms {
            self.responder.sync_delay_ms = delay_ms;
        }
        if overrides.port.is_some() {
            self.port = overrides.port;
        }
        if overrides.assets.is_some() {
            self.assets = overrides.assets;
        }
        self.responder.validate()?;
        Ok(self)
    }
}

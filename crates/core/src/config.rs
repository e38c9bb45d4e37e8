//! Engine configuration.
//!
//! Values come from, in priority order: environment variables, then a TOML
//! file. Every limit is unset by default.
//!
//! ```toml
//! [limits]
//! max_description_len = 1024
//! max_proposals = 100
//! ```

use confique::Config;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

#[derive(Clone, Debug, Default, PartialEq, Eq, Config, Serialize, Deserialize)]
pub struct EngineConfig {
    #[config(nested)]
    pub limits: LimitsConfig,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Config, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Longest accepted proposal description, in characters, after trimming.
    /// Unbounded when unset.
    #[config(env = "EZPOLL_MAX_DESCRIPTION_LEN")]
    pub max_description_len: Option<usize>,

    /// Maximum number of submitted proposals (the sentinel does not count).
    /// Unbounded when unset.
    #[config(env = "EZPOLL_MAX_PROPOSALS")]
    pub max_proposals: Option<usize>,
}

impl EngineConfig {
    /// Load from the environment and `path`.
    /// A missing file is not an error.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::builder().env().file(path.as_ref()).load()?)
    }

    /// Load from `path` only, ignoring the environment.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::builder().file(path.as_ref()).load()?)
    }

    /// Render as TOML, e.g. to write a config template.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

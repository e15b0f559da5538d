//! Validator configuration files.
//!
//! ```json
//! {
//!   "delimiters": [{ "open": "$$", "close": "$$", "displayMode": true }],
//!   "macros": { "\\RR": "\\mathbb{R}" }
//! }
//! ```
//!
//! Both keys are optional. A `delimiters` list replaces the default table.

use crate::delimiters::{DelimiterSpec, DelimiterTable, DelimiterTableError};
use mathguard_engine::MacroMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    #[serde(default)]
    pub delimiters: Option<Vec<DelimiterSpec>>,
    #[serde(default)]
    pub macros: Option<MacroMap>,
}

impl ValidatorConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The configured table, or a copy of the default one.
    pub fn delimiter_table(&self) -> Result<DelimiterTable, DelimiterTableError> {
        match &self.delimiters {
            Some(specs) => DelimiterTable::new(specs.clone()),
            None => Ok(DelimiterTable::default()),
        }
    }

    /// Adds or replaces a macro. Later definitions win.
    pub fn define_macro(&mut self, name: impl Into<String>, body: impl Into<String>) {
        self.macros
            .get_or_insert_with(MacroMap::new)
            .insert(name.into(), body.into());
    }
}

//! Rule documents on disk.

use std::path::{Path, PathBuf};

use thiserror::Error;

use warden_auth::{PermissionSet, SharedPermissions};
use warden_core::{ConfigError, ConfigResult};

#[derive(Debug, Error)]
pub enum RulesFileError {
    #[error("failed to read rules file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid rules file {path}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: ConfigError,
    },
}

/// A JSON rule document (see [`warden_auth::RuleDeclaration`]).
#[derive(Debug, Clone)]
pub struct RulesFile {
    path: PathBuf,
}

impl RulesFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<String, RulesFileError> {
        tracing::debug!(path = %self.path.display(), "reading rules file");
        std::fs::read_to_string(&self.path).map_err(|source| RulesFileError::Read {
            path: self.path.clone(),
            source,
        })
    }

    fn invalid(&self, source: ConfigError) -> RulesFileError {
        RulesFileError::Invalid {
            path: self.path.clone(),
            source,
        }
    }

    /// Append the file's rules to the published set.
    pub fn load_into(&self, shared: &SharedPermissions) -> Result<usize, RulesFileError> {
        let content = self.read()?;
        let mut added = 0;
        shared
            .update(|set| {
                added = set.load_json(&content)?;
                Ok(())
            })
            .map_err(|e| self.invalid(e))?;
        Ok(added)
    }

    /// Replace the published set with `base` rules followed by the file's rules,
    /// in one swap. On any error the previous set stays in effect.
    pub fn reload<F>(&self, shared: &SharedPermissions, base: F) -> Result<usize, RulesFileError>
    where
        F: FnOnce(&mut PermissionSet) -> ConfigResult<usize>,
    {
        let content = self.read()?;
        let mut next = PermissionSet::new();
        let mut added = base(&mut next).map_err(|e| self.invalid(e))?;
        added += next.load_json(&content).map_err(|e| self.invalid(e))?;
        shared.publish(next);
        tracing::info!(path = %self.path.display(), rules = added, "rules file reloaded");
        Ok(added)
    }
}

//! Resource file loading

use super::schema::ResourceFile;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Standard locations searched by [`ResourceFile::discover`]
pub const RESOURCE_FILE_CANDIDATES: [&str; 3] =
    [".apiwrap.toml", "apiwrap.toml", ".config/apiwrap.toml"];

impl ResourceFile {
    /// Load a resource file. `.json` files are parsed as JSON, anything else
    /// as TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let file = if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json_str(&content)?
        } else {
            Self::from_toml_str(&content)?
        };

        debug!(
            path = %path.display(),
            resources = file.resources.len(),
            "Loaded resource file"
        );
        Ok(file)
    }

    /// Load the first resource file found in the standard locations
    pub fn discover() -> Result<Option<Self>> {
        find_resource_file().map(Self::load).transpose()
    }

    /// Parse a TOML resource file
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: Self = toml::from_str(content)?;
        file.validate()?;
        Ok(file)
    }

    /// Parse a JSON resource file
    pub fn from_json_str(content: &str) -> Result<Self> {
        let file: Self = serde_json::from_str(content)?;
        file.validate()?;
        Ok(file)
    }

    /// Validate the resource file
    pub fn validate(&self) -> Result<()> {
        if self.api_root.is_empty() && self.roots.is_empty() {
            return Err(Error::config("api_root cannot be empty"));
        }

        for (name, resource) in &self.resources {
            if resource.resource.is_empty() {
                return Err(Error::config(format!(
                    "resource '{name}' has an empty template"
                )));
            }
            if resource.resource.matches('{').count() != resource.resource.matches('}').count() {
                return Err(Error::config(format!(
                    "resource '{name}' has unbalanced placeholders"
                )));
            }
        }

        Ok(())
    }
}

/// Find a resource file in the standard locations
#[must_use]
pub fn find_resource_file() -> Option<PathBuf> {
    RESOURCE_FILE_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|candidate| candidate.exists())
}

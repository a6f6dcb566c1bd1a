//! Resource descriptor schema
//!
//! ```toml
//! api_root = "https://api.example.org"
//!
//! [resources.user]
//! resource = "user/{id}/"
//! docs = "https://example.org/docs/user"
//! ```

use crate::naming::title_case;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Named resources of an API, ordered by name
pub type ResourceMapping = BTreeMap<String, Resource>;

/// One named endpoint: a URL template plus documentation metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// URL template relative to the API root, with `{name}` placeholders
    pub resource: String,

    /// Documentation URL
    #[serde(default)]
    pub docs: String,

    /// Any further metadata
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl Resource {
    /// Create a resource from its URL template
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            resource: template.into(),
            docs: String::new(),
            extra: BTreeMap::new(),
        }
    }

    /// Builder-style method to set the documentation URL
    #[must_use]
    pub fn with_docs(mut self, docs: impl Into<String>) -> Self {
        self.docs = docs.into();
        self
    }

    /// Builder-style method to attach a metadata entry
    #[must_use]
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Names of the `{placeholder}` segments in the template, in order
    #[must_use]
    pub fn placeholders(&self) -> Vec<&str> {
        let mut names = Vec::new();
        let mut rest = self.resource.as_str();
        while let Some(start) = rest.find('{') {
            let after = &rest[start + 1..];
            let Some(end) = after.find('}') else { break };
            names.push(&after[..end]);
            rest = &after[end + 1..];
        }
        names
    }

    /// Human-readable description built from the descriptor.
    ///
    /// Template and docs come first, followed by the extra metadata sorted by
    /// key with title-cased keys.
    #[must_use]
    pub fn describe(&self) -> String {
        let mut doc = format!("Resource: {}\nDocs: {}\n", self.resource, self.docs);
        for (key, value) in &self.extra {
            doc.push_str(&format!("{}: {}\n", title_case(key), value));
        }
        doc.trim().to_string()
    }
}

/// Contents of a resource file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceFile {
    /// Root URL every resource template is joined onto
    #[serde(default)]
    pub api_root: String,

    /// Optional per-resource root overrides
    #[serde(default)]
    pub roots: BTreeMap<String, String>,

    /// The resource map
    #[serde(default)]
    pub resources: ResourceMapping,
}

impl ResourceFile {
    /// Root URL for a resource, honouring per-resource overrides
    #[must_use]
    pub fn root_for(&self, resource_name: &str) -> &str {
        self.roots
            .get(resource_name)
            .map_or(self.api_root.as_str(), String::as_str)
    }
}

//! Resource descriptors and resource file loading
//!
//! A resource map can be declared in code or loaded from a TOML/JSON file.

mod loader;
mod schema;

pub use loader::{find_resource_file, RESOURCE_FILE_CANDIDATES};
pub use schema::*;

// Tool catalog: the descriptors advertised through tools/list

use crate::protocol::ToolDescriptor;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Catalog documents in load order: primary, administrative, identity federation.
pub const CATALOG_FILES: [&str; 3] = ["tools.json", "admin-tools.json", "oauth-tools.json"];

static EMBEDDED: [(&str, &str); 3] = [
    ("tools.json", include_str!("../../catalog/tools.json")),
    ("admin-tools.json", include_str!("../../catalog/admin-tools.json")),
    ("oauth-tools.json", include_str!("../../catalog/oauth-tools.json")),
];

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog source {0} not found")]
    NotFound(PathBuf),

    #[error("failed to read catalog source {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("catalog source {origin} is not a valid tool document: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Where one catalog document comes from.
#[derive(Debug, Clone)]
pub enum CatalogSource {
    File(PathBuf),
    Embedded { origin: &'static str, json: &'static str },
}

impl CatalogSource {
    /// The standard documents read from `dir`.
    pub fn directory(dir: &Path) -> Vec<Self> {
        CATALOG_FILES
            .iter()
            .map(|name| Self::File(dir.join(name)))
            .collect()
    }

    /// The standard documents compiled into the binary.
    pub fn embedded() -> Vec<Self> {
        EMBEDDED
            .iter()
            .map(|&(origin, json)| Self::Embedded { origin, json })
            .collect()
    }

    pub fn origin(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Embedded { origin, .. } => format!("embedded:{}", origin),
        }
    }

    fn read(&self) -> Result<Vec<ToolDescriptor>, CatalogError> {
        let text = match self {
            Self::File(path) => match std::fs::read_to_string(path) {
                Ok(text) => text,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Err(CatalogError::NotFound(path.clone()))
                }
                Err(source) => {
                    return Err(CatalogError::Io {
                        path: path.clone(),
                        source,
                    })
                }
            },
            Self::Embedded { json, .. } => (*json).to_string(),
        };

        let document: CatalogDocument =
            serde_json::from_str(&text).map_err(|source| CatalogError::Parse {
                origin: self.origin(),
                source,
            })?;
        Ok(document.tools)
    }
}

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    #[serde(default)]
    tools: Vec<ToolDescriptor>,
}

/// Immutable, ordered set of tool descriptors.
///
/// Names are unique: when two sources declare the same tool, the first one
/// loaded wins and the later declaration is dropped with a warning.
#[derive(Debug, Clone, Default)]
pub struct ToolCatalog {
    tools: Vec<ToolDescriptor>,
    index: HashMap<String, usize>,
}

impl ToolCatalog {
    /// Load every source in order. Unreadable sources are skipped, never fatal.
    pub fn load(sources: &[CatalogSource]) -> Self {
        let mut catalog = Self::default();

        for source in sources {
            match source.read() {
                Ok(descriptors) => {
                    debug!(origin = %source.origin(), count = descriptors.len(), "Loaded catalog source");
                    for descriptor in descriptors {
                        catalog.register(descriptor, source);
                    }
                }
                Err(e) => warn!(error = %e, "Skipping catalog source"),
            }
        }

        catalog
    }

    fn register(&mut self, descriptor: ToolDescriptor, source: &CatalogSource) {
        if self.index.contains_key(&descriptor.name) {
            warn!(
                tool = %descriptor.name,
                origin = %source.origin(),
                "Duplicate tool declaration ignored, keeping the first one"
            );
            return;
        }
        self.index.insert(descriptor.name.clone(), self.tools.len());
        self.tools.push(descriptor);
    }

    /// All descriptors, in load order.
    pub fn list(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

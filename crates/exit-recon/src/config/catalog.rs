use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::workflows::offboarding::adapters::{RequestShape, SystemDescriptor};
use crate::workflows::offboarding::normalizer::StatusDomain;

const ENV_PREFIX: &str = "env:";

/// Immutable set of downstream systems, iterated in declaration order.
#[derive(Debug, Clone, Default)]
pub struct SystemCatalog {
    systems: Vec<SystemDescriptor>,
}

impl SystemCatalog {
    pub fn from_descriptors(
        descriptors: impl IntoIterator<Item = SystemDescriptor>,
    ) -> Result<Self, CatalogError> {
        let mut catalog = Self::default();
        for descriptor in descriptors {
            if catalog.systems.iter().any(|known| known.id == descriptor.id) {
                return Err(CatalogError::DuplicateId(descriptor.id.to_string()));
            }
            catalog.systems.push(descriptor);
        }
        Ok(catalog)
    }

    /// Load `path`, resolving `env:NAME` values from the process environment.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path, |name| std::env::var(name).ok())
    }

    pub fn parse(
        text: &str,
        path: &Path,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, CatalogError> {
        let mut document: toml::Table =
            toml::from_str(text).map_err(|source| CatalogError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let mut missing = BTreeSet::new();
        for (_, value) in document.iter_mut() {
            resolve_env(value, &lookup, &mut missing);
        }
        if !missing.is_empty() {
            return Err(CatalogError::MissingEnv(missing.into_iter().collect()));
        }

        let file: CatalogFile = toml::Value::Table(document)
            .try_into()
            .map_err(|source| CatalogError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        Self::from_descriptors(file.system.into_iter().map(SystemEntry::into_descriptor))
    }

    pub fn iter(&self) -> impl Iterator<Item = &SystemDescriptor> {
        self.systems.iter()
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    system: Vec<SystemEntry>,
}

#[derive(Debug, Deserialize)]
struct SystemEntry {
    id: String,
    label: String,
    url: String,
    #[serde(default)]
    status_domain: Option<StatusDomain>,
    #[serde(default)]
    headers: BTreeMap<String, String>,
    request: RequestShape,
}

impl SystemEntry {
    fn into_descriptor(self) -> SystemDescriptor {
        let mut descriptor = match self.request {
            RequestShape::Batched {
                result_key,
                envelope,
            } => {
                let descriptor =
                    SystemDescriptor::batched(&self.id, &self.label, &self.url, &result_key);
                match envelope {
                    Some(envelope) => descriptor.with_envelope(&envelope),
                    None => descriptor,
                }
            }
            RequestShape::PerEmployee { service_key } => {
                SystemDescriptor::per_employee(&self.id, &self.label, &self.url, &service_key)
            }
        };

        descriptor.headers.extend(self.headers);
        if let Some(domain) = self.status_domain {
            descriptor.status_domain = domain;
        }
        descriptor
    }
}

/// Replace every `env:NAME` string in place, recording names that are not set.
fn resolve_env(
    value: &mut toml::Value,
    lookup: &impl Fn(&str) -> Option<String>,
    missing: &mut BTreeSet<String>,
) {
    match value {
        toml::Value::String(text) => {
            if let Some(name) = text.strip_prefix(ENV_PREFIX) {
                let name = name.trim().to_string();
                match lookup(&name) {
                    Some(resolved) => *text = resolved,
                    None => {
                        missing.insert(name);
                    }
                }
            }
        }
        toml::Value::Array(items) => {
            for item in items.iter_mut() {
                resolve_env(item, lookup, missing);
            }
        }
        toml::Value::Table(table) => {
            for (_, item) in table.iter_mut() {
                resolve_env(item, lookup, missing);
            }
        }
        _ => {}
    }
}

#[derive(Debug)]
pub enum CatalogError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// Every unset variable referenced by the catalog, sorted by name.
    MissingEnv(Vec<String>),
    DuplicateId(String),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::Read { path, .. } => {
                write!(f, "unable to read system catalog {}", path.display())
            }
            CatalogError::Parse { path, source } => {
                write!(f, "invalid system catalog {}: {}", path.display(), source)
            }
            CatalogError::MissingEnv(names) => write!(
                f,
                "system catalog references unset environment variables: {}",
                names.join(", ")
            ),
            CatalogError::DuplicateId(id) => write!(f, "system '{id}' is declared more than once"),
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::Read { source, .. } => Some(source),
            CatalogError::Parse { source, .. } => Some(source),
            CatalogError::MissingEnv(_) | CatalogError::DuplicateId(_) => None,
        }
    }
}

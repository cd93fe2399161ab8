//! Loading the category-mapping resource, with the built-in default as the
//! fallback when it is missing or malformed.

use sniffer_core::{CategoryMappingConfig, MappingError};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

/// Read and validate a mapping document.
pub fn load_mapping(path: &Path) -> Result<CategoryMappingConfig, MappingError> {
    let text = fs::read_to_string(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => MappingError::Missing(path.to_path_buf()),
        _ => MappingError::Unreadable {
            path: path.to_path_buf(),
            source,
        },
    })?;
    CategoryMappingConfig::from_json_str(&text)
}

/// Like [`load_mapping`], but never fails: problems are logged and the
/// built-in default mapping is returned.
pub fn load_mapping_or_default(path: Option<&Path>) -> CategoryMappingConfig {
    let Some(path) = path else {
        info!("no category mapping configured; using built-in default");
        return CategoryMappingConfig::default();
    };

    match load_mapping(path) {
        Ok(config) => {
            info!(
                path = %path.display(),
                mapped = config.category_to_super.len(),
                "loaded category mapping"
            );
            config
        }
        Err(e) => {
            warn!("{e}; using built-in default mapping");
            CategoryMappingConfig::default()
        }
    }
}

/// The active mapping for a session.
///
/// Readers take an `Arc` snapshot with [`current`](Self::current); a refresh
/// swaps in a new config without touching snapshots already handed out.
#[derive(Debug)]
pub struct MappingStore {
    path: Option<PathBuf>,
    active: RwLock<Arc<CategoryMappingConfig>>,
}

impl MappingStore {
    /// Load once from `path` (or use the default when `None`).
    pub fn open(path: Option<PathBuf>) -> Self {
        let config = load_mapping_or_default(path.as_deref());
        Self {
            path,
            active: RwLock::new(Arc::new(config)),
        }
    }

    pub fn with_config(config: CategoryMappingConfig) -> Self {
        Self {
            path: None,
            active: RwLock::new(Arc::new(config)),
        }
    }

    pub fn current(&self) -> Arc<CategoryMappingConfig> {
        match self.active.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Re-read the resource and swap it in; returns the new snapshot.
    pub fn refresh(&self) -> Arc<CategoryMappingConfig> {
        let fresh = Arc::new(load_mapping_or_default(self.path.as_deref()));
        self.replace(Arc::clone(&fresh));
        fresh
    }

    pub fn replace(&self, config: Arc<CategoryMappingConfig>) {
        match self.active.write() {
            Ok(mut guard) => *guard = config,
            Err(poisoned) => *poisoned.into_inner() = config,
        }
    }
}

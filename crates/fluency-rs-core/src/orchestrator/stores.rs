//! Store construction from `store` config.

use crate::error::GenerationError;
use directories::BaseDirs;
use fluency_rs_config::StoreConfig;
use fluency_rs_store::{
    FileQuotaStore, FileTestStore, InMemoryTestStore, MemoryQuotaStore, QuotaStore, StoreError,
    TestStore,
};
use log::{debug, info};
use std::path::PathBuf;
use std::sync::Arc;

/// Test and quota stores selected by config.
#[derive(Clone)]
pub struct StoreBundle {
    pub tests: Arc<dyn TestStore>,
    pub quota: Arc<dyn QuotaStore>,
}

/// Build the stores named by `store.provider`.
pub fn build_default_stores(config: &StoreConfig) -> Result<StoreBundle, GenerationError> {
    info!("initializing stores (provider={})", config.provider);
    match config.provider.as_str() {
        "memory" => Ok(StoreBundle {
            tests: Arc::new(InMemoryTestStore::new()),
            quota: Arc::new(MemoryQuotaStore::new()),
        }),
        "file" => {
            let root = resolve_default_root(config.path.as_ref())?;
            info!("using file store (root={})", root.display());
            Ok(StoreBundle {
                tests: Arc::new(FileTestStore::new(&root)?),
                quota: Arc::new(FileQuotaStore::new(&root)?),
            })
        }
        other => Err(GenerationError::Config(format!(
            "unsupported store provider: {other}"
        ))),
    }
}

/// Resolve the file store root: absolute paths as-is, relative paths against
/// the cwd, and `~/.fluency/data` when unset.
fn resolve_default_root(path: Option<&String>) -> Result<PathBuf, GenerationError> {
    let cwd = std::env::current_dir().map_err(StoreError::Io)?;
    if let Some(path) = path {
        let path = PathBuf::from(path);
        if path.is_absolute() {
            return Ok(path);
        }
        debug!(
            "resolving store root relative to cwd: {}",
            cwd.join(&path).display()
        );
        return Ok(cwd.join(path));
    }
    if let Some(home) = BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf()) {
        return Ok(home.join(".fluency").join("data"));
    }
    Ok(cwd.join(".fluency").join("data"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn resolve_root_respects_absolute_and_relative_paths() {
        let temp = tempdir().expect("tempdir");
        let absolute = temp.path().join("data");
        let absolute_str = absolute.to_string_lossy().to_string();
        assert_eq!(
            resolve_default_root(Some(&absolute_str)).expect("absolute"),
            absolute
        );

        let relative = "tmp/data".to_string();
        let cwd = std::env::current_dir().expect("cwd");
        assert_eq!(
            resolve_default_root(Some(&relative)).expect("relative"),
            cwd.join(&relative)
        );
    }

    #[test]
    fn file_provider_creates_root() {
        let temp = tempdir().expect("tempdir");
        let root = temp.path().join("store");
        let config = StoreConfig {
            provider: "file".to_string(),
            path: Some(root.to_string_lossy().to_string()),
        };
        build_default_stores(&config).expect("stores");
        assert!(root.is_dir());
    }

    #[test]
    fn unknown_provider_is_a_config_error() {
        let config = StoreConfig {
            provider: "postgres".to_string(),
            path: None,
        };
        assert!(matches!(
            build_default_stores(&config),
            Err(GenerationError::Config(_))
        ));
    }
}

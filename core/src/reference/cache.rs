use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::sync::Arc;
use tracing::{debug, warn};

use super::ReferenceData;
use crate::config::{BUILTIN_VARIANT, Settings};

static SNAPSHOTS: Lazy<DashMap<String, Arc<ReferenceData>>> = Lazy::new(DashMap::new);

/// Reference tables for the configured variant, loaded on first use.
///
/// A variant that cannot be loaded from `reference_dir` falls back to the builtin
/// snapshot, cached under the requested key.
pub fn reference_data(settings: &Settings) -> Arc<ReferenceData> {
    if let Some(hit) = SNAPSHOTS.get(&settings.variant) {
        return hit.clone();
    }
    let loaded = Arc::new(load_variant(settings));
    SNAPSHOTS
        .entry(settings.variant.clone())
        .or_insert(loaded)
        .clone()
}

/// Drop every cached snapshot; the next access reloads from the current settings.
pub fn clear_cache() {
    SNAPSHOTS.clear();
}

fn load_variant(settings: &Settings) -> ReferenceData {
    if settings.variant != BUILTIN_VARIANT {
        match &settings.reference_dir {
            Some(dir) => {
                let path = dir.join(format!("{}.json", settings.variant));
                match ReferenceData::from_file(&path) {
                    Ok(data) => {
                        debug!("loaded reference data '{}' from {}", settings.variant, path.display());
                        return data;
                    }
                    Err(err) => warn!("{:#}; using builtin reference data", err),
                }
            }
            None => warn!(
                "reference variant '{}' requested without a reference directory; using builtin reference data",
                settings.variant
            ),
        }
    }
    builtin_or_empty()
}

fn builtin_or_empty() -> ReferenceData {
    ReferenceData::builtin().unwrap_or_else(|err| {
        tracing::error!("{:#}", err);
        ReferenceData::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_loads_variant_from_directory() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("cache-test-6.4.json"),
            r#"{"keywords": {"only_here": {"options": {"custom": ["gwf-dis"]}}}}"#,
        )
        .unwrap();
        let settings = Settings {
            variant: "cache-test-6.4".to_string(),
            reference_dir: Some(dir.path().to_path_buf()),
            ..Settings::default()
        };
        let data = reference_data(&settings);
        assert!(data.keyword_descriptions("only_here", "options").is_some());
        assert!(data.keyword_descriptions("length_units", "options").is_none());

        let again = reference_data(&settings);
        assert!(Arc::ptr_eq(&data, &again));
    }

    #[test]
    fn test_missing_variant_falls_back_to_builtin() {
        let settings = Settings {
            variant: "cache-test-missing".to_string(),
            reference_dir: None,
            ..Settings::default()
        };
        let data = reference_data(&settings);
        assert!(data.keyword_descriptions("length_units", "options").is_some());
    }
}

use std::path::PathBuf;

use mf6_core::config::{BUILTIN_VARIANT, DEFAULT_MAX_FILE_SIZE_MB};
use mf6_core::reference;
use mf6_core::Settings;
use serde::Deserialize;
use tower_lsp::lsp_types::ConfigurationItem;
use tracing::{info, warn};

use super::state::Mf6LanguageServer;

pub(crate) const CONFIG_SECTION: &str = "mf6Syntax";

#[derive(Debug, Clone, Default)]
pub(crate) struct ServerConfig {
    pub(crate) settings: Settings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Mf6ConfigSection {
    #[serde(default, rename = "maxFileSizeMB")]
    max_file_size_mb: Option<f64>,
    #[serde(default)]
    dfn_version: Option<String>,
    #[serde(default)]
    reference_data_dir: Option<PathBuf>,
}

impl Mf6ConfigSection {
    pub(crate) fn into_settings(self) -> Settings {
        Settings {
            max_file_size_mb: self
                .max_file_size_mb
                .filter(|v| v.is_finite() && *v > 0.0)
                .unwrap_or(DEFAULT_MAX_FILE_SIZE_MB),
            variant: self
                .dfn_version
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| BUILTIN_VARIANT.to_string()),
            reference_dir: self.reference_data_dir.filter(|p| !p.as_os_str().is_empty()),
        }
    }
}

impl Mf6LanguageServer {
    pub(crate) async fn load_config(&self) {
        let items = vec![ConfigurationItem {
            scope_uri: None,
            section: Some(CONFIG_SECTION.to_string()),
        }];

        let values = match self.client.configuration(items).await {
            Ok(values) => values,
            Err(err) => {
                warn!("workspace/configuration failed: {}", err);
                return;
            }
        };
        let Some(val) = values.into_iter().next() else {
            return;
        };
        let section = if val.is_null() {
            Mf6ConfigSection::default()
        } else {
            match serde_json::from_value::<Mf6ConfigSection>(val) {
                Ok(section) => section,
                Err(err) => {
                    warn!("ignoring invalid {} settings: {}", CONFIG_SECTION, err);
                    return;
                }
            }
        };

        let settings = section.into_settings();
        info!(
            "settings: max file size {} MB, reference variant '{}'",
            settings.max_file_size_label(),
            settings.variant
        );
        if let Ok(mut guard) = self.config.lock() {
            guard.settings = settings;
        }
        // Reference data is reloaded on next use; cached outlines depend on it.
        reference::clear_cache();
        for mut doc in self.documents.iter_mut() {
            doc.cached_analysis = None;
        }
    }
}

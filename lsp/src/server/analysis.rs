use std::sync::Arc;

use anyhow::Context;
use mf6_core::reference::reference_data;
use mf6_core::xref::DefinitionLookup;
use mf6_core::Settings;
use tokio::task;
use tower_lsp::lsp_types::{Hover, Position, Url};

use crate::analyzer::{AnalysisResult, Mf6Analyzer, OutlineMode};

use super::state::Mf6LanguageServer;

/// Analyzer bound to the reference data and size limit selected by `settings`.
/// Loading reference data may touch the disk, so call this off the async runtime.
pub(crate) fn analyzer_for(settings: &Settings) -> Mf6Analyzer {
    Mf6Analyzer::new(reference_data(settings)).with_max_file_bytes(settings.max_file_size_bytes())
}

impl Mf6LanguageServer {
    fn snapshot(&self, uri: &Url) -> Option<(String, i32)> {
        let doc = self.documents.get(uri)?;
        Some((doc.content.to_string(), doc.version))
    }

    pub(crate) fn outline_mode(&self, uri: &Url) -> OutlineMode {
        if self.input_mode.contains(uri) {
            return OutlineMode::Input;
        }
        OutlineMode::for_path(uri.to_file_path().ok().as_deref())
    }

    pub(crate) async fn get_or_compute_analysis(&self, uri: &Url) -> Option<Arc<AnalysisResult>> {
        if let Some(doc) = self.documents.get(uri) {
            if let Some(cached) = doc.cached_analysis.clone() {
                return Some(cached);
            }
        }

        let (content, version_snapshot) = self.snapshot(uri)?;
        let settings = self.settings();
        let path = uri.to_file_path().ok();
        let mode = self.outline_mode(uri);
        let computed = task::spawn_blocking(move || analyzer_for(&settings).analyze(&content, path.as_deref(), mode))
            .await
            .ok()?;
        let computed = Arc::new(computed);

        if let Some(mut doc) = self.documents.get_mut(uri) {
            if doc.version == version_snapshot {
                doc.cached_analysis = Some(computed.clone());
            }
        }
        Some(computed)
    }

    pub(crate) async fn get_hover_info(&self, uri: &Url, position: Position) -> Option<Hover> {
        let (content, _) = self.snapshot(uri)?;
        let settings = self.settings();
        let path = uri.to_file_path().ok();
        task::spawn_blocking(move || analyzer_for(&settings).hover(&content, path.as_deref(), position))
            .await
            .ok()
            .flatten()
    }

    pub(crate) async fn lookup_definition(
        &self,
        uri: &Url,
        position: Position,
    ) -> anyhow::Result<Option<DefinitionLookup>> {
        let Some((content, _)) = self.snapshot(uri) else {
            return Ok(None);
        };
        let settings = self.settings();
        let path = uri.to_file_path().ok();
        task::spawn_blocking(move || analyzer_for(&settings).definition(&content, path.as_deref(), position))
            .await
            .context("definition lookup aborted")?
    }
}

use std::sync::{Arc, Mutex};

use dashmap::{DashMap, DashSet};
use ropey::Rope;
use tower_lsp::lsp_types::Url;
use tower_lsp::Client;

use crate::analyzer::AnalysisResult;

/// In-memory representation of an open document and its cached outline.
#[derive(Debug, Default)]
pub(crate) struct Document {
    pub(crate) content: Rope,
    pub(crate) version: i32,
    pub(crate) cached_analysis: Option<Arc<AnalysisResult>>,
}

/// Primary LSP server state shared across handlers.
pub(crate) struct Mf6LanguageServer {
    pub(crate) client: Client,
    pub(crate) documents: Arc<DashMap<Url, Document>>,
    /// Documents switched to model-input mode by `mf6.setLanguageMode`.
    pub(crate) input_mode: DashSet<Url>,
    /// Last document opened or edited; the target of commands sent without a URI.
    pub(crate) active: Mutex<Option<Url>>,
    pub(crate) config: Mutex<super::config::ServerConfig>,
}

impl Mf6LanguageServer {
    pub(crate) fn new(client: Client) -> Self {
        Self {
            client,
            documents: Arc::new(DashMap::new()),
            input_mode: DashSet::new(),
            active: Mutex::new(None),
            config: Mutex::new(super::config::ServerConfig::default()),
        }
    }

    pub(crate) fn set_active(&self, uri: &Url) {
        if let Ok(mut active) = self.active.lock() {
            *active = Some(uri.clone());
        }
    }

    pub(crate) fn active_document(&self) -> Option<Url> {
        self.active.lock().ok().and_then(|a| a.clone())
    }

    /// Current settings; a poisoned lock falls back to defaults.
    pub(crate) fn settings(&self) -> mf6_core::Settings {
        self.config
            .lock()
            .map(|cfg| cfg.settings.clone())
            .unwrap_or_default()
    }
}

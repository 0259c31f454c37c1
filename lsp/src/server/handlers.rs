use ropey::Rope;
use serde_json::Value;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::LanguageServer;
use tracing::{info, warn};

use mf6_core::xref::DefinitionLookup;

use super::{
    commands::command_names,
    state::{Document, Mf6LanguageServer},
    text::apply_incremental_change_rope,
};

#[tower_lsp::async_trait]
impl LanguageServer for Mf6LanguageServer {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        info!("MODFLOW 6 Language Server initializing with params: {:?}", params.root_uri);

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::INCREMENTAL)),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                document_symbol_provider: Some(OneOf::Left(true)),
                definition_provider: Some(OneOf::Left(true)),
                execute_command_provider: Some(ExecuteCommandOptions {
                    commands: command_names(),
                    work_done_progress_options: Default::default(),
                }),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "MODFLOW 6 Language Server".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        info!("MODFLOW 6 Language Server initialized");
        self.client
            .log_message(MessageType::INFO, "MODFLOW 6 Language Server started")
            .await;
        self.load_config().await;
    }

    async fn shutdown(&self) -> Result<()> {
        info!("MODFLOW 6 Language Server shutting down");
        Ok(())
    }

    async fn did_change_configuration(&self, _params: DidChangeConfigurationParams) {
        self.load_config().await;
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        let document = Document {
            content: Rope::from_str(&params.text_document.text),
            version: params.text_document.version,
            cached_analysis: None,
        };
        self.set_active(&uri);
        self.documents.insert(uri, document);
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        {
            let mut entry = self.documents.entry(uri.clone()).or_default();
            entry.version = params.text_document.version;
            for change in &params.content_changes {
                apply_incremental_change_rope(&mut entry.content, change);
            }
            entry.cached_analysis = None;
        }
        self.set_active(&uri);
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        self.documents.remove(&params.text_document.uri);
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let uri = &params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;

        Ok(self.get_hover_info(uri, position).await)
    }

    async fn document_symbol(&self, params: DocumentSymbolParams) -> Result<Option<DocumentSymbolResponse>> {
        let uri = &params.text_document.uri;
        if let Some(analysis) = self.get_or_compute_analysis(uri).await {
            if !analysis.symbols.is_empty() {
                return Ok(Some(DocumentSymbolResponse::Nested(analysis.symbols.clone())));
            }
        }
        Ok(None)
    }

    async fn goto_definition(&self, params: GotoDefinitionParams) -> Result<Option<GotoDefinitionResponse>> {
        let uri = &params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;

        let lookup = match self.lookup_definition(uri, position).await {
            Ok(Some(lookup)) => lookup,
            Ok(None) => return Ok(None),
            Err(err) => {
                warn!("definition lookup failed: {:#}", err);
                self.client.show_message(MessageType::ERROR, format!("{:#}", err)).await;
                return Ok(None);
            }
        };

        if let DefinitionLookup::Found(path) = &lookup {
            return Ok(Url::from_file_path(path).ok().map(|target| {
                let origin = Position::new(0, 0);
                GotoDefinitionResponse::Scalar(Location::new(target, Range::new(origin, origin)))
            }));
        }
        let label = self.settings().max_file_size_label();
        if let Some(message) = lookup.message(&label) {
            self.client.show_message(MessageType::WARNING, message).await;
        }
        Ok(None)
    }

    async fn execute_command(&self, params: ExecuteCommandParams) -> Result<Option<Value>> {
        self.run_command(params).await
    }
}

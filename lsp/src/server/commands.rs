use mf6_core::xref::{self, ParentLookup};
use serde_json::Value;
use tokio::task;
use tower_lsp::jsonrpc::{Error, Result};
use tower_lsp::lsp_types::{ExecuteCommandParams, MessageType, ShowDocumentParams, Url};
use tracing::{info, warn};

use super::state::Mf6LanguageServer;

pub(crate) const SET_LANGUAGE_MODE: &str = "mf6.setLanguageMode";
pub(crate) const GO_TO_PARENT: &str = "mf6.goToParent";

pub(crate) fn command_names() -> Vec<String> {
    vec![SET_LANGUAGE_MODE.to_string(), GO_TO_PARENT.to_string()]
}

/// First argument as a document URI, either a plain string or `{ "uri": .. }`.
pub(crate) fn command_uri(arguments: &[Value]) -> Option<Url> {
    let raw = match arguments.first()? {
        Value::String(s) => s.as_str(),
        Value::Object(map) => map.get("uri")?.as_str()?,
        _ => return None,
    };
    Url::parse(raw).ok()
}

pub(crate) fn file_name_of(uri: &Url) -> String {
    uri.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uri.to_string())
}

impl Mf6LanguageServer {
    pub(crate) async fn run_command(&self, params: ExecuteCommandParams) -> Result<Option<Value>> {
        let uri = command_uri(&params.arguments).or_else(|| self.active_document());
        let Some(uri) = uri else {
            self.client.show_message(MessageType::WARNING, "No active file.").await;
            return Ok(None);
        };
        match params.command.as_str() {
            SET_LANGUAGE_MODE => self.set_language_mode(uri).await,
            GO_TO_PARENT => self.go_to_parent(uri).await,
            other => Err(Error::invalid_params(format!("Unknown command '{}'", other))),
        }
    }

    async fn set_language_mode(&self, uri: Url) -> Result<Option<Value>> {
        let name = file_name_of(&uri);
        if let Some(mut doc) = self.documents.get_mut(&uri) {
            doc.cached_analysis = None;
        }
        self.input_mode.insert(uri);
        info!("input mode enabled for {}", name);
        self.client
            .show_message(MessageType::INFO, format!("MODFLOW 6 language mode set for: {}", name))
            .await;
        Ok(None)
    }

    async fn go_to_parent(&self, uri: Url) -> Result<Option<Value>> {
        let Ok(path) = uri.to_file_path() else {
            self.client
                .show_message(MessageType::WARNING, format!("{} is not a local file.", uri))
                .await;
            return Ok(None);
        };
        let settings = self.settings();
        let max_bytes = settings.max_file_size_bytes();
        let lookup = task::spawn_blocking(move || xref::find_parent(&path, max_bytes))
            .await
            .map_err(|e| Error::invalid_params(format!("parent lookup aborted: {}", e)))?;

        let lookup = match lookup {
            Ok(lookup) => lookup,
            Err(err) => {
                warn!("parent lookup failed: {:#}", err);
                self.client.show_message(MessageType::ERROR, format!("{:#}", err)).await;
                return Ok(None);
            }
        };

        if let ParentLookup::Found(parent) = &lookup {
            let Ok(target) = Url::from_file_path(parent) else {
                return Ok(None);
            };
            let params = ShowDocumentParams {
                uri: target.clone(),
                external: Some(false),
                take_focus: Some(true),
                selection: None,
            };
            if let Err(err) = self.client.show_document(params).await {
                warn!("window/showDocument failed: {}", err);
            }
            return Ok(Some(Value::String(target.to_string())));
        }
        if let Some(message) = lookup.message(&settings.max_file_size_label()) {
            self.client.show_message(MessageType::INFO, message).await;
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_command_uri_forms() {
        let plain = command_uri(&[json!("file:///models/a.dis")]).unwrap();
        assert_eq!(plain.path(), "/models/a.dis");
        let wrapped = command_uri(&[json!({"uri": "file:///models/a.nam"})]).unwrap();
        assert_eq!(file_name_of(&wrapped), "a.nam");
        assert!(command_uri(&[]).is_none());
        assert!(command_uri(&[json!(3)]).is_none());
    }
}

use std::path::Path;
use std::sync::Arc;

use mf6_core::docs::{HoverContext, compose_hover, default_providers};
use mf6_core::reference::ReferenceData;
use mf6_core::xref::{self, DefinitionLookup};
use mf6_core::{Document as CoreDocument, NodeKind, OutlineNode, scan_blocks, scan_listing};
use tower_lsp::lsp_types::*;

mod utils;

pub use utils::{char_col_to_utf16, to_lsp_range, to_text_position, utf16_to_char_col};

/// Outline and symbols computed for one document snapshot.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub outline: Vec<OutlineNode>,
    pub symbols: Vec<DocumentSymbol>,
}

/// Which scanner a buffer is outlined with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutlineMode {
    /// Block-structured model input.
    Input,
    /// Simulation list output (`.lst`).
    Listing,
}

impl OutlineMode {
    pub fn for_path(path: Option<&Path>) -> Self {
        let is_listing = path
            .and_then(|p| p.extension())
            .is_some_and(|e| e.eq_ignore_ascii_case("lst"));
        if is_listing { OutlineMode::Listing } else { OutlineMode::Input }
    }
}

/// MODFLOW 6 analyzer for providing LSP functionality
pub struct Mf6Analyzer {
    reference: Arc<ReferenceData>,
    max_file_bytes: u64,
}

impl Mf6Analyzer {
    pub fn new(reference: Arc<ReferenceData>) -> Self {
        Self {
            reference,
            max_file_bytes: mf6_core::Settings::default().max_file_size_bytes(),
        }
    }

    pub fn with_max_file_bytes(mut self, max_file_bytes: u64) -> Self {
        self.max_file_bytes = max_file_bytes;
        self
    }

    pub fn analyze(&self, content: &str, path: Option<&Path>, mode: OutlineMode) -> AnalysisResult {
        let doc = core_document(content, path);
        let outline = match mode {
            OutlineMode::Input => scan_blocks(&doc, &self.reference),
            OutlineMode::Listing => scan_listing(&doc, &self.reference),
        };
        let symbols = outline.iter().map(|node| to_document_symbol(&doc, node)).collect();
        AnalysisResult { outline, symbols }
    }

    pub fn hover(&self, content: &str, path: Option<&Path>, position: Position) -> Option<Hover> {
        let doc = core_document(content, path);
        let ctx = HoverContext::new(&doc, to_text_position(&doc, position), &self.reference);
        let markdown = compose_hover(&default_providers(), &ctx)?;
        Some(Hover {
            contents: HoverContents::Markup(MarkupContent {
                kind: MarkupKind::Markdown,
                value: markdown,
            }),
            range: None,
        })
    }

    /// File named by the token under `position`, resolved next to the document.
    pub fn definition(
        &self,
        content: &str,
        path: Option<&Path>,
        position: Position,
    ) -> anyhow::Result<Option<DefinitionLookup>> {
        let doc = core_document(content, path);
        xref::definition_at(&doc, to_text_position(&doc, position), self.max_file_bytes)
    }
}

fn core_document<'a>(content: &'a str, path: Option<&'a Path>) -> CoreDocument<'a> {
    match path {
        Some(path) => CoreDocument::with_path(content, path),
        None => CoreDocument::new(content),
    }
}

pub fn symbol_kind(kind: NodeKind) -> SymbolKind {
    match kind {
        NodeKind::Block | NodeKind::Period => SymbolKind::FIELD,
        NodeKind::ReadArray => SymbolKind::ARRAY,
        NodeKind::Header => SymbolKind::FILE,
        NodeKind::Package => SymbolKind::PACKAGE,
        NodeKind::StressPeriod => SymbolKind::NAMESPACE,
        NodeKind::TimeStep => SymbolKind::EVENT,
    }
}

fn to_document_symbol(doc: &CoreDocument<'_>, node: &OutlineNode) -> DocumentSymbol {
    let range = to_lsp_range(doc, node.range);
    let first_line = node.range.start.line;
    let selection_range = to_lsp_range(doc, doc.line_span(first_line, first_line));
    let children: Vec<DocumentSymbol> = node.children.iter().map(|c| to_document_symbol(doc, c)).collect();

    #[allow(deprecated)]
    DocumentSymbol {
        name: node.name.clone(),
        detail: Some(node.detail().to_string()),
        kind: symbol_kind(node.kind),
        tags: None,
        deprecated: None,
        range,
        selection_range,
        children: if children.is_empty() { None } else { Some(children) },
    }
}

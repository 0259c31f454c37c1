pub mod config;
pub mod document;
pub mod docs;
pub mod reference;
pub mod resolve;
pub mod scan;
pub mod xref;

pub use config::Settings;
pub use document::{Document, TextPosition, TextRange};
pub use scan::{NodeKind, OutlineNode, scan_blocks, scan_listing};

/// Outline for a document, choosing the list-output scanner for `.lst` files.
pub fn outline(doc: &Document<'_>, reference: &reference::ReferenceData) -> Vec<OutlineNode> {
    if doc.extension().as_deref() == Some("lst") {
        scan_listing(doc, reference)
    } else {
        scan_blocks(doc, reference)
    }
}

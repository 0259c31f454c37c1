//! Line scanners that recover document outlines.

use serde::Serialize;

use crate::document::TextRange;

pub mod blocks;
pub mod listing;

pub use blocks::scan_blocks;
pub use listing::scan_listing;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Block,
    Period,
    ReadArray,
    Header,
    Package,
    StressPeriod,
    TimeStep,
}

impl NodeKind {
    /// Short tag shown next to the node name in outlines.
    pub fn detail(self) -> &'static str {
        match self {
            NodeKind::Block | NodeKind::Period => "block",
            NodeKind::ReadArray => "readarray",
            NodeKind::Header => "header",
            NodeKind::Package => "package",
            NodeKind::StressPeriod => "stress period",
            NodeKind::TimeStep => "time step",
        }
    }
}

/// One entry of a document outline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlineNode {
    pub name: String,
    pub kind: NodeKind,
    pub range: TextRange,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<OutlineNode>,
    /// Set on time steps whose solver output reports a convergence failure.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub failed: bool,
}

impl OutlineNode {
    pub fn new(name: impl Into<String>, kind: NodeKind, range: TextRange) -> Self {
        Self {
            name: name.into(),
            kind,
            range,
            children: Vec::new(),
            failed: false,
        }
    }

    pub fn detail(&self) -> &'static str {
        self.kind.detail()
    }
}

use std::fmt::Write as _;
use std::path::Path;

use mf6_core::OutlineNode;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct OutlineReport<'a> {
    file: String,
    outline: &'a [OutlineNode],
}

pub(crate) fn outline_json(file: &Path, outline: &[OutlineNode]) -> anyhow::Result<String> {
    let report = OutlineReport {
        file: file.display().to_string(),
        outline,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

/// One line per node, children indented by two spaces.
pub(crate) fn outline_tree(outline: &[OutlineNode]) -> String {
    let mut out = String::new();
    for node in outline {
        write_node(&mut out, node, 0);
    }
    out
}

fn write_node(out: &mut String, node: &OutlineNode, depth: usize) {
    let _ = writeln!(out, "{:indent$}{}  [{}]  {}", "", node.name, node.detail(), node.range, indent = depth * 2);
    for child in &node.children {
        write_node(out, child, depth + 1);
    }
}

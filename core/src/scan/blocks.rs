use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::{NodeKind, OutlineNode};
use crate::document::{Document, indentation, is_comment_line};
use crate::reference::ReferenceData;

static BEGIN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*begin\s+(\w+)(.*)$").unwrap());
static END_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*end\s+(\w+)").unwrap());

const PERIOD_BLOCK: &str = "period";

/// A `begin <name> [suffix]` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHeader<'a> {
    pub name: &'a str,
    pub suffix: &'a str,
}

pub fn match_begin(line: &str) -> Option<BlockHeader<'_>> {
    let caps = BEGIN_RE.captures(line)?;
    Some(BlockHeader {
        name: caps.get(1)?.as_str(),
        suffix: caps.get(2).map(|m| m.as_str().trim()).unwrap_or(""),
    })
}

pub fn match_end(line: &str) -> Option<&str> {
    END_RE.captures(line).and_then(|c| c.get(1)).map(|m| m.as_str())
}

/// Recover the top-level blocks of an input file.
///
/// Lines that do not open a recognized block are skipped. A block without a
/// matching `end <name>` line collapses onto its begin line and scanning
/// continues with the next line.
pub fn scan_blocks(doc: &Document<'_>, reference: &ReferenceData) -> Vec<OutlineNode> {
    let mut out = Vec::new();
    let line_count = doc.line_count();
    let mut i = 0usize;
    while i < line_count {
        let header = match match_begin(doc.line(i)) {
            Some(h) if reference.is_block(h.name) => h,
            _ => {
                i += 1;
                continue;
            }
        };

        let end_line = find_block_end(doc, i + 1, header.name).unwrap_or_else(|| {
            debug!("block '{}' opened on line {} is never closed", header.name, i + 1);
            i
        });

        let mut node = OutlineNode::new(display_name(&header), block_kind(&header), doc.line_span(i, end_line));
        if let Some(names) = reference.readarray_names(header.name) {
            node.children = scan_readarrays(doc, i + 1, end_line, |token| names.contains(token));
        }
        out.push(node);
        i = end_line + 1;
    }
    out
}

fn find_block_end(doc: &Document<'_>, from: usize, name: &str) -> Option<usize> {
    (from..doc.line_count()).find(|&j| match_end(doc.line(j)).is_some_and(|n| n.eq_ignore_ascii_case(name)))
}

fn block_kind(header: &BlockHeader<'_>) -> NodeKind {
    if header.name.eq_ignore_ascii_case(PERIOD_BLOCK) {
        NodeKind::Period
    } else {
        NodeKind::Block
    }
}

fn display_name(header: &BlockHeader<'_>) -> String {
    if !header.name.eq_ignore_ascii_case(PERIOD_BLOCK) {
        return header.name.to_string();
    }
    match header.suffix.split_whitespace().next() {
        Some(iper) => format!("{} {}", PERIOD_BLOCK, iper),
        None => PERIOD_BLOCK.to_string(),
    }
}

/// Arrays inside `(start..end)`; each extends over the following lines that are
/// indented deeper than its keyword line.
fn scan_readarrays(
    doc: &Document<'_>,
    start: usize,
    end: usize,
    is_array: impl Fn(&str) -> bool,
) -> Vec<OutlineNode> {
    let mut out = Vec::new();
    let mut j = start;
    while j < end {
        let line = doc.line(j);
        let keyword = match line.split_whitespace().next() {
            Some(tok) if !is_comment_line(line) && is_array(&tok.to_ascii_lowercase()) => tok,
            _ => {
                j += 1;
                continue;
            }
        };
        let base = indentation(line);
        let mut last = j;
        while last + 1 < end && indentation(doc.line(last + 1)) > base {
            last += 1;
        }
        out.push(OutlineNode::new(keyword, NodeKind::ReadArray, doc.line_span(j, last)));
        j = last + 1;
    }
    out
}

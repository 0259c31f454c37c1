//! Hover documentation for keywords, tabular columns and block structures.

use once_cell::unsync::OnceCell;
use tracing::{debug, warn};

use crate::document::{Document, TextPosition, is_comment_line};
use crate::reference::{Descriptions, ReferenceData, select_by_extension, tag_matches_extension};
use crate::resolve::{GridType, enclosing_block, resolve_column, token_at};
use crate::scan::blocks::{match_begin, match_end};
use crate::xref::probe_grid_type;

/// Everything a hover provider needs to answer one request.
pub struct HoverContext<'a> {
    pub doc: &'a Document<'a>,
    pub position: TextPosition,
    pub reference: &'a ReferenceData,
    grid: OnceCell<Option<GridType>>,
}

impl<'a> HoverContext<'a> {
    pub fn new(doc: &'a Document<'a>, position: TextPosition, reference: &'a ReferenceData) -> Self {
        Self {
            doc,
            position,
            reference,
            grid: OnceCell::new(),
        }
    }

    /// Use a known grid type instead of probing sibling files.
    pub fn with_grid(self, grid: Option<GridType>) -> Self {
        let _ = self.grid.set(grid);
        self
    }

    /// Grid type of the model the document belongs to, probed once on first use.
    pub fn grid(&self) -> Option<GridType> {
        *self.grid.get_or_init(|| {
            let dir = self.doc.directory()?;
            let stem = self.doc.path().and_then(|p| p.file_stem()).map(|s| s.to_string_lossy());
            match probe_grid_type(dir, stem.as_deref()) {
                Ok(grid) => grid,
                Err(err) => {
                    warn!("grid probe failed: {:#}", err);
                    None
                }
            }
        })
    }

    fn extension(&self) -> Option<String> {
        self.doc.extension()
    }
}

pub trait HoverProvider {
    fn provide(&self, ctx: &HoverContext<'_>) -> Option<String>;
}

/// Describes the keyword under the cursor, or the column a data value sits in.
pub struct KeywordHover;

/// Shows the documented layouts of a block when hovering its name on a
/// `begin`/`end` line.
pub struct BlockHover;

/// Providers in the order their results are shown.
pub fn default_providers() -> Vec<Box<dyn HoverProvider + Send + Sync>> {
    vec![Box::new(KeywordHover), Box::new(BlockHover)]
}

/// Run every provider and join the non-empty answers with a horizontal rule.
pub fn compose_hover<P>(providers: &[P], ctx: &HoverContext<'_>) -> Option<String>
where
    P: AsRef<dyn HoverProvider + Send + Sync>,
{
    let parts: Vec<String> = providers
        .iter()
        .filter_map(|p| p.as_ref().provide(ctx))
        .filter(|s| !s.is_empty())
        .collect();
    if parts.is_empty() { None } else { Some(parts.join("\n\n---\n\n")) }
}

impl HoverProvider for KeywordHover {
    fn provide(&self, ctx: &HoverContext<'_>) -> Option<String> {
        let line = ctx.doc.line(ctx.position.line);
        let token = token_at(line, ctx.position.column)?;
        let block = enclosing_block(ctx.doc, ctx.position.line)?;
        let extension = ctx.extension();
        let keyword = token.text.to_ascii_lowercase();

        if let Some(descriptions) = ctx.reference.keyword_descriptions(&keyword, &block) {
            return Some(render_keyword(&keyword, &block, descriptions, extension.as_deref()));
        }

        if !ctx.reference.has_row_layouts(&block) || is_comment_line(line) {
            return None;
        }
        if is_block_delimiter(line) {
            return None;
        }
        let column = resolve_column(ctx.reference, &block, extension.as_deref(), token.index, ctx.grid())?;
        debug!("token {} of '{}' row resolves to column '{}'", token.index, block, column);
        let descriptions = ctx.reference.keyword_descriptions(column, &block)?;
        Some(render_keyword(column, &block, descriptions, extension.as_deref()))
    }
}

impl HoverProvider for BlockHover {
    fn provide(&self, ctx: &HoverContext<'_>) -> Option<String> {
        let line = ctx.doc.line(ctx.position.line);
        let name = match_begin(line).map(|h| h.name).or_else(|| match_end(line))?;
        let token = token_at(line, ctx.position.column)?;
        if token.index != 1 || !token.text.eq_ignore_ascii_case(name) {
            return None;
        }

        let templates: Vec<(&String, &String)> = ctx.reference.block_structures(name)?.iter().collect();
        let extension = ctx.extension();
        let selection = select_by_extension(&templates, |(tag, _)| tag_matches_extension(tag, extension.as_deref()));
        Some(
            selection
                .items
                .iter()
                .map(|(_, template)| format!("```\n{}\n```", template))
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }
}

/// `begin`/`end` lines are never data rows, even when the backward block
/// search places them inside the previous block.
fn is_block_delimiter(line: &str) -> bool {
    match_begin(line).is_some() || match_end(line).is_some()
}

fn render_keyword(keyword: &str, block: &str, descriptions: &Descriptions, extension: Option<&str>) -> String {
    let entries: Vec<(&String, &Vec<String>)> = descriptions.iter().collect();
    let selection = select_by_extension(&entries, |(_, tags)| {
        tags.iter().any(|t| tag_matches_extension(t, extension))
    });

    let body = match selection.items.as_slice() {
        [(description, _)] if selection.matched => format!("- {}", description),
        items => items
            .iter()
            .map(|(description, tags)| {
                let tags: Vec<String> = tags.iter().map(|t| format!("*{}*", t)).collect();
                format!("{}\n- {}", tags.join(", "), description)
            })
            .collect::<Vec<_>>()
            .join("\n\n"),
    };
    format!(
        "**{}**&nbsp;&nbsp;(block: *{}*)\n\n{}",
        keyword.to_ascii_uppercase(),
        block.to_ascii_uppercase(),
        body
    )
}

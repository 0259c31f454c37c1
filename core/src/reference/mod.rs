//! Reference tables describing blocks, keywords and row layouts per definition file.
//!
//! Every entry is tagged with the definition ("dfn") it was extracted from, such as
//! `gwf-dis` or `sim-tdis`. The last `-` component of a tag is the input file
//! extension that entry documents.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

mod cache;

pub use cache::{clear_cache, reference_data};

const BUILTIN_SNAPSHOT: &str = include_str!("../../data/builtin.json");

/// description -> source tags
pub type Descriptions = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReferenceData {
    /// Block names recognized by the outline scanner (lower-case).
    #[serde(default)]
    blocks: BTreeSet<String>,
    /// keyword -> block -> description -> tags
    #[serde(default)]
    keywords: BTreeMap<String, BTreeMap<String, Descriptions>>,
    /// block -> tag -> structure template
    #[serde(default)]
    block_structures: BTreeMap<String, BTreeMap<String, String>>,
    /// block -> comma separated column names -> tags
    #[serde(default)]
    recarrays: BTreeMap<String, BTreeMap<String, Vec<String>>>,
    /// block -> array names introduced by a bare keyword line
    #[serde(default)]
    readarrays: BTreeMap<String, BTreeSet<String>>,
    /// Package names that open a section in list output.
    #[serde(default)]
    lst_packages: BTreeSet<String>,
}

/// One positional row layout of a tabular block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowLayout<'a> {
    pub columns: Vec<&'a str>,
    pub tags: &'a [String],
}

impl ReferenceData {
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_SNAPSHOT).context("Failed to parse builtin reference snapshot")
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let data: ReferenceData = serde_json::from_str(raw)?;
        Ok(data.normalized())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read reference data '{}'", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("Invalid reference data in '{}'", path.display()))
    }

    /// Lower-case every block key and register blocks that only appear in nested tables.
    fn normalized(mut self) -> Self {
        let mut blocks: BTreeSet<String> = self.blocks.iter().map(|b| b.to_ascii_lowercase()).collect();
        for per_block in self.keywords.values() {
            blocks.extend(per_block.keys().map(|b| b.to_ascii_lowercase()));
        }
        blocks.extend(self.block_structures.keys().map(|b| b.to_ascii_lowercase()));
        blocks.extend(self.recarrays.keys().map(|b| b.to_ascii_lowercase()));
        blocks.extend(self.readarrays.keys().map(|b| b.to_ascii_lowercase()));
        self.blocks = blocks;

        self.keywords = std::mem::take(&mut self.keywords)
            .into_iter()
            .map(|(kw, per_block)| {
                let per_block = per_block
                    .into_iter()
                    .map(|(b, d)| (b.to_ascii_lowercase(), d))
                    .collect();
                (kw.to_ascii_lowercase(), per_block)
            })
            .collect();
        self.readarrays = std::mem::take(&mut self.readarrays)
            .into_iter()
            .map(|(b, names)| {
                let names = names.into_iter().map(|n| n.to_ascii_lowercase()).collect();
                (b.to_ascii_lowercase(), names)
            })
            .collect();
        self.block_structures = std::mem::take(&mut self.block_structures)
            .into_iter()
            .map(|(b, t)| (b.to_ascii_lowercase(), t))
            .collect();
        self.recarrays = std::mem::take(&mut self.recarrays)
            .into_iter()
            .map(|(b, r)| (b.to_ascii_lowercase(), r))
            .collect();
        self
    }

    pub fn is_block(&self, name: &str) -> bool {
        self.blocks.contains(&name.to_ascii_lowercase())
    }

    pub fn blocks(&self) -> impl Iterator<Item = &str> {
        self.blocks.iter().map(String::as_str)
    }

    pub fn keyword_descriptions(&self, keyword: &str, block: &str) -> Option<&Descriptions> {
        self.keywords
            .get(&keyword.to_ascii_lowercase())?
            .get(&block.to_ascii_lowercase())
            .filter(|d| !d.is_empty())
    }

    pub fn block_structures(&self, block: &str) -> Option<&BTreeMap<String, String>> {
        self.block_structures
            .get(&block.to_ascii_lowercase())
            .filter(|t| !t.is_empty())
    }

    pub fn row_layouts(&self, block: &str) -> Vec<RowLayout<'_>> {
        self.recarrays
            .get(&block.to_ascii_lowercase())
            .map(|layouts| {
                layouts
                    .iter()
                    .map(|(cols, tags)| RowLayout {
                        columns: cols.split(',').map(str::trim).filter(|c| !c.is_empty()).collect(),
                        tags,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn has_row_layouts(&self, block: &str) -> bool {
        self.recarrays.contains_key(&block.to_ascii_lowercase())
    }

    pub fn readarray_names(&self, block: &str) -> Option<&BTreeSet<String>> {
        self.readarrays.get(&block.to_ascii_lowercase())
    }

    pub fn is_lst_package(&self, name: &str) -> bool {
        self.lst_packages.contains(name)
    }
}

/// Result of narrowing reference entries down to the ones relevant for a file.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection<T> {
    pub items: Vec<T>,
    /// False when nothing matched and `items` holds every entry instead.
    pub matched: bool,
}

/// Entries accepted by `matches`, or all entries when none is accepted.
///
/// Attempts run in order and the first non-empty one wins.
pub fn select_by_extension<T: Clone>(items: &[T], matches: impl Fn(&T) -> bool) -> Selection<T> {
    let attempts: [(&dyn Fn(&T) -> bool, bool); 2] = [(&matches, true), (&|_: &T| true, false)];
    attempts
        .iter()
        .map(|(keep, matched)| Selection {
            items: items.iter().filter(|item| keep(item)).cloned().collect(),
            matched: *matched,
        })
        .find(|selection| !selection.items.is_empty())
        .unwrap_or(Selection {
            items: Vec::new(),
            matched: false,
        })
}

/// File extension a source tag documents (`gwf-dis` -> `dis`).
pub fn tag_extension(tag: &str) -> &str {
    tag.rsplit('-').next().unwrap_or(tag)
}

pub fn tag_matches_extension(tag: &str, extension: Option<&str>) -> bool {
    match extension {
        Some(ext) => tag_extension(tag).eq_ignore_ascii_case(ext),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_snapshot_parses() {
        let data = ReferenceData::builtin().expect("builtin snapshot");
        assert!(data.is_block("OPTIONS"));
        assert!(data.is_block("period"));
        assert!(!data.is_block("nonexistent"));
        assert!(data.is_lst_package("DIS"));
        assert!(data.keyword_descriptions("LENGTH_UNITS", "Options").is_some());
    }

    #[test]
    fn test_blocks_collected_from_nested_tables() {
        let data = ReferenceData::from_json(
            r#"{
                "keywords": {"Alpha": {"Options": {"desc": ["gwf-dis"]}}},
                "readarrays": {"GridData": ["TOP"]}
            }"#,
        )
        .unwrap();
        assert!(data.is_block("options"));
        assert!(data.is_block("griddata"));
        assert!(data.keyword_descriptions("alpha", "options").is_some());
        assert!(data.readarray_names("griddata").unwrap().contains("top"));
    }

    #[test]
    fn test_row_layouts_split_columns() {
        let data = ReferenceData::builtin().unwrap();
        let layouts = data.row_layouts("period");
        let wel = layouts
            .iter()
            .find(|l| l.tags.iter().any(|t| t == "gwf-wel"))
            .expect("wel layout");
        assert_eq!(wel.columns, vec!["cellid", "q", "aux", "boundname"]);
    }

    #[test]
    fn test_select_by_extension_falls_back_to_all() {
        let items = vec!["gwf-dis", "gwf-disv", "gwt-dis"];
        let hit = select_by_extension(&items, |t| tag_matches_extension(t, Some("dis")));
        assert!(hit.matched);
        assert_eq!(hit.items, vec!["gwf-dis", "gwt-dis"]);

        let miss = select_by_extension(&items, |t| tag_matches_extension(t, Some("wel")));
        assert!(!miss.matched);
        assert_eq!(miss.items, items);

        let empty: Vec<&str> = Vec::new();
        assert!(select_by_extension(&empty, |_| true).items.is_empty());
    }

    #[test]
    fn test_tag_extension() {
        assert_eq!(tag_extension("gwf-disv"), "disv");
        assert_eq!(tag_extension("sim-nam"), "nam");
        assert!(tag_matches_extension("gwt-DIS", Some("dis")));
        assert!(!tag_matches_extension("gwt-dis", None));
    }
}

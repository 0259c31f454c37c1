//! Cross-file navigation between an input file, the files it names and the
//! name file that references it.

use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::document::{Document, TextPosition};
use crate::resolve::{GridType, token_at};

/// Simulation name file; the root of every reference chain.
pub const TOP_LEVEL_FILE: &str = "mfsim.nam";

/// Binary or tabular outputs that never reference input files.
pub const OUTPUT_EXTENSIONS: &[&str] = &["grb", "lst", "hds", "bud", "cbc", "ucn", "csv"];

/// Editor setting that controls the size limit, named in user messages.
pub const SIZE_LIMIT_SETTING: &str = "mf6Syntax.maxFileSizeMB";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefinitionLookup {
    Found(PathBuf),
    NotFound(PathBuf),
    Oversized { path: PathBuf, size: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentLookup {
    Found(PathBuf),
    /// The file is the simulation name file itself.
    TopLevel,
    /// No sibling references the file. `oversized` lists siblings that were not
    /// read because of the size limit.
    NotFound { oversized: Vec<PathBuf> },
}

impl DefinitionLookup {
    /// Warning to show the user, `None` when the target was found.
    pub fn message(&self, size_limit_mb: &str) -> Option<String> {
        match self {
            DefinitionLookup::Found(_) => None,
            DefinitionLookup::NotFound(path) => Some(format!("File {} not found", display_name(path))),
            DefinitionLookup::Oversized { path, .. } => Some(format!(
                "File {} exceeds the {}MB size limit. See setting '{}'.",
                display_name(path),
                size_limit_mb,
                SIZE_LIMIT_SETTING
            )),
        }
    }
}

impl ParentLookup {
    /// Information message for the user, `None` when a parent was found.
    pub fn message(&self, size_limit_mb: &str) -> Option<String> {
        match self {
            ParentLookup::Found(_) => None,
            ParentLookup::TopLevel => Some(format!("{} is already the top-level file.", TOP_LEVEL_FILE)),
            ParentLookup::NotFound { oversized } if oversized.is_empty() => {
                Some("No parent file found within the directory.".to_string())
            }
            ParentLookup::NotFound { .. } => Some(format!(
                "No parent file found within the directory. Parent file may exist but above the {}MB size limit. See setting '{}'.",
                size_limit_mb, SIZE_LIMIT_SETTING
            )),
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Resolve `target` as a file name relative to `dir`.
pub fn resolve_definition(dir: &Path, target: &str, max_bytes: u64) -> Result<DefinitionLookup> {
    let path = dir.join(target);
    let meta = match fs::metadata(&path) {
        Ok(meta) => meta,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(DefinitionLookup::NotFound(path)),
        Err(err) => return Err(err).with_context(|| format!("Failed to stat '{}'", path.display())),
    };
    if !meta.is_file() {
        return Ok(DefinitionLookup::NotFound(path));
    }
    if meta.len() > max_bytes {
        return Ok(DefinitionLookup::Oversized { path, size: meta.len() });
    }
    Ok(DefinitionLookup::Found(path))
}

/// Definition lookup for the token under `position`. `None` when the document has
/// no backing file or the cursor is not on a token.
pub fn definition_at(doc: &Document<'_>, position: TextPosition, max_bytes: u64) -> Result<Option<DefinitionLookup>> {
    let Some(dir) = doc.directory() else {
        return Ok(None);
    };
    let Some(token) = token_at(doc.line(position.line), position.column) else {
        return Ok(None);
    };
    resolve_definition(dir, &token.text, max_bytes).map(Some)
}

/// Find the sibling file that references `path` by name.
///
/// Candidates are visited in file-name order and the first bounded match wins.
/// Files larger than `max_bytes` are skipped without being read.
pub fn find_parent(path: &Path, max_bytes: u64) -> Result<ParentLookup> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("'{}' has no file name", path.display()))?;
    if file_name.eq_ignore_ascii_case(TOP_LEVEL_FILE) {
        return Ok(ParentLookup::TopLevel);
    }
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut oversized = Vec::new();
    for candidate in sibling_files(dir)? {
        let name = candidate.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        if name == file_name || is_output_artifact(&candidate) {
            continue;
        }
        let size = fs::metadata(&candidate)
            .with_context(|| format!("Failed to stat '{}'", candidate.display()))?
            .len();
        if size > max_bytes {
            debug!("skipping {} ({} bytes over limit)", candidate.display(), size);
            oversized.push(candidate);
            continue;
        }
        let bytes = fs::read(&candidate).with_context(|| format!("Failed to read '{}'", candidate.display()))?;
        if contains_bounded(&String::from_utf8_lossy(&bytes), &file_name) {
            return Ok(ParentLookup::Found(candidate));
        }
    }
    Ok(ParentLookup::NotFound { oversized })
}

/// Regular files in `dir`, sorted by name.
fn sibling_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).with_context(|| format!("Failed to list '{}'", dir.display()))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to list '{}'", dir.display()))?;
        if entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

fn is_output_artifact(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .is_some_and(|e| OUTPUT_EXTENSIONS.contains(&e.as_str()))
}

fn is_name_boundary(c: char) -> bool {
    c.is_whitespace() || c == '\'' || c == '"'
}

/// True when `needle` occurs in `haystack` delimited by whitespace, quotes or
/// the string edges (`model.dis` does not match inside `model.disv`).
pub fn contains_bounded(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack.match_indices(needle).any(|(idx, _)| {
        let before = haystack[..idx].chars().next_back();
        let after = haystack[idx + needle.len()..].chars().next();
        before.is_none_or(is_name_boundary) && after.is_none_or(is_name_boundary)
    })
}

/// Grid type of the model in `dir`, judged from discretization file extensions.
/// A file sharing `stem` is preferred over other discretization files.
pub fn probe_grid_type(dir: &Path, stem: Option<&str>) -> Result<Option<GridType>> {
    let mut grids: Vec<(PathBuf, GridType)> = sibling_files(dir)?
        .into_iter()
        .filter_map(|p| {
            let grid = GridType::from_extension(&p.extension()?.to_string_lossy())?;
            Some((p, grid))
        })
        .collect();
    if let Some(stem) = stem {
        if let Some(idx) = grids
            .iter()
            .position(|(p, _)| p.file_stem().is_some_and(|s| s.to_string_lossy().eq_ignore_ascii_case(stem)))
        {
            return Ok(Some(grids.swap_remove(idx).1));
        }
    }
    Ok(grids.first().map(|(_, g)| *g))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const LIMIT: u64 = 50 * 1024 * 1024;

    #[test]
    fn test_contains_bounded() {
        assert!(contains_bounded("  DIS6  a.dis  dis", "a.dis"));
        assert!(contains_bounded("'a.dis'", "a.dis"));
        assert!(contains_bounded("a.dis", "a.dis"));
        assert!(contains_bounded("x\ta.dis\n", "a.dis"));
        assert!(!contains_bounded("DIS6 dummy_a.dis", "a.dis"));
        assert!(!contains_bounded("DISV6 a.disv", "a.dis"));
        assert!(!contains_bounded("anything", ""));
        assert!(contains_bounded("dummy_a.dis a.dis", "a.dis"));
    }

    #[test]
    fn test_parent_chain_up_to_simulation_file() {
        let dir = tempdir().unwrap();
        let p = dir.path();
        fs::write(p.join("a.dis"), "BEGIN options\nEND options\n").unwrap();
        fs::write(p.join("a.nam"), "BEGIN packages\n  DIS6  a.dis  dis\nEND packages\n").unwrap();
        fs::write(p.join("b.nam"), "BEGIN packages\n  DIS6  dummy_a.dis\nEND packages\n").unwrap();
        fs::write(p.join("mfsim.nam"), "BEGIN models\n  gwf6  a.nam  a\nEND models\n").unwrap();
        fs::write(p.join("a.lst"), "a.dis a.nam").unwrap();

        assert_eq!(find_parent(&p.join("a.dis"), LIMIT).unwrap(), ParentLookup::Found(p.join("a.nam")));
        assert_eq!(find_parent(&p.join("a.nam"), LIMIT).unwrap(), ParentLookup::Found(p.join("mfsim.nam")));
        assert_eq!(find_parent(&p.join("mfsim.nam"), LIMIT).unwrap(), ParentLookup::TopLevel);
    }

    #[test]
    fn test_substring_reference_is_not_a_parent() {
        let dir = tempdir().unwrap();
        let p = dir.path();
        fs::write(p.join("a.dis"), "").unwrap();
        fs::write(p.join("b.nam"), "DIS6 dummy_a.dis\n").unwrap();
        fs::write(p.join("c.lst"), "a.dis").unwrap();
        assert_eq!(
            find_parent(&p.join("a.dis"), LIMIT).unwrap(),
            ParentLookup::NotFound { oversized: vec![] }
        );
    }

    #[test]
    fn test_oversized_candidates_are_reported() {
        let dir = tempdir().unwrap();
        let p = dir.path();
        fs::write(p.join("a.dis"), "").unwrap();
        fs::write(p.join("big.nam"), "DIS6 a.dis".repeat(20)).unwrap();
        match find_parent(&p.join("a.dis"), 16).unwrap() {
            ParentLookup::NotFound { oversized } => assert_eq!(oversized, vec![p.join("big.nam")]),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("gone").join("a.dis");
        assert!(find_parent(&missing, LIMIT).is_err());
    }

    #[test]
    fn test_resolve_definition() {
        let dir = tempdir().unwrap();
        let p = dir.path();
        fs::write(p.join("model.tdis"), "BEGIN options\nEND options").unwrap();
        fs::create_dir(p.join("sub")).unwrap();

        assert_eq!(
            resolve_definition(p, "model.tdis", LIMIT).unwrap(),
            DefinitionLookup::Found(p.join("model.tdis"))
        );
        assert_eq!(
            resolve_definition(p, "missing.tdis", LIMIT).unwrap(),
            DefinitionLookup::NotFound(p.join("missing.tdis"))
        );
        assert_eq!(
            resolve_definition(p, "sub", LIMIT).unwrap(),
            DefinitionLookup::NotFound(p.join("sub"))
        );
        assert!(matches!(
            resolve_definition(p, "model.tdis", 4).unwrap(),
            DefinitionLookup::Oversized { size: 25, .. }
        ));
    }

    #[test]
    fn test_definition_at_cursor() {
        let dir = tempdir().unwrap();
        let p = dir.path();
        fs::write(p.join("test_model.tdis"), "BEGIN\nEND").unwrap();
        let nam = p.join("test_model.nam");
        let text = "BEGIN\ntest_model.tdis\nEND";
        let doc = Document::with_path(text, &nam);

        assert_eq!(
            definition_at(&doc, TextPosition::new(1, 0), LIMIT).unwrap(),
            Some(DefinitionLookup::Found(p.join("test_model.tdis")))
        );
        assert_eq!(
            definition_at(&doc, TextPosition::new(0, 0), LIMIT).unwrap(),
            Some(DefinitionLookup::NotFound(p.join("BEGIN")))
        );
        assert_eq!(definition_at(&Document::new(text), TextPosition::new(1, 0), LIMIT).unwrap(), None);
    }

    #[test]
    fn test_user_messages() {
        assert_eq!(ParentLookup::TopLevel.message("50").unwrap(), "mfsim.nam is already the top-level file.");
        assert_eq!(ParentLookup::Found(PathBuf::from("a.nam")).message("50"), None);
        assert_eq!(
            ParentLookup::NotFound { oversized: vec![PathBuf::from("big.nam")] }.message("0.5").unwrap(),
            "No parent file found within the directory. Parent file may exist but above the 0.5MB size limit. See setting 'mf6Syntax.maxFileSizeMB'."
        );
        assert_eq!(
            DefinitionLookup::NotFound(PathBuf::from("/m/model.tdis")).message("50").unwrap(),
            "File model.tdis not found"
        );
        assert!(
            DefinitionLookup::Oversized { path: PathBuf::from("/m/big.dis"), size: 9 }
                .message("50")
                .unwrap()
                .starts_with("File big.dis exceeds the 50MB size limit")
        );
    }

    #[test]
    fn test_probe_grid_type_prefers_same_stem() {
        let dir = tempdir().unwrap();
        let p = dir.path();
        fs::write(p.join("alpha.disv"), "").unwrap();
        fs::write(p.join("model.dis"), "").unwrap();
        assert_eq!(probe_grid_type(p, Some("model")).unwrap(), Some(GridType::Structured));
        assert_eq!(probe_grid_type(p, Some("other")).unwrap(), Some(GridType::Vertex));
        assert_eq!(probe_grid_type(p, None).unwrap(), Some(GridType::Vertex));

        let empty = tempdir().unwrap();
        assert_eq!(probe_grid_type(empty.path(), None).unwrap(), None);
    }
}

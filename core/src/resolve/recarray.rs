use tracing::debug;

use crate::reference::{ReferenceData, RowLayout, select_by_extension, tag_matches_extension};

const CELLID: &str = "cellid";

/// Discretization type of the model a file belongs to; decides how many
/// positional values a `cellid` column occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridType {
    /// DIS: layer, row, column.
    Structured,
    /// DISV: layer, cell2d.
    Vertex,
    /// DISU: node.
    Unstructured,
}

impl GridType {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "dis" => Some(GridType::Structured),
            "disv" => Some(GridType::Vertex),
            "disu" => Some(GridType::Unstructured),
            _ => None,
        }
    }

    /// Slots a `cellid` takes beyond the first one.
    pub fn cellid_repeat(self) -> usize {
        match self {
            GridType::Structured => 2,
            GridType::Vertex => 1,
            GridType::Unstructured => 0,
        }
    }
}

/// Column names by position, with `cellid` repeated for its extra slots.
pub fn expand_columns<'a>(columns: &[&'a str], grid: Option<GridType>) -> Vec<&'a str> {
    let repeat = grid.map(GridType::cellid_repeat).unwrap_or(0);
    let mut out = Vec::with_capacity(columns.len() + repeat);
    for &col in columns {
        out.push(col);
        if col.eq_ignore_ascii_case(CELLID) {
            out.extend(std::iter::repeat_n(col, repeat));
        }
    }
    out
}

/// Column name at token `index` of a data row in `block`.
///
/// Only layouts documented for `extension` are used. When none is, a block
/// with a single layout still resolves through it; with several candidate
/// layouts the column is unknown.
pub fn resolve_column<'r>(
    reference: &'r ReferenceData,
    block: &str,
    extension: Option<&str>,
    index: usize,
    grid: Option<GridType>,
) -> Option<&'r str> {
    let layouts = reference.row_layouts(block);
    let selection = select_by_extension(&layouts, |layout: &RowLayout<'_>| {
        layout.tags.iter().any(|t| tag_matches_extension(t, extension))
    });

    if !selection.matched && selection.items.len() > 1 {
        debug!("no '{}' row layout documents {:?}", block, extension);
        return None;
    }
    selection
        .items
        .iter()
        .find_map(|layout| expand_columns(&layout.columns, grid).get(index).copied())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> ReferenceData {
        ReferenceData::builtin().unwrap()
    }

    #[test]
    fn test_expand_columns_by_grid_type() {
        let cols = ["cellid", "q", "aux"];
        assert_eq!(
            expand_columns(&cols, Some(GridType::Structured)),
            vec!["cellid", "cellid", "cellid", "q", "aux"]
        );
        assert_eq!(expand_columns(&cols, Some(GridType::Vertex)), vec!["cellid", "cellid", "q", "aux"]);
        assert_eq!(expand_columns(&cols, Some(GridType::Unstructured)), vec!["cellid", "q", "aux"]);
        assert_eq!(expand_columns(&cols, None), vec!["cellid", "q", "aux"]);
    }

    #[test]
    fn test_structured_well_row() {
        let data = reference();
        let grid = Some(GridType::Structured);
        for index in 0..3 {
            assert_eq!(resolve_column(&data, "period", Some("wel"), index, grid), Some("cellid"));
        }
        assert_eq!(resolve_column(&data, "period", Some("wel"), 3, grid), Some("q"));
        assert_eq!(resolve_column(&data, "period", Some("wel"), 5, grid), Some("boundname"));
        assert_eq!(resolve_column(&data, "period", Some("wel"), 6, grid), None);
    }

    #[test]
    fn test_vertex_grid_shifts_columns() {
        let data = reference();
        assert_eq!(
            resolve_column(&data, "period", Some("chd"), 2, Some(GridType::Vertex)),
            Some("head")
        );
    }

    #[test]
    fn test_undocumented_extension_has_no_columns() {
        let data = reference();
        // `.ghb` has no period layout; borrowing another package's would mislabel values.
        for index in [0, 1, 9] {
            assert_eq!(
                resolve_column(&data, "period", Some("ghb"), index, Some(GridType::Unstructured)),
                None
            );
        }
        assert_eq!(resolve_column(&data, "period", None, 0, None), None);
    }

    #[test]
    fn test_single_layout_block_resolves_without_match() {
        let data = reference();
        assert_eq!(resolve_column(&data, "perioddata", Some("txt"), 1, None), Some("nstp"));
        assert_eq!(resolve_column(&data, "perioddata", Some("txt"), 3, None), None);
    }

    #[test]
    fn test_block_without_layouts() {
        assert_eq!(resolve_column(&reference(), "options", Some("dis"), 0, None), None);
    }

    #[test]
    fn test_grid_type_from_extension() {
        assert_eq!(GridType::from_extension("DISV"), Some(GridType::Vertex));
        assert_eq!(GridType::from_extension("wel"), None);
    }
}

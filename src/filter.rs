use crate::grid::{CellValue, Grid};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("none of the requested columns exist in the header row")]
    NoMatchingColumns,
}

/// Resolve requested header names to column positions
///
/// Each name is looked up left to right in `header` and the first exact,
/// case-sensitive match against the cell's display text wins. Empty header
/// cells never match, not even an empty name. Names without a match are
/// skipped, so the result may be shorter than `requested`.
///
/// # Arguments
/// * `header` - Header row of the sheet
/// * `requested` - Column names in the order they should appear in the output
///
/// # Returns
/// * `Vec<usize>` - Zero-based positions, in the order of the matching requests
///
/// # Examples
/// ```
/// use sheet_filter::filter::resolve_columns;
/// use sheet_filter::grid::CellValue;
///
/// let header = vec!["Name".into(), CellValue::Empty, "City".into()];
/// let requested = vec!["City".to_string(), "".to_string(), "Name".to_string()];
/// assert_eq!(resolve_columns(&header, &requested), vec![2, 0]);
/// ```
pub fn resolve_columns(header: &[CellValue], requested: &[String]) -> Vec<usize> {
    requested
        .iter()
        .filter_map(|name| {
            header
                .iter()
                .position(|cell| !cell.is_empty() && cell.to_string() == *name)
        })
        .collect()
}

/// Project a grid onto the requested columns
///
/// The output header row holds the source header cells at the matched
/// positions; every data row holds the cells at the same positions. Row order
/// is preserved.
///
/// # Arguments
/// * `grid` - Source grid, row 0 being the header row
/// * `requested` - Column names in output order
///
/// # Returns
/// * `Result<Grid, FilterError>` - The projected grid, or an error when no
///   requested name matches a header
pub fn select_columns(grid: &Grid, requested: &[String]) -> Result<Grid, FilterError> {
    let header = grid.header();
    let indices = resolve_columns(header, requested);
    if indices.is_empty() {
        return Err(FilterError::NoMatchingColumns);
    }

    // Short rows read as empty past their last stored cell
    let project = |row: &[CellValue]| -> Vec<CellValue> {
        indices
            .iter()
            .map(|&col| row.get(col).cloned().unwrap_or_default())
            .collect()
    };

    let mut rows = Vec::with_capacity(grid.len());
    rows.push(project(header));
    rows.extend(grid.data_rows().iter().map(|row| project(row)));

    Ok(Grid::new(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn people() -> Grid {
        Grid::new(vec![
            vec!["Name".into(), "Age".into(), "City".into()],
            vec!["Ann".into(), 30.into(), "NY".into()],
            vec!["Bo".into(), 25.into(), "LA".into()],
        ])
    }

    #[test]
    fn output_follows_request_order() {
        let filtered = select_columns(&people(), &names(&["City", "Name"])).unwrap();

        assert_eq!(
            filtered,
            Grid::new(vec![
                vec!["City".into(), "Name".into()],
                vec!["NY".into(), "Ann".into()],
                vec!["LA".into(), "Bo".into()],
            ])
        );
    }

    #[test]
    fn unknown_columns_are_dropped() {
        let filtered = select_columns(&people(), &names(&["Zip", "Age"])).unwrap();

        assert_eq!(filtered.header_names(), vec!["Age"]);
        assert_eq!(filtered.data_rows()[0], vec![CellValue::Number(30.0)]);
        assert_eq!(filtered.data_rows()[1], vec![CellValue::Number(25.0)]);
    }

    #[test]
    fn no_matching_column_is_an_error() {
        let result = select_columns(&people(), &names(&["Zip", "name"]));
        assert_eq!(result, Err(FilterError::NoMatchingColumns));
    }

    #[test]
    fn blank_headers_never_match() {
        let grid = Grid::new(vec![
            vec!["A".into(), CellValue::Empty, "C".into()],
            vec!["a".into(), "hidden".into(), "c".into()],
        ]);

        let result = select_columns(&grid, &names(&[""]));
        assert_eq!(result, Err(FilterError::NoMatchingColumns));

        let filtered = select_columns(&grid, &names(&["", "C"])).unwrap();
        assert_eq!(filtered.header_names(), vec!["C"]);
    }

    #[test]
    fn duplicate_headers_use_first_occurrence() {
        let grid = Grid::new(vec![
            vec!["Id".into(), "Tag".into(), "Tag".into()],
            vec![1.into(), "first".into(), "second".into()],
        ]);

        let filtered = select_columns(&grid, &names(&["Tag", "Tag"])).unwrap();

        assert_eq!(filtered.rows()[1], vec![CellValue::from("first"), CellValue::from("first")]);
    }

    #[test]
    fn full_header_set_reproduces_the_grid() {
        let grid = people();
        let filtered = select_columns(&grid, &grid.header_names()).unwrap();

        assert_eq!(filtered, grid);
    }

    #[test]
    fn short_rows_read_as_empty_cells() {
        let grid = Grid::new(vec![
            vec!["A".into(), "B".into(), "C".into()],
            vec!["a1".into()],
            vec!["a2".into(), CellValue::Empty, "c2".into()],
        ]);

        let filtered = select_columns(&grid, &names(&["C", "A"])).unwrap();

        assert_eq!(filtered.rows()[1], vec![CellValue::Empty, CellValue::from("a1")]);
        assert_eq!(filtered.rows()[2], vec![CellValue::from("c2"), CellValue::from("a2")]);
    }

    #[test]
    fn numeric_headers_match_their_text() {
        let grid = Grid::new(vec![vec![2024.into(), "Total".into()], vec![7.into(), 9.into()]]);

        let filtered = select_columns(&grid, &names(&["2024"])).unwrap();

        assert_eq!(filtered.header(), &[CellValue::Number(2024.0)]);
    }

    #[test]
    fn header_only_sheet_keeps_the_header() {
        let grid = Grid::new(vec![vec!["A".into(), "B".into()]]);

        let filtered = select_columns(&grid, &names(&["B"])).unwrap();

        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.header_names(), vec!["B"]);
    }
}

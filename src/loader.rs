use crate::grid::{CellValue, Grid};
use calamine::{Data, Reader, open_workbook_auto_from_rs};
use std::fs;
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;

/// Errors raised while reading a workbook
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read workbook file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse workbook: {0}")]
    Parse(#[from] calamine::Error),

    #[error("workbook has no sheets")]
    NoSheets,
}

/// Load the first sheet of a workbook file into a grid
///
/// The format (`.xlsx`, `.xlsm`, `.xls`, `.ods`) is detected from the file
/// content rather than its extension, since stored upload names keep
/// whatever extension the client sent.
///
/// # Arguments
/// * `filepath` - Path to the workbook file
///
/// # Returns
/// * `Result<Grid, LoadError>` - The first sheet as a row-major grid or an error
///
/// # Examples
/// ```no_run
/// use sheet_filter::loader::load_first_sheet;
///
/// match load_first_sheet("uploads/1700000000000-data.xlsx") {
///     Ok(grid) => println!("Loaded {} rows", grid.len()),
///     Err(e) => eprintln!("Error loading workbook: {}", e),
/// }
/// ```
pub fn load_first_sheet(filepath: impl AsRef<Path>) -> Result<Grid, LoadError> {
    let bytes = fs::read(filepath)?;
    grid_from_bytes(bytes)
}

/// Parse the first sheet of an in-memory workbook into a grid
pub fn grid_from_bytes(bytes: Vec<u8>) -> Result<Grid, LoadError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;

    // Get the first worksheet
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(LoadError::NoSheets)?;

    let range = workbook.worksheet_range(&sheet_name)?;

    let rows = range
        .rows()
        .map(|row| row.iter().map(to_cell_value).collect())
        .collect();

    Ok(Grid::new(rows))
}

fn to_cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(text) => CellValue::Text(text.clone()),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        // Dates keep their serial number, as the sheet stores them
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(text) | Data::DurationIso(text) => CellValue::Text(text.clone()),
        Data::Error(e) => CellValue::Text(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;

    fn write_fixture(path: &Path) {
        let mut workbook = Workbook::new();

        let first = workbook.add_worksheet();
        first.set_name("People").unwrap();
        first.write_string(0, 0, "Name").unwrap();
        first.write_string(0, 1, "Age").unwrap();
        first.write_string(0, 2, "City").unwrap();
        first.write_string(1, 0, "Ann").unwrap();
        first.write_number(1, 1, 30.0).unwrap();
        first.write_string(1, 2, "NY").unwrap();
        first.write_string(2, 0, "Bo").unwrap();
        first.write_number(2, 1, 25.5).unwrap();
        first.write_boolean(2, 2, true).unwrap();

        let second = workbook.add_worksheet();
        second.write_string(0, 0, "Ignored").unwrap();

        workbook.save(path).unwrap();
    }

    #[test]
    fn reads_only_the_first_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("people.xlsx");
        write_fixture(&path);

        let grid = load_first_sheet(&path).unwrap();

        assert_eq!(grid.header_names(), vec!["Name", "Age", "City"]);
        assert_eq!(grid.len(), 3);
        assert_eq!(
            grid.data_rows()[0],
            vec![CellValue::from("Ann"), CellValue::Number(30.0), CellValue::from("NY")]
        );
        assert_eq!(
            grid.data_rows()[1],
            vec![CellValue::from("Bo"), CellValue::Number(25.5), CellValue::Bool(true)]
        );
    }

    #[test]
    fn format_is_detected_without_an_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("people.xlsx");
        write_fixture(&path);

        let renamed = dir.path().join("1700000000000-people");
        fs::rename(&path, &renamed).unwrap();

        let grid = load_first_sheet(&renamed).unwrap();
        assert_eq!(grid.header_names(), vec!["Name", "Age", "City"]);
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let result = grid_from_bytes(b"definitely not a workbook".to_vec());
        assert!(matches!(result, Err(LoadError::Parse(_))));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_first_sheet(dir.path().join("absent.xlsx"));
        assert!(matches!(result, Err(LoadError::Io(_))));
    }
}

use crate::grid::{CellValue, Grid};
use rust_xlsxwriter::{ColNum, RowNum, Workbook, XlsxError};
use thiserror::Error;

/// Name of the single sheet in an exported workbook
pub const EXPORT_SHEET_NAME: &str = "Filtered Data";

/// MIME type of `.xlsx` downloads
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write workbook: {0}")]
    Xlsx(#[from] XlsxError),

    #[error("grid does not fit in a worksheet (row {row}, column {col})")]
    TooLarge { row: usize, col: usize },
}

/// Convert a grid to XLSX format
///
/// Exports the grid as a workbook with a single sheet named
/// [`EXPORT_SHEET_NAME`], using the rust_xlsxwriter library. Text, numbers
/// and booleans are written with their own cell type, empty cells are left
/// blank.
///
/// # Arguments
/// * `grid` - The grid to export, row 0 being the header row
///
/// # Returns
/// * `Result<Vec<u8>, ExportError>` - XLSX file content as bytes or an error
///
/// # Examples
/// ```
/// use sheet_filter::downloader::to_xlsx;
/// use sheet_filter::grid::Grid;
///
/// let grid = Grid::new(vec![vec!["City".into()], vec!["NY".into()]]);
/// match to_xlsx(&grid) {
///     Ok(xlsx_data) => println!("XLSX generated: {} bytes", xlsx_data.len()),
///     Err(e) => eprintln!("Failed to generate XLSX: {}", e),
/// }
/// ```
pub fn to_xlsx(grid: &Grid) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(EXPORT_SHEET_NAME)?;

    // Write cell data
    for (r, row) in grid.rows().iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            let (Ok(row_num), Ok(col_num)) = (RowNum::try_from(r), ColNum::try_from(c)) else {
                return Err(ExportError::TooLarge { row: r, col: c });
            };

            match cell {
                CellValue::Empty => {}
                CellValue::Text(text) => {
                    worksheet.write_string(row_num, col_num, text.as_str())?;
                }
                CellValue::Number(n) => {
                    worksheet.write_number(row_num, col_num, *n)?;
                }
                CellValue::Bool(b) => {
                    worksheet.write_boolean(row_num, col_num, *b)?;
                }
            }
        }
    }

    let buffer = workbook.save_to_buffer()?;

    Ok(buffer)
}

/// Build the `Content-Disposition` value for a download
///
/// The base name is percent-encoded as UTF-8 (RFC 5987 `filename*` form) and
/// the `.xlsx` extension is appended. Only ASCII alphanumerics and `-_.~` are
/// left as-is, so apostrophes always come out as `%27`.
///
/// # Arguments
/// * `base_name` - Output file name without extension
///
/// # Returns
/// * `String` - Header value of the form `attachment; filename*=UTF-8''<name>.xlsx`
///
/// # Examples
/// ```
/// use sheet_filter::downloader::content_disposition;
///
/// assert_eq!(
///     content_disposition("Bo's list"),
///     "attachment; filename*=UTF-8''Bo%27s%20list.xlsx",
/// );
/// ```
pub fn content_disposition(base_name: &str) -> String {
    let encoded = urlencoding::encode(base_name).replace('\'', "%27");
    format!("attachment; filename*=UTF-8''{}.xlsx", encoded)
}

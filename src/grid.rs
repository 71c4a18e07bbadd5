use std::fmt;

/// A single raw cell value read from a worksheet
///
/// Only the raw value is kept. Formatting, styles and formulas are dropped;
/// formula cells carry their cached result.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CellValue {
    /// No value in the cell
    #[default]
    Empty,

    /// Text content (also used for error cells such as `#DIV/0!`)
    Text(String),

    /// Numeric content; dates are stored as their serial number
    Number(f64),

    /// Boolean content
    Bool(bool),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(text) => f.write_str(text),
            // Integral values print without a fractional part
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        CellValue::Number(f64::from(value))
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

/// Row-major cell grid parsed from the first sheet of a workbook
///
/// Row 0 is the header row, every following row is data. Rows may have
/// different lengths: trailing empty cells are not stored, so callers treat
/// positions past the end of a row as [`CellValue::Empty`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    rows: Vec<Vec<CellValue>>,
}

impl Grid {
    /// Create a grid from rows, dropping trailing empty cells of each row
    ///
    /// # Arguments
    /// * `rows` - Rows in sheet order, row 0 being the header row
    ///
    /// # Returns
    /// * `Grid` - The normalized grid
    ///
    /// # Examples
    /// ```
    /// use sheet_filter::grid::{CellValue, Grid};
    ///
    /// let grid = Grid::new(vec![vec!["Name".into(), CellValue::Empty]]);
    /// assert_eq!(grid.header_names(), vec!["Name".to_string()]);
    /// ```
    pub fn new(rows: Vec<Vec<CellValue>>) -> Self {
        let rows = rows
            .into_iter()
            .map(|mut row| {
                while row.last().is_some_and(CellValue::is_empty) {
                    row.pop();
                }
                row
            })
            .collect();

        Grid { rows }
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    /// Number of rows, header row included
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The header row (row 0), or an empty slice for an empty sheet
    pub fn header(&self) -> &[CellValue] {
        self.rows.first().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Data rows (every row after the header)
    pub fn data_rows(&self) -> &[Vec<CellValue>] {
        self.rows.get(1..).unwrap_or(&[])
    }

    /// The header row rendered as strings, in sheet order
    pub fn header_names(&self) -> Vec<String> {
        self.header().iter().map(ToString::to_string).collect()
    }
}

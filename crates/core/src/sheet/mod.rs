//! Tabular persistence backends.
//!
//! The census core only needs three operations from its backing sheet: read every row, write a
//! single cell, and grow the sheet by a number of empty rows. Each call is a blocking,
//! whole-operation call; the backend is responsible for making single-cell writes and appends
//! atomic with respect to each other.
//!
//! Rows and columns are 1-indexed, matching what operators see in a spreadsheet.

mod memory;
mod yaml;

pub use memory::MemorySheet;
pub use yaml::YamlSheet;

/// Errors raised by a sheet backend.
#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    #[error("sheet I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid sheet YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("sheet schema mismatch: {0}")]
    Schema(String),

    #[error("cell ({row}, {column}) is outside the sheet (capacity {capacity} rows)")]
    OutOfRange {
        row: usize,
        column: usize,
        capacity: usize,
    },

    #[error("sheet backend unavailable: {0}")]
    Unavailable(String),
}

pub type SheetResult<T> = std::result::Result<T, SheetError>;

/// A tabular store addressed by 1-indexed row and column.
pub trait SheetBackend: Send + Sync {
    /// All populated rows, in order, starting at row 1. Trailing empty rows are omitted.
    fn read_all_rows(&self) -> SheetResult<Vec<Vec<String>>>;

    /// Overwrite one cell. The row must be within [`SheetBackend::row_capacity`].
    fn write_cell(&self, row: usize, column: usize, value: &str) -> SheetResult<()>;

    /// Grow the sheet by `count` empty rows.
    fn append_empty_rows(&self, count: usize) -> SheetResult<()>;

    /// Number of addressable rows, populated or not.
    fn row_capacity(&self) -> SheetResult<usize>;
}

/// In-memory grid shared by the concrete backends.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Grid {
    pub capacity: usize,
    pub rows: Vec<Vec<String>>,
}

impl Grid {
    pub fn populated_rows(&self) -> Vec<Vec<String>> {
        let mut rows = self.rows.clone();
        while rows
            .last()
            .is_some_and(|r| r.iter().all(|c| c.trim().is_empty()))
        {
            rows.pop();
        }
        rows
    }

    pub fn write_cell(&mut self, row: usize, column: usize, value: &str) -> SheetResult<()> {
        if row == 0 || column == 0 || row > self.capacity {
            return Err(SheetError::OutOfRange {
                row,
                column,
                capacity: self.capacity,
            });
        }

        if self.rows.len() < row {
            self.rows.resize_with(row, Vec::new);
        }
        let cells = &mut self.rows[row - 1];
        if cells.len() < column {
            cells.resize(column, String::new());
        }
        cells[column - 1] = value.to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_pads_rows_and_columns_on_write() {
        let mut grid = Grid {
            capacity: 5,
            rows: vec![],
        };
        grid.write_cell(3, 2, "x").expect("write within capacity");
        assert_eq!(grid.rows.len(), 3);
        assert_eq!(grid.rows[2], vec!["".to_string(), "x".to_string()]);
    }

    #[test]
    fn grid_rejects_writes_past_capacity() {
        let mut grid = Grid {
            capacity: 2,
            rows: vec![],
        };
        let err = grid.write_cell(3, 1, "x").expect_err("row 3 is past capacity");
        assert!(matches!(err, SheetError::OutOfRange { row: 3, .. }));
    }

    #[test]
    fn populated_rows_drops_trailing_blank_rows() {
        let grid = Grid {
            capacity: 10,
            rows: vec![
                vec!["h".into()],
                vec!["".into(), " ".into()],
                vec!["a".into()],
                vec!["".into()],
                vec![],
            ],
        };
        assert_eq!(grid.populated_rows().len(), 3);
    }
}

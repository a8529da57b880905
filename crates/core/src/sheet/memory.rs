use super::{Grid, SheetBackend, SheetError, SheetResult};
use crate::constants::HEADER_ROW;
use std::sync::Mutex;

/// A sheet held entirely in memory.
///
/// Used by tests and by short-lived tools that do not need persistence.
#[derive(Debug, Default)]
pub struct MemorySheet {
    grid: Mutex<Grid>,
}

impl MemorySheet {
    /// An empty sheet with a header row and `capacity` addressable rows.
    pub fn with_header(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            grid: Mutex::new(Grid {
                capacity,
                rows: vec![HEADER_ROW.iter().map(|c| c.to_string()).collect()],
            }),
        }
    }

    /// A sheet pre-populated with `rows`, starting at row 1.
    pub fn from_rows(rows: Vec<Vec<String>>, capacity: usize) -> Self {
        let capacity = capacity.max(rows.len());
        Self {
            grid: Mutex::new(Grid { capacity, rows }),
        }
    }

    fn lock(&self) -> SheetResult<std::sync::MutexGuard<'_, Grid>> {
        self.grid
            .lock()
            .map_err(|_| SheetError::Unavailable("in-memory sheet lock poisoned".into()))
    }
}

impl SheetBackend for MemorySheet {
    fn read_all_rows(&self) -> SheetResult<Vec<Vec<String>>> {
        Ok(self.lock()?.populated_rows())
    }

    fn write_cell(&self, row: usize, column: usize, value: &str) -> SheetResult<()> {
        self.lock()?.write_cell(row, column, value)
    }

    fn append_empty_rows(&self, count: usize) -> SheetResult<()> {
        let mut grid = self.lock()?;
        grid.capacity += count;
        Ok(())
    }

    fn row_capacity(&self) -> SheetResult<usize> {
        Ok(self.lock()?.capacity)
    }
}

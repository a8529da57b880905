//! A sheet persisted as a single YAML document.
//!
//! ```yaml
//! title: Template [Edit Here ONLY]
//! capacity: 51
//! rows:
//!   - [Critical, GM, "", O2, ...]
//!   - [...]
//! ```
//!
//! Every operation re-reads the file, and writes replace it through a temporary sibling file and
//! a rename, so a crash never leaves a half-written sheet behind.

use super::{Grid, SheetBackend, SheetError, SheetResult};
use crate::constants::HEADER_ROW;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct SheetWire {
    title: String,
    capacity: usize,
    #[serde(default)]
    rows: Vec<Vec<String>>,
}

/// File-backed sheet.
#[derive(Debug)]
pub struct YamlSheet {
    path: PathBuf,
    title: String,
    // Serialises read-modify-write cycles within this process.
    guard: Mutex<()>,
}

impl YamlSheet {
    /// Open an existing sheet file, checking its worksheet title.
    ///
    /// # Errors
    ///
    /// Returns [`SheetError::Io`] if the file cannot be read, or [`SheetError::Schema`] if it does
    /// not match the sheet layout or carries a different title.
    pub fn open(path: impl Into<PathBuf>, title: &str) -> SheetResult<Self> {
        let sheet = Self {
            path: path.into(),
            title: title.to_string(),
            guard: Mutex::new(()),
        };
        sheet.load()?;
        Ok(sheet)
    }

    /// Create a new sheet file holding only the header row.
    ///
    /// # Errors
    ///
    /// Fails if the file already exists.
    pub fn create(path: impl Into<PathBuf>, title: &str, capacity: usize) -> SheetResult<Self> {
        let path = path.into();
        if path.exists() {
            return Err(SheetError::Io(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("sheet file already exists: {}", path.display()),
            )));
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let sheet = Self {
            path,
            title: title.to_string(),
            guard: Mutex::new(()),
        };
        sheet.store(&Grid {
            capacity: capacity.max(1),
            rows: vec![HEADER_ROW.iter().map(|c| c.to_string()).collect()],
        })?;
        Ok(sheet)
    }

    /// Open the sheet at `path`, creating it first if it does not exist.
    pub fn open_or_create(
        path: impl Into<PathBuf>,
        title: &str,
        capacity: usize,
    ) -> SheetResult<Self> {
        let path = path.into();
        if path.exists() {
            Self::open(path, title)
        } else {
            tracing::info!("creating census sheet at {}", path.display());
            Self::create(path, title, capacity)
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> SheetResult<Grid> {
        let text = fs::read_to_string(&self.path)?;
        let deserializer = serde_yaml::Deserializer::from_str(&text);
        let wire: SheetWire = serde_path_to_error::deserialize(deserializer).map_err(|err| {
            let path = err.path().to_string();
            let source = err.into_inner();
            let path = if path.is_empty() { "<root>" } else { path.as_str() };
            SheetError::Schema(format!("{} at {path}: {source}", self.path.display()))
        })?;

        if wire.title != self.title {
            return Err(SheetError::Schema(format!(
                "worksheet '{}' not found in {} (found '{}')",
                self.title,
                self.path.display(),
                wire.title
            )));
        }

        Ok(Grid {
            capacity: wire.capacity.max(wire.rows.len()),
            rows: wire.rows,
        })
    }

    fn store(&self, grid: &Grid) -> SheetResult<()> {
        let wire = SheetWire {
            title: self.title.clone(),
            capacity: grid.capacity,
            rows: grid.rows.clone(),
        };
        let text = serde_yaml::to_string(&wire)?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, text)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn modify(&self, f: impl FnOnce(&mut Grid) -> SheetResult<()>) -> SheetResult<()> {
        let _guard = self
            .guard
            .lock()
            .map_err(|_| SheetError::Unavailable("sheet file lock poisoned".into()))?;
        let mut grid = self.load()?;
        f(&mut grid)?;
        self.store(&grid)
    }
}

impl SheetBackend for YamlSheet {
    fn read_all_rows(&self) -> SheetResult<Vec<Vec<String>>> {
        Ok(self.load()?.populated_rows())
    }

    fn write_cell(&self, row: usize, column: usize, value: &str) -> SheetResult<()> {
        self.modify(|grid| grid.write_cell(row, column, value))
    }

    fn append_empty_rows(&self, count: usize) -> SheetResult<()> {
        self.modify(|grid| {
            grid.capacity += count;
            Ok(())
        })
    }

    fn row_capacity(&self) -> SheetResult<usize> {
        Ok(self.load()?.capacity)
    }
}

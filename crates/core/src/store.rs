//! Census store adapter.
//!
//! Maps [`PatientRecord`]s onto the fixed column layout of the census sheet. This is the only
//! module that knows column positions; everything above it works with records.

use crate::codec::{self, EntryFields};
use crate::config::{CensusConfig, DerivedColumns};
use crate::constants::{
    COL_CRITICAL, COL_CWI, COL_DISPO, COL_JRIC, COL_O2, COL_PATIENT, COL_SERVICE, COL_WARD_BED,
    FIRST_DATA_ROW, O2_TOKENS,
};
use crate::record::{CriticalFlag, Disposition, PatientRecord, SpecialTag};
use crate::sheet::SheetBackend;
use crate::{CensusError, CensusResult};
use std::sync::{Arc, Mutex, PoisonError};

/// A fully collected entry, ready to be committed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewRecord {
    pub fields: EntryFields,
    pub disposition: Disposition,
    pub cwi: String,
}

/// Record-level access to the census sheet.
#[derive(Clone)]
pub struct CensusStore {
    backend: Arc<dyn SheetBackend>,
    derived_columns: DerivedColumns,
    row_growth: usize,
    // Held from row allocation until the line cell is written.
    commit_lock: Arc<Mutex<()>>,
}

impl std::fmt::Debug for CensusStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CensusStore")
            .field("derived_columns", &self.derived_columns)
            .field("row_growth", &self.row_growth)
            .finish_non_exhaustive()
    }
}

impl CensusStore {
    pub fn new(backend: Arc<dyn SheetBackend>, cfg: &CensusConfig) -> Self {
        Self {
            backend,
            derived_columns: cfg.derived_columns(),
            row_growth: cfg.row_growth(),
            commit_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Read every present record, in sheet order.
    ///
    /// A row is present iff its encoded-line cell is non-empty after trimming. Header rows are
    /// never returned.
    pub fn load_records(&self) -> CensusResult<Vec<PatientRecord>> {
        let rows = self.backend.read_all_rows()?;

        let records = rows
            .iter()
            .enumerate()
            .map(|(idx, cells)| (idx + 1, cells))
            .filter(|(row, _)| *row >= FIRST_DATA_ROW)
            .filter_map(|(row, cells)| {
                let line = cell(cells, COL_PATIENT);
                if line.trim().is_empty() {
                    return None;
                }
                Some(PatientRecord::new(
                    row,
                    line,
                    parse_disposition(row, cell(cells, COL_DISPO)),
                    cell(cells, COL_WARD_BED),
                    cell(cells, COL_JRIC),
                    cell(cells, COL_CWI),
                ))
            })
            .collect();

        Ok(records)
    }

    /// Append a new record to the end of the sheet.
    ///
    /// The next row is one past the last populated row. When that row is beyond the sheet's
    /// capacity the sheet is grown first. The encoded line is written last, so a commit that fails
    /// part-way never leaves a row that reads back as present.
    ///
    /// Commits through clones of the same store are serialised, so concurrent operators never
    /// share a row.
    pub fn commit(&self, record: &NewRecord) -> CensusResult<PatientRecord> {
        let line = codec::encode(&record.fields);
        let ward_bed = record.fields.ward_bed();

        let _guard = self
            .commit_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let populated = self.backend.read_all_rows()?.len();
        let row = (populated + 1).max(FIRST_DATA_ROW);

        if row > self.backend.row_capacity()? {
            tracing::info!("census sheet full at row {}, adding {} rows", row, self.row_growth);
            self.backend.append_empty_rows(self.row_growth)?;
        }

        let (critical, service, o2) = self.derived_cells(row, &line);
        let cells = [
            (COL_CRITICAL, critical),
            (COL_SERVICE, service),
            (COL_O2, o2),
            (COL_DISPO, record.disposition.as_str().to_string()),
            (COL_WARD_BED, ward_bed.clone()),
            (COL_JRIC, record.fields.jric.clone()),
            (COL_CWI, record.cwi.clone()),
            (COL_PATIENT, line.clone()),
        ];
        for (column, value) in &cells {
            self.backend.write_cell(row, *column, value)?;
        }

        tracing::info!("committed census record at row {}", row);

        Ok(PatientRecord::new(
            row,
            line,
            Some(record.disposition),
            ward_bed,
            record.fields.jric.clone(),
            record.cwi.clone(),
        ))
    }

    /// Overwrite the disposition of the record at `row`. No other cell is touched.
    ///
    /// # Errors
    ///
    /// - [`CensusError::HeaderRowWrite`] if `row` is a header row.
    /// - [`CensusError::RecordNotFound`] if no record is present at `row`.
    /// - [`CensusError::Backend`] if the sheet cannot be read or written.
    pub fn update_disposition(&self, row: usize, disposition: Disposition) -> CensusResult<()> {
        if row < FIRST_DATA_ROW {
            return Err(CensusError::HeaderRowWrite(row));
        }
        if !self.load_records()?.iter().any(|r| r.row == row) {
            return Err(CensusError::RecordNotFound(row));
        }

        self.backend
            .write_cell(row, COL_DISPO, disposition.as_str())?;
        tracing::info!("row {} disposition set to {}", row, disposition);
        Ok(())
    }

    fn derived_cells(&self, row: usize, line: &str) -> (String, String, String) {
        match self.derived_columns {
            DerivedColumns::Computed => (
                CriticalFlag::from_line(line).as_str().to_string(),
                codec::decode(line).service_code,
                codec::o2_token(line).unwrap_or_default().to_string(),
            ),
            DerivedColumns::Formula => formulas(row),
        }
    }
}

fn cell(cells: &[String], column: usize) -> &str {
    cells.get(column - 1).map(String::as_str).unwrap_or_default()
}

fn parse_disposition(row: usize, value: &str) -> Option<Disposition> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    match value.parse() {
        Ok(disposition) => Some(disposition),
        Err(_) => {
            tracing::warn!("row {} has unrecognised disposition '{}'", row, value);
            None
        }
    }
}

/// Spreadsheet formulas equivalent to the computed derived columns.
fn formulas(row: usize) -> (String, String, String) {
    let cell = format!("I{row}");
    let airway = SpecialTag::AdvancedAirway.symbol();
    let shock = SpecialTag::Shock.symbol();
    let tokens = O2_TOKENS.join("|");

    (
        format!(
            r#"=IF({cell}="", "", IF(OR(ISNUMBER(SEARCH("{airway}", {cell})), ISNUMBER(SEARCH("{shock}", {cell}))), "Critical", "Non-Crit"))"#
        ),
        format!(r#"=IF({cell}="","",LEFT({cell},3))"#),
        format!(
            r#"=IF(REGEXMATCH({cell}, "\(?({tokens})/"), REGEXEXTRACT({cell}, "\(?({tokens})"), "")"#
        ),
    )
}

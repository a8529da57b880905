//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services.
//! Nothing in this crate reads process environment variables while handling a conversation.

use crate::constants::{DEFAULT_ROW_GROWTH, DEFAULT_SHEET_PATH, DEFAULT_WORKSHEET};
use crate::{CensusError, CensusResult};
use census_types::NonEmptyText;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// How the derived columns (critical flag, service code, O2 token) are written on commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DerivedColumns {
    /// Write the values the sheet formulas would produce.
    #[default]
    Computed,
    /// Write spreadsheet formulas referencing the encoded-line cell.
    Formula,
}

impl FromStr for DerivedColumns {
    type Err = CensusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "computed" => Ok(Self::Computed),
            "formula" => Ok(Self::Formula),
            other => Err(CensusError::InvalidInput(format!(
                "derived column mode must be 'computed' or 'formula', got '{other}'"
            ))),
        }
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CensusConfig {
    sheet_path: PathBuf,
    worksheet: NonEmptyText,
    derived_columns: DerivedColumns,
    row_growth: usize,
}

impl CensusConfig {
    /// Create a new `CensusConfig`.
    ///
    /// # Errors
    ///
    /// Returns `CensusError::InvalidInput` if `row_growth` is zero.
    pub fn new(
        sheet_path: PathBuf,
        worksheet: NonEmptyText,
        derived_columns: DerivedColumns,
        row_growth: usize,
    ) -> CensusResult<Self> {
        if row_growth == 0 {
            return Err(CensusError::InvalidInput(
                "row growth must be greater than zero".into(),
            ));
        }

        Ok(Self {
            sheet_path,
            worksheet,
            derived_columns,
            row_growth,
        })
    }

    /// Build a configuration from raw environment values.
    ///
    /// Missing or blank values fall back to the defaults in [`crate::constants`].
    pub fn from_env_values(
        sheet_path: Option<String>,
        worksheet: Option<String>,
        derived_columns: Option<String>,
        row_growth: Option<String>,
    ) -> CensusResult<Self> {
        let sheet_path = non_blank(sheet_path)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SHEET_PATH));
        let worksheet = NonEmptyText::or_fallback(worksheet, DEFAULT_WORKSHEET)?;

        Self::new(
            sheet_path,
            worksheet,
            derived_columns_from_env_value(derived_columns)?,
            row_growth_from_env_value(row_growth)?,
        )
    }

    pub fn sheet_path(&self) -> &Path {
        &self.sheet_path
    }

    pub fn worksheet(&self) -> &NonEmptyText {
        &self.worksheet
    }

    pub fn derived_columns(&self) -> DerivedColumns {
        self.derived_columns
    }

    pub fn row_growth(&self) -> usize {
        self.row_growth
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse the derived column mode from an optional string value.
///
/// If `value` is `None` or blank, returns [`DerivedColumns::Computed`].
pub fn derived_columns_from_env_value(value: Option<String>) -> CensusResult<DerivedColumns> {
    let parsed = non_blank(value)
        .map(|v| v.parse::<DerivedColumns>())
        .transpose()?;

    Ok(parsed.unwrap_or_default())
}

/// Parse the row growth from an optional string value.
///
/// If `value` is `None` or blank, returns [`DEFAULT_ROW_GROWTH`].
pub fn row_growth_from_env_value(value: Option<String>) -> CensusResult<usize> {
    match non_blank(value) {
        None => Ok(DEFAULT_ROW_GROWTH),
        Some(v) => v.parse::<usize>().map_err(|e| {
            CensusError::InvalidInput(format!("row growth must be a positive integer: {e}"))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_values_missing() {
        let cfg = CensusConfig::from_env_values(None, None, None, None)
            .expect("defaults should be valid");
        assert_eq!(cfg.sheet_path(), Path::new(DEFAULT_SHEET_PATH));
        assert_eq!(cfg.worksheet().as_str(), DEFAULT_WORKSHEET);
        assert_eq!(cfg.derived_columns(), DerivedColumns::Computed);
        assert_eq!(cfg.row_growth(), DEFAULT_ROW_GROWTH);
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let cfg = CensusConfig::from_env_values(
            Some("  ".into()),
            Some("".into()),
            Some(" ".into()),
            Some("".into()),
        )
        .expect("blank values should fall back");
        assert_eq!(cfg.worksheet().as_str(), DEFAULT_WORKSHEET);
        assert_eq!(cfg.row_growth(), DEFAULT_ROW_GROWTH);
    }

    #[test]
    fn parses_formula_mode_case_insensitively() {
        let mode = derived_columns_from_env_value(Some("FORMULA".into())).expect("should parse");
        assert_eq!(mode, DerivedColumns::Formula);
    }

    #[test]
    fn rejects_unknown_derived_mode() {
        let err = derived_columns_from_env_value(Some("magic".into()))
            .expect_err("unknown mode should fail");
        assert!(matches!(err, CensusError::InvalidInput(_)));
    }

    #[test]
    fn rejects_zero_row_growth() {
        let err = CensusConfig::from_env_values(None, None, None, Some("0".into()))
            .expect_err("zero growth should fail");
        assert!(matches!(err, CensusError::InvalidInput(_)));
    }

    #[test]
    fn rejects_non_numeric_row_growth() {
        let err = row_growth_from_env_value(Some("lots".into())).expect_err("should fail");
        assert!(matches!(err, CensusError::InvalidInput(_)));
    }
}

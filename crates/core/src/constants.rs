//! Constants used throughout the census core crate.
//!
//! Column positions are 1-indexed to match the sheet layout operators see.

/// Column A: derived Critical/Non-Crit flag.
pub const COL_CRITICAL: usize = 1;

/// Column B: derived GM service code.
pub const COL_SERVICE: usize = 2;

/// Column D: derived oxygen support token.
pub const COL_O2: usize = 4;

/// Column F: disposition status.
pub const COL_DISPO: usize = 6;

/// Column H: `ward-bed` location.
pub const COL_WARD_BED: usize = 8;

/// Column I: canonical encoded patient line.
pub const COL_PATIENT: usize = 9;

/// Column J: JRIC name as typed by the operator.
pub const COL_JRIC: usize = 10;

/// Column K: current working impression.
pub const COL_CWI: usize = 11;

/// Width of a fully populated census row.
pub const ROW_WIDTH: usize = COL_CWI;

/// First row holding patient data. Rows above it are headers.
pub const FIRST_DATA_ROW: usize = 2;

/// Default number of empty rows appended when a commit runs past the sheet's capacity.
pub const DEFAULT_ROW_GROWTH: usize = 50;

/// Default worksheet title.
pub const DEFAULT_WORKSHEET: &str = "Template [Edit Here ONLY]";

/// Default path of the YAML-backed sheet file.
pub const DEFAULT_SHEET_PATH: &str = "census_sheet.yaml";

/// Default REST listen address.
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:3000";

/// The general-medicine services covered by the ward-wide report, in report order.
pub const WARD_SERVICES: [&str; 6] = ["GM1", "GM2", "GM3", "GM4", "GM5", "GM6"];

/// Group label used in service-mode search for records without a JRIC.
pub const NO_JRIC_LABEL: &str = "No JRIC";

/// Maximum number of entries listed by a substring search.
pub const SEARCH_LIST_LIMIT: usize = 15;

/// Maximum characters of an encoded line shown on a disposition-flow button.
pub const DISPO_BUTTON_WIDTH: usize = 50;

/// Oxygen-support tokens recognised when deriving column D.
pub const O2_TOKENS: [&str; 8] = ["RA", "NC", "FM", "TM", "NRM", "HFNC", "BIPAP", "ET"];

/// Selection token that closes the special-category step.
pub const DONE_TOKEN: &str = "done";

/// Token prefix for the initial disposition offered during entry.
pub const ENTRY_DISPO_PREFIX: &str = "dtype_";

/// Token prefix for a record picked in the disposition flow.
pub const PATIENT_TOKEN_PREFIX: &str = "patient_";

/// Token prefix for a disposition picked in the disposition flow.
pub const DISPO_TOKEN_PREFIX: &str = "dispo_";

/// Header row written when a new sheet is created.
pub const HEADER_ROW: [&str; ROW_WIDTH] = [
    "Critical",
    "GM",
    "",
    "O2",
    "",
    "Dispo",
    "",
    "Ward-Bed",
    "Patient",
    "JRIC",
    "CWI",
];

//! Census record types.
//!
//! Dispositions and special categories are closed enumerations: the sheet only ever receives one
//! of their canonical spellings, and anything else read back is treated as unknown.

use crate::codec::{self, DecodedLine};
use crate::{CensusError, CensusResult};
use serde::Serialize;
use std::str::FromStr;

/// Patient-flow status of a census record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Disposition {
    #[serde(rename = "OLD")]
    Old,
    #[serde(rename = "ADMITTED")]
    Admitted,
    #[serde(rename = "HOME")]
    Home,
    #[serde(rename = "TOS IN")]
    TosIn,
    #[serde(rename = "TRANS IN FROM ICU")]
    TransInFromIcu,
    #[serde(rename = "MORT")]
    Mort,
    #[serde(rename = "TOS OUT")]
    TosOut,
    #[serde(rename = "TRANS OUT TO ICU")]
    TransOutToIcu,
    #[serde(rename = "HAMA/HPR")]
    HamaHpr,
    #[serde(rename = "THOC")]
    Thoc,
    #[serde(rename = "ABSCOND")]
    Abscond,
}

impl Disposition {
    /// Every disposition, in the order offered by the disposition-update flow.
    pub const ALL: [Disposition; 11] = [
        Disposition::Old,
        Disposition::Admitted,
        Disposition::Home,
        Disposition::TosIn,
        Disposition::TransInFromIcu,
        Disposition::Mort,
        Disposition::TosOut,
        Disposition::TransOutToIcu,
        Disposition::HamaHpr,
        Disposition::Thoc,
        Disposition::Abscond,
    ];

    /// Dispositions a new entry may start with.
    pub const ENTRY_CHOICES: [Disposition; 3] = [
        Disposition::Admitted,
        Disposition::TosIn,
        Disposition::TransInFromIcu,
    ];

    /// Canonical spelling as stored in the disposition column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Disposition::Old => "OLD",
            Disposition::Admitted => "ADMITTED",
            Disposition::Home => "HOME",
            Disposition::TosIn => "TOS IN",
            Disposition::TransInFromIcu => "TRANS IN FROM ICU",
            Disposition::Mort => "MORT",
            Disposition::TosOut => "TOS OUT",
            Disposition::TransOutToIcu => "TRANS OUT TO ICU",
            Disposition::HamaHpr => "HAMA/HPR",
            Disposition::Thoc => "THOC",
            Disposition::Abscond => "ABSCOND",
        }
    }

    /// Whether this disposition adds a patient to a service's census.
    pub fn is_addition(&self) -> bool {
        Self::ENTRY_CHOICES.contains(self)
    }

    /// Whether this disposition removes a patient from a service's census.
    pub fn is_subtraction(&self) -> bool {
        matches!(
            self,
            Disposition::Home
                | Disposition::TosOut
                | Disposition::TransOutToIcu
                | Disposition::HamaHpr
                | Disposition::Thoc
                | Disposition::Abscond
                | Disposition::Mort
        )
    }
}

impl FromStr for Disposition {
    type Err = CensusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| CensusError::UnknownDisposition(s.to_string()))
    }
}

impl std::fmt::Display for Disposition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A special clinical category, shown as a single symbol in the encoded line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialTag {
    PendingMort,
    Hospitalist,
    Dialytic,
    Lepto,
    AdvancedAirway,
    Acs,
    DkaHhs,
    New,
    Tb,
    Shock,
    Surgical,
    Dfi,
    Covid,
    Overflow,
}

impl SpecialTag {
    /// The fixed vocabulary, in presentation order.
    pub const ALL: [SpecialTag; 14] = [
        SpecialTag::PendingMort,
        SpecialTag::Hospitalist,
        SpecialTag::Dialytic,
        SpecialTag::Lepto,
        SpecialTag::AdvancedAirway,
        SpecialTag::Acs,
        SpecialTag::DkaHhs,
        SpecialTag::New,
        SpecialTag::Tb,
        SpecialTag::Shock,
        SpecialTag::Surgical,
        SpecialTag::Dfi,
        SpecialTag::Covid,
        SpecialTag::Overflow,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            SpecialTag::PendingMort => "🕊",
            SpecialTag::Hospitalist => "🏥",
            SpecialTag::Dialytic => "💦",
            SpecialTag::Lepto => "🐀",
            SpecialTag::AdvancedAirway => "🚨",
            SpecialTag::Acs => "🫀",
            SpecialTag::DkaHhs => "🪼",
            SpecialTag::New => "✨",
            SpecialTag::Tb => "📺",
            SpecialTag::Shock => "😱",
            SpecialTag::Surgical => "🔪",
            SpecialTag::Dfi => "🦶",
            SpecialTag::Covid => "🦠",
            SpecialTag::Overflow => "🌊",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SpecialTag::PendingMort => "pending mort",
            SpecialTag::Hospitalist => "hospitalist",
            SpecialTag::Dialytic => "dialytic/possible HD",
            SpecialTag::Lepto => "Lepto",
            SpecialTag::AdvancedAirway => "Advanced airway (ET/BIPAP/HFNC)",
            SpecialTag::Acs => "ACS",
            SpecialTag::DkaHhs => "DKA/HHS",
            SpecialTag::New => "New",
            SpecialTag::Tb => "TB",
            SpecialTag::Shock => "Shock",
            SpecialTag::Surgical => "Surgical",
            SpecialTag::Dfi => "DFI",
            SpecialTag::Covid => "COVID",
            SpecialTag::Overflow => "Overflow",
        }
    }

    /// Whether this tag marks the patient as critical.
    pub fn is_critical(&self) -> bool {
        matches!(self, SpecialTag::AdvancedAirway | SpecialTag::Shock)
    }

    /// Look up a tag by its symbol.
    pub fn from_symbol(symbol: &str) -> CensusResult<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.symbol() == symbol)
            .ok_or_else(|| CensusError::UnknownSpecialTag(symbol.to_string()))
    }
}

/// The working set of special categories for one entry.
///
/// Membership is toggled rather than added, so duplicates cannot occur. Iteration follows
/// selection order, which is the order tags are appended to the encoded line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SpecialTags(Vec<SpecialTag>);

impl SpecialTags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip membership of `tag`. Returns `true` if the tag is now selected.
    pub fn toggle(&mut self, tag: SpecialTag) -> bool {
        if let Some(pos) = self.0.iter().position(|t| *t == tag) {
            self.0.remove(pos);
            false
        } else {
            self.0.push(tag);
            true
        }
    }

    pub fn contains(&self, tag: SpecialTag) -> bool {
        self.0.contains(&tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = SpecialTag> + '_ {
        self.0.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl FromIterator<SpecialTag> for SpecialTags {
    fn from_iter<I: IntoIterator<Item = SpecialTag>>(iter: I) -> Self {
        let mut tags = SpecialTags::new();
        for tag in iter {
            if !tags.contains(tag) {
                tags.toggle(tag);
            }
        }
        tags
    }
}

/// Derived criticality of a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum CriticalFlag {
    #[serde(rename = "Critical")]
    Critical,
    #[serde(rename = "Non-Crit")]
    NonCritical,
}

impl CriticalFlag {
    /// `Critical` iff the line carries the advanced-airway or shock symbol.
    pub fn from_line(line: &str) -> Self {
        let critical = SpecialTag::ALL
            .iter()
            .filter(|t| t.is_critical())
            .any(|t| line.contains(t.symbol()));
        if critical {
            CriticalFlag::Critical
        } else {
            CriticalFlag::NonCritical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CriticalFlag::Critical => "Critical",
            CriticalFlag::NonCritical => "Non-Crit",
        }
    }
}

/// One patient record as read back from the census sheet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PatientRecord {
    /// 1-indexed sheet row holding this record.
    pub row: usize,
    /// Canonical encoded line, trimmed.
    pub line: String,
    /// Stored disposition; `None` when the cell is blank or not a known value.
    pub disposition: Option<Disposition>,
    pub ward_bed: String,
    /// JRIC column as typed at entry time.
    pub jric: String,
    pub cwi: String,
    /// Fields parsed back out of `line`.
    pub decoded: DecodedLine,
}

impl PatientRecord {
    /// Build a record from a row's cells, deriving everything else from the encoded line.
    pub fn new(
        row: usize,
        line: impl Into<String>,
        disposition: Option<Disposition>,
        ward_bed: impl Into<String>,
        jric: impl Into<String>,
        cwi: impl Into<String>,
    ) -> Self {
        let line = line.into().trim().to_string();
        let decoded = codec::decode(&line);
        Self {
            row,
            line,
            disposition,
            ward_bed: ward_bed.into(),
            jric: jric.into(),
            cwi: cwi.into(),
            decoded,
        }
    }

    pub fn service_code(&self) -> &str {
        &self.decoded.service_code
    }

    pub fn critical(&self) -> CriticalFlag {
        self.decoded.critical
    }

    pub fn has_disposition(&self, disposition: Disposition) -> bool {
        self.disposition == Some(disposition)
    }

    pub fn has_tag(&self, tag: SpecialTag) -> bool {
        self.decoded.tags.contains(&tag)
    }
}

//! Canonical encoded-line grammar.
//!
//! Every census record is stored as one line of text:
//!
//! ```text
//! <service>/<last name> (<o2>/<covid>) - <case number>/<passcode> - <ward>-<bed> [<jric>] <tags...>
//! ```
//!
//! Free text is written verbatim. Nothing is escaped, so `/`, `(`, `)`, `[` and `]` inside a field
//! will confuse the decoder. Decoding never fails: anything it cannot find comes back empty.
//!
//! All knowledge of the grammar lives here so that the entry flow and the reports never slice
//! the line themselves.

use crate::constants::O2_TOKENS;
use crate::record::{CriticalFlag, SpecialTag, SpecialTags};
use census_types::ServiceCode;
use serde::Serialize;

/// Separator between the name, case and location segments.
const SEGMENT_SEPARATOR: &str = " - ";

/// The structured fields collected for a new entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryFields {
    pub service: ServiceCode,
    pub last_name: String,
    pub o2_support: String,
    pub covid_status: String,
    pub case_number: String,
    pub passcode: String,
    pub ward: String,
    pub bed: String,
    pub jric: String,
    pub tags: SpecialTags,
}

impl EntryFields {
    /// The `ward-bed` location written to its own column.
    pub fn ward_bed(&self) -> String {
        format!("{}-{}", self.ward, self.bed)
    }
}

/// Encode entry fields into the canonical line.
pub fn encode(fields: &EntryFields) -> String {
    let tags = fields
        .tags
        .iter()
        .map(|t| t.symbol())
        .collect::<Vec<_>>()
        .join(" ");

    format!(
        "{}/{} ({}/{}) - {}/{} - {}-{} [{}] {}",
        fields.service,
        fields.last_name,
        fields.o2_support,
        fields.covid_status,
        fields.case_number,
        fields.passcode,
        fields.ward,
        fields.bed,
        fields.jric,
        tags
    )
    .trim()
    .to_string()
}

/// Fields recovered from an encoded line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DecodedLine {
    /// First three characters of the line.
    pub service_code: String,
    /// Text strictly between the first `[` and the `]` after it.
    pub jric: Option<String>,
    /// Tags present in the line, in vocabulary order.
    pub tags: Vec<SpecialTag>,
    pub critical: CriticalFlag,
    /// The `<case number>/<passcode>` segment.
    pub case_segment: Option<String>,
    /// Text after the first `/` and before the next `(`, trimmed.
    pub last_name: Option<String>,
}

/// Decode an encoded line. Malformed lines yield empty fields rather than an error.
pub fn decode(line: &str) -> DecodedLine {
    DecodedLine {
        service_code: line.chars().take(3).collect(),
        jric: bracket_jric(line).map(str::to_string),
        tags: SpecialTag::ALL
            .iter()
            .copied()
            .filter(|t| line.contains(t.symbol()))
            .collect(),
        critical: CriticalFlag::from_line(line),
        case_segment: line
            .split(SEGMENT_SEPARATOR)
            .nth(1)
            .map(str::to_string),
        last_name: last_name(line).map(str::to_string),
    }
}

fn bracket_jric(line: &str) -> Option<&str> {
    let start = line.find('[')?;
    let rest = &line[start + 1..];
    let end = rest.find(']')?;
    Some(&rest[..end])
}

fn last_name(line: &str) -> Option<&str> {
    let after_slash = line.split('/').nth(1)?;
    let name = after_slash.split('(').next().unwrap_or_default();
    Some(name.trim())
}

/// The oxygen-support token the sheet's O2 column would extract.
///
/// The column is blank unless some known token (`RA`, `NC`, ... `ET`) is immediately followed by
/// `/`. When one is, the value is the leftmost token anywhere in the line, slash or not, so an
/// upper-case last name such as `GRANT` yields `RA` ahead of the bracketed `NC`.
pub fn o2_token(line: &str) -> Option<&'static str> {
    leftmost_o2_token(line, true)?;
    leftmost_o2_token(line, false)
}

fn leftmost_o2_token(line: &str, before_slash: bool) -> Option<&'static str> {
    line.char_indices().find_map(|(i, _)| {
        let rest = &line[i..];
        O2_TOKENS.iter().copied().find(|token| {
            rest.starts_with(token) && (!before_slash || rest[token.len()..].starts_with('/'))
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn fields(tags: &[SpecialTag]) -> EntryFields {
        EntryFields {
            service: ServiceCode::normalise("1"),
            last_name: "Cruz".into(),
            o2_support: "NC".into(),
            covid_status: "Negative".into(),
            case_number: "123".into(),
            passcode: "45".into(),
            ward: "A".into(),
            bed: "2".into(),
            jric: "JoyD".into(),
            tags: tags.iter().copied().collect(),
        }
    }

    #[test]
    fn encodes_canonical_line() {
        let line = encode(&fields(&[SpecialTag::AdvancedAirway]));
        assert_eq!(line, "GM1/Cruz (NC/Negative) - 123/45 - A-2 [JoyD] 🚨");
    }

    #[test]
    fn encoding_without_tags_has_no_trailing_space() {
        let line = encode(&fields(&[]));
        assert_eq!(line, "GM1/Cruz (NC/Negative) - 123/45 - A-2 [JoyD]");
    }

    #[test]
    fn tags_follow_selection_order() {
        let line = encode(&fields(&[SpecialTag::Overflow, SpecialTag::New]));
        assert!(line.ends_with("[JoyD] 🌊 ✨"));
    }

    #[test]
    fn decode_recovers_jric_and_tag_membership() {
        let selected = [SpecialTag::Shock, SpecialTag::Lepto, SpecialTag::Covid];
        let decoded = decode(&encode(&fields(&selected)));

        assert_eq!(decoded.jric.as_deref(), Some("JoyD"));
        let expected: BTreeSet<_> = selected.iter().copied().collect();
        let actual: BTreeSet<_> = decoded.tags.iter().copied().collect();
        assert_eq!(actual, expected);
        assert_eq!(decoded.critical, CriticalFlag::Critical);
    }

    #[test]
    fn decode_extracts_report_segments() {
        let decoded = decode("GM1/Cruz (NC/Negative) - 123/45 - A-2 [JoyD] 🚨");
        assert_eq!(decoded.service_code, "GM1");
        assert_eq!(decoded.case_segment.as_deref(), Some("123/45"));
        assert_eq!(decoded.last_name.as_deref(), Some("Cruz"));
    }

    #[test]
    fn decode_tolerates_malformed_lines() {
        let decoded = decode("free text note");
        assert_eq!(decoded.service_code, "fre");
        assert_eq!(decoded.jric, None);
        assert!(decoded.tags.is_empty());
        assert_eq!(decoded.critical, CriticalFlag::NonCritical);
        assert_eq!(decoded.case_segment, None);
        assert_eq!(decoded.last_name, None);

        let empty = decode("");
        assert_eq!(empty.service_code, "");
    }

    #[test]
    fn unclosed_bracket_yields_no_jric() {
        assert_eq!(decode("GM2/Lee (RA/Neg) - 1/2 - B-3 [Open").jric, None);
        assert_eq!(decode("GM2/Lee ] x [").jric, None);
        assert_eq!(decode("GM2/Lee []").jric.as_deref(), Some(""));
    }

    #[test]
    fn o2_token_requires_a_token_before_slash() {
        assert_eq!(o2_token("GM1/Cruz (NC/Negative) - 1/2"), Some("NC"));
        assert_eq!(o2_token("GM1/Cruz (HFNC/Negative)"), Some("HFNC"));
        assert_eq!(o2_token("GM1/Cruz (BIPAP/Neg)"), Some("BIPAP"));
        assert_eq!(o2_token("GM1/Cruz (room air/Neg)"), None);
        assert_eq!(o2_token("GM1/GRANT (room air/Neg)"), None);
    }

    #[test]
    fn o2_token_takes_leftmost_token_like_the_sheet_formula() {
        assert_eq!(o2_token("GM1/GRANT (NC/Neg)"), Some("RA"));
        assert_eq!(o2_token("GM1/PETERS (FM/Neg)"), Some("ET"));
        assert_eq!(o2_token("GM1/Grant (NC/Neg)"), Some("NC"));
        assert_eq!(o2_token("GM1/Lee (NRM/Neg)"), Some("NRM"));
    }
}

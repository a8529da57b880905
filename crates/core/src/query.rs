//! Free-text census search.
//!
//! A query is classified into exactly one mode, in strict priority order:
//!
//! 1. **Service**: starts with `gm` (any case) and is at most four characters long.
//! 2. **JRIC**: some record's JRIC column equals the query, ignoring case.
//! 3. **Substring**: case-insensitive substring match against the encoded line.
//!
//! JRIC mode counts the matching team in its header but lists every record on the census.

use crate::constants::{NO_JRIC_LABEL, SEARCH_LIST_LIMIT};
use crate::record::{CriticalFlag, PatientRecord};
use std::collections::BTreeMap;

/// Which search mode a query resolved to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchMode {
    /// Upper-cased service code.
    Service(String),
    Jric,
    Substring,
}

/// Classify `query` against the current records.
pub fn classify(query: &str, records: &[PatientRecord]) -> SearchMode {
    let lowered = query.to_lowercase();

    if lowered.starts_with("gm") && query.chars().count() <= 4 {
        return SearchMode::Service(query.to_uppercase());
    }

    if records.iter().any(|r| r.jric.to_lowercase() == lowered) {
        return SearchMode::Jric;
    }

    SearchMode::Substring
}

/// One JRIC group in a service-mode result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JricLines {
    pub jric: String,
    pub lines: Vec<String>,
}

/// One entry in a multi-match substring result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListEntry {
    pub line: String,
    pub cwi: String,
}

/// The rendered-ready outcome of a search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchView {
    ServiceGroups {
        service: String,
        total: usize,
        critical: usize,
        groups: Vec<JricLines>,
    },
    ServiceEmpty {
        service: String,
    },
    Jric {
        label: String,
        total: usize,
        critical: usize,
        lines: Vec<String>,
    },
    NotFound {
        query: String,
    },
    Detail {
        line: String,
        cwi: String,
    },
    List {
        query: String,
        total: usize,
        entries: Vec<ListEntry>,
    },
}

/// Run `query` against `records`.
pub fn search(query: &str, records: &[PatientRecord]) -> SearchView {
    let mode = classify(query, records);
    tracing::debug!("search '{}' resolved to {:?}", query, mode);

    match mode {
        SearchMode::Service(service) => by_service(service, records),
        SearchMode::Jric => by_jric(query, records),
        SearchMode::Substring => by_substring(query, records),
    }
}

fn critical_count<'a>(records: impl IntoIterator<Item = &'a PatientRecord>) -> usize {
    records
        .into_iter()
        .filter(|r| r.critical() == CriticalFlag::Critical)
        .count()
}

fn by_service(service: String, records: &[PatientRecord]) -> SearchView {
    let matching: Vec<&PatientRecord> = records
        .iter()
        .filter(|r| r.service_code() == service)
        .collect();

    if matching.is_empty() {
        return SearchView::ServiceEmpty { service };
    }

    let mut grouped: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for record in &matching {
        let jric = if record.jric.is_empty() {
            NO_JRIC_LABEL
        } else {
            record.jric.as_str()
        };
        grouped.entry(jric).or_default().push(record.line.clone());
    }

    SearchView::ServiceGroups {
        total: matching.len(),
        critical: critical_count(matching.iter().copied()),
        groups: grouped
            .into_iter()
            .map(|(jric, lines)| JricLines {
                jric: jric.to_string(),
                lines,
            })
            .collect(),
        service,
    }
}

fn by_jric(query: &str, records: &[PatientRecord]) -> SearchView {
    let lowered = query.to_lowercase();
    let team: Vec<&PatientRecord> = records
        .iter()
        .filter(|r| r.jric.to_lowercase() == lowered)
        .collect();

    SearchView::Jric {
        label: query.to_string(),
        total: team.len(),
        critical: critical_count(team),
        lines: records.iter().map(|r| r.line.clone()).collect(),
    }
}

fn by_substring(query: &str, records: &[PatientRecord]) -> SearchView {
    let lowered = query.to_lowercase();
    let matches: Vec<&PatientRecord> = records
        .iter()
        .filter(|r| r.line.to_lowercase().contains(&lowered))
        .collect();

    match matches.as_slice() {
        [] => SearchView::NotFound {
            query: query.to_string(),
        },
        [only] => SearchView::Detail {
            line: only.line.clone(),
            cwi: only.cwi.clone(),
        },
        _ => SearchView::List {
            query: query.to_string(),
            total: matches.len(),
            entries: matches
                .iter()
                .take(SEARCH_LIST_LIMIT)
                .map(|r| ListEntry {
                    line: r.line.clone(),
                    cwi: r.cwi.clone(),
                })
                .collect(),
        },
    }
}

impl SearchView {
    /// Render the view as operator-facing text.
    pub fn render(&self) -> String {
        match self {
            SearchView::ServiceGroups {
                service,
                total,
                critical,
                groups,
            } => {
                let mut out = format!("{service} ({total} | {critical})\n\n");
                for group in groups {
                    out.push_str(&format!("[{}]\n", group.jric));
                    for line in &group.lines {
                        out.push_str(&format!("{line}\n"));
                    }
                    out.push('\n');
                }
                out.trim_end().to_string()
            }
            SearchView::ServiceEmpty { service } => format!("No patients found for {service}"),
            SearchView::Jric {
                label,
                total,
                critical,
                lines,
            } => {
                let mut out = format!("{label} ({total} | {critical})\n");
                for line in lines {
                    out.push_str(&format!("{line}\n"));
                }
                out.trim_end().to_string()
            }
            SearchView::NotFound { query } => format!("No patients found matching: {query}"),
            SearchView::Detail { line, cwi } => {
                let cwi = if cwi.is_empty() {
                    "No assessment available"
                } else {
                    cwi.as_str()
                };
                format!("{line}\n{cwi}")
            }
            SearchView::List {
                query,
                total,
                entries,
            } => {
                let mut out = format!("🔍 Found {total} patient(s) matching '{query}':\n\n");
                for (idx, entry) in entries.iter().enumerate() {
                    out.push_str(&format!("{}. {}\n", idx + 1, entry.line));
                    if !entry.cwi.is_empty() {
                        out.push_str(&format!("   {}\n", entry.cwi));
                    }
                    out.push('\n');
                }
                if *total > entries.len() {
                    out.push_str(&format!(
                        "... and {} more results.",
                        total - entries.len()
                    ));
                }
                out.trim_end().to_string()
            }
        }
    }

    /// Number of records the view was built from.
    pub fn match_count(&self) -> usize {
        match self {
            SearchView::ServiceGroups { total, .. } | SearchView::List { total, .. } => *total,
            SearchView::Jric { lines, .. } => lines.len(),
            SearchView::Detail { .. } => 1,
            SearchView::ServiceEmpty { .. } | SearchView::NotFound { .. } => 0,
        }
    }
}

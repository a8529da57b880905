//! Census aggregation and report rendering.
//!
//! Two documents are produced, both as plain monospace text:
//!
//! - the **service report** for one general-medicine service, grouped by JRIC;
//! - the **ward-wide report** covering `GM1`..`GM6`, headed by the duty roster.
//!
//! Both are pure functions of the record set and a report date. Neither touches the store.

use crate::constants::WARD_SERVICES;
use crate::record::{Disposition, PatientRecord, SpecialTag};
use census_types::ServiceCode;
use chrono::NaiveDate;

const DATE_FORMAT: &str = "%m/%d/%y";

/// Census arithmetic for a set of records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CensusTally {
    pub old: usize,
    pub additions: usize,
    pub subtractions: usize,
}

impl CensusTally {
    pub fn of<'a>(records: impl IntoIterator<Item = &'a PatientRecord>) -> Self {
        records
            .into_iter()
            .filter_map(|r| r.disposition)
            .fold(Self::default(), |mut tally, d| {
                if d == Disposition::Old {
                    tally.old += 1;
                } else if d.is_addition() {
                    tally.additions += 1;
                } else if d.is_subtraction() {
                    tally.subtractions += 1;
                }
                tally
            })
    }

    /// `old + additions - subtractions`. Negative when more patients left than were on census.
    pub fn total(&self) -> i64 {
        self.old as i64 + self.additions as i64 - self.subtractions as i64
    }

    /// `<old> + <additions> - <subtractions> = <total>`
    pub fn equation(&self) -> String {
        format!(
            "{} + {} - {} = {}",
            self.old,
            self.additions,
            self.subtractions,
            self.total()
        )
    }
}

/// Records sharing one bracketed JRIC in a service report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JricGroup {
    /// JRIC parsed from the encoded line; empty when the line has none.
    pub jric: String,
    pub size: usize,
    pub advanced_airway: usize,
    /// `<case number>/<passcode>` segments, in sheet order.
    pub codes: Vec<String>,
}

/// Census report for one service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceReport {
    pub service: ServiceCode,
    pub date: NaiveDate,
    pub tally: CensusTally,
    pub groups: Vec<JricGroup>,
}

/// Outcome of asking for a service report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServiceReportView {
    EmptySheet,
    NoPatients(ServiceCode),
    Report(ServiceReport),
}

impl ServiceReportView {
    pub fn render(&self) -> String {
        match self {
            ServiceReportView::EmptySheet => "No patients found in the sheet.".into(),
            ServiceReportView::NoPatients(service) => {
                format!("No patients found for service: {service}")
            }
            ServiceReportView::Report(report) => report.render(),
        }
    }

    /// Whether the view should be shown as a monospace block.
    pub fn is_preformatted(&self) -> bool {
        matches!(self, ServiceReportView::Report(_))
    }
}

/// Build the census report for `service`.
pub fn service_report(
    service: &ServiceCode,
    records: &[PatientRecord],
    date: NaiveDate,
) -> ServiceReportView {
    if records.is_empty() {
        return ServiceReportView::EmptySheet;
    }

    let in_service: Vec<&PatientRecord> = records
        .iter()
        .filter(|r| r.service_code() == service.as_str())
        .collect();
    if in_service.is_empty() {
        return ServiceReportView::NoPatients(service.clone());
    }

    let mut groups: Vec<JricGroup> = Vec::new();
    for record in &in_service {
        let jric = record.decoded.jric.clone().unwrap_or_default();
        let idx = match groups.iter().position(|g| g.jric == jric) {
            Some(idx) => idx,
            None => {
                groups.push(JricGroup {
                    jric,
                    size: 0,
                    advanced_airway: 0,
                    codes: Vec::new(),
                });
                groups.len() - 1
            }
        };

        let group = &mut groups[idx];
        group.size += 1;
        if record.has_tag(SpecialTag::AdvancedAirway) {
            group.advanced_airway += 1;
        }
        if let Some(code) = &record.decoded.case_segment {
            group.codes.push(code.clone());
        }
    }

    ServiceReportView::Report(ServiceReport {
        service: service.clone(),
        date,
        tally: CensusTally::of(in_service.iter().copied()),
        groups,
    })
}

impl ServiceReport {
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("{} WARD CENSUS\n", self.service));
        out.push_str(&format!("DATE {}\n", self.date.format(DATE_FORMAT)));
        out.push_str(&format!("RECEIVED: {}\n\n", self.tally.old));

        for group in &self.groups {
            out.push_str(&format!(
                "{} ({} | {})\n",
                group.jric, group.size, group.advanced_airway
            ));
            for code in &group.codes {
                out.push_str(&format!("{code}\n"));
            }
            out.push('\n');
        }

        out.push_str(&format!("{} = {}", self.service, self.tally.equation()));
        out
    }
}

/// Duty fields echoed at the top of the ward-wide report.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DutyRoster {
    pub admitting_service: String,
    pub sapod: String,
    pub napod: String,
    pub wapod: String,
    pub apod: String,
}

/// One disposition section of the ward-wide report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WardSection {
    pub label: &'static str,
    pub total: usize,
    /// `(service, last names)` for services with at least one match, in service order.
    pub services: Vec<(String, Vec<String>)>,
    /// Whether per-service lines show a count before the names.
    pub counted: bool,
}

/// The ward-wide report across `GM1`..`GM6`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WardReport {
    pub roster: DutyRoster,
    pub date: NaiveDate,
    pub old_total: usize,
    pub sections: Vec<WardSection>,
    /// Census tally per service, in service order.
    pub census: Vec<(String, CensusTally)>,
}

const WARD_SECTIONS: [(&str, Disposition, bool); 10] = [
    ("ADMISSIONS", Disposition::Admitted, true),
    ("DISCHARGES", Disposition::Home, true),
    ("TOS IN", Disposition::TosIn, false),
    ("TRANS IN FROM ICU", Disposition::TransInFromIcu, false),
    ("MORT", Disposition::Mort, false),
    ("TOS OUT", Disposition::TosOut, false),
    ("TRANS OUT TO ICU", Disposition::TransOutToIcu, false),
    ("HAMA", Disposition::HamaHpr, false),
    ("THOC", Disposition::Thoc, false),
    ("ABSCOND", Disposition::Abscond, false),
];

/// Build the ward-wide report.
pub fn ward_report(roster: DutyRoster, records: &[PatientRecord], date: NaiveDate) -> WardReport {
    let sections = WARD_SECTIONS
        .iter()
        .map(|&(label, disposition, counted)| {
            let matching: Vec<&PatientRecord> = records
                .iter()
                .filter(|r| r.has_disposition(disposition))
                .collect();
            let services = WARD_SERVICES
                .iter()
                .filter_map(|service| {
                    let names: Vec<String> = matching
                        .iter()
                        .filter(|r| r.service_code() == *service)
                        .map(|r| r.decoded.last_name.clone().unwrap_or_default())
                        .collect();
                    (!names.is_empty()).then(|| (service.to_string(), names))
                })
                .collect();
            WardSection {
                label,
                total: matching.len(),
                services,
                counted,
            }
        })
        .collect();

    let census = WARD_SERVICES
        .iter()
        .map(|service| {
            let tally = CensusTally::of(records.iter().filter(|r| r.service_code() == *service));
            (service.to_string(), tally)
        })
        .collect();

    WardReport {
        roster,
        date,
        old_total: records
            .iter()
            .filter(|r| r.has_disposition(Disposition::Old))
            .count(),
        sections,
        census,
    }
}

impl WardReport {
    /// Sum of every service's census total.
    pub fn grand_total(&self) -> i64 {
        self.census.iter().map(|(_, tally)| tally.total()).sum()
    }

    pub fn render(&self) -> String {
        let mut out = String::from("SERVICE AND WARD CENSUS\n");
        out.push_str(&format!(
            "Admitting service: {}\n",
            self.roster.admitting_service
        ));
        out.push_str(&format!("Date of Duty: {}\n\n", self.date.format(DATE_FORMAT)));
        out.push_str(&format!("SAPOD: {}\n", self.roster.sapod));
        out.push_str(&format!("NAPOD: {}\n", self.roster.napod));
        out.push_str(&format!("WAPOD: {}\n", self.roster.wapod));
        out.push_str(&format!("APOD: {}\n\n", self.roster.apod));
        out.push_str(&format!("Received: {}\n\n", self.old_total));

        for section in &self.sections {
            out.push_str(&format!("{}: {}\n", section.label, section.total));
            for (service, names) in &section.services {
                if section.counted {
                    out.push_str(&format!(
                        "{service}: {} ({})\n",
                        names.len(),
                        names.join(", ")
                    ));
                } else {
                    out.push_str(&format!("{service}: {}\n", names.join(", ")));
                }
            }
            out.push('\n');
        }

        out.push_str("SERVICE CENSUS\n");
        for (service, tally) in &self.census {
            out.push_str(&format!("{service}: {}\n", tally.equation()));
        }
        out.push_str(&format!("\nTOTAL: {}", self.grand_total()));
        out
    }
}

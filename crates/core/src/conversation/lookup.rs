//! Read-only flows: search and the two reports.

use super::reply::{Reply, Step};
use crate::query;
use crate::report::{self, DutyRoster};
use crate::store::CensusStore;
use census_types::ServiceCode;
use chrono::NaiveDate;

const SEARCH_PROMPT: &str = "🔍 Search for a patient\n\n\
     Enter search term (name, case number, ward, bed, JRIC, or any keyword):";
const SERVICE_REPORT_PROMPT: &str = "Enter the GM service for the report (e.g., GM1):";
const EMPTY_SHEET: &str = "No patients found in the sheet.";

/// Waiting for a search query.
#[derive(Clone, Debug)]
pub(crate) struct SearchFlow;

impl SearchFlow {
    pub(crate) fn start() -> (Self, Reply) {
        (SearchFlow, Reply::message(SEARCH_PROMPT))
    }

    pub(crate) fn on_text(self, text: &str, store: &CensusStore) -> Step<Self> {
        let query = text.trim();
        if query.is_empty() {
            return Step::Continue(self, Reply::message(SEARCH_PROMPT));
        }

        let reply = match store.load_records() {
            Ok(records) if records.is_empty() => Reply::message(EMPTY_SHEET),
            Ok(records) => Reply::message(query::search(query, &records).render()),
            Err(err) => Reply::message(format!("Error during search: {err}")),
        };
        Step::Finish(reply)
    }

    pub(crate) fn on_selection(self) -> Step<Self> {
        Step::Continue(self, Reply::message(SEARCH_PROMPT))
    }
}

/// Waiting for the service to report on.
#[derive(Clone, Debug)]
pub(crate) struct ServiceReportFlow;

impl ServiceReportFlow {
    pub(crate) fn start() -> (Self, Reply) {
        (ServiceReportFlow, Reply::message(SERVICE_REPORT_PROMPT))
    }

    pub(crate) fn on_text(self, text: &str, store: &CensusStore, date: NaiveDate) -> Step<Self> {
        if text.trim().is_empty() {
            return Step::Continue(self, Reply::message(SERVICE_REPORT_PROMPT));
        }
        let service = ServiceCode::normalise(text);

        let reply = match store.load_records() {
            Ok(records) => {
                let view = report::service_report(&service, &records, date);
                let reply = Reply::message(view.render());
                if view.is_preformatted() {
                    reply.preformatted()
                } else {
                    reply
                }
            }
            Err(err) => Reply::message(format!("Error generating report: {err}")),
        };
        Step::Finish(reply)
    }

    pub(crate) fn on_selection(self) -> Step<Self> {
        Step::Continue(self, Reply::message(SERVICE_REPORT_PROMPT))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RosterStep {
    AdmittingService,
    Sapod,
    Napod,
    Wapod,
    Apod,
}

impl RosterStep {
    fn prompt(&self) -> &'static str {
        match self {
            RosterStep::AdmittingService => "Enter Admitting service:",
            RosterStep::Sapod => "Enter SAPOD:",
            RosterStep::Napod => "Enter NAPOD:",
            RosterStep::Wapod => "Enter WAPOD:",
            RosterStep::Apod => "Enter APOD:",
        }
    }
}

/// Collecting the duty roster for the ward-wide report.
#[derive(Clone, Debug)]
pub(crate) struct WardReportFlow {
    step: RosterStep,
    roster: DutyRoster,
}

impl WardReportFlow {
    pub(crate) fn start() -> (Self, Reply) {
        let step = RosterStep::AdmittingService;
        let flow = Self {
            step,
            roster: DutyRoster::default(),
        };
        (flow, Reply::message(step.prompt()))
    }

    pub(crate) fn on_text(
        mut self,
        text: &str,
        store: &CensusStore,
        date: NaiveDate,
    ) -> Step<Self> {
        let value = text.trim().to_string();
        let next = match self.step {
            RosterStep::AdmittingService => {
                self.roster.admitting_service = value;
                RosterStep::Sapod
            }
            RosterStep::Sapod => {
                self.roster.sapod = value;
                RosterStep::Napod
            }
            RosterStep::Napod => {
                self.roster.napod = value;
                RosterStep::Wapod
            }
            RosterStep::Wapod => {
                self.roster.wapod = value;
                RosterStep::Apod
            }
            RosterStep::Apod => {
                self.roster.apod = value;
                return Step::Finish(Self::generate(self.roster, store, date));
            }
        };

        self.step = next;
        Step::Continue(self, Reply::message(next.prompt()))
    }

    pub(crate) fn on_selection(self) -> Step<Self> {
        let reply = Reply::message(self.step.prompt());
        Step::Continue(self, reply)
    }

    fn generate(roster: DutyRoster, store: &CensusStore, date: NaiveDate) -> Reply {
        match store.load_records() {
            Ok(records) => {
                Reply::message(report::ward_report(roster, &records, date).render()).preformatted()
            }
            Err(err) => Reply::message(format!("Error generating report: {err}")),
        }
    }
}

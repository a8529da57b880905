//! Add-patient flow.
//!
//! Nine free-text fields are collected in a fixed order, then the initial disposition is picked
//! from the entry choices, then the working impression is typed, and finally special categories
//! are toggled until `done` commits the record.

use super::reply::{Delivery, Reply, ReplyOption, Step};
use crate::codec::EntryFields;
use crate::constants::{DONE_TOKEN, ENTRY_DISPO_PREFIX};
use crate::record::{Disposition, SpecialTag, SpecialTags};
use crate::store::{CensusStore, NewRecord};
use crate::{CensusError, CensusResult};
use census_types::ServiceCode;

const TAGS_PROMPT: &str = "Select Special Categories (you can select multiple):";

/// Position of an add-patient flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryStep {
    Service,
    LastName,
    O2Support,
    CovidStatus,
    CaseNumber,
    Passcode,
    Ward,
    Bed,
    Jric,
    DispoType,
    Cwi,
    SpecialCategories,
}

impl EntryStep {
    fn prompt(&self) -> &'static str {
        match self {
            EntryStep::Service => "Please enter the GM service number (e.g., 1, 2, 3, etc.):",
            EntryStep::LastName => "Enter patient's Last Name:",
            EntryStep::O2Support => "Enter Oxygen Support:",
            EntryStep::CovidStatus => "Enter COVID Status:",
            EntryStep::CaseNumber => "Enter Case Number:",
            EntryStep::Passcode => "Enter Passcode:",
            EntryStep::Ward => "Enter Ward:",
            EntryStep::Bed => "Enter Bed:",
            EntryStep::Jric => "Enter JRIC:",
            EntryStep::DispoType => "Select the patient type:",
            EntryStep::Cwi => "Enter Current Working Impression:",
            EntryStep::SpecialCategories => TAGS_PROMPT,
        }
    }
}

#[derive(Clone, Debug, Default)]
struct Draft {
    service: Option<ServiceCode>,
    last_name: String,
    o2_support: String,
    covid_status: String,
    case_number: String,
    passcode: String,
    ward: String,
    bed: String,
    jric: String,
    disposition: Option<Disposition>,
    cwi: String,
    tags: SpecialTags,
}

impl Draft {
    fn into_new_record(self) -> CensusResult<NewRecord> {
        let service = self
            .service
            .ok_or_else(|| CensusError::InvalidInput("service was never entered".into()))?;
        let disposition = self
            .disposition
            .ok_or_else(|| CensusError::InvalidInput("patient type was never selected".into()))?;

        Ok(NewRecord {
            fields: EntryFields {
                service,
                last_name: self.last_name,
                o2_support: self.o2_support,
                covid_status: self.covid_status,
                case_number: self.case_number,
                passcode: self.passcode,
                ward: self.ward,
                bed: self.bed,
                jric: self.jric,
                tags: self.tags,
            },
            disposition,
            cwi: self.cwi,
        })
    }
}

#[derive(Clone, Debug)]
pub(crate) struct EntryFlow {
    step: EntryStep,
    draft: Draft,
}

impl EntryFlow {
    pub(crate) fn start() -> (Self, Reply) {
        let flow = Self {
            step: EntryStep::Service,
            draft: Draft::default(),
        };
        let reply = flow.prompt();
        (flow, reply)
    }

    pub(crate) fn step(&self) -> EntryStep {
        self.step
    }

    /// The reply that presents the current step.
    fn prompt(&self) -> Reply {
        let reply = Reply::message(self.step.prompt());
        match self.step {
            EntryStep::DispoType => reply.with_options(entry_dispo_options()),
            EntryStep::SpecialCategories => reply.with_options(tag_options(&self.draft.tags)),
            _ => reply,
        }
    }

    pub(crate) fn on_text(mut self, text: &str) -> Step<Self> {
        let value = text.trim().to_string();
        let draft = &mut self.draft;

        self.step = match self.step {
            EntryStep::Service => {
                draft.service = Some(ServiceCode::normalise(&value));
                EntryStep::LastName
            }
            EntryStep::LastName => {
                draft.last_name = value;
                EntryStep::O2Support
            }
            EntryStep::O2Support => {
                draft.o2_support = value;
                EntryStep::CovidStatus
            }
            EntryStep::CovidStatus => {
                draft.covid_status = value;
                EntryStep::CaseNumber
            }
            EntryStep::CaseNumber => {
                draft.case_number = value;
                EntryStep::Passcode
            }
            EntryStep::Passcode => {
                draft.passcode = value;
                EntryStep::Ward
            }
            EntryStep::Ward => {
                draft.ward = value;
                EntryStep::Bed
            }
            EntryStep::Bed => {
                draft.bed = value;
                EntryStep::Jric
            }
            EntryStep::Jric => {
                draft.jric = value;
                EntryStep::DispoType
            }
            EntryStep::Cwi => {
                draft.cwi = value;
                EntryStep::SpecialCategories
            }
            // Selection steps ignore typed text.
            step @ (EntryStep::DispoType | EntryStep::SpecialCategories) => step,
        };

        let reply = self.prompt();
        Step::Continue(self, reply)
    }

    pub(crate) fn on_selection(mut self, token: &str, store: &CensusStore) -> Step<Self> {
        match self.step {
            EntryStep::DispoType => {
                let Some(disposition) = parse_entry_dispo(token) else {
                    let reply = self.prompt();
                    return Step::Continue(self, reply);
                };
                self.draft.disposition = Some(disposition);
                self.step = EntryStep::Cwi;
                let reply = Reply::edit(format!(
                    "Patient type set to: {disposition}\n\n{}",
                    EntryStep::Cwi.prompt()
                ));
                Step::Continue(self, reply)
            }
            EntryStep::SpecialCategories if token == DONE_TOKEN => Step::Finish(self.commit(store)),
            EntryStep::SpecialCategories => {
                if let Ok(tag) = SpecialTag::from_symbol(token) {
                    self.draft.tags.toggle(tag);
                    let reply = self.prompt().with_delivery(Delivery::EditOptions);
                    return Step::Continue(self, reply);
                }
                let reply = self.prompt();
                Step::Continue(self, reply)
            }
            _ => {
                let reply = self.prompt();
                Step::Continue(self, reply)
            }
        }
    }

    fn commit(self, store: &CensusStore) -> Reply {
        let result = self
            .draft
            .into_new_record()
            .and_then(|record| store.commit(&record).map(|saved| (saved, record)));

        match result {
            Ok((saved, record)) => Reply::edit(format!(
                "✅ Patient added successfully!\n\n{}\n\nDisposition: {}\nCWI: {}",
                saved.line, record.disposition, record.cwi
            )),
            Err(err) => {
                tracing::error!("failed to commit census entry: {}", err);
                Reply::edit(format!("❌ Error adding patient: {err}"))
            }
        }
    }
}

fn parse_entry_dispo(token: &str) -> Option<Disposition> {
    let value = token.strip_prefix(ENTRY_DISPO_PREFIX)?;
    value
        .parse::<Disposition>()
        .ok()
        .filter(|d| Disposition::ENTRY_CHOICES.contains(d))
}

fn entry_dispo_options() -> Vec<ReplyOption> {
    Disposition::ENTRY_CHOICES
        .iter()
        .map(|d| ReplyOption::new(d.as_str(), format!("{ENTRY_DISPO_PREFIX}{d}")))
        .collect()
}

fn tag_options(selected: &SpecialTags) -> Vec<ReplyOption> {
    let mut options: Vec<ReplyOption> = SpecialTag::ALL
        .iter()
        .map(|tag| {
            let mark = if selected.contains(*tag) { "✓ " } else { "" };
            ReplyOption::new(
                format!("{mark}{} - {}", tag.symbol(), tag.label()),
                tag.symbol(),
            )
        })
        .collect();
    options.push(ReplyOption::new("✅ Done", DONE_TOKEN));
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CensusConfig, DerivedColumns};
    use crate::sheet::{MemorySheet, SheetBackend};
    use census_types::NonEmptyText;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn store(sheet: Arc<MemorySheet>) -> CensusStore {
        let cfg = CensusConfig::new(
            PathBuf::from("unused.yaml"),
            NonEmptyText::new("Census").expect("title"),
            DerivedColumns::Computed,
            50,
        )
        .expect("config");
        CensusStore::new(sheet, &cfg)
    }

    fn expect_continue(step: Step<EntryFlow>) -> (EntryFlow, Reply) {
        match step {
            Step::Continue(flow, reply) => (flow, reply),
            Step::Finish(reply) => panic!("flow finished early: {}", reply.text),
        }
    }

    fn through_cwi(store: &CensusStore) -> EntryFlow {
        let (mut flow, _) = EntryFlow::start();
        for text in ["gm1", " Cruz ", "NC", "Negative", "123", "45", "A", "2", "JoyD"] {
            flow = expect_continue(flow.on_text(text)).0;
        }
        assert_eq!(flow.step(), EntryStep::DispoType);
        let (flow, reply) = expect_continue(flow.on_selection("dtype_ADMITTED", store));
        assert_eq!(
            reply.text,
            "Patient type set to: ADMITTED\n\nEnter Current Working Impression:"
        );
        assert_eq!(reply.delivery, Delivery::EditPrevious);
        expect_continue(flow.on_text("CAP")).0
    }

    #[test]
    fn prompts_follow_field_order() {
        let (flow, reply) = EntryFlow::start();
        assert_eq!(reply.text, "Please enter the GM service number (e.g., 1, 2, 3, etc.):");

        let (flow, reply) = expect_continue(flow.on_text("3"));
        assert_eq!(reply.text, "Enter patient's Last Name:");
        assert_eq!(flow.draft.service, Some(ServiceCode::normalise("GM3")));

        let (_, reply) = expect_continue(flow.on_text("Cruz"));
        assert_eq!(reply.text, "Enter Oxygen Support:");
    }

    #[test]
    fn jric_step_offers_exactly_the_entry_dispositions() {
        let (mut flow, _) = EntryFlow::start();
        let mut reply = Reply::default();
        for text in ["1", "Cruz", "NC", "Neg", "1", "2", "A", "3", "J"] {
            (flow, reply) = expect_continue(flow.on_text(text));
        }
        let tokens: Vec<_> = reply.options.iter().map(|o| o.token.as_str()).collect();
        assert_eq!(
            tokens,
            vec!["dtype_ADMITTED", "dtype_TOS IN", "dtype_TRANS IN FROM ICU"]
        );
    }

    #[test]
    fn unmatched_selections_and_text_re_present_the_step() {
        let sheet = Arc::new(MemorySheet::with_header(10));
        let store = store(sheet);
        let (mut flow, _) = EntryFlow::start();
        for text in ["1", "Cruz", "NC", "Neg", "1", "2", "A", "3", "J"] {
            flow = expect_continue(flow.on_text(text)).0;
        }

        let (flow, reply) = expect_continue(flow.on_selection("dtype_HOME", &store));
        assert_eq!(flow.step(), EntryStep::DispoType);
        assert_eq!(reply.text, "Select the patient type:");

        let (flow, _) = expect_continue(flow.on_text("ADMITTED"));
        assert_eq!(flow.step(), EntryStep::DispoType);
        assert!(flow.draft.disposition.is_none());
    }

    #[test]
    fn tag_selection_toggles_and_marks_options() {
        let sheet = Arc::new(MemorySheet::with_header(10));
        let store = store(sheet);
        let flow = through_cwi(&store);
        assert_eq!(flow.step(), EntryStep::SpecialCategories);

        let (flow, reply) = expect_continue(flow.on_selection("🚨", &store));
        assert_eq!(reply.delivery, Delivery::EditOptions);
        assert!(reply
            .options
            .iter()
            .any(|o| o.label == "✓ 🚨 - Advanced airway (ET/BIPAP/HFNC)"));
        assert_eq!(reply.options.last().map(|o| o.token.as_str()), Some("done"));

        let (flow, reply) = expect_continue(flow.on_selection("🚨", &store));
        assert!(reply.options.iter().all(|o| !o.label.starts_with("✓ ")));
        assert!(flow.draft.tags.is_empty());

        let (flow, _) = expect_continue(flow.on_selection("not-a-tag", &store));
        assert!(flow.draft.tags.is_empty());
    }

    #[test]
    fn done_commits_the_encoded_line() {
        let sheet = Arc::new(MemorySheet::with_header(10));
        let store = store(sheet.clone());
        let flow = through_cwi(&store);
        let (flow, _) = expect_continue(flow.on_selection("🚨", &store));

        let reply = match flow.on_selection("done", &store) {
            Step::Finish(reply) => reply,
            Step::Continue(..) => panic!("done should finish the flow"),
        };
        assert_eq!(
            reply.text,
            "✅ Patient added successfully!\n\nGM1/Cruz (NC/Negative) - 123/45 - A-2 [JoyD] 🚨\n\n\
             Disposition: ADMITTED\nCWI: CAP"
        );

        let rows = sheet.read_all_rows().expect("rows");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][8], "GM1/Cruz (NC/Negative) - 123/45 - A-2 [JoyD] 🚨");
    }
}

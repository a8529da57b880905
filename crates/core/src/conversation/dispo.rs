use super::reply::{Reply, ReplyOption, Step};
use crate::constants::{DISPO_BUTTON_WIDTH, DISPO_TOKEN_PREFIX, PATIENT_TOKEN_PREFIX};
use crate::record::{Disposition, PatientRecord};
use crate::store::CensusStore;

const PICK_PATIENT_PROMPT: &str = "Select a patient to update disposition:";
const PICK_DISPOSITION_PROMPT: &str = "Select the disposition status:";

/// Disposition-update flow: pick a record, then pick its new disposition.
#[derive(Clone, Debug)]
pub(crate) enum DispoFlow {
    PickPatient { options: Vec<ReplyOption> },
    PickDisposition { row: usize },
}

impl DispoFlow {
    pub(crate) fn start(store: &CensusStore) -> Step<Self> {
        let records = match store.load_records() {
            Ok(records) => records,
            Err(err) => {
                return Step::Finish(Reply::message(format!("Error loading patients: {err}")))
            }
        };
        if records.is_empty() {
            return Step::Finish(Reply::message("No patients found in the sheet."));
        }

        let flow = DispoFlow::PickPatient {
            options: records.iter().map(patient_option).collect(),
        };
        let reply = flow.prompt();
        Step::Continue(flow, reply)
    }

    fn prompt(&self) -> Reply {
        match self {
            DispoFlow::PickPatient { options } => {
                Reply::message(PICK_PATIENT_PROMPT).with_options(options.clone())
            }
            DispoFlow::PickDisposition { .. } => {
                Reply::message(PICK_DISPOSITION_PROMPT).with_options(disposition_options())
            }
        }
    }

    pub(crate) fn on_text(self) -> Step<Self> {
        let reply = self.prompt();
        Step::Continue(self, reply)
    }

    pub(crate) fn on_selection(self, token: &str, store: &CensusStore) -> Step<Self> {
        match self {
            DispoFlow::PickPatient { options } => {
                let row = options
                    .iter()
                    .any(|o| o.token == token)
                    .then(|| token.strip_prefix(PATIENT_TOKEN_PREFIX))
                    .flatten()
                    .and_then(|row| row.parse::<usize>().ok());

                match row {
                    Some(row) => {
                        let reply = Reply::edit(PICK_DISPOSITION_PROMPT)
                            .with_options(disposition_options());
                        Step::Continue(DispoFlow::PickDisposition { row }, reply)
                    }
                    None => DispoFlow::PickPatient { options }.on_text(),
                }
            }
            DispoFlow::PickDisposition { row } => {
                let disposition = token
                    .strip_prefix(DISPO_TOKEN_PREFIX)
                    .and_then(|value| value.parse::<Disposition>().ok());

                match disposition {
                    Some(disposition) => Step::Finish(apply(store, row, disposition)),
                    None => DispoFlow::PickDisposition { row }.on_text(),
                }
            }
        }
    }
}

fn apply(store: &CensusStore, row: usize, disposition: Disposition) -> Reply {
    match store.update_disposition(row, disposition) {
        Ok(()) => Reply::edit(format!("✅ Disposition updated to: {disposition}")),
        Err(err) => {
            tracing::error!("failed to update disposition at row {}: {}", row, err);
            Reply::edit(format!("❌ Error updating disposition: {err}"))
        }
    }
}

fn patient_option(record: &PatientRecord) -> ReplyOption {
    let label = if record.line.chars().count() > DISPO_BUTTON_WIDTH {
        let head: String = record.line.chars().take(DISPO_BUTTON_WIDTH).collect();
        format!("{head}...")
    } else {
        record.line.clone()
    };
    ReplyOption::new(label, format!("{PATIENT_TOKEN_PREFIX}{}", record.row))
}

fn disposition_options() -> Vec<ReplyOption> {
    Disposition::ALL
        .iter()
        .map(|d| ReplyOption::new(d.as_str(), format!("{DISPO_TOKEN_PREFIX}{d}")))
        .collect()
}

//! Per-operator conversation handling.
//!
//! A transport feeds [`Inbound`] events into [`ConversationService::handle`] and delivers the
//! returned [`Reply`]. Each operator has at most one active flow. A flow's working state lives in
//! the session map between events and is dropped when the flow finishes or is cancelled.
//!
//! Transports are expected to deliver one operator's events in order. Different operators never
//! share state.

mod dispo;
mod entry;
mod lookup;
mod reply;

pub use entry::EntryStep;
pub use reply::{Delivery, Reply, ReplyOption};

use crate::store::CensusStore;
use crate::{CensusError, CensusResult};
use census_types::NonEmptyText;
use chrono::NaiveDate;
use dispo::DispoFlow;
use entry::EntryFlow;
use lookup::{SearchFlow, ServiceReportFlow, WardReportFlow};
use reply::Step;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};

const WELCOME: &str = "Welcome to Patient Census Bot! 🏥\n\n\
    Available commands:\n\
    /add - Add a new patient\n\
    /dispo - Update patient disposition\n\
    /search - Search for a patient\n\
    /servicereport - Generate service report\n\
    /galawardsreport - Generate Gala Wards report\n\
    /cancel - Cancel current operation";
const CANCELLED: &str = "Operation cancelled.";
const IDLE_HINT: &str = "No operation in progress. Send /start to see the available commands.";

/// Identity of the operator a session belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct OperatorId(NonEmptyText);

impl OperatorId {
    pub fn new(id: impl AsRef<str>) -> CensusResult<Self> {
        Ok(Self(NonEmptyText::new(id)?))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for OperatorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Operator commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    Add,
    Dispo,
    Search,
    ServiceReport,
    GalaWardsReport,
    Cancel,
}

impl FromStr for Command {
    type Err = CensusError;

    /// Accepts the command name with or without a leading `/`, in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        let name = name.strip_prefix('/').unwrap_or(name).to_ascii_lowercase();
        match name.as_str() {
            "start" => Ok(Command::Start),
            "add" => Ok(Command::Add),
            "dispo" => Ok(Command::Dispo),
            "search" => Ok(Command::Search),
            "servicereport" => Ok(Command::ServiceReport),
            "galawardsreport" => Ok(Command::GalaWardsReport),
            "cancel" => Ok(Command::Cancel),
            _ => Err(CensusError::UnknownCommand(s.trim().to_string())),
        }
    }
}

/// One event from the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Inbound {
    Command(Command),
    /// A free-text message.
    Text(String),
    /// A selection signal carrying an option token.
    Selection(String),
}

/// The flow an operator is currently in.
#[derive(Debug)]
enum Flow {
    Entry(EntryFlow),
    Dispo(DispoFlow),
    Search(SearchFlow),
    ServiceReport(ServiceReportFlow),
    WardReport(WardReportFlow),
}

impl Flow {
    fn name(&self) -> &'static str {
        match self {
            Flow::Entry(_) => "add",
            Flow::Dispo(_) => "dispo",
            Flow::Search(_) => "search",
            Flow::ServiceReport(_) => "servicereport",
            Flow::WardReport(_) => "galawardsreport",
        }
    }
}

fn lift<F>(step: Step<F>, wrap: impl FnOnce(F) -> Flow) -> Step<Flow> {
    match step {
        Step::Continue(flow, reply) => Step::Continue(wrap(flow), reply),
        Step::Finish(reply) => Step::Finish(reply),
    }
}

/// Routes operator events to their flows.
pub struct ConversationService {
    store: CensusStore,
    sessions: Mutex<HashMap<OperatorId, Flow>>,
    today: fn() -> NaiveDate,
}

impl std::fmt::Debug for ConversationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationService")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

impl ConversationService {
    /// Reports are dated with the local calendar date.
    pub fn new(store: CensusStore) -> Self {
        Self::with_today(store, local_today)
    }

    /// Use `today` to date reports.
    pub fn with_today(store: CensusStore, today: fn() -> NaiveDate) -> Self {
        Self {
            store,
            sessions: Mutex::new(HashMap::new()),
            today,
        }
    }

    pub fn store(&self) -> &CensusStore {
        &self.store
    }

    /// Name of the operator's active flow, if any.
    pub fn active_flow(&self, operator: &OperatorId) -> Option<&'static str> {
        self.sessions().get(operator).map(Flow::name)
    }

    /// Current step of the operator's add-patient flow, if one is active.
    pub fn entry_step(&self, operator: &OperatorId) -> Option<EntryStep> {
        match self.sessions().get(operator) {
            Some(Flow::Entry(flow)) => Some(flow.step()),
            _ => None,
        }
    }

    /// Process one event for `operator` and return the reply to deliver.
    pub fn handle(&self, operator: &OperatorId, input: Inbound) -> Reply {
        match input {
            Inbound::Command(command) => self.on_command(operator, command),
            Inbound::Text(text) => match self.take(operator) {
                Some(flow) => {
                    let step = self.on_text(flow, &text);
                    self.settle(operator, step)
                }
                None => Reply::message(IDLE_HINT),
            },
            Inbound::Selection(token) => match self.take(operator) {
                Some(flow) => {
                    let step = self.on_selection(flow, &token);
                    self.settle(operator, step)
                }
                None => Reply::message(IDLE_HINT),
            },
        }
    }

    fn on_command(&self, operator: &OperatorId, command: Command) -> Reply {
        let step = match command {
            Command::Start => return Reply::message(WELCOME),
            Command::Cancel => {
                if let Some(flow) = self.take(operator) {
                    tracing::info!("operator {} cancelled {} flow", operator, flow.name());
                }
                return Reply::message(CANCELLED);
            }
            Command::Add => {
                let (flow, reply) = EntryFlow::start();
                Step::Continue(Flow::Entry(flow), reply)
            }
            Command::Dispo => lift(DispoFlow::start(&self.store), Flow::Dispo),
            Command::Search => {
                let (flow, reply) = SearchFlow::start();
                Step::Continue(Flow::Search(flow), reply)
            }
            Command::ServiceReport => {
                let (flow, reply) = ServiceReportFlow::start();
                Step::Continue(Flow::ServiceReport(flow), reply)
            }
            Command::GalaWardsReport => {
                let (flow, reply) = WardReportFlow::start();
                Step::Continue(Flow::WardReport(flow), reply)
            }
        };

        if let Some(flow) = self.take(operator) {
            tracing::warn!(
                "discarding unfinished {} flow for operator {}",
                flow.name(),
                operator
            );
        }
        self.settle(operator, step)
    }

    fn on_text(&self, flow: Flow, text: &str) -> Step<Flow> {
        let store = &self.store;
        match flow {
            Flow::Entry(f) => lift(f.on_text(text), Flow::Entry),
            Flow::Dispo(f) => lift(f.on_text(), Flow::Dispo),
            Flow::Search(f) => lift(f.on_text(text, store), Flow::Search),
            Flow::ServiceReport(f) => {
                lift(f.on_text(text, store, (self.today)()), Flow::ServiceReport)
            }
            Flow::WardReport(f) => lift(f.on_text(text, store, (self.today)()), Flow::WardReport),
        }
    }

    fn on_selection(&self, flow: Flow, token: &str) -> Step<Flow> {
        let store = &self.store;
        match flow {
            Flow::Entry(f) => lift(f.on_selection(token, store), Flow::Entry),
            Flow::Dispo(f) => lift(f.on_selection(token, store), Flow::Dispo),
            Flow::Search(f) => lift(f.on_selection(), Flow::Search),
            Flow::ServiceReport(f) => lift(f.on_selection(), Flow::ServiceReport),
            Flow::WardReport(f) => lift(f.on_selection(), Flow::WardReport),
        }
    }

    fn settle(&self, operator: &OperatorId, step: Step<Flow>) -> Reply {
        match step {
            Step::Continue(flow, reply) => {
                self.sessions().insert(operator.clone(), flow);
                reply
            }
            Step::Finish(reply) => reply,
        }
    }

    fn take(&self, operator: &OperatorId) -> Option<Flow> {
        self.sessions().remove(operator)
    }

    fn sessions(&self) -> std::sync::MutexGuard<'_, HashMap<OperatorId, Flow>> {
        // Flows are inserted whole, so a poisoned map is still consistent.
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

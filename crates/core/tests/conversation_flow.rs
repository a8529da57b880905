use census_core::conversation::{Delivery, EntryStep};
use census_core::sheet::{MemorySheet, SheetBackend, SheetError, SheetResult, YamlSheet};
use census_core::{
    CensusConfig, CensusStore, Command, ConversationService, DerivedColumns, Disposition, Inbound,
    OperatorId, Reply,
};
use census_types::NonEmptyText;
use chrono::NaiveDate;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

fn config() -> CensusConfig {
    CensusConfig::new(
        PathBuf::from("census.yaml"),
        NonEmptyText::new("Template [Edit Here ONLY]").expect("title"),
        DerivedColumns::Computed,
        50,
    )
    .expect("config")
}

fn report_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 16).expect("valid date")
}

fn service_over(backend: Arc<dyn SheetBackend>) -> ConversationService {
    ConversationService::with_today(CensusStore::new(backend, &config()), report_date)
}

fn command(svc: &ConversationService, op: &OperatorId, command: Command) -> Reply {
    svc.handle(op, Inbound::Command(command))
}

fn text(svc: &ConversationService, op: &OperatorId, text: &str) -> Reply {
    svc.handle(op, Inbound::Text(text.to_string()))
}

fn select(svc: &ConversationService, op: &OperatorId, token: &str) -> Reply {
    svc.handle(op, Inbound::Selection(token.to_string()))
}

/// Drive a full add-patient flow and return the final reply.
fn add_patient(
    svc: &ConversationService,
    op: &OperatorId,
    fields: [&str; 9],
    dispo: &str,
    cwi: &str,
    tags: &[&str],
) -> Reply {
    command(svc, op, Command::Add);
    for field in fields {
        text(svc, op, field);
    }
    select(svc, op, &format!("dtype_{dispo}"));
    text(svc, op, cwi);
    for tag in tags {
        select(svc, op, tag);
    }
    select(svc, op, "done")
}

#[test]
fn add_update_search_and_report_end_to_end() {
    let sheet = Arc::new(MemorySheet::with_header(10));
    let svc = service_over(sheet.clone());
    let op = OperatorId::new("resident-1").expect("operator");

    let reply = add_patient(
        &svc,
        &op,
        ["1", "Cruz", "NC", "Negative", "123", "45", "A", "2", "JoyD"],
        "ADMITTED",
        "CAP",
        &["🚨"],
    );
    assert!(reply.text.starts_with("✅ Patient added successfully!"));
    assert_eq!(reply.delivery, Delivery::EditPrevious);
    assert_eq!(svc.active_flow(&op), None);

    // Move the patient onto the existing census.
    let reply = command(&svc, &op, Command::Dispo);
    assert_eq!(reply.options.len(), 1);
    let token = reply.options[0].token.clone();
    assert_eq!(token, "patient_2");
    select(&svc, &op, &token);
    let reply = select(&svc, &op, "dispo_OLD");
    assert_eq!(reply.text, "✅ Disposition updated to: OLD");

    let records = svc.store().load_records().expect("records");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].disposition, Some(Disposition::Old));

    command(&svc, &op, Command::Search);
    let reply = text(&svc, &op, "joyd");
    assert_eq!(
        reply.text,
        "joyd (1 | 1)\nGM1/Cruz (NC/Negative) - 123/45 - A-2 [JoyD] 🚨"
    );

    command(&svc, &op, Command::ServiceReport);
    let reply = text(&svc, &op, "GM1");
    assert!(reply.preformatted);
    assert_eq!(
        reply.text,
        "GM1 WARD CENSUS\nDATE 10/16/26\nRECEIVED: 1\n\nJoyD (1 | 1)\n123/45\n\nGM1 = 1 + 0 - 0 = 1"
    );
}

#[test]
fn ward_report_flow_uses_the_collected_roster() {
    let sheet = Arc::new(MemorySheet::with_header(10));
    let svc = service_over(sheet);
    let op = OperatorId::new("resident-1").expect("operator");

    add_patient(
        &svc,
        &op,
        ["2", "Reyes", "RA", "Negative", "200", "1", "B", "4", "Ana"],
        "TOS IN",
        "UTI",
        &[],
    );
    add_patient(
        &svc,
        &op,
        ["gm2", "Lim", "FM", "Positive", "201", "2", "B", "5", "Ana"],
        "TRANS IN FROM ICU",
        "Sepsis",
        &["😱", "🦠"],
    );

    command(&svc, &op, Command::GalaWardsReport);
    for field in ["GM2", "Dr A", "Dr B", "Dr C"] {
        text(&svc, &op, field);
    }
    let reply = text(&svc, &op, "Dr D");

    assert!(reply.preformatted);
    assert!(reply.text.contains("TOS IN: 1\nGM2: Reyes\n"));
    assert!(reply.text.contains("TRANS IN FROM ICU: 1\nGM2: Lim\n"));
    assert!(reply.text.contains("GM2: 0 + 2 - 0 = 2\n"));
    assert!(reply.text.ends_with("TOTAL: 2"));
}

#[test]
fn cancel_mid_entry_commits_nothing() {
    let sheet = Arc::new(MemorySheet::with_header(10));
    let svc = service_over(sheet.clone());
    let op = OperatorId::new("resident-1").expect("operator");

    command(&svc, &op, Command::Add);
    for field in ["1", "Cruz", "NC", "Negative", "123", "45", "A", "2", "JoyD"] {
        text(&svc, &op, field);
    }
    assert_eq!(svc.entry_step(&op), Some(EntryStep::DispoType));

    let reply = command(&svc, &op, Command::Cancel);
    assert_eq!(reply.text, "Operation cancelled.");
    assert_eq!(sheet.read_all_rows().expect("rows").len(), 1);
}

#[test]
fn file_backed_sheet_persists_across_services() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("census.yaml");
    let op = OperatorId::new("resident-1").expect("operator");

    {
        let sheet = YamlSheet::create(&path, "Template [Edit Here ONLY]", 2).expect("sheet");
        let svc = service_over(Arc::new(sheet));
        for name in ["Cruz", "Lee"] {
            add_patient(
                &svc,
                &op,
                ["3", name, "RA", "Negative", "1", "1", "C", "1", "Team"],
                "ADMITTED",
                "",
                &[],
            );
        }
    }

    let sheet = YamlSheet::open(&path, "Template [Edit Here ONLY]").expect("reopen");
    assert_eq!(sheet.row_capacity().expect("capacity"), 52);
    let store = CensusStore::new(Arc::new(sheet), &config());
    let rows: Vec<_> = store
        .load_records()
        .expect("records")
        .into_iter()
        .map(|r| (r.row, r.decoded.last_name))
        .collect();
    assert_eq!(
        rows,
        vec![(2, Some("Cruz".to_string())), (3, Some("Lee".to_string()))]
    );
}

struct UnavailableSheet;

impl SheetBackend for UnavailableSheet {
    fn read_all_rows(&self) -> SheetResult<Vec<Vec<String>>> {
        Err(SheetError::Unavailable("connection refused".into()))
    }
    fn write_cell(&self, _: usize, _: usize, _: &str) -> SheetResult<()> {
        Err(SheetError::Unavailable("connection refused".into()))
    }
    fn append_empty_rows(&self, _: usize) -> SheetResult<()> {
        Err(SheetError::Unavailable("connection refused".into()))
    }
    fn row_capacity(&self) -> SheetResult<usize> {
        Err(SheetError::Unavailable("connection refused".into()))
    }
}

#[test]
fn backend_failures_end_flows_with_a_message() {
    let svc = service_over(Arc::new(UnavailableSheet));
    let op = OperatorId::new("resident-1").expect("operator");

    let reply = add_patient(
        &svc,
        &op,
        ["1", "Cruz", "NC", "Negative", "123", "45", "A", "2", "JoyD"],
        "ADMITTED",
        "CAP",
        &[],
    );
    assert!(reply.text.starts_with("❌ Error adding patient: "));
    assert!(reply.text.contains("connection refused"));
    assert_eq!(svc.active_flow(&op), None);

    let reply = command(&svc, &op, Command::Dispo);
    assert!(reply.text.starts_with("Error loading patients: "));
    assert_eq!(svc.active_flow(&op), None);

    command(&svc, &op, Command::Search);
    let reply = text(&svc, &op, "cruz");
    assert!(reply.text.starts_with("Error during search: "));

    command(&svc, &op, Command::ServiceReport);
    let reply = text(&svc, &op, "1");
    assert!(reply.text.starts_with("Error generating report: "));
}

use census_core::report::{self, DutyRoster};
use census_core::sheet::YamlSheet;
use census_core::{query, CensusConfig, CensusStore, Disposition};
use census_types::ServiceCode;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "census")]
#[command(about = "Ward census CLI")]
struct Cli {
    /// Sheet file to use instead of CENSUS_SHEET_PATH
    #[arg(long, global = true)]
    sheet: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty census sheet
    InitSheet {
        /// Number of addressable rows, header included
        #[arg(long, default_value_t = 51)]
        capacity: usize,
    },
    /// List all patients
    List,
    /// Search the census
    Search {
        /// Service code, JRIC or any text in the patient line
        query: String,
    },
    /// Print the census report for one service
    ServiceReport {
        /// Service number or code, e.g. 3 or GM3
        service: String,
        /// Report date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Print the ward-wide census report
    WardReport {
        admitting_service: String,
        sapod: String,
        napod: String,
        wapod: String,
        apod: String,
        /// Report date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Overwrite the disposition of one row
    SetDisposition {
        /// Sheet row of the patient
        row: usize,
        /// One of OLD, ADMITTED, HOME, "TOS IN", "TRANS IN FROM ICU", MORT, "TOS OUT",
        /// "TRANS OUT TO ICU", HAMA/HPR, THOC, ABSCOND
        disposition: Disposition,
    },
}

fn load_config(sheet: Option<PathBuf>) -> Result<CensusConfig, Box<dyn std::error::Error>> {
    let sheet_path = sheet
        .map(|p| p.display().to_string())
        .or_else(|| std::env::var("CENSUS_SHEET_PATH").ok());

    Ok(CensusConfig::from_env_values(
        sheet_path,
        std::env::var("CENSUS_WORKSHEET").ok(),
        std::env::var("CENSUS_DERIVED_COLUMNS").ok(),
        std::env::var("CENSUS_ROW_GROWTH").ok(),
    )?)
}

fn open_store(cfg: &CensusConfig) -> Result<CensusStore, Box<dyn std::error::Error>> {
    let sheet = YamlSheet::open(cfg.sheet_path(), cfg.worksheet().as_str())?;
    Ok(CensusStore::new(Arc::new(sheet), cfg))
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let cfg = load_config(cli.sheet)?;

    match cli.command {
        Some(Commands::InitSheet { capacity }) => {
            match YamlSheet::create(cfg.sheet_path(), cfg.worksheet().as_str(), capacity) {
                Ok(sheet) => println!("Created census sheet at {}", sheet.path().display()),
                Err(e) => eprintln!("Error creating census sheet: {}", e),
            }
        }
        Some(Commands::List) => {
            let records = open_store(&cfg)?.load_records()?;
            if records.is_empty() {
                println!("No patients found.");
            } else {
                for record in records {
                    println!(
                        "Row: {}, Dispo: {}, Patient: {}",
                        record.row,
                        record.disposition.map(|d| d.as_str()).unwrap_or("-"),
                        record.line
                    );
                }
            }
        }
        Some(Commands::Search { query: text }) => {
            let records = open_store(&cfg)?.load_records()?;
            if records.is_empty() {
                println!("No patients found in the sheet.");
            } else {
                println!("{}", query::search(text.trim(), &records).render());
            }
        }
        Some(Commands::ServiceReport { service, date }) => {
            let records = open_store(&cfg)?.load_records()?;
            let service = ServiceCode::normalise(&service);
            let view = report::service_report(&service, &records, date.unwrap_or_else(today));
            println!("{}", view.render());
        }
        Some(Commands::WardReport {
            admitting_service,
            sapod,
            napod,
            wapod,
            apod,
            date,
        }) => {
            let records = open_store(&cfg)?.load_records()?;
            let roster = DutyRoster {
                admitting_service,
                sapod,
                napod,
                wapod,
                apod,
            };
            let ward = report::ward_report(roster, &records, date.unwrap_or_else(today));
            println!("{}", ward.render());
        }
        Some(Commands::SetDisposition { row, disposition }) => {
            match open_store(&cfg)?.update_disposition(row, disposition) {
                Ok(()) => println!("Row {} disposition updated to: {}", row, disposition),
                Err(e) => eprintln!("Error updating disposition: {}", e),
            }
        }
        None => {
            println!("Use 'census --help' for commands");
        }
    }

    Ok(())
}

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::store::{Backend, DEFAULT_API_URL};
use crate::utils::parse_month;

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendArg {
    /// SQLite file on this machine
    #[value(alias = "localStorage")]
    Local,
    /// REST API at --api-url
    Api,
    /// Hosted document database (not configured)
    #[value(name = "document-store", alias = "firebase")]
    DocumentStore,
}

impl From<BackendArg> for Backend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Local => Backend::Local,
            BackendArg::Api => Backend::Api,
            BackendArg::DocumentStore => Backend::DocumentStore,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "wattbook",
    version,
    about = "Track household equipment usage and meter readings, and estimate electricity cost"
)]
pub struct Args {
    /// Storage backend for equipment, usage history and billing settings
    #[arg(long, global = true, value_enum, env = "WATTBOOK_BACKEND", default_value_t = BackendArg::Local)]
    pub backend: BackendArg,

    /// Base URL of the REST API (api backend)
    #[arg(long, global = true, env = "WATTBOOK_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Local database file. Defaults to wattbook.db in the user data directory
    #[arg(long, global = true, env = "WATTBOOK_DB_PATH")]
    pub db_path: Option<PathBuf>,

    /// Emit JSON instead of colored text
    #[arg(long, global = true)]
    pub json: bool,

    /// Debug mode: log every storage call
    #[arg(long, global = true, env = "WATTBOOK_DEBUG")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    pub fn parse() -> Self {
        <Args as clap::Parser>::parse()
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage the equipment list
    #[command(subcommand)]
    Equipment(EquipmentCmd),
    /// Price a day of equipment use and keep a history of days
    #[command(subcommand)]
    Usage(UsageCmd),
    /// Show or change rates for the equipment calculator
    #[command(subcommand)]
    Settings(SettingsCmd),
    /// Record meter readings and price the intervals between them
    #[command(subcommand)]
    Meter(MeterCmd),
    /// Export, import or clear calculator data
    #[command(subcommand)]
    Data(DataCmd),
}

#[derive(Subcommand, Debug)]
pub enum EquipmentCmd {
    List,
    Add {
        name: String,
        /// Rated power draw in watts
        watts: f64,
    },
    Remove {
        id: i64,
    },
}

#[derive(clap::Args, Debug)]
pub struct DayArgs {
    /// Day being priced (defaults to today)
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Hours of use for one piece of equipment, as ID=HOURS. Repeatable
    #[arg(long = "hours", value_parser = parse_hours_pair)]
    pub hours: Vec<(i64, f64)>,
}

#[derive(Subcommand, Debug)]
pub enum UsageCmd {
    /// Price the given hours without saving
    Quote(DayArgs),
    /// Price the given hours and save them as the record for the day
    Save(DayArgs),
    /// Most recent saved days
    History,
    /// Totals for the month containing --date
    Month {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

#[derive(Subcommand, Debug)]
pub enum SettingsCmd {
    Show,
    Set {
        /// Price per kWh
        #[arg(long)]
        unit_rate: Option<f64>,
        /// Service fee percentage
        #[arg(long)]
        service_fee: Option<f64>,
    },
}

#[derive(clap::Args, Debug)]
pub struct ReadingArgs {
    /// Reading at the start of the interval (defaults to the last recorded reading)
    #[arg(long)]
    pub start: Option<f64>,

    /// Date of the start reading (defaults to the last recorded date)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Current meter reading
    #[arg(long)]
    pub reading: f64,

    /// Date of the current reading (defaults to today)
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

#[derive(Subcommand, Debug)]
pub enum MeterCmd {
    /// Price an interval without saving it
    Quote(ReadingArgs),
    /// Save an interval to the reading log
    Record {
        #[command(flatten)]
        reading: ReadingArgs,
        #[arg(long, default_value = "")]
        note: String,
    },
    /// Most recent readings, newest first
    History,
    Delete {
        id: i64,
    },
    /// Re-price a saved reading under the current settings
    Load {
        id: i64,
    },
    /// Totals for a month (defaults to the current month)
    Month {
        /// Month as YYYY-MM
        #[arg(long, value_parser = parse_month_arg)]
        month: Option<NaiveDate>,
    },
    /// Show or change meter billing settings
    Settings {
        #[arg(long)]
        unit_rate: Option<f64>,
        #[arg(long)]
        service_fee: Option<f64>,
        /// Billing floor for one interval
        #[arg(long)]
        minimum_charge: Option<f64>,
    },
}

#[derive(Subcommand, Debug)]
pub enum DataCmd {
    /// Write equipment, history and settings to a JSON file
    Export {
        /// Output file (defaults to electricity-data-YYYY-MM-DD.json)
        path: Option<PathBuf>,
    },
    /// Replace equipment, history and settings from an export file
    Import { path: PathBuf },
    /// Delete all calculator data (local backend only)
    Clear {
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },
}

/// Parse `ID=HOURS`
pub fn parse_hours_pair(s: &str) -> Result<(i64, f64), String> {
    let (id, hours) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ID=HOURS, got {s:?}"))?;
    let id = id
        .trim()
        .parse::<i64>()
        .map_err(|_| format!("invalid equipment id {id:?}"))?;
    let hours = hours
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("invalid hours {hours:?}"))?;
    Ok((id, hours))
}

fn parse_month_arg(s: &str) -> Result<NaiveDate, String> {
    parse_month(s).ok_or_else(|| format!("expected YYYY-MM, got {s:?}"))
}

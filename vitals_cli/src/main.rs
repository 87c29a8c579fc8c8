use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use vitals_core::*;

mod menu;

#[derive(Parser)]
#[command(name = "vitals")]
#[command(about = "Daily health log with weight statistics and trend prediction", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

/// Optional measurements shared by `add` and `update`
///
/// Values are taken as text so the core parser reports range and format
/// errors the same way for every input path.
#[derive(Args)]
struct FieldArgs {
    /// Weight in pounds
    #[arg(long, allow_hyphen_values = true)]
    weight: Option<String>,

    /// Sleep duration in hours
    #[arg(long, allow_hyphen_values = true)]
    sleep: Option<String>,

    /// Resting heart rate in bpm
    #[arg(long = "resting-hr", allow_hyphen_values = true)]
    resting_hr: Option<String>,

    /// Free-form notes
    #[arg(long)]
    notes: Option<String>,
}

impl FieldArgs {
    fn into_raw(self, date: String) -> RawEntry {
        RawEntry {
            date: Some(date),
            weight: self.weight,
            sleep_hours: self.sleep,
            resting_heart_rate: self.resting_hr,
            notes: self.notes,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Record an entry, replacing any entry for the same date
    Add {
        /// Date (YYYY-MM-DD)
        #[arg(long)]
        date: String,

        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Change fields of an existing entry; omitted fields are kept
    Update {
        /// Date (YYYY-MM-DD) of the entry to change
        #[arg(long)]
        date: String,

        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Show the entry for one date
    Show {
        /// Date (YYYY-MM-DD)
        #[arg(long)]
        date: String,
    },

    /// List all entries, oldest first
    List,

    /// Weight, sleep and heart-rate statistics
    Stats {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Project weight forward along a linear trend
    Predict {
        /// Number of days to project (default from config, 30)
        #[arg(long)]
        days: Option<u32>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write all entries to the backup file
    Backup {
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Merge the backup file back into the log
    Restore {
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Export all entries (csv or json)
    Export {
        #[arg(long)]
        file: Option<PathBuf>,

        /// csv or json; inferred from the file extension when omitted
        #[arg(long)]
        format: Option<String>,
    },

    /// Import entries from a csv or json table
    Import {
        #[arg(long)]
        file: Option<PathBuf>,

        /// csv or json; inferred from the file extension when omitted
        #[arg(long)]
        format: Option<String>,
    },

    /// Interactive numbered menu (default)
    Menu,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        vitals_core::logging::init_with_level("debug");
    } else {
        vitals_core::logging::init();
    }

    let mut config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(data_dir) = cli.data_dir {
        config.data.data_dir = data_dir;
    }

    let mut store = SqliteStore::open(&config.database_path())?;
    let result = dispatch(cli.command.unwrap_or(Commands::Menu), &mut store, &config);

    // Close even when the command failed; its error takes precedence
    let closed = store.close();
    result.and(closed)
}

fn dispatch(command: Commands, store: &mut SqliteStore, config: &Config) -> Result<()> {
    match command {
        Commands::Add { date, fields } => cmd_add(store, fields.into_raw(date)),
        Commands::Update { date, fields } => {
            let date = parse_date(&date)?;
            let patch = EntryPatch::try_from(fields.into_raw(String::new()))?;
            cmd_update(store, date, &patch)
        }
        Commands::Show { date } => cmd_show(store, parse_date(&date)?),
        Commands::List => cmd_list(store),
        Commands::Stats { json } => cmd_stats(store, json),
        Commands::Predict { days, json } => {
            cmd_predict(store, days.unwrap_or(config.prediction.horizon_days), json)
        }
        Commands::Backup { file } => {
            let path = file.unwrap_or_else(|| config.backup_path());
            cmd_backup(store, &path)
        }
        Commands::Restore { file } => {
            let path = file.unwrap_or_else(|| config.backup_path());
            cmd_restore(store, &path)
        }
        Commands::Export { file, format } => {
            let path = file.unwrap_or_else(|| config.export_path());
            let format = resolve_format(format.as_deref(), &path)?;
            cmd_export(store, &path, format)
        }
        Commands::Import { file, format } => {
            let path = file.unwrap_or_else(|| config.import_path());
            let format = resolve_format(format.as_deref(), &path)?;
            cmd_import(store, &path, format)
        }
        Commands::Menu => menu::run(store, config),
    }
}

fn resolve_format(explicit: Option<&str>, path: &Path) -> Result<TransferFormat> {
    match explicit {
        Some(s) => s.parse(),
        None => Ok(TransferFormat::from_path(path)),
    }
}

// ============================================================================
// Commands
// ============================================================================

fn cmd_add(store: &mut SqliteStore, raw: RawEntry) -> Result<()> {
    let entry = Entry::try_from(raw)?;
    let replaced = store.find_by_date(entry.date)?.is_some();
    store.upsert(&entry)?;

    if replaced {
        println!("✓ Entry for {} replaced", entry.date);
    } else {
        println!("✓ Entry for {} added", entry.date);
    }
    Ok(())
}

fn cmd_update(
    store: &mut SqliteStore,
    date: chrono::NaiveDate,
    patch: &EntryPatch,
) -> Result<()> {
    let updated = store.update(date, patch)?;
    println!("✓ Entry for {} updated", date);
    println!("  {}", format_entry(&updated, None));
    Ok(())
}

fn cmd_show(store: &SqliteStore, date: chrono::NaiveDate) -> Result<()> {
    let entry = store.find_by_date(date)?.ok_or(Error::NotFound(date))?;
    println!("{}", format_entry(&entry, None));
    Ok(())
}

fn cmd_list(store: &SqliteStore) -> Result<()> {
    let entries = store.list_all()?;
    if entries.is_empty() {
        println!("No entries found.");
        return Ok(());
    }

    let trends = weight_trends(&entries);
    for (entry, trend) in entries.iter().zip(trends) {
        println!("{}", format_entry(entry, Some(trend)));
    }
    Ok(())
}

fn cmd_stats(store: &SqliteStore, json: bool) -> Result<()> {
    let entries = store.list_all()?;
    let summary = summarize(&entries)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn cmd_predict(store: &SqliteStore, horizon_days: u32, json: bool) -> Result<()> {
    let entries = store.list_all()?;
    let prediction = predict(&entries, horizon_days)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&prediction)?);
    } else {
        print_prediction(&prediction);
    }
    Ok(())
}

fn cmd_backup(store: &SqliteStore, path: &Path) -> Result<()> {
    let count = transfer::export_store(store, TransferFormat::from_path(path), path)?;
    println!("✓ Backed up {} entries", count);
    println!("  File: {}", path.display());
    Ok(())
}

fn cmd_restore(store: &mut SqliteStore, path: &Path) -> Result<()> {
    let count = transfer::import_into_store(store, TransferFormat::from_path(path), path)?;
    println!("✓ Restored {} entries from {}", count, path.display());
    Ok(())
}

fn cmd_export(store: &SqliteStore, path: &Path, format: TransferFormat) -> Result<()> {
    let count = transfer::export_store(store, format, path)?;
    println!("✓ Exported {} entries", count);
    println!("  File: {}", path.display());
    Ok(())
}

fn cmd_import(store: &mut SqliteStore, path: &Path, format: TransferFormat) -> Result<()> {
    let count = transfer::import_into_store(store, format, path)?;
    println!("✓ Imported {} entries from {}", count, path.display());
    Ok(())
}

// ============================================================================
// Output
// ============================================================================

fn format_entry(entry: &Entry, trend: Option<WeightTrend>) -> String {
    let weight = entry
        .weight
        .map(|w| format!("{} lbs", w))
        .unwrap_or_else(|| "No weight".into());
    let sleep = entry
        .sleep_hours
        .map(|h| format!("{} hours", h))
        .unwrap_or_else(|| "-".into());
    let resting_hr = entry
        .resting_heart_rate
        .map(|r| format!("{} bpm", r))
        .unwrap_or_else(|| "-".into());

    let mut line = format!(
        "Date: {}, Weight: {}, Sleep Duration: {}, Resting HR: {}",
        entry.date, weight, sleep, resting_hr
    );
    if let Some(trend) = trend {
        line.push_str(&format!(", Trend: {}", trend));
    }
    if let Some(ref notes) = entry.notes {
        line.push_str(&format!(", Notes: {}", notes));
    }
    line
}

fn print_summary(summary: &Summary) {
    let weight = &summary.weight;
    let change = &summary.change;

    println!("Average Weight: {:.2} lbs", weight.mean);
    println!("Minimum Weight: {:.2} lbs", weight.min);
    println!("Maximum Weight: {:.2} lbs", weight.max);
    println!("Total Entries with Weight: {}", weight.count);
    println!("Total Weight Change: {:.2} lbs", change.total_change);
    match change.average_daily_change {
        Some(per_day) => println!("Average Daily Weight Change: {:.4} lbs/day", per_day),
        None => println!("Average Daily Weight Change: n/a (all weights on one day)"),
    }

    match summary.heart_rate {
        Some(ref hr) => {
            println!("Average Resting Heart Rate: {:.2} bpm", hr.mean);
            println!("Minimum Resting Heart Rate: {} bpm", hr.min);
            println!("Maximum Resting Heart Rate: {} bpm", hr.max);
        }
        None => println!("No resting heart rate data available."),
    }

    match summary.sleep {
        Some(ref sleep) => {
            println!("Average Sleep Duration: {:.2} hours", sleep.mean);
            println!("Shortest Sleep: {:.2} hours", sleep.min);
            println!("Longest Sleep: {:.2} hours", sleep.max);
        }
        None => println!("No sleep data available."),
    }

    println!();
    println!("Weight Change by Month:");
    for month in &summary.monthly {
        match month.change {
            Some(delta) => println!("{}: {:.2} lbs", month.label(), delta),
            None => println!(
                "{}: insufficient data ({} entry)",
                month.label(),
                month.entries
            ),
        }
    }
}

fn print_prediction(prediction: &Prediction) {
    let fit = &prediction.fit;
    println!(
        "Trend: {:+.4} lbs/day over {} recorded weights",
        fit.slope, fit.samples
    );
    println!();
    for point in &prediction.points {
        println!("  {}  {:.2} lbs", point.date, point.weight);
    }
}

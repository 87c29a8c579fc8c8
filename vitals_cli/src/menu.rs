//! Interactive numbered menu.
//!
//! Each numbered choice maps to exactly one command; errors are printed and
//! the menu is shown again. End of input behaves like choosing Exit.

use crate::{
    cmd_backup, cmd_export, cmd_import, cmd_list, cmd_predict, cmd_restore, cmd_stats,
    format_entry,
};
use std::io::{self, BufRead, Write};
use vitals_core::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MenuChoice {
    Add,
    List,
    Stats,
    Update,
    Predict,
    Backup,
    Restore,
    Export,
    Import,
    Exit,
}

impl MenuChoice {
    const ALL: [MenuChoice; 10] = [
        MenuChoice::Add,
        MenuChoice::List,
        MenuChoice::Stats,
        MenuChoice::Update,
        MenuChoice::Predict,
        MenuChoice::Backup,
        MenuChoice::Restore,
        MenuChoice::Export,
        MenuChoice::Import,
        MenuChoice::Exit,
    ];

    fn label(self) -> &'static str {
        match self {
            MenuChoice::Add => "Add entry",
            MenuChoice::List => "View log",
            MenuChoice::Stats => "Calculate statistics",
            MenuChoice::Update => "Update entry",
            MenuChoice::Predict => "Predict future weight",
            MenuChoice::Backup => "Back up data",
            MenuChoice::Restore => "Restore data",
            MenuChoice::Export => "Export data",
            MenuChoice::Import => "Import data",
            MenuChoice::Exit => "Exit",
        }
    }

    /// Parse the 1-based menu number
    fn from_input(input: &str) -> Option<Self> {
        let n: usize = input.trim().parse().ok()?;
        n.checked_sub(1).and_then(|i| Self::ALL.get(i).copied())
    }
}

/// Run the menu against stdin until Exit or end of input
pub fn run(store: &mut SqliteStore, config: &Config) -> Result<()> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    run_with(&mut input, store, config)
}

fn run_with(input: &mut impl BufRead, store: &mut SqliteStore, config: &Config) -> Result<()> {
    loop {
        println!();
        println!("--- Vitals Menu ---");
        for (i, choice) in MenuChoice::ALL.iter().enumerate() {
            println!("{}. {}", i + 1, choice.label());
        }

        let prompt = format!("Choose an option (1-{}): ", MenuChoice::ALL.len());
        let Some(line) = read_line(input, &prompt)? else {
            println!();
            break;
        };

        let Some(choice) = MenuChoice::from_input(&line) else {
            println!(
                "Invalid option. Please choose a number between 1 and {}.",
                MenuChoice::ALL.len()
            );
            continue;
        };

        if choice == MenuChoice::Exit {
            break;
        }

        if let Err(e) = perform(choice, input, store, config) {
            tracing::debug!("Menu action {:?} failed: {:?}", choice, e);
            println!("Error: {}", e);
        }
    }

    println!("Exiting.");
    Ok(())
}

fn perform(
    choice: MenuChoice,
    input: &mut impl BufRead,
    store: &mut SqliteStore,
    config: &Config,
) -> Result<()> {
    match choice {
        MenuChoice::Add => add_entry(input, store),
        MenuChoice::List => cmd_list(store),
        MenuChoice::Stats => cmd_stats(store, false),
        MenuChoice::Update => update_entry(input, store),
        MenuChoice::Predict => cmd_predict(store, config.prediction.horizon_days, false),
        MenuChoice::Backup => cmd_backup(store, &config.backup_path()),
        MenuChoice::Restore => cmd_restore(store, &config.backup_path()),
        MenuChoice::Export => {
            let path = config.export_path();
            cmd_export(store, &path, TransferFormat::from_path(&path))
        }
        MenuChoice::Import => {
            let path = config.import_path();
            cmd_import(store, &path, TransferFormat::from_path(&path))
        }
        MenuChoice::Exit => Ok(()),
    }
}

fn add_entry(input: &mut impl BufRead, store: &mut SqliteStore) -> Result<()> {
    let date = prompt_date(input, "Enter the date (YYYY-MM-DD): ")?;
    let weight = prompt_optional(
        input,
        "Enter your weight in pounds (or leave blank if unknown): ",
        parse_weight,
    )?;
    let notes = read_line(input, "Notes (optional): ")?.ok_or_else(end_of_input)?;
    let sleep_hours = prompt_optional(input, "Sleep duration (hours, optional): ", parse_sleep_hours)?;
    let resting_heart_rate = prompt_optional(
        input,
        "Resting heart rate (optional): ",
        parse_resting_heart_rate,
    )?;

    let entry = Entry {
        date,
        weight,
        sleep_hours,
        resting_heart_rate,
        notes: Some(notes),
    };
    store.upsert(&entry)?;
    println!("✓ Entry for {} saved", date);
    Ok(())
}

fn update_entry(input: &mut impl BufRead, store: &mut SqliteStore) -> Result<()> {
    let date = prompt_date(input, "Enter the date of the entry to update (YYYY-MM-DD): ")?;
    let current = store.find_by_date(date)?.ok_or(Error::NotFound(date))?;

    println!("Current entry:");
    println!("  {}", format_entry(&current, None));

    let patch = EntryPatch {
        weight: prompt_optional(
            input,
            "New weight in pounds (leave blank to keep): ",
            parse_weight,
        )?,
        notes: read_line(input, "New notes (leave blank to keep): ")?
            .ok_or_else(end_of_input)
            .map(|n| Some(n).filter(|n| !n.trim().is_empty()))?,
        sleep_hours: prompt_optional(
            input,
            "New sleep duration in hours (leave blank to keep): ",
            parse_sleep_hours,
        )?,
        resting_heart_rate: prompt_optional(
            input,
            "New resting heart rate (leave blank to keep): ",
            parse_resting_heart_rate,
        )?,
    };

    if patch.is_empty() {
        println!("Nothing changed.");
        return Ok(());
    }

    let updated = store.update(date, &patch)?;
    println!("✓ Entry for {} updated", date);
    println!("  {}", format_entry(&updated, None));
    Ok(())
}

// ============================================================================
// Prompt helpers
// ============================================================================

fn end_of_input() -> Error {
    Error::Io(io::Error::new(
        io::ErrorKind::UnexpectedEof,
        "input ended before the entry was complete",
    ))
}

/// Print `prompt` and read one line; `None` at end of input
fn read_line(input: &mut impl BufRead, prompt: &str) -> Result<Option<String>> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

/// Ask until a valid date is given
fn prompt_date(input: &mut impl BufRead, prompt: &str) -> Result<chrono::NaiveDate> {
    loop {
        let line = read_line(input, prompt)?.ok_or_else(end_of_input)?;
        match parse_date(&line) {
            Ok(date) => return Ok(date),
            Err(e) => println!("{}", e),
        }
    }
}

/// Ask until the answer is blank (absent) or parses
fn prompt_optional<T>(
    input: &mut impl BufRead,
    prompt: &str,
    parse: fn(&str) -> Result<T>,
) -> Result<Option<T>> {
    loop {
        let line = read_line(input, prompt)?.ok_or_else(end_of_input)?;
        if line.trim().is_empty() {
            return Ok(None);
        }
        match parse(&line) {
            Ok(value) => return Ok(Some(value)),
            Err(e) => println!("{}", e),
        }
    }
}

//! Export and import of the entry log as flat tables.
//!
//! Two formats share one column set
//! (`date, weight, sleep_hours, resting_heart_rate, notes`):
//! - CSV with a header row, absent values as empty fields
//! - JSON, an array of objects with `null` for absent values
//!
//! Imports parse and validate every row before anything is written, so a bad
//! row leaves the store untouched. The error names the 1-based data row
//! (header excluded).

use crate::store::EntryStore;
use crate::{Entry, Error, RawEntry, Result};
use fs2::FileExt;
use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::str::FromStr;
use tempfile::NamedTempFile;

/// Column order of every exported table
pub const COLUMNS: [&str; 5] = [
    "date",
    "weight",
    "sleep_hours",
    "resting_heart_rate",
    "notes",
];

/// Table encoding
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TransferFormat {
    #[default]
    Csv,
    Json,
}

impl TransferFormat {
    /// Guess from a file extension; anything but `.json` is CSV
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => TransferFormat::Json,
            _ => TransferFormat::Csv,
        }
    }
}

impl FromStr for TransferFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(TransferFormat::Csv),
            "json" => Ok(TransferFormat::Json),
            other => Err(Error::validation(
                "format",
                format!("unknown format '{}' (expected csv or json)", other),
            )),
        }
    }
}

impl fmt::Display for TransferFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferFormat::Csv => f.write_str("csv"),
            TransferFormat::Json => f.write_str("json"),
        }
    }
}

/// A row in the CSV output
///
/// Reals are pre-formatted so they are always plain decimals; the csv
/// serializer would switch to exponent notation for very small or large values.
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    date: String,
    weight: Option<String>,
    sleep_hours: Option<String>,
    resting_heart_rate: Option<u32>,
    notes: Option<&'a str>,
}

/// Shortest decimal that parses back to `value`, without an exponent
fn plain_decimal(value: f64) -> String {
    value.to_string()
}

impl<'a> From<&'a Entry> for CsvRow<'a> {
    fn from(entry: &'a Entry) -> Self {
        CsvRow {
            date: entry.date.format(crate::DATE_FORMAT).to_string(),
            weight: entry.weight.map(plain_decimal),
            sleep_hours: entry.sleep_hours.map(plain_decimal),
            resting_heart_rate: entry.resting_heart_rate,
            notes: entry.notes.as_deref(),
        }
    }
}

// ============================================================================
// Stream-level export/import
// ============================================================================

/// Write `entries` as a table; returns the number of data rows
pub fn export<W: Write>(entries: &[Entry], format: TransferFormat, writer: W) -> Result<usize> {
    match format {
        TransferFormat::Csv => {
            // Header is written by hand so an empty log still gets one
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(writer);
            writer.write_record(COLUMNS)?;
            for entry in entries {
                writer.serialize(CsvRow::from(entry))?;
            }
            writer.flush()?;
        }
        TransferFormat::Json => {
            let mut writer = writer;
            serde_json::to_writer_pretty(&mut writer, entries)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
    }
    Ok(entries.len())
}

/// Parse and validate a whole table
pub fn import<R: Read>(reader: R, format: TransferFormat) -> Result<Vec<Entry>> {
    match format {
        TransferFormat::Csv => import_csv(reader),
        TransferFormat::Json => import_json(reader),
    }
}

fn row_error(row: usize, err: impl fmt::Display) -> Error {
    Error::Parse {
        row,
        message: err.to_string(),
    }
}

fn import_csv<R: Read>(reader: R) -> Result<Vec<Entry>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);

    let headers = reader.headers()?;
    if !headers.iter().any(|h| h == "date" || h == "Date") {
        return Err(Error::Parse {
            row: 0,
            message: "header row has no 'date' column".into(),
        });
    }

    let mut entries = Vec::new();
    for (index, result) in reader.deserialize::<RawEntry>().enumerate() {
        let row = index + 1;
        let raw = result.map_err(|e| row_error(row, e))?;
        let entry = Entry::try_from(raw).map_err(|e| row_error(row, e))?;
        entries.push(entry);
    }
    Ok(entries)
}

fn import_json<R: Read>(reader: R) -> Result<Vec<Entry>> {
    let rows: Vec<serde_json::Value> = serde_json::from_reader(reader)?;

    rows.into_iter()
        .enumerate()
        .map(|(index, value)| {
            let row = index + 1;
            serde_json::from_value::<Entry>(value)
                .map_err(|e| row_error(row, e))?
                .normalized()
                .map_err(|e| row_error(row, e))
        })
        .collect()
}

// ============================================================================
// File-level export/import
// ============================================================================

/// Export to `path`, replacing it atomically
///
/// The table is written to a locked temp file in the same directory, synced,
/// then renamed over `path`, so readers never see a partial file.
pub fn export_to_path(entries: &[Entry], format: TransferFormat, path: &Path) -> Result<usize> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let temp = NamedTempFile::new_in(parent)?;
    temp.as_file().lock_exclusive()?;

    let count = export(entries, format, BufWriter::new(temp.as_file()))?;

    temp.as_file().sync_all()?;
    temp.as_file().unlock()?;
    temp.persist(path).map_err(|e| Error::Io(e.error))?;

    tracing::info!("Exported {} entries to {:?} as {}", count, path, format);
    Ok(count)
}

/// Read and validate a table from `path`
pub fn import_from_path(path: &Path, format: TransferFormat) -> Result<Vec<Entry>> {
    if !path.exists() {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("no file found at {}", path.display()),
        )));
    }

    let file = File::open(path)?;
    file.lock_shared()?;
    let entries = import(BufReader::new(&file), format);
    file.unlock()?;

    let entries = entries?;
    tracing::info!("Read {} entries from {:?}", entries.len(), path);
    Ok(entries)
}

/// Export everything in `store` to `path`
pub fn export_store<S: EntryStore>(store: &S, format: TransferFormat, path: &Path) -> Result<usize> {
    let entries = store.list_all()?;
    export_to_path(&entries, format, path)
}

/// Merge the table at `path` into `store` (last write wins per date)
pub fn import_into_store<S: EntryStore>(
    store: &mut S,
    format: TransferFormat,
    path: &Path,
) -> Result<usize> {
    let entries = import_from_path(path, format)?;
    let written = store.upsert_many(&entries)?;
    tracing::info!("Imported {} entries from {:?}", written, path);
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use crate::types::parse_date;

    fn sample_entries() -> Vec<Entry> {
        let d = |s: &str| parse_date(s).unwrap();
        vec![
            Entry::new(d("2024-01-01"))
                .with_weight(180.2)
                .with_sleep_hours(7.25)
                .with_resting_heart_rate(58)
                .with_notes("long run, \"easy\" pace"),
            Entry::new(d("2024-01-02")),
            Entry::new(d("2024-01-03")).with_weight(179.8),
            Entry::new(d("2024-01-04"))
                .with_sleep_hours(0.0)
                .with_notes("red-eye\nflight"),
        ]
    }

    fn to_string(entries: &[Entry], format: TransferFormat) -> String {
        let mut out = Vec::new();
        export(entries, format, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_csv_layout() {
        let csv = to_string(&sample_entries()[1..3], TransferFormat::Csv);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "date,weight,sleep_hours,resting_heart_rate,notes");
        assert_eq!(lines[1], "2024-01-02,,,,");
        assert_eq!(lines[2], "2024-01-03,179.8,,,");
    }

    #[test]
    fn test_csv_numbers_are_plain_decimals() {
        let d = parse_date("2024-01-01").unwrap();
        let entries = vec![Entry::new(d)
            .with_weight(1e17)
            .with_sleep_hours(1e-7)];

        let csv = to_string(&entries, TransferFormat::Csv);
        let row = csv.lines().nth(1).unwrap();
        assert_eq!(row, "2024-01-01,100000000000000000,0.0000001,,");
        assert_eq!(import(csv.as_bytes(), TransferFormat::Csv).unwrap(), entries);
    }

    #[test]
    fn test_empty_export_still_has_header() {
        let csv = to_string(&[], TransferFormat::Csv);
        assert_eq!(csv.trim_end(), COLUMNS.join(","));
        assert!(import(csv.as_bytes(), TransferFormat::Csv).unwrap().is_empty());
    }

    #[test]
    fn test_roundtrip_through_store() {
        for format in [TransferFormat::Csv, TransferFormat::Json] {
            let mut store = SqliteStore::open_in_memory().unwrap();
            store.upsert_many(&sample_entries()).unwrap();
            let before = store.list_all().unwrap();

            let table = to_string(&before, format);
            let mut restored = SqliteStore::open_in_memory().unwrap();
            let parsed = import(table.as_bytes(), format).unwrap();
            restored.upsert_many(&parsed).unwrap();

            assert_eq!(restored.list_all().unwrap(), before, "format {}", format);
        }
    }

    #[test]
    fn test_malformed_date_names_row() {
        let table = "date,weight,sleep_hours,resting_heart_rate,notes\n\
                     2024-01-01,180,,,\n\
                     2024-13-40,179,,,\n";

        match import(table.as_bytes(), TransferFormat::Csv) {
            Err(Error::Parse { row, message }) => {
                assert_eq!(row, 2);
                assert!(message.contains("2024-13-40"));
            }
            other => panic!("Expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_non_numeric_field_names_row() {
        let table = "date,weight,sleep_hours,resting_heart_rate,notes\n\
                     2024-01-01,abc,,,\n";
        assert!(matches!(
            import(table.as_bytes(), TransferFormat::Csv),
            Err(Error::Parse { row: 1, .. })
        ));

        let json = r#"[{"date": "2024-01-01", "weight": 180.0},
                       {"date": "2024-01-02", "resting_heart_rate": -3}]"#;
        assert!(matches!(
            import(json.as_bytes(), TransferFormat::Json),
            Err(Error::Parse { row: 2, .. })
        ));
    }

    #[test]
    fn test_missing_date_column_rejected() {
        let table = "weight,notes\n180,hi\n";
        assert!(matches!(
            import(table.as_bytes(), TransferFormat::Csv),
            Err(Error::Parse { row: 0, .. })
        ));
    }

    #[test]
    fn test_legacy_backup_columns() {
        let table = "Date,Weight,Notes,WeightTrend,SleepDrtn,RestingHr\n\
                     2023-11-02,185.5,,No trend,6.5,64.0\n\
                     2023-11-03,,sick,No weight provided,,\n";

        let entries = import(table.as_bytes(), TransferFormat::Csv).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].weight, Some(185.5));
        assert_eq!(entries[0].sleep_hours, Some(6.5));
        assert_eq!(entries[0].resting_heart_rate, Some(64));
        assert_eq!(entries[0].notes, None);
        assert_eq!(entries[1].notes.as_deref(), Some("sick"));
    }

    #[test]
    fn test_format_selection() {
        assert_eq!(TransferFormat::from_path(Path::new("a/b.JSON")), TransferFormat::Json);
        assert_eq!(TransferFormat::from_path(Path::new("backup.csv")), TransferFormat::Csv);
        assert_eq!(TransferFormat::from_path(Path::new("noext")), TransferFormat::Csv);
        assert_eq!("Json".parse::<TransferFormat>().unwrap(), TransferFormat::Json);
        assert!("xml".parse::<TransferFormat>().is_err());
    }

    #[test]
    fn test_bad_import_leaves_store_unchanged() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("import.csv");
        std::fs::write(
            &path,
            "date,weight,sleep_hours,resting_heart_rate,notes\n\
             2024-02-01,170,,,\n\
             2024-02-30,169,,,\n",
        )
        .unwrap();

        let mut store = SqliteStore::open_in_memory().unwrap();
        let result = import_into_store(&mut store, TransferFormat::Csv, &path);
        assert!(matches!(result, Err(Error::Parse { row: 2, .. })));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_import_merges_last_write_wins() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("backup.csv");

        let mut store = SqliteStore::open_in_memory().unwrap();
        store.upsert_many(&sample_entries()).unwrap();
        export_store(&store, TransferFormat::Csv, &path).unwrap();

        let d = |s: &str| parse_date(s).unwrap();
        store
            .upsert(&Entry::new(d("2024-01-01")).with_weight(150.0))
            .unwrap();
        store
            .upsert(&Entry::new(d("2024-06-01")).with_weight(151.0))
            .unwrap();

        let written = import_into_store(&mut store, TransferFormat::Csv, &path).unwrap();
        assert_eq!(written, 4);
        // Backup wins for dates it contains, later entries survive
        assert_eq!(store.count().unwrap(), 5);
        assert_eq!(
            store.find_by_date(d("2024-01-01")).unwrap().unwrap().weight,
            Some(180.2)
        );
    }

    #[test]
    fn test_export_to_path_leaves_no_temp_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("export.json");

        export_to_path(&sample_entries(), TransferFormat::Json, &path).unwrap();
        export_to_path(&sample_entries(), TransferFormat::Json, &path).unwrap();

        let names: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("export.json")]);
        assert_eq!(
            import_from_path(&path, TransferFormat::Json).unwrap(),
            sample_entries()
        );
    }

    #[test]
    fn test_import_missing_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let result = import_from_path(&temp_dir.path().join("nope.csv"), TransferFormat::Csv);
        assert!(matches!(result, Err(Error::Io(_))));
    }
}

// 🗄️ Record Store - in-memory roster backed by a ';'-delimited text file
//
// File format: one record per line, surname;name;patronymic;age;city;group
// No header, no quoting, no escaping. A ';' inside a field corrupts the line.

use crate::record::Record;
use crate::validator::{self, ValidationError};
use anyhow::{Context, Result};
use csv::{QuoteStyle, ReaderBuilder, Terminator, WriterBuilder};
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const FIELD_COUNT: usize = 6;
pub const DELIMITER: u8 = b';';

// ============================================================================
// LOAD WARNINGS
// ============================================================================

/// LoadWarning - A line skipped while loading; loading always continues
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadWarning {
    /// Line does not split into exactly six fields
    MalformedLine {
        line: u64,
        fields: usize,
        content: String,
    },
    /// Six fields, but one of them fails validation
    DataError {
        line: u64,
        error: ValidationError,
        content: String,
    },
}

impl LoadWarning {
    pub fn line(&self) -> u64 {
        match self {
            LoadWarning::MalformedLine { line, .. } | LoadWarning::DataError { line, .. } => *line,
        }
    }
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadWarning::MalformedLine { line, fields, content } => write!(
                f,
                "Malformed line {} ({} fields, expected {}): {}",
                line, fields, FIELD_COUNT, content
            ),
            LoadWarning::DataError { line, error, content } => {
                write!(f, "Invalid data on line {}: {}: {}", line, error, content)
            }
        }
    }
}

/// LoadReport - What happened while reading the backing file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    pub warnings: Vec<LoadWarning>,
    /// The backing file does not exist; the roster starts empty
    pub file_absent: bool,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty() && !self.file_absent
    }
}

// ============================================================================
// PARSE / LOAD / SAVE
// ============================================================================

/// Parse the text of a roster file
///
/// Lines that do not have exactly six fields, or whose fields fail
/// validation, are skipped and reported. Trailing empty fields are dropped
/// before counting; a blank line is a one-field malformed line.
pub fn parse_records(text: &str) -> Result<(Vec<Record>, Vec<LoadWarning>)> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(text.as_bytes());

    let mut records = Vec::new();
    let mut warnings = Vec::new();
    // The reader skips empty lines; gaps in its line numbers are blank lines
    let mut next_line = 1;

    for result in rdr.records() {
        let row = result.context("Failed to split roster line")?;
        let line = row.position().map(|p| p.line()).unwrap_or(next_line);
        warnings.extend((next_line..line).map(blank_line));
        next_line = line + 1;
        let content = row.iter().collect::<Vec<_>>().join(";");

        let mut fields: Vec<&str> = row.iter().collect();
        while fields.last().is_some_and(|f| f.is_empty()) {
            fields.pop();
        }

        match <[&str; FIELD_COUNT]>::try_from(fields) {
            Ok(fields) => match validator::validate_fields(&fields) {
                Ok(record) => records.push(record),
                Err(error) => warnings.push(LoadWarning::DataError { line, error, content }),
            },
            Err(fields) => warnings.push(LoadWarning::MalformedLine {
                line,
                fields: fields.len(),
                content,
            }),
        }
    }

    let last_line = text.lines().count() as u64;
    warnings.extend((next_line..=last_line).map(blank_line));

    Ok((records, warnings))
}

fn blank_line(line: u64) -> LoadWarning {
    LoadWarning::MalformedLine {
        line,
        fields: 1,
        content: String::new(),
    }
}

/// Read the backing file into records plus per-line warnings
///
/// A missing file is not an error: the report says so and no records are
/// returned. Unreadable files (permissions, invalid UTF-8) are errors.
pub fn load_store(path: &Path) -> Result<(Vec<Record>, LoadReport)> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(path = %path.display(), "Roster file not found, starting empty");
            return Ok((
                Vec::new(),
                LoadReport {
                    file_absent: true,
                    ..LoadReport::default()
                },
            ));
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read {}", path.display()));
        }
    };

    let (records, warnings) =
        parse_records(&text).with_context(|| format!("Failed to parse {}", path.display()))?;

    for warning in &warnings {
        warn!(path = %path.display(), line = warning.line(), "{}", warning);
    }
    info!(path = %path.display(), records = records.len(), skipped = warnings.len(), "Loaded roster");

    let report = LoadReport {
        loaded: records.len(),
        warnings,
        file_absent: false,
    };
    Ok((records, report))
}

/// Overwrite the backing file with all records, one per line
pub fn save_store(path: &Path, records: &[Record]) -> Result<()> {
    let mut wtr = WriterBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(false)
        .quote_style(QuoteStyle::Never)
        .terminator(Terminator::Any(b'\n'))
        .from_path(path)
        .with_context(|| format!("Failed to open {} for writing", path.display()))?;

    for record in records {
        wtr.write_record(record.to_fields())
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    wtr.flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;

    info!(path = %path.display(), records = records.len(), "Saved roster");
    Ok(())
}

// ============================================================================
// STORE
// ============================================================================

/// Store - Ordered roster of records and the file it persists to
///
/// Mutations only touch memory; callers follow each one with `save()` and
/// report its result.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
    records: Vec<Record>,
}

impl Store {
    /// Empty store bound to a backing file (nothing is read yet)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Store {
            path: path.into(),
            records: Vec::new(),
        }
    }

    /// Create a store and load its backing file
    pub fn open(path: impl Into<PathBuf>) -> Result<(Self, LoadReport)> {
        let mut store = Store::new(path);
        let report = store.reload()?;
        Ok((store, report))
    }

    /// Re-read the backing file
    ///
    /// On error the current in-memory records are kept.
    pub fn reload(&mut self) -> Result<LoadReport> {
        let (records, report) = load_store(&self.path)?;
        self.records = records;
        Ok(report)
    }

    pub fn save(&self) -> Result<()> {
        save_store(&self.path, &self.records)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn get(&self, position: usize) -> Option<&Record> {
        self.records.get(position)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append a record, returning its position
    pub fn add(&mut self, record: Record) -> usize {
        debug!(record = %record, "Adding record");
        self.records.push(record);
        self.records.len() - 1
    }

    /// Remove the record at `position`
    pub fn remove(&mut self, position: usize) -> Option<Record> {
        if position >= self.records.len() {
            return None;
        }
        let removed = self.records.remove(position);
        debug!(position, record = %removed, "Removed record");
        Some(removed)
    }

    /// Overwrite every field of the record at `position`, returning the old values
    pub fn replace_fields(&mut self, position: usize, values: Record) -> Option<Record> {
        let slot = self.records.get_mut(position)?;
        debug!(position, old = %slot, new = %values, "Replacing record fields");
        Some(std::mem::replace(slot, values))
    }
}

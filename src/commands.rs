// One-shot command-line operations on the roster
//
// Each command opens the store, does one thing, saves if it changed
// anything, and writes its report to `out`.

use crate::record::{Record, RecordForm};
use crate::search::{self, SearchQuery};
use crate::store::{LoadReport, Store};
use crate::validator;
use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::io::Write;
use tracing::info;

/// Record with its 1-based row number, for `--json` output
#[derive(Debug, Serialize)]
struct Row<'a> {
    row: usize,
    #[serde(flatten)]
    record: &'a Record,
}

fn print_rows<'a, W: Write>(
    out: &mut W,
    rows: impl IntoIterator<Item = (usize, &'a Record)>,
    json: bool,
) -> Result<()> {
    if json {
        let rows: Vec<Row> = rows
            .into_iter()
            .map(|(position, record)| Row { row: position + 1, record })
            .collect();
        serde_json::to_writer_pretty(&mut *out, &rows)?;
        writeln!(out)?;
    } else {
        for (position, record) in rows {
            writeln!(out, "{:>4}. {}", position + 1, record)?;
        }
    }
    Ok(())
}

/// Print load problems to `err`; they never stop a command
pub fn report_load<W: Write>(err: &mut W, store: &Store, report: &LoadReport) -> Result<()> {
    if report.file_absent {
        writeln!(err, "File not found: {}", store.path().display())?;
    }
    for warning in &report.warnings {
        writeln!(err, "{}", warning)?;
    }
    Ok(())
}

pub fn list<W: Write>(store: &Store, json: bool, out: &mut W) -> Result<()> {
    print_rows(out, store.records().iter().enumerate(), json)
}

pub fn search<W: Write>(store: &Store, surname: &str, group: &str, json: bool, out: &mut W) -> Result<usize> {
    let query = SearchQuery::new(surname, group)?;
    let positions = search::search_positions(store.records(), &query);

    if !json && positions.is_empty() {
        writeln!(out, "No students found")?;
        return Ok(0);
    }

    let records = store.records();
    print_rows(out, positions.iter().map(|&p| (p, &records[p])), json)?;
    Ok(positions.len())
}

pub fn add<W: Write>(store: &mut Store, form: &RecordForm, out: &mut W) -> Result<()> {
    let record = validator::validate_form(form)?;
    let surname = record.surname.clone();

    let position = store.add(record);
    store.save()?;

    info!(row = position + 1, "Added student");
    writeln!(out, "Added student {}: {}", position + 1, surname)?;
    Ok(())
}

fn position_of(store: &Store, row: usize) -> Result<usize> {
    if row == 0 || row > store.len() {
        bail!("No student at row {} (roster has {})", row, store.len());
    }
    Ok(row - 1)
}

/// Apply `edit` to the form of the record at `row`, validate, replace, save
pub fn edit<W: Write>(
    store: &mut Store,
    row: usize,
    edit: impl FnOnce(&mut RecordForm),
    out: &mut W,
) -> Result<()> {
    let position = position_of(store, row)?;
    let current = store
        .get(position)
        .with_context(|| format!("No student at row {}", row))?;

    let mut form = RecordForm::from_record(current);
    edit(&mut form);
    let record = validator::validate_form(&form)?;
    let surname = record.surname.clone();

    store.replace_fields(position, record);
    store.save()?;

    info!(row, "Updated student");
    writeln!(out, "Updated student {}: {}", row, surname)?;
    Ok(())
}

pub fn remove<W: Write>(store: &mut Store, row: usize, out: &mut W) -> Result<()> {
    let position = position_of(store, row)?;
    let removed = store
        .remove(position)
        .with_context(|| format!("No student at row {}", row))?;
    store.save()?;

    info!(row, "Removed student");
    writeln!(out, "Deleted {}: {}", row, removed.surname)?;
    Ok(())
}

/// Print every load problem; returns true when the file loaded cleanly
pub fn check<W: Write>(store: &Store, report: &LoadReport, out: &mut W) -> Result<bool> {
    report_load(out, store, report)?;
    if report.is_clean() {
        writeln!(out, "{}: {} students, no problems", store.path().display(), report.loaded)?;
    } else {
        writeln!(
            out,
            "{}: {} students loaded, {} lines skipped",
            store.path().display(),
            report.loaded,
            report.warnings.len()
        )?;
    }
    Ok(report.is_clean())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::ValidationError;
    use std::fs;
    use tempfile::TempDir;

    const ROSTER: &str = "Ivanov;Ivan;Ivanovich;20;Minsk;CS-101\nSmith;John;Paul;21;London;EN-1\n";

    fn open(dir: &TempDir, contents: &str) -> (Store, LoadReport) {
        let path = dir.path().join("students.txt");
        fs::write(&path, contents).unwrap();
        Store::open(path).unwrap()
    }

    fn text(out: Vec<u8>) -> String {
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_list_plain() {
        let dir = TempDir::new().unwrap();
        let (store, _) = open(&dir, ROSTER);
        let mut out = Vec::new();

        list(&store, false, &mut out).unwrap();

        assert_eq!(
            text(out),
            "   1. Ivanov Ivan Ivanovich, 20 y.o., Minsk, group CS-101\n   2. Smith John Paul, 21 y.o., London, group EN-1\n"
        );
    }

    #[test]
    fn test_search_json_keeps_rows() {
        let dir = TempDir::new().unwrap();
        let (store, _) = open(&dir, ROSTER);
        let mut out = Vec::new();

        let found = search(&store, "SMI", "", true, &mut out).unwrap();

        assert_eq!(found, 1);
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value[0]["row"], 2);
        assert_eq!(value[0]["surname"], "Smith");
        assert_eq!(value[0]["age"], 21);
    }

    #[test]
    fn test_search_without_terms_fails() {
        let dir = TempDir::new().unwrap();
        let (store, _) = open(&dir, ROSTER);
        assert!(search(&store, "", "", false, &mut Vec::new()).is_err());
    }

    #[test]
    fn test_search_nothing_found() {
        let dir = TempDir::new().unwrap();
        let (store, _) = open(&dir, ROSTER);
        let mut out = Vec::new();
        assert_eq!(search(&store, "xyz", "", false, &mut out).unwrap(), 0);
        assert_eq!(text(out), "No students found\n");
    }

    #[test]
    fn test_add_saves() {
        let dir = TempDir::new().unwrap();
        let (mut store, _) = open(&dir, ROSTER);
        let form = RecordForm {
            surname: " Петров ".to_string(),
            name: "Пётр".to_string(),
            patronymic: "Петрович".to_string(),
            age: "18".to_string(),
            city: "Гродно".to_string(),
            group: "ФИ-1".to_string(),
        };

        add(&mut store, &form, &mut Vec::new()).unwrap();

        let saved = fs::read_to_string(store.path()).unwrap();
        assert!(saved.ends_with("Петров;Пётр;Петрович;18;Гродно;ФИ-1\n"));
    }

    #[test]
    fn test_add_invalid_leaves_file_alone() {
        let dir = TempDir::new().unwrap();
        let (mut store, _) = open(&dir, ROSTER);
        let form = RecordForm {
            surname: "Petrov".to_string(),
            age: "121".to_string(),
            ..RecordForm::default()
        };

        let err = add(&mut store, &form, &mut Vec::new()).unwrap_err();

        assert!(err.downcast_ref::<ValidationError>().is_some());
        assert_eq!(store.len(), 2);
        assert_eq!(fs::read_to_string(store.path()).unwrap(), ROSTER);
    }

    #[test]
    fn test_add_rejects_line_break_inside_field() {
        let dir = TempDir::new().unwrap();
        let (mut store, _) = open(&dir, ROSTER);
        let form = RecordForm {
            surname: "Petrov".to_string(),
            name: "Pe\ntr".to_string(),
            patronymic: "Petrovich".to_string(),
            age: "20".to_string(),
            city: "Minsk".to_string(),
            group: "CS-101".to_string(),
        };

        assert!(add(&mut store, &form, &mut Vec::new()).is_err());

        let (reopened, report) = Store::open(store.path()).unwrap();
        assert!(report.is_clean());
        assert_eq!(reopened.len(), 2);
    }

    #[test]
    fn test_edit_changes_only_given_fields() {
        let dir = TempDir::new().unwrap();
        let (mut store, _) = open(&dir, ROSTER);

        edit(&mut store, 2, |form| form.city = "Leeds".to_string(), &mut Vec::new()).unwrap();

        let (reopened, _) = Store::open(store.path()).unwrap();
        assert_eq!(
            reopened.records()[1],
            Record::new("Smith", "John", "Paul", 21, "Leeds", "EN-1")
        );
    }

    #[test]
    fn test_bad_rows() {
        let dir = TempDir::new().unwrap();
        let (mut store, _) = open(&dir, ROSTER);
        assert!(remove(&mut store, 0, &mut Vec::new()).is_err());
        assert!(remove(&mut store, 3, &mut Vec::new()).is_err());
        assert!(edit(&mut store, 3, |_| {}, &mut Vec::new()).is_err());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_remove_saves() {
        let dir = TempDir::new().unwrap();
        let (mut store, _) = open(&dir, ROSTER);
        let mut out = Vec::new();

        remove(&mut store, 1, &mut out).unwrap();

        assert_eq!(text(out), "Deleted 1: Ivanov\n");
        assert_eq!(
            fs::read_to_string(store.path()).unwrap(),
            "Smith;John;Paul;21;London;EN-1\n"
        );
    }

    #[test]
    fn test_check_reports_skipped_lines() {
        let dir = TempDir::new().unwrap();
        let (store, report) = open(&dir, "Ivanov;Ivan;Ivanovich;20;Minsk;CS-101\nbroken line\n");
        let mut out = Vec::new();

        assert!(!check(&store, &report, &mut out).unwrap());

        let out = text(out);
        assert!(out.contains("Malformed line 2 (1 fields, expected 6): broken line"));
        assert!(out.contains("1 students loaded, 1 lines skipped"));
    }

    #[test]
    fn test_check_clean() {
        let dir = TempDir::new().unwrap();
        let (store, report) = open(&dir, ROSTER);
        assert!(check(&store, &report, &mut Vec::new()).unwrap());
    }
}

// ⚙️ Command-line configuration

use crate::logging::LogTarget;
use crate::record::{Field, RecordForm};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub const DEFAULT_FILE: &str = "students.txt";
pub const DEFAULT_LOG_FILE: &str = "student-roster.log";

static DEFAULT_COMMAND: Command = Command::Tui;

#[derive(Debug, Parser)]
#[command(
    name = "student-roster",
    version,
    about = "Maintain a roster of student records stored in a ';'-delimited text file"
)]
pub struct Cli {
    /// Roster file, one `surname;name;patronymic;age;city;group` per line
    #[arg(short, long, global = true, default_value = DEFAULT_FILE)]
    pub file: PathBuf,

    /// Write logs here (the interactive UI defaults to student-roster.log,
    /// other commands log to stderr)
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Subcommand to run; the interactive UI when none is given
    pub fn mode(&self) -> &Command {
        self.command.as_ref().unwrap_or(&DEFAULT_COMMAND)
    }

    pub fn log_target(&self) -> LogTarget {
        match (&self.log_file, self.mode()) {
            (Some(path), _) => LogTarget::File(path.clone()),
            (None, Command::Tui) => LogTarget::File(PathBuf::from(DEFAULT_LOG_FILE)),
            (None, _) => LogTarget::Stderr,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Interactive terminal UI (default)
    Tui,
    /// Print every student with its row number
    List {
        #[arg(long)]
        json: bool,
    },
    /// Print students whose surname and/or group contain the given text
    Search {
        #[arg(short, long, default_value = "")]
        surname: String,
        #[arg(short, long, default_value = "")]
        group: String,
        #[arg(long)]
        json: bool,
    },
    /// Add a student
    Add(RecordArgs),
    /// Change fields of the student at ROW (1-based)
    Edit {
        row: usize,
        #[command(flatten)]
        changes: FieldChanges,
    },
    /// Delete the student at ROW (1-based)
    Remove { row: usize },
    /// Load the roster file and report every skipped line
    Check,
}

/// All six fields of a new student
#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct RecordArgs {
    #[arg(long)]
    pub surname: String,
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub patronymic: String,
    #[arg(long, allow_hyphen_values = true)]
    pub age: String,
    #[arg(long)]
    pub city: String,
    #[arg(long)]
    pub group: String,
}

impl RecordArgs {
    pub fn to_form(&self) -> RecordForm {
        RecordForm {
            surname: self.surname.clone(),
            name: self.name.clone(),
            patronymic: self.patronymic.clone(),
            age: self.age.clone(),
            city: self.city.clone(),
            group: self.group.clone(),
        }
    }
}

/// Fields to overwrite; unset ones keep their current value
#[derive(Debug, Clone, Default, PartialEq, Eq, Args)]
pub struct FieldChanges {
    #[arg(long)]
    pub surname: Option<String>,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub patronymic: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    pub age: Option<String>,
    #[arg(long)]
    pub city: Option<String>,
    #[arg(long)]
    pub group: Option<String>,
}

impl FieldChanges {
    fn value(&self, field: Field) -> Option<&String> {
        match field {
            Field::Surname => self.surname.as_ref(),
            Field::Name => self.name.as_ref(),
            Field::Patronymic => self.patronymic.as_ref(),
            Field::Age => self.age.as_ref(),
            Field::City => self.city.as_ref(),
            Field::Group => self.group.as_ref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        Field::FILE_ORDER.iter().all(|f| self.value(*f).is_none())
    }

    pub fn apply(&self, form: &mut RecordForm) {
        for field in Field::FILE_ORDER {
            if let Some(value) = self.value(field) {
                *form.get_mut(field) = value.clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_tui() {
        let cli = Cli::try_parse_from(["student-roster"]).unwrap();
        assert_eq!(cli.file, PathBuf::from(DEFAULT_FILE));
        assert_eq!(cli.mode(), &Command::Tui);
        assert_eq!(cli.log_target(), LogTarget::File(PathBuf::from(DEFAULT_LOG_FILE)));
    }

    #[test]
    fn test_subcommands_log_to_stderr() {
        let cli = Cli::try_parse_from(["student-roster", "list", "--json"]).unwrap();
        assert_eq!(cli.mode(), &Command::List { json: true });
        assert_eq!(cli.log_target(), LogTarget::Stderr);
    }

    #[test]
    fn test_global_file_after_subcommand() {
        let cli = Cli::try_parse_from([
            "student-roster",
            "search",
            "--surname",
            "iva",
            "--file",
            "group.txt",
            "--log-file",
            "roster.log",
        ])
        .unwrap();
        assert_eq!(cli.file, PathBuf::from("group.txt"));
        assert_eq!(cli.log_target(), LogTarget::File(PathBuf::from("roster.log")));
        assert_eq!(
            cli.mode(),
            &Command::Search {
                surname: "iva".to_string(),
                group: String::new(),
                json: false,
            }
        );
    }

    #[test]
    fn test_add_requires_every_field() {
        assert!(Cli::try_parse_from(["student-roster", "add", "--surname", "Ivanov"]).is_err());

        let cli = Cli::try_parse_from([
            "student-roster", "add", "--surname", "Ivanov", "--name", "Ivan", "--patronymic",
            "Ivanovich", "--age", "20", "--city", "Minsk", "--group", "CS-101",
        ])
        .unwrap();
        match cli.mode() {
            Command::Add(args) => assert_eq!(args.to_form().age, "20"),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_field_changes_apply() {
        let cli = Cli::try_parse_from(["student-roster", "edit", "2", "--city", "Brest", "--age", "-1"]).unwrap();
        let Command::Edit { row, changes } = cli.mode().clone() else {
            panic!("expected edit");
        };
        assert_eq!(row, 2);
        assert!(!changes.is_empty());

        let mut form = RecordForm {
            city: "Minsk".to_string(),
            surname: "Ivanov".to_string(),
            ..RecordForm::default()
        };
        changes.apply(&mut form);
        assert_eq!(form.city, "Brest");
        assert_eq!(form.age, "-1");
        assert_eq!(form.surname, "Ivanov");
        assert!(FieldChanges::default().is_empty());
    }
}

// Student Roster - Core Library
// Record store, validation and search, plus the CLI and terminal front ends

pub mod record;
pub mod validator;
pub mod store;
pub mod search;
pub mod config;
pub mod logging;
pub mod commands;

// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
pub mod ui;

// Re-export commonly used types
pub use record::{Field, Record, RecordForm};
pub use validator::{
    validate, validate_field, validate_form, validate_form_all, FieldKind, Problem,
    ValidationError,
};
pub use store::{load_store, parse_records, save_store, LoadReport, LoadWarning, Store};
pub use search::{search, search_positions, SearchError, SearchQuery};


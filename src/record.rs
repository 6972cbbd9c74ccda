// Student record - one row of the roster
// Plain value type; validation lives in validator.rs

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// FIELDS
// ============================================================================

/// Field - Identifies one column of a student record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    Surname,
    Name,
    Patronymic,
    Age,
    City,
    Group,
}

impl Field {
    /// Columns in file order: surname;name;patronymic;age;city;group
    pub const FILE_ORDER: [Field; 6] = [
        Field::Surname,
        Field::Name,
        Field::Patronymic,
        Field::Age,
        Field::City,
        Field::Group,
    ];

    /// Order in which a whole record is checked (first failure wins)
    pub const CHECK_ORDER: [Field; 6] = [
        Field::Name,
        Field::Surname,
        Field::Patronymic,
        Field::Age,
        Field::City,
        Field::Group,
    ];

    /// Human-readable name for display
    pub fn label(&self) -> &'static str {
        match self {
            Field::Surname => "Surname",
            Field::Name => "Name",
            Field::Patronymic => "Patronymic",
            Field::Age => "Age",
            Field::City => "City",
            Field::Group => "Group",
        }
    }

    /// Column index in the backing file
    pub fn file_index(&self) -> usize {
        match self {
            Field::Surname => 0,
            Field::Name => 1,
            Field::Patronymic => 2,
            Field::Age => 3,
            Field::City => 4,
            Field::Group => 5,
        }
    }

    /// Longest input accepted by the edit form, in characters
    pub fn max_len(&self) -> usize {
        match self {
            Field::Surname | Field::Name | Field::Patronymic | Field::City => 50,
            Field::Group => 20,
            Field::Age => 3,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// RECORD
// ============================================================================

/// Record - One student entry
///
/// No identity field: a record is identified by its position in the store,
/// so two records with equal values are still distinct entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub surname: String,
    pub name: String,
    pub patronymic: String,
    pub age: u32,
    pub city: String,
    pub group: String,
}

impl Record {
    pub fn new(
        surname: impl Into<String>,
        name: impl Into<String>,
        patronymic: impl Into<String>,
        age: u32,
        city: impl Into<String>,
        group: impl Into<String>,
    ) -> Self {
        Record {
            surname: surname.into(),
            name: name.into(),
            patronymic: patronymic.into(),
            age,
            city: city.into(),
            group: group.into(),
        }
    }

    /// Field value rendered as text (age as a decimal literal)
    pub fn get(&self, field: Field) -> String {
        match field {
            Field::Surname => self.surname.clone(),
            Field::Name => self.name.clone(),
            Field::Patronymic => self.patronymic.clone(),
            Field::Age => self.age.to_string(),
            Field::City => self.city.clone(),
            Field::Group => self.group.clone(),
        }
    }

    /// Fields in file order, as written to the backing file
    pub fn to_fields(&self) -> [String; 6] {
        Field::FILE_ORDER.map(|field| self.get(field))
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}, {} y.o., {}, group {}",
            self.surname, self.name, self.patronymic, self.age, self.city, self.group
        )
    }
}

// ============================================================================
// RECORD FORM
// ============================================================================

/// RecordForm - Raw text of the six inputs of the edit form
///
/// Values stay as typed until `validator::validate_form` turns them into
/// a `Record`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordForm {
    pub surname: String,
    pub name: String,
    pub patronymic: String,
    pub age: String,
    pub city: String,
    pub group: String,
}

impl RecordForm {
    /// Pre-fill the form from an existing record
    ///
    /// A fresh record (age 0) leaves the age input empty.
    pub fn from_record(record: &Record) -> Self {
        RecordForm {
            surname: record.surname.clone(),
            name: record.name.clone(),
            patronymic: record.patronymic.clone(),
            age: if record.age == 0 {
                String::new()
            } else {
                record.age.to_string()
            },
            city: record.city.clone(),
            group: record.group.clone(),
        }
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Surname => &self.surname,
            Field::Name => &self.name,
            Field::Patronymic => &self.patronymic,
            Field::Age => &self.age,
            Field::City => &self.city,
            Field::Group => &self.group,
        }
    }

    pub fn get_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Surname => &mut self.surname,
            Field::Name => &mut self.name,
            Field::Patronymic => &mut self.patronymic,
            Field::Age => &mut self.age,
            Field::City => &mut self.city,
            Field::Group => &mut self.group,
        }
    }
}

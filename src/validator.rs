// 📐 Field Validation
// Character-class and range rules for student record fields
//
// Letters are an explicit Cyrillic + Latin allow-list, not a generic
// "is alphabetic" check, so other scripts are rejected.

use crate::record::{Field, Record, RecordForm};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

pub const MIN_AGE: i32 = 1;
pub const MAX_AGE: i32 = 120;

// Whitespace is space, \t, \x0B, \f; line breaks would split a saved record
const NAME_LIKE: &str = r"\A[а-яА-ЯёЁa-zA-Z \t\x0B\f-]+\z";
const NAME_LIKE_PARTIAL: &str = r"\A[а-яА-ЯёЁa-zA-Z \t\x0B\f-]*\z";
const GROUP_LIKE: &str = r"\A[а-яА-ЯёЁa-zA-Z0-9-]+\z";
const GROUP_LIKE_PARTIAL: &str = r"\A[а-яА-ЯёЁa-zA-Z0-9-]*\z";
const AGE_DIGITS: &str = r"\A[0-9]+\z";
const AGE_PARTIAL: &str = r"\A[0-9]*\z";

// ============================================================================
// FIELD KINDS
// ============================================================================

/// FieldKind - Which rule a field is checked against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Letters, whitespace, hyphen (surname, name, patronymic, city)
    NameLike,
    /// Letters, digits, hyphen (group)
    GroupLike,
    /// Integer in [1, 120]
    Age,
}

impl FieldKind {
    pub fn of(field: Field) -> Self {
        match field {
            Field::Surname | Field::Name | Field::Patronymic | Field::City => FieldKind::NameLike,
            Field::Group => FieldKind::GroupLike,
            Field::Age => FieldKind::Age,
        }
    }

    /// Hint shown while the user is typing an invalid value
    pub fn hint(&self) -> &'static str {
        match self {
            FieldKind::NameLike => "may contain only letters, spaces and hyphens",
            FieldKind::GroupLike => "may contain only letters, digits and hyphens",
            FieldKind::Age => "must be a number from 1 to 120",
        }
    }
}

// Patterns are constants covered by the tests below, so compiling cannot fail at runtime
fn compiled(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("character class pattern is valid"))
}

fn full_pattern(kind: FieldKind) -> &'static Regex {
    static NAME: OnceLock<Regex> = OnceLock::new();
    static GROUP: OnceLock<Regex> = OnceLock::new();
    static AGE: OnceLock<Regex> = OnceLock::new();
    match kind {
        FieldKind::NameLike => compiled(&NAME, NAME_LIKE),
        FieldKind::GroupLike => compiled(&GROUP, GROUP_LIKE),
        FieldKind::Age => compiled(&AGE, AGE_DIGITS),
    }
}

fn partial_pattern(kind: FieldKind) -> &'static Regex {
    static NAME: OnceLock<Regex> = OnceLock::new();
    static GROUP: OnceLock<Regex> = OnceLock::new();
    static AGE: OnceLock<Regex> = OnceLock::new();
    match kind {
        FieldKind::NameLike => compiled(&NAME, NAME_LIKE_PARTIAL),
        FieldKind::GroupLike => compiled(&GROUP, GROUP_LIKE_PARTIAL),
        FieldKind::Age => compiled(&AGE, AGE_PARTIAL),
    }
}

/// True if every character of a non-empty `value` is in the kind's class
pub fn matches_class(kind: FieldKind, value: &str) -> bool {
    full_pattern(kind).is_match(value)
}

/// Live-typing check: empty input is fine, otherwise only allowed characters
pub fn is_partial_match(kind: FieldKind, value: &str) -> bool {
    partial_pattern(kind).is_match(value)
}

// ============================================================================
// VALIDATION ERRORS
// ============================================================================

/// Problem - Why a single value was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Problem {
    Empty,
    InvalidCharacters,
    NotANumber,
    OutOfRange,
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Problem::Empty => f.write_str("must not be empty"),
            Problem::InvalidCharacters => f.write_str("contains invalid characters"),
            Problem::NotANumber => f.write_str("must be a number"),
            Problem::OutOfRange => write!(f, "must be between {} and {}", MIN_AGE, MAX_AGE),
        }
    }
}

impl std::error::Error for Problem {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: Field,
    pub problem: Problem,
}

impl ValidationError {
    pub fn new(field: Field, problem: Problem) -> Self {
        ValidationError { field, problem }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.problem)
    }
}

impl std::error::Error for ValidationError {}

// ============================================================================
// SINGLE VALUES
// ============================================================================

/// Parse an age literal and check the [1, 120] range
///
/// Accepts what a 32-bit signed integer parse accepts (an optional sign,
/// no surrounding whitespace); negative values are out of range.
pub fn parse_age(value: &str) -> Result<u32, Problem> {
    let age: i32 = value.parse().map_err(|_| Problem::NotANumber)?;
    if !(MIN_AGE..=MAX_AGE).contains(&age) {
        return Err(Problem::OutOfRange);
    }
    Ok(age as u32)
}

/// Check one value against a rule
pub fn validate_field(kind: FieldKind, value: &str) -> Result<(), Problem> {
    match kind {
        FieldKind::Age => parse_age(value).map(|_| ()),
        FieldKind::NameLike | FieldKind::GroupLike => {
            if value.trim().is_empty() {
                Err(Problem::Empty)
            } else if !matches_class(kind, value) {
                Err(Problem::InvalidCharacters)
            } else {
                Ok(())
            }
        }
    }
}

/// Check one value of a named field
pub fn validate(field: Field, value: &str) -> Result<(), ValidationError> {
    validate_field(FieldKind::of(field), value).map_err(|problem| ValidationError::new(field, problem))
}

// ============================================================================
// WHOLE RECORDS
// ============================================================================

fn build_record<'a>(get: impl Fn(Field) -> &'a str) -> Result<Record, ValidationError> {
    for field in Field::CHECK_ORDER {
        validate(field, get(field))?;
    }

    let age = parse_age(get(Field::Age)).map_err(|problem| ValidationError::new(Field::Age, problem))?;

    Ok(Record {
        surname: get(Field::Surname).to_string(),
        name: get(Field::Name).to_string(),
        patronymic: get(Field::Patronymic).to_string(),
        age,
        city: get(Field::City).to_string(),
        group: get(Field::Group).to_string(),
    })
}

/// Validate six raw fields in file order, as read from one line
///
/// Values are checked untrimmed; the first failing field is reported.
pub fn validate_fields(fields: &[&str; 6]) -> Result<Record, ValidationError> {
    build_record(|field| fields[field.file_index()])
}

/// Validate the edit form (values trimmed); the first failing field is reported
pub fn validate_form(form: &RecordForm) -> Result<Record, ValidationError> {
    build_record(|field| form.get(field).trim())
}

/// Validate the edit form and report every failing field
pub fn validate_form_all(form: &RecordForm) -> Result<Record, Vec<ValidationError>> {
    let errors: Vec<ValidationError> = Field::CHECK_ORDER
        .iter()
        .filter_map(|field| validate(*field, form.get(*field).trim()).err())
        .collect();

    if !errors.is_empty() {
        return Err(errors);
    }

    validate_form(form).map_err(|e| vec![e])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(values: [&str; 6]) -> RecordForm {
        RecordForm {
            surname: values[0].to_string(),
            name: values[1].to_string(),
            patronymic: values[2].to_string(),
            age: values[3].to_string(),
            city: values[4].to_string(),
            group: values[5].to_string(),
        }
    }

    #[test]
    fn test_name_like_accepts_latin_and_cyrillic() {
        for value in ["Ivanov", "Иванов", "Ёжиков", "Anna-Maria", "Rostov na Donu", "Щёкино"] {
            assert_eq!(validate_field(FieldKind::NameLike, value), Ok(()), "{}", value);
        }
    }

    #[test]
    fn test_name_like_rejects_digits_and_symbols() {
        for value in ["Ivan0v", "Smith!", "O'Brien", "a;b", "Ivan_", "Müller", "Ελένη"] {
            assert_eq!(
                validate_field(FieldKind::NameLike, value),
                Err(Problem::InvalidCharacters),
                "{}",
                value
            );
        }
    }

    #[test]
    fn test_name_like_rejects_line_breaks() {
        for value in ["Iv\nan", "Iv\ran", "Ivan\r\nPetrov"] {
            assert_eq!(
                validate_field(FieldKind::NameLike, value),
                Err(Problem::InvalidCharacters),
                "{:?}",
                value
            );
        }
        assert_eq!(validate_field(FieldKind::NameLike, "Rostov\tna Donu"), Ok(()));

        let err = validate_form(&form(["Ivanov", "Iv\nan", "Ivanovich", "20", "Minsk", "CS-101"])).unwrap_err();
        assert_eq!(err, ValidationError::new(Field::Name, Problem::InvalidCharacters));
    }

    #[test]
    fn test_name_like_rejects_blank() {
        assert_eq!(validate_field(FieldKind::NameLike, ""), Err(Problem::Empty));
        assert_eq!(validate_field(FieldKind::NameLike, "   "), Err(Problem::Empty));
    }

    #[test]
    fn test_group_like() {
        assert_eq!(validate_field(FieldKind::GroupLike, "CS-101"), Ok(()));
        assert_eq!(validate_field(FieldKind::GroupLike, "ИВТ-21"), Ok(()));
        assert_eq!(validate_field(FieldKind::GroupLike, ""), Err(Problem::Empty));
        assert_eq!(
            validate_field(FieldKind::GroupLike, "CS 101"),
            Err(Problem::InvalidCharacters)
        );
        assert_eq!(
            validate_field(FieldKind::GroupLike, "CS/101"),
            Err(Problem::InvalidCharacters)
        );
    }

    #[test]
    fn test_age_boundaries() {
        assert_eq!(parse_age("1"), Ok(1));
        assert_eq!(parse_age("120"), Ok(120));
        assert_eq!(parse_age("0"), Err(Problem::OutOfRange));
        assert_eq!(parse_age("121"), Err(Problem::OutOfRange));
        assert_eq!(parse_age("-5"), Err(Problem::OutOfRange));
        assert_eq!(parse_age("+20"), Ok(20));
    }

    #[test]
    fn test_age_not_a_number() {
        for value in ["", "twenty", "20.5", " 20", "99999999999"] {
            assert_eq!(parse_age(value), Err(Problem::NotANumber), "{:?}", value);
        }
    }

    #[test]
    fn test_partial_match() {
        assert!(is_partial_match(FieldKind::NameLike, ""));
        assert!(is_partial_match(FieldKind::NameLike, "Iva"));
        assert!(!is_partial_match(FieldKind::NameLike, "Iva1"));
        assert!(is_partial_match(FieldKind::GroupLike, "CS-1"));
        assert!(!is_partial_match(FieldKind::GroupLike, "CS 1"));
        assert!(is_partial_match(FieldKind::Age, "12"));
        assert!(!is_partial_match(FieldKind::Age, "1a"));
    }

    #[test]
    fn test_validate_fields_from_file_line() {
        let record = validate_fields(&["Ivanov", "Ivan", "Ivanovich", "20", "Minsk", "CS-101"]).unwrap();
        assert_eq!(record, Record::new("Ivanov", "Ivan", "Ivanovich", 20, "Minsk", "CS-101"));
    }

    #[test]
    fn test_validate_fields_first_failure_wins() {
        // Both name and group are bad; name is checked first
        let err = validate_fields(&["Ivanov", "Iv4n", "Ivanovich", "20", "Minsk", "CS 101"]).unwrap_err();
        assert_eq!(err, ValidationError::new(Field::Name, Problem::InvalidCharacters));
        assert_eq!(err.to_string(), "Name contains invalid characters");
    }

    #[test]
    fn test_validate_form_trims_values() {
        let record = validate_form(&form(["  Петров ", "Пётр", "Петрович", " 19 ", "Москва", "ИВТ-21 "])).unwrap();
        assert_eq!(record, Record::new("Петров", "Пётр", "Петрович", 19, "Москва", "ИВТ-21"));
    }

    #[test]
    fn test_validate_form_age_message() {
        let err = validate_form(&form(["Ivanov", "Ivan", "Ivanovich", "0", "Minsk", "CS-101"])).unwrap_err();
        assert_eq!(err.to_string(), "Age must be between 1 and 120");
    }

    #[test]
    fn test_validate_form_all_reports_every_field() {
        let errors = validate_form_all(&form(["", "Ivan", "Iv4novich", "abc", "Minsk", "CS 101"])).unwrap_err();
        let fields: Vec<Field> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec![Field::Surname, Field::Patronymic, Field::Age, Field::Group]);
    }

    #[test]
    fn test_every_field_of_valid_record_validates() {
        let record = Record::new("Сидорова", "Анна", "Сергеевна", 22, "Нижний Новгород", "ПМ-3");
        for field in Field::FILE_ORDER {
            assert_eq!(validate(field, &record.get(field)), Ok(()), "{}", field);
        }
    }

    #[test]
    fn test_every_pattern_compiles() {
        for pattern in [NAME_LIKE, NAME_LIKE_PARTIAL, GROUP_LIKE, GROUP_LIKE_PARTIAL, AGE_DIGITS, AGE_PARTIAL] {
            assert!(Regex::new(pattern).is_ok(), "{}", pattern);
        }
    }
}

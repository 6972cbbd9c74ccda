// 🔍 Search - case-insensitive substring filter over the roster
// Produces a derived view; the store is never modified.

use crate::record::{Field, Record};
use crate::validator::{self, FieldKind};
use std::fmt;

/// SearchError - Query rejected before any record is looked at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// Neither a surname nor a group was given
    EmptyQuery,
    /// Query contains characters the field can never hold
    InvalidCharacters { field: Field, kind: FieldKind },
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchError::EmptyQuery => f.write_str("Enter a surname or a group to search for"),
            SearchError::InvalidCharacters { field, kind } => write!(f, "{} {}", field, kind.hint()),
        }
    }
}

impl std::error::Error for SearchError {}

/// SearchQuery - A checked search request
///
/// Only constructible through `new`, so at least one term is non-empty and
/// both terms use their field's character class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    surname: String,
    group: String,
}

impl SearchQuery {
    /// Trim and check both terms; an empty term places no constraint
    pub fn new(surname: &str, group: &str) -> Result<Self, SearchError> {
        let surname = surname.trim();
        let group = group.trim();

        if surname.is_empty() && group.is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        if !surname.is_empty() && !validator::matches_class(FieldKind::NameLike, surname) {
            return Err(SearchError::InvalidCharacters {
                field: Field::Surname,
                kind: FieldKind::NameLike,
            });
        }
        if !group.is_empty() && !validator::matches_class(FieldKind::GroupLike, group) {
            return Err(SearchError::InvalidCharacters {
                field: Field::Group,
                kind: FieldKind::GroupLike,
            });
        }

        Ok(SearchQuery {
            surname: surname.to_lowercase(),
            group: group.to_lowercase(),
        })
    }

    /// Lower-cased surname term ("" = any)
    pub fn surname(&self) -> &str {
        &self.surname
    }

    /// Lower-cased group term ("" = any)
    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn matches(&self, record: &Record) -> bool {
        (self.surname.is_empty() || record.surname.to_lowercase().contains(&self.surname))
            && (self.group.is_empty() || record.group.to_lowercase().contains(&self.group))
    }
}

/// Records matching `query`, in their original order
pub fn search<'a>(records: &'a [Record], query: &SearchQuery) -> Vec<&'a Record> {
    records.iter().filter(|r| query.matches(r)).collect()
}

/// Positions of the records matching `query`, ascending
pub fn search_positions(records: &[Record], query: &SearchQuery) -> Vec<usize> {
    records
        .iter()
        .enumerate()
        .filter(|(_, r)| query.matches(r))
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Vec<Record> {
        vec![
            Record::new("Smith", "John", "Paul", 20, "London", "EN-1"),
            Record::new("Ivanov", "Ivan", "Ivanovich", 20, "Minsk", "CS-101"),
            Record::new("Goldsmith", "Anna", "Maria", 22, "Leeds", "cs-102"),
            Record::new("Смирнов", "Олег", "Петрович", 19, "Тверь", "ИВТ-21"),
            Record::new("Asmus", "Karl", "Otto", 30, "Kiel", "CS-101"),
        ]
    }

    #[test]
    fn test_both_terms_empty_is_rejected() {
        assert_eq!(SearchQuery::new("", ""), Err(SearchError::EmptyQuery));
        assert_eq!(SearchQuery::new("  ", "\t"), Err(SearchError::EmptyQuery));
    }

    #[test]
    fn test_invalid_terms_are_rejected() {
        assert!(matches!(
            SearchQuery::new("sm1th", ""),
            Err(SearchError::InvalidCharacters { field: Field::Surname, .. })
        ));
        assert!(matches!(
            SearchQuery::new("", "CS 101"),
            Err(SearchError::InvalidCharacters { field: Field::Group, .. })
        ));
    }

    #[test]
    fn test_surname_substring_preserves_order() {
        let records = roster();
        let query = SearchQuery::new("sm", "").unwrap();

        let found: Vec<&str> = search(&records, &query)
            .into_iter()
            .map(|r| r.surname.as_str())
            .collect();

        assert_eq!(found, vec!["Smith", "Goldsmith", "Asmus"]);
        assert_eq!(search_positions(&records, &query), vec![0, 2, 4]);
    }

    #[test]
    fn test_group_is_case_insensitive() {
        let records = roster();
        let query = SearchQuery::new("", "CS-10").unwrap();
        assert_eq!(search_positions(&records, &query), vec![1, 2, 4]);
    }

    #[test]
    fn test_both_terms_must_match() {
        let records = roster();
        let query = SearchQuery::new("SMITH", "cs").unwrap();
        assert_eq!(search_positions(&records, &query), vec![2]);
    }

    #[test]
    fn test_cyrillic_case_insensitive() {
        let records = roster();
        let query = SearchQuery::new("СМИР", "ивт").unwrap();
        assert_eq!(search_positions(&records, &query), vec![3]);
    }

    #[test]
    fn test_example_record() {
        let records = vec![Record::new("Ivanov", "Ivan", "Ivanovich", 20, "Minsk", "CS-101")];

        let hit = SearchQuery::new("iva", "").unwrap();
        assert_eq!(search(&records, &hit), vec![&records[0]]);

        let miss = SearchQuery::new("xyz", "").unwrap();
        assert!(search(&records, &miss).is_empty());
    }

    #[test]
    fn test_search_does_not_touch_input() {
        let records = roster();
        let before = records.clone();
        let _ = search(&records, &SearchQuery::new("a", "").unwrap());
        assert_eq!(records, before);
    }
}

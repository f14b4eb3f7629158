//! # tabmap - Row to Record Mapping
//!
//! Converts tabular result rows (column name to raw cell, with a null
//! sentinel) into typed records, driven by per-field metadata instead of
//! hand-written converters.
//!
//! ## Modules
//!
//! - **shape**: declare target record types and their field metadata
//! - **map**: resolve mapping plans and apply them to rows and tables
//! - **json**: read values out of JSON blobs stored in a column
//!
//! ## Quick Start
//!
//! ```rust
//! use tabmap::{map_table, FieldDef, FieldType, FromRecord, Record, Row, RowSet, Shape};
//!
//! struct Person {
//!     name: Option<String>,
//!     city: Option<String>,
//! }
//!
//! impl FromRecord for Person {
//!     fn shape() -> tabmap::Result<Shape> {
//!         Shape::builder("Person")
//!             .field(FieldDef::new("Name", FieldType::Text))
//!             .field(FieldDef::new("City", FieldType::Text).from_json("Address"))
//!             .build()
//!     }
//!
//!     fn from_record(mut record: Record) -> tabmap::Result<Self> {
//!         Ok(Person {
//!             name: record.take("Name")?,
//!             city: record.take("City")?,
//!         })
//!     }
//! }
//!
//! # fn main() -> tabmap::Result<()> {
//! let rows = RowSet::from(vec![
//!     Row::new().with("Name", "Alice").with("Address", r#"{"City":"Oslo"}"#),
//! ]);
//!
//! let people: Vec<Person> = map_table(&rows)?;
//! assert_eq!(people[0].city.as_deref(), Some("Oslo"));
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod json;
pub mod map;
pub mod shape;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{MapError, Result};
pub use json::JsonDocument;
pub use map::{map_table, map_table_with, ColumnMapping, MapConfig, MappingPlan, MissingColumn, RowMapper, TableMapper};
pub use shape::{load_shape, EnumTable, FieldDef, FieldType, FromRecord, MappedEnum, Shape};
pub use types::{Cell, FromValue, MappedValue, Record, Row, RowSet};

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    enum Status {
        #[default]
        Unknown,
        Active,
    }

    impl MappedEnum for Status {
        const NAME: &'static str = "Status";

        fn members() -> &'static [(&'static str, i64)] {
            &[("Unknown", 0), ("Active", 1)]
        }

        fn from_stored(value: i64) -> Option<Self> {
            match value {
                0 => Some(Status::Unknown),
                1 => Some(Status::Active),
                _ => None,
            }
        }
    }

    #[derive(Debug, PartialEq)]
    struct Ticket {
        status: Status,
        level: Option<String>,
        note: String,
    }

    impl FromRecord for Ticket {
        fn shape() -> Result<Shape> {
            Shape::builder("Ticket")
                .field(FieldDef::new("Status", FieldType::enum_of::<Status>()))
                .field(FieldDef::new("Level", FieldType::Text).from_json("Meta"))
                .field(FieldDef::new("Note", FieldType::Text).not_mapped())
                .build()
        }

        fn from_record(mut record: Record) -> Result<Self> {
            Ok(Ticket {
                status: record.take_enum_or_default("Status")?,
                level: record.take_or_default("Level")?,
                note: record.take_or_default("Note")?,
            })
        }
    }

    #[derive(Debug, PartialEq)]
    struct Named {
        name: Option<String>,
    }

    impl FromRecord for Named {
        fn shape() -> Result<Shape> {
            Shape::builder("Named")
                .field(FieldDef::new("Name", FieldType::Text))
                .build()
        }

        fn from_record(mut record: Record) -> Result<Self> {
            Ok(Named {
                name: record.take("Name")?,
            })
        }
    }

    #[test]
    fn test_enum_and_embedded_json_scenario() {
        let rows = RowSet::from(vec![Row::new()
            .with("Status", 1)
            .with("Meta", r#"{"Level":"high"}"#)
            .with("Note", "ignored")]);

        let tickets: Vec<Ticket> = map_table(&rows).unwrap();

        assert_eq!(
            tickets,
            vec![Ticket {
                status: Status::Active,
                level: Some("high".to_string()),
                note: String::new(),
            }]
        );
    }

    #[test]
    fn test_null_direct_field_scenario() {
        let rows = RowSet::from(vec![Row::new().with("Name", Cell::Null)]);
        let named: Vec<Named> = map_table(&rows).unwrap();
        assert_eq!(named, vec![Named { name: None }]);
    }

    #[test]
    fn test_empty_row_set_scenario() {
        let named: Vec<Named> = map_table(&RowSet::new()).unwrap();
        assert!(named.is_empty());
    }

    #[test]
    fn test_lowercase_columns_feed_fields() {
        let rows = RowSet::from(vec![Row::new().with("name", "Ann")]);
        let named: Vec<Named> = map_table(&rows).unwrap();
        assert_eq!(named[0].name.as_deref(), Some("Ann"));
    }

    #[test]
    fn test_unknown_enum_member_fails() {
        let rows = RowSet::from(vec![Row::new().with("Status", 5).with("Meta", Cell::Null)]);

        let err = map_table::<Ticket>(&rows).unwrap_err();
        assert!(matches!(err.root(), MapError::Coercion { .. }));
    }

    #[test]
    fn test_mapping_allow_list_on_typed_records() {
        let rows = RowSet::from(vec![Row::new()
            .with("Status", 1)
            .with("Meta", r#"{"Level":"low"}"#)]);
        let mapping = ColumnMapping::new().with("Level", "Meta");

        // Status is present in both shape and row, but not listed
        let tickets = map_table_with::<Ticket>(&rows, &mapping).unwrap();
        assert_eq!(tickets[0].status, Status::Unknown);
        assert_eq!(tickets[0].level.as_deref(), Some("low"));

        let records = TableMapper::default()
            .map_records(&rows, &Ticket::shape().unwrap(), Some(&mapping))
            .unwrap();
        assert!(!records[0].contains("Status"));
        assert_eq!(records[0].get("Level"), Some(&MappedValue::Text("low".to_string())));
    }

    #[test]
    fn test_renamed_typed_mapping() {
        let rows = RowSet::from(vec![Row::new().with("display_name", "Bo").with("Name", "wrong")]);
        let mapping = ColumnMapping::new().with("Name", "display_name");

        let named: Vec<Named> = map_table_with(&rows, &mapping).unwrap();
        assert_eq!(named[0].name.as_deref(), Some("Bo"));
    }
}

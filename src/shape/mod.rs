//! Target shape declarations
//!
//! A shape is the static, ordered field list of a record type together with
//! the per-field metadata that drives mapping: whether the field is mapped at
//! all, whether it is read from an embedded JSON blob, and its declared type.
//! Shapes are built once, either in code through [`ShapeBuilder`] or from a
//! JSON definition through [`loader`].

pub mod loader;

use crate::error::{MapError, Result};
use crate::types::{MappedValue, Record};
use std::collections::HashSet;

pub use loader::{load_shape, ShapeFile};

/// One member of an enum type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumMember {
    pub name: String,
    pub value: i64,
}

/// The member table of an enum-typed field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumTable {
    pub name: String,
    pub members: Vec<EnumMember>,
}

impl EnumTable {
    pub fn new(name: impl Into<String>) -> Self {
        EnumTable {
            name: name.into(),
            members: Vec::new(),
        }
    }

    pub fn member(mut self, name: impl Into<String>, value: i64) -> Self {
        self.members.push(EnumMember {
            name: name.into(),
            value,
        });
        self
    }

    /// Build the table for a Rust enum
    pub fn of<E: MappedEnum>() -> Self {
        E::members()
            .iter()
            .fold(EnumTable::new(E::NAME), |table, (name, value)| {
                table.member(*name, *value)
            })
    }

    pub fn by_value(&self, value: i64) -> Option<&EnumMember> {
        self.members.iter().find(|m| m.value == value)
    }

    pub fn by_name(&self, name: &str, ignore_case: bool) -> Option<&EnumMember> {
        self.members.iter().find(|m| {
            if ignore_case {
                m.name.eq_ignore_ascii_case(name)
            } else {
                m.name == name
            }
        })
    }

    /// Resolve a stored text representation: a member name, or failing
    /// that an integer member value. Surrounding whitespace is ignored.
    pub fn parse_stored(&self, text: &str, ignore_case: bool) -> Option<&EnumMember> {
        let text = text.trim();
        self.by_name(text, ignore_case)
            .or_else(|| text.parse::<i64>().ok().and_then(|v| self.by_value(v)))
    }
}

/// Declared type of a field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    Bool,
    Int,
    Float,
    Text,
    Enum(EnumTable),
    /// Any JSON value, taken as-is
    Json,
}

impl FieldType {
    pub fn enum_of<E: MappedEnum>() -> Self {
        FieldType::Enum(EnumTable::of::<E>())
    }

    /// Label used in error messages
    pub fn describe(&self) -> String {
        match self {
            FieldType::Bool => "bool".to_string(),
            FieldType::Int => "int".to_string(),
            FieldType::Float => "float".to_string(),
            FieldType::Text => "text".to_string(),
            FieldType::Enum(table) => format!("enum {}", table.name),
            FieldType::Json => "json".to_string(),
        }
    }
}

/// Static metadata of one field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub field_type: FieldType,

    /// Excluded from mapping entirely
    pub skipped: bool,

    /// Column holding the JSON blob this field is read from
    pub json_source: Option<String>,

    /// Key inside the blob; the field name when unset
    pub json_key: Option<String>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        FieldDef {
            name: name.into(),
            field_type,
            skipped: false,
            json_source: None,
            json_key: None,
        }
    }

    pub fn not_mapped(mut self) -> Self {
        self.skipped = true;
        self
    }

    /// Read this field out of the JSON object stored in `column`
    pub fn from_json(mut self, column: impl Into<String>) -> Self {
        self.json_source = Some(column.into());
        self
    }

    pub fn json_key(mut self, key: impl Into<String>) -> Self {
        self.json_key = Some(key.into());
        self
    }

    /// The key looked up inside the embedded blob
    pub fn embedded_key(&self) -> &str {
        self.json_key.as_deref().unwrap_or(&self.name)
    }
}

/// A target record type: name plus ordered fields
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    name: String,
    fields: Vec<FieldDef>,
}

impl Shape {
    pub fn builder(name: impl Into<String>) -> ShapeBuilder {
        ShapeBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Collects field definitions and validates them into a [`Shape`]
#[derive(Debug, Clone)]
pub struct ShapeBuilder {
    name: String,
    fields: Vec<FieldDef>,
}

impl ShapeBuilder {
    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    pub fn build(self) -> Result<Shape> {
        let mut seen = HashSet::new();

        for field in &self.fields {
            if field.name.is_empty() {
                return Err(MapError::InvalidShape {
                    reason: format!("shape '{}' has a field with an empty name", self.name),
                });
            }
            if !seen.insert(field.name.as_str()) {
                return Err(MapError::DuplicateField {
                    shape: self.name.clone(),
                    field: field.name.clone(),
                });
            }
            if field.json_key.is_some() && field.json_source.is_none() {
                return Err(MapError::InvalidShape {
                    reason: format!("field '{}' sets a JSON key without a JSON source column", field.name),
                });
            }
            if let FieldType::Enum(table) = &field.field_type {
                if table.members.is_empty() {
                    return Err(MapError::InvalidShape {
                        reason: format!("enum '{}' of field '{}' has no members", table.name, field.name),
                    });
                }
            }
        }

        Ok(Shape {
            name: self.name,
            fields: self.fields,
        })
    }
}

/// A Rust enum that can be decoded from its stored representation
pub trait MappedEnum: Sized {
    const NAME: &'static str;

    /// Member names with their stored numeric values
    fn members() -> &'static [(&'static str, i64)];

    fn from_stored(value: i64) -> Option<Self>;
}

/// A record type that mapping can produce
///
/// `shape` declares the fields; `from_record` is the typed constructor that
/// receives the coerced values.
pub trait FromRecord: Sized {
    fn shape() -> Result<Shape>;

    fn from_record(record: Record) -> Result<Self>;
}

impl Record {
    /// Take an enum field; `None` when the mapped value is null
    pub fn take_enum<E: MappedEnum>(&mut self, field: &str) -> Result<Option<E>> {
        let value: MappedValue = self.take(field)?;
        match value {
            MappedValue::Null => Ok(None),
            MappedValue::Enum { value, .. } => E::from_stored(value)
                .map(Some)
                .ok_or_else(|| MapError::Coercion {
                    field: field.to_string(),
                    value: value.to_string(),
                    target: format!("enum {}", E::NAME),
                }),
            other => Err(MapError::TypeMismatch {
                field: field.to_string(),
                expected: E::NAME,
                found: other.type_name().to_string(),
            }),
        }
    }

    /// Take an enum field, or `E::default()` if it was not mapped or is null
    pub fn take_enum_or_default<E: MappedEnum + Default>(&mut self, field: &str) -> Result<E> {
        if !self.contains(field) {
            return Ok(E::default());
        }
        Ok(self.take_enum(field)?.unwrap_or_default())
    }
}

//! Shape definitions loaded from JSON
//!
//! Used when the record type is not known at compile time, e.g. by the CLI:
//!
//! ```json
//! {
//!   "name": "Order",
//!   "fields": [
//!     {"name": "Id", "type": "int"},
//!     {"name": "Status", "type": "enum", "members": [{"name": "Active", "value": 1}]},
//!     {"name": "Level", "type": "text", "json_source": "Meta"},
//!     {"name": "Cache", "type": "json", "not_mapped": true}
//!   ]
//! }
//! ```

use crate::error::{MapError, Result};
use crate::shape::{EnumTable, FieldDef, FieldType, Shape};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

static IDENTIFIER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeName {
    Bool,
    Int,
    Float,
    Text,
    Enum,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MemberSpec {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldSpec {
    pub name: String,

    #[serde(rename = "type")]
    pub kind: TypeName,

    #[serde(default)]
    pub not_mapped: bool,

    #[serde(default)]
    pub json_source: Option<String>,

    #[serde(default)]
    pub json_key: Option<String>,

    /// Enum type name; the field name when unset
    #[serde(default)]
    pub enum_name: Option<String>,

    #[serde(default)]
    pub members: Vec<MemberSpec>,
}

/// On-disk shape definition
#[derive(Debug, Clone, Deserialize)]
pub struct ShapeFile {
    pub name: String,
    pub fields: Vec<FieldSpec>,
}

impl ShapeFile {
    pub fn into_shape(self) -> Result<Shape> {
        let mut builder = Shape::builder(self.name);

        for spec in self.fields {
            if !IDENTIFIER_REGEX.is_match(&spec.name) {
                return Err(MapError::InvalidShape {
                    reason: format!("'{}' is not a valid field name", spec.name),
                });
            }
            if spec.kind != TypeName::Enum && !spec.members.is_empty() {
                return Err(MapError::InvalidShape {
                    reason: format!("field '{}' lists enum members but is not an enum", spec.name),
                });
            }

            let field_type = match spec.kind {
                TypeName::Bool => FieldType::Bool,
                TypeName::Int => FieldType::Int,
                TypeName::Float => FieldType::Float,
                TypeName::Text => FieldType::Text,
                TypeName::Json => FieldType::Json,
                TypeName::Enum => {
                    let enum_name = spec.enum_name.clone().unwrap_or_else(|| spec.name.clone());
                    let table = spec
                        .members
                        .into_iter()
                        .fold(EnumTable::new(enum_name), |table, m| table.member(m.name, m.value));
                    FieldType::Enum(table)
                }
            };

            let mut field = FieldDef::new(spec.name, field_type);
            if spec.not_mapped {
                field = field.not_mapped();
            }
            if let Some(column) = spec.json_source {
                field = field.from_json(column);
            }
            if let Some(key) = spec.json_key {
                field = field.json_key(key);
            }

            builder = builder.field(field);
        }

        builder.build()
    }
}

/// Parse a JSON shape definition and validate it
pub fn load_shape(text: &str) -> Result<Shape> {
    let file: ShapeFile = serde_json::from_str(text).map_err(|e| MapError::InvalidShape {
        reason: format!("bad shape definition: {}", e),
    })?;
    file.into_shape()
}

//! Pre-computed mapping plans
//!
//! A plan is resolved once per shape (and optional column mapping) and then
//! reused for every row; resolving never looks at row data.

use crate::shape::{FieldType, Shape};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, trace};

/// Caller-supplied field-name to column-name table.
///
/// Acts as an allow-list: fields without an entry are not mapped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ColumnMapping {
    entries: HashMap<String, String>,
}

impl ColumnMapping {
    pub fn new() -> Self {
        ColumnMapping {
            entries: HashMap::new(),
        }
    }

    pub fn with(mut self, field: impl Into<String>, column: impl Into<String>) -> Self {
        self.insert(field, column);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, column: impl Into<String>) {
        self.entries.insert(field.into(), column.into());
    }

    pub fn column_for(&self, field: &str) -> Option<&str> {
        self.entries.get(field).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<F: Into<String>, C: Into<String>> FromIterator<(F, C)> for ColumnMapping {
    fn from_iter<I: IntoIterator<Item = (F, C)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(ColumnMapping::new(), |mapping, (field, column)| mapping.with(field, column))
    }
}

/// How a single field gets its value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldMode {
    /// Not mapped; the field keeps its default
    Skipped,
    /// Read from the same-named column
    Direct { column: String },
    /// Read from a column named by the column mapping
    Renamed { column: String },
    /// Read `key` out of the JSON object stored in `column`
    EmbeddedJson { column: String, key: String },
}

impl FieldMode {
    /// The column this mode reads, if any
    pub fn source_column(&self) -> Option<&str> {
        match self {
            FieldMode::Skipped => None,
            FieldMode::Direct { column }
            | FieldMode::Renamed { column }
            | FieldMode::EmbeddedJson { column, .. } => Some(column),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldPlan {
    pub name: String,
    pub field_type: FieldType,
    pub mode: FieldMode,
}

/// Resolved per-field execution plan for one shape
#[derive(Debug, Clone, PartialEq)]
pub struct MappingPlan {
    pub shape_name: String,

    /// One entry per shape field, in declaration order
    pub fields: Vec<FieldPlan>,
}

impl MappingPlan {
    /// Resolve a plan from the shape's own metadata
    pub fn resolve(shape: &Shape) -> Self {
        Self::build(shape, None)
    }

    /// Resolve a plan restricted and redirected by `mapping`
    pub fn resolve_with(shape: &Shape, mapping: &ColumnMapping) -> Self {
        Self::build(shape, Some(mapping))
    }

    fn build(shape: &Shape, mapping: Option<&ColumnMapping>) -> Self {
        let fields: Vec<FieldPlan> = shape
            .fields()
            .iter()
            .map(|field| {
                let override_column = mapping.map(|m| m.column_for(&field.name));

                let mode = if field.skipped {
                    FieldMode::Skipped
                } else if let Some(None) = override_column {
                    // Mapping present, field not listed
                    FieldMode::Skipped
                } else if let Some(column) = &field.json_source {
                    FieldMode::EmbeddedJson {
                        column: column.clone(),
                        key: field.embedded_key().to_string(),
                    }
                } else {
                    match override_column.flatten() {
                        Some(column) if column != field.name => FieldMode::Renamed {
                            column: column.to_string(),
                        },
                        _ => FieldMode::Direct {
                            column: field.name.clone(),
                        },
                    }
                };

                trace!(shape = shape.name(), field = %field.name, ?mode, "resolved field");

                FieldPlan {
                    name: field.name.clone(),
                    field_type: field.field_type.clone(),
                    mode,
                }
            })
            .collect();

        let plan = MappingPlan {
            shape_name: shape.name().to_string(),
            fields,
        };

        debug!(
            shape = shape.name(),
            mapped = plan.mapped_fields(),
            total = plan.fields.len(),
            "resolved mapping plan"
        );

        plan
    }

    /// Number of fields that read a column
    pub fn mapped_fields(&self) -> usize {
        self.fields
            .iter()
            .filter(|f| f.mode != FieldMode::Skipped)
            .count()
    }

    /// Distinct columns read by this plan, first use first
    pub fn source_columns(&self) -> Vec<&str> {
        let mut columns: Vec<&str> = Vec::new();
        for column in self.fields.iter().filter_map(|f| f.mode.source_column()) {
            if !columns.contains(&column) {
                columns.push(column);
            }
        }
        columns
    }

    /// Get the plan entry for a given field
    pub fn get_plan(&self, field: &str) -> Option<&FieldPlan> {
        self.fields.iter().find(|f| f.name == field)
    }
}

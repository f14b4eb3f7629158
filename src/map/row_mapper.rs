//! Plan-driven mapping of a single row
//!
//! `RowMapper` applies a pre-computed `MappingPlan` to rows without any
//! per-row decisions about field modes.

use crate::error::{MapError, Result};
use crate::json::JsonDocument;
use crate::map::coerce::coerce;
use crate::map::config::{MapConfig, MissingColumn};
use crate::map::plan::{FieldMode, FieldPlan, MappingPlan};
use crate::shape::Shape;
use crate::types::{Cell, MappedValue, Record, Row};

/// Maps rows into records using a pre-computed plan
#[derive(Debug, Clone)]
pub struct RowMapper {
    plan: MappingPlan,
    config: MapConfig,
}

impl RowMapper {
    pub fn new(plan: MappingPlan, config: MapConfig) -> Self {
        RowMapper { plan, config }
    }

    /// Resolve the plan from a shape with the default config
    pub fn for_shape(shape: &Shape) -> Self {
        Self::new(MappingPlan::resolve(shape), MapConfig::default())
    }

    pub fn plan(&self) -> &MappingPlan {
        &self.plan
    }

    /// Map one row. The row is only read.
    pub fn map_row(&self, row: &Row) -> Result<Record> {
        let mut record = Record::new();

        for field in &self.plan.fields {
            let value = match &field.mode {
                FieldMode::Skipped => continue,
                FieldMode::Direct { column } | FieldMode::Renamed { column } => {
                    match self.lookup(row, field, column)? {
                        Some(cell) => coerce(&field.name, cell, &field.field_type, &self.config)?,
                        None => MappedValue::Null,
                    }
                }
                FieldMode::EmbeddedJson { column, key } => match self.lookup(row, field, column)? {
                    Some(cell) => self.extract_embedded(field, column, key, cell)?,
                    None => MappedValue::Null,
                },
            };

            record.insert(field.name.clone(), value);
        }

        Ok(record)
    }

    /// Find the source cell; `None` only under `MissingColumn::Null`
    fn lookup<'r>(&self, row: &'r Row, field: &FieldPlan, column: &str) -> Result<Option<&'r Cell>> {
        let cell = if self.config.column_ignore_case {
            row.get_ignore_case(column)
        } else {
            row.get(column)
        };

        match (cell, self.config.missing_column) {
            (Some(cell), _) => Ok(Some(cell)),
            (None, MissingColumn::Null) => Ok(None),
            (None, MissingColumn::Fail) => Err(MapError::ColumnNotFound {
                field: field.name.clone(),
                column: column.to_string(),
            }),
        }
    }

    fn extract_embedded(&self, field: &FieldPlan, column: &str, key: &str, cell: &Cell) -> Result<MappedValue> {
        let text = match cell {
            // Null blob: no parse attempted
            Cell::Null => return Ok(MappedValue::Null),
            Cell::Text(text) => text,
            other => {
                return Err(MapError::Coercion {
                    field: field.name.clone(),
                    value: other.to_string(),
                    target: "JSON text".to_string(),
                })
            }
        };

        let document = JsonDocument::parse(column, text)?;
        let value = document
            .extract(key, &field.field_type, self.config.enum_ignore_case)
            .map_err(|e| match e {
                MapError::Coercion { value, target, .. } => MapError::Coercion {
                    field: field.name.clone(),
                    value,
                    target,
                },
                other => other,
            })?;

        Ok(value.unwrap_or(MappedValue::Null))
    }
}

//! Cell to field value coercion

use crate::error::{MapError, Result};
use crate::map::config::MapConfig;
use crate::shape::{EnumTable, FieldType};
use crate::types::{Cell, MappedValue};

/// Coerce a raw cell into the value assigned to `field`.
///
/// Null always maps to null. Enum fields are decoded from their stored
/// member value or name; every other cell passes through unchanged.
pub fn coerce(field: &str, cell: &Cell, field_type: &FieldType, config: &MapConfig) -> Result<MappedValue> {
    if cell.is_null() {
        return Ok(MappedValue::Null);
    }

    match field_type {
        FieldType::Enum(table) => coerce_enum(field, cell, table, config.enum_ignore_case),
        _ => Ok(MappedValue::from(cell.clone())),
    }
}

fn coerce_enum(field: &str, cell: &Cell, table: &EnumTable, ignore_case: bool) -> Result<MappedValue> {
    let member = match cell {
        Cell::Int(n) => table.by_value(*n),
        Cell::Text(s) => table.parse_stored(s, ignore_case),
        _ => None,
    };

    member
        .map(|m| MappedValue::Enum {
            name: m.name.clone(),
            value: m.value,
        })
        .ok_or_else(|| MapError::Coercion {
            field: field.to_string(),
            value: cell.to_string(),
            target: format!("enum {}", table.name),
        })
}

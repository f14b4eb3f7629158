//! Table-level entry points

use crate::error::Result;
use crate::map::config::MapConfig;
use crate::map::plan::{ColumnMapping, MappingPlan};
use crate::map::row_mapper::RowMapper;
use crate::shape::{FromRecord, Shape};
use crate::types::{Record, RowSet};
use tracing::debug;

/// Maps whole row sets, resolving the plan once per call
#[derive(Debug, Clone, Default)]
pub struct TableMapper {
    config: MapConfig,
}

impl TableMapper {
    pub fn new(config: MapConfig) -> Self {
        TableMapper { config }
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    /// Build a row mapper for `shape`, optionally restricted by `mapping`
    pub fn row_mapper(&self, shape: &Shape, mapping: Option<&ColumnMapping>) -> RowMapper {
        let plan = match mapping {
            Some(mapping) => MappingPlan::resolve_with(shape, mapping),
            None => MappingPlan::resolve(shape),
        };
        RowMapper::new(plan, self.config.clone())
    }

    /// Map every row into a dynamic record, preserving row order.
    ///
    /// The first failing row aborts the call; the error carries its index.
    pub fn map_records(&self, rows: &RowSet, shape: &Shape, mapping: Option<&ColumnMapping>) -> Result<Vec<Record>> {
        let mapper = self.row_mapper(shape, mapping);

        let records = rows
            .iter()
            .enumerate()
            .map(|(index, row)| mapper.map_row(row).map_err(|e| e.at_row(index)))
            .collect::<Result<Vec<_>>>()?;

        debug!(shape = shape.name(), rows = records.len(), "mapped table");
        Ok(records)
    }

    /// Map every row into `T`
    pub fn map<T: FromRecord>(&self, rows: &RowSet, mapping: Option<&ColumnMapping>) -> Result<Vec<T>> {
        let shape = T::shape()?;
        let mapper = self.row_mapper(&shape, mapping);

        let items = rows
            .iter()
            .enumerate()
            .map(|(index, row)| {
                mapper
                    .map_row(row)
                    .and_then(T::from_record)
                    .map_err(|e| e.at_row(index))
            })
            .collect::<Result<Vec<T>>>()?;

        debug!(shape = shape.name(), rows = items.len(), "mapped table");
        Ok(items)
    }
}

/// Map every row of `rows` into `T` using the shape's own field list
pub fn map_table<T: FromRecord>(rows: &RowSet) -> Result<Vec<T>> {
    TableMapper::default().map(rows, None)
}

/// Map every row of `rows` into `T`, reading only the fields in `mapping`
pub fn map_table_with<T: FromRecord>(rows: &RowSet, mapping: &ColumnMapping) -> Result<Vec<T>> {
    TableMapper::default().map(rows, Some(mapping))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MapError;
    use crate::shape::{FieldDef, FieldType};
    use crate::types::{Cell, MappedValue, Row};

    fn person_shape() -> Shape {
        Shape::builder("Person")
            .field(FieldDef::new("Name", FieldType::Text))
            .field(FieldDef::new("Age", FieldType::Int))
            .build()
            .unwrap()
    }

    #[test]
    fn test_empty_row_set() {
        let records = TableMapper::default()
            .map_records(&RowSet::new(), &person_shape(), None)
            .unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_preserves_row_order() {
        let rows: RowSet = (0..5)
            .map(|i| Row::new().with("Name", format!("p{}", i)).with("Age", i))
            .collect();

        let records = TableMapper::default()
            .map_records(&rows, &person_shape(), None)
            .unwrap();

        let ages: Vec<_> = records.iter().map(|r| r.get("Age").cloned()).collect();
        assert_eq!(ages, (0..5).map(|i| Some(MappedValue::Int(i))).collect::<Vec<_>>());
    }

    #[test]
    fn test_failing_row_aborts_with_index() {
        let rows = RowSet::from(vec![
            Row::new().with("Name", "a").with("Age", 1),
            Row::new().with("Name", "b"),
            Row::new().with("Name", "c").with("Age", 3),
        ]);

        let err = TableMapper::default()
            .map_records(&rows, &person_shape(), None)
            .unwrap_err();

        match err {
            MapError::Row { index, source } => {
                assert_eq!(index, 1);
                assert!(matches!(*source, MapError::ColumnNotFound { .. }));
            }
            other => panic!("Expected row error, got {:?}", other),
        }
    }

    #[test]
    fn test_mapping_restricts_fields() {
        let rows = RowSet::from(vec![Row::new().with("full_name", "Ann").with("Age", Cell::Null)]);
        let mapping = ColumnMapping::new().with("Name", "full_name");

        let records = TableMapper::default()
            .map_records(&rows, &person_shape(), Some(&mapping))
            .unwrap();

        assert_eq!(records[0].get("Name"), Some(&MappedValue::Text("Ann".to_string())));
        assert!(!records[0].contains("Age"));
    }
}

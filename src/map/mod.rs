//! Row mapping - turn tabular rows into typed records
//!
//! A `MappingPlan` is resolved once from a shape (and optional column
//! mapping), then `RowMapper` applies it to each row and `TableMapper`
//! drives it over a whole row set.

pub mod config;
pub mod plan;
pub mod coerce;
pub mod row_mapper;
pub mod table;
pub mod writer;

pub use config::{MapConfig, MissingColumn};
pub use plan::{ColumnMapping, FieldMode, FieldPlan, MappingPlan};
pub use coerce::coerce;
pub use row_mapper::RowMapper;
pub use table::{map_table, map_table_with, TableMapper};
pub use writer::RecordWriter;

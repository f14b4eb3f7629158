/// What to do when a resolved source column is not in the row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingColumn {
    /// Fail the row with `MapError::ColumnNotFound`
    #[default]
    Fail,
    /// Map the field to null
    Null,
}

/// Configuration for the mapping process
#[derive(Debug, Clone)]
pub struct MapConfig {
    /// Policy for columns absent from a row
    pub missing_column: MissingColumn,

    /// Fall back to an ASCII case-insensitive column match when no column
    /// has the exact name
    pub column_ignore_case: bool,

    /// Match enum member names without regard to ASCII case
    pub enum_ignore_case: bool,
}

impl Default for MapConfig {
    fn default() -> Self {
        MapConfig {
            missing_column: MissingColumn::Fail,
            column_ignore_case: true,
            enum_ignore_case: false,
        }
    }
}

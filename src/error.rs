//! Error type for row mapping

use thiserror::Error;

/// Errors raised while resolving shapes or mapping rows
#[derive(Debug, Error)]
pub enum MapError {
    /// The embedded JSON blob in `column` is not valid JSON
    #[error("malformed JSON in column '{column}': {source}")]
    Parse {
        column: String,
        #[source]
        source: serde_json::Error,
    },

    /// The embedded JSON blob parsed, but its top level is not an object
    #[error("JSON in column '{column}' is not an object")]
    NotAnObject { column: String },

    /// A value could not be converted into the field's declared type
    #[error("cannot coerce {value} into {target} for field '{field}'")]
    Coercion {
        field: String,
        value: String,
        target: String,
    },

    /// The resolved source column does not exist in the row
    #[error("column '{column}' (for field '{field}') not found in row")]
    ColumnNotFound { field: String, column: String },

    /// The builder asked for a Rust type the mapped value cannot become
    #[error("field '{field}' expected {expected}, found {found}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: String,
    },

    /// The builder asked for a field that was never mapped
    #[error("field '{field}' is missing from the record")]
    MissingField { field: String },

    #[error("duplicate field '{field}' in shape '{shape}'")]
    DuplicateField { shape: String, field: String },

    #[error("invalid shape: {reason}")]
    InvalidShape { reason: String },

    /// A failure while mapping one row of a table
    #[error("row {index}: {source}")]
    Row {
        index: usize,
        #[source]
        source: Box<MapError>,
    },
}

impl MapError {
    /// Wrap this error with the index of the row that produced it
    pub fn at_row(self, index: usize) -> Self {
        MapError::Row {
            index,
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping row context
    pub fn root(&self) -> &MapError {
        match self {
            MapError::Row { source, .. } => source.root(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, MapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_context_message() {
        let err = MapError::ColumnNotFound {
            field: "Name".to_string(),
            column: "name".to_string(),
        }
        .at_row(3);

        assert_eq!(
            err.to_string(),
            "row 3: column 'name' (for field 'Name') not found in row"
        );
        assert!(matches!(err.root(), MapError::ColumnNotFound { .. }));
    }
}

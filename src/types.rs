use crate::error::{MapError, Result};
use serde::de::{self, Deserialize, Deserializer, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use std::fmt;

/// A raw cell value as produced by the tabular source
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// The null sentinel
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Plain text, possibly a JSON-encoded blob
    Text(String),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Short type label used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Cell::Null => "null",
            Cell::Bool(_) => "bool",
            Cell::Int(_) => "int",
            Cell::Float(_) => "float",
            Cell::Text(_) => "text",
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => write!(f, "null"),
            Cell::Bool(b) => write!(f, "{}", b),
            Cell::Int(n) => write!(f, "{}", n),
            Cell::Float(x) => write!(f, "{}", x),
            Cell::Text(s) => write!(f, "{:?}", s),
        }
    }
}

impl From<bool> for Cell {
    fn from(b: bool) -> Self {
        Cell::Bool(b)
    }
}

impl From<i64> for Cell {
    fn from(n: i64) -> Self {
        Cell::Int(n)
    }
}

impl From<i32> for Cell {
    fn from(n: i32) -> Self {
        Cell::Int(n.into())
    }
}

impl From<f64> for Cell {
    fn from(x: f64) -> Self {
        Cell::Float(x)
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map_or(Cell::Null, Into::into)
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Cell::Null => serializer.serialize_none(),
            Cell::Bool(b) => serializer.serialize_bool(*b),
            Cell::Int(n) => serializer.serialize_i64(*n),
            Cell::Float(x) => serializer.serialize_f64(*x),
            Cell::Text(s) => serializer.serialize_str(s),
        }
    }
}

struct CellVisitor;

impl<'de> Visitor<'de> for CellVisitor {
    type Value = Cell;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a scalar cell value or null")
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Cell, E> {
        Ok(Cell::Null)
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<Cell, E> {
        Ok(Cell::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> std::result::Result<Cell, D::Error> {
        deserializer.deserialize_any(CellVisitor)
    }

    fn visit_bool<E: de::Error>(self, b: bool) -> std::result::Result<Cell, E> {
        Ok(Cell::Bool(b))
    }

    fn visit_i64<E: de::Error>(self, n: i64) -> std::result::Result<Cell, E> {
        Ok(Cell::Int(n))
    }

    fn visit_u64<E: de::Error>(self, n: u64) -> std::result::Result<Cell, E> {
        i64::try_from(n)
            .map(Cell::Int)
            .map_err(|_| E::custom(format!("integer {} does not fit a cell", n)))
    }

    fn visit_f64<E: de::Error>(self, x: f64) -> std::result::Result<Cell, E> {
        Ok(Cell::Float(x))
    }

    fn visit_str<E: de::Error>(self, s: &str) -> std::result::Result<Cell, E> {
        Ok(Cell::Text(s.to_string()))
    }

    fn visit_string<E: de::Error>(self, s: String) -> std::result::Result<Cell, E> {
        Ok(Cell::Text(s))
    }
}

impl<'de> Deserialize<'de> for Cell {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(CellVisitor)
    }
}

/// One tabular record: ordered, uniquely named columns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: Vec<(String, Cell)>,
}

impl Row {
    pub fn new() -> Self {
        Row { cells: Vec::new() }
    }

    /// Builder-style insert
    pub fn with(mut self, column: impl Into<String>, cell: impl Into<Cell>) -> Self {
        self.insert(column, cell);
        self
    }

    /// Set a column, replacing any existing cell with the same name
    pub fn insert(&mut self, column: impl Into<String>, cell: impl Into<Cell>) {
        let column = column.into();
        let cell = cell.into();
        match self.cells.iter_mut().find(|(name, _)| *name == column) {
            Some(slot) => slot.1 = cell,
            None => self.cells.push((column, cell)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Cell> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, cell)| cell)
    }

    /// Exact match first, then the first column equal ignoring ASCII case
    pub fn get_ignore_case(&self, column: &str) -> Option<&Cell> {
        self.get(column).or_else(|| {
            self.cells
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(column))
                .map(|(_, cell)| cell)
        })
    }

    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Cell)> {
        self.cells.iter().map(|(name, cell)| (name.as_str(), cell))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Cell)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, Cell)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (column, cell) in iter {
            row.insert(column, cell);
        }
        row
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (column, cell) in &self.cells {
            map.serialize_entry(column, cell)?;
        }
        map.end()
    }
}

struct RowVisitor;

impl<'de> Visitor<'de> for RowVisitor {
    type Value = Row;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an object of column names to scalar cells")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Row, A::Error> {
        let mut cells: Vec<(String, Cell)> = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((column, cell)) = access.next_entry::<String, Cell>()? {
            if cells.iter().any(|(name, _)| *name == column) {
                return Err(de::Error::custom(format!("duplicate column '{}'", column)));
            }
            cells.push((column, cell));
        }
        Ok(Row { cells })
    }
}

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(RowVisitor)
    }
}

/// An ordered collection of rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    rows: Vec<Row>,
}

impl RowSet {
    pub fn new() -> Self {
        RowSet { rows: Vec::new() }
    }

    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl From<Vec<Row>> for RowSet {
    fn from(rows: Vec<Row>) -> Self {
        RowSet { rows }
    }
}

impl FromIterator<Row> for RowSet {
    fn from_iter<I: IntoIterator<Item = Row>>(iter: I) -> Self {
        RowSet {
            rows: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a RowSet {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// A value after coercion, ready to be assigned to a field
#[derive(Debug, Clone, PartialEq)]
pub enum MappedValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// A resolved enum member
    Enum { name: String, value: i64 },
    /// An opaque JSON value taken from an embedded document
    Json(Value),
}

impl MappedValue {
    pub fn is_null(&self) -> bool {
        matches!(self, MappedValue::Null)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            MappedValue::Null => "null",
            MappedValue::Bool(_) => "bool",
            MappedValue::Int(_) => "int",
            MappedValue::Float(_) => "float",
            MappedValue::Text(_) => "text",
            MappedValue::Enum { .. } => "enum",
            MappedValue::Json(_) => "json",
        }
    }

    /// Convert to a JSON value; enum members become their names
    pub fn to_json(&self) -> Value {
        match self {
            MappedValue::Null => Value::Null,
            MappedValue::Bool(b) => Value::Bool(*b),
            MappedValue::Int(n) => Value::from(*n),
            MappedValue::Float(x) => serde_json::Number::from_f64(*x)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            MappedValue::Text(s) => Value::String(s.clone()),
            MappedValue::Enum { name, .. } => Value::String(name.clone()),
            MappedValue::Json(v) => v.clone(),
        }
    }
}

impl From<Cell> for MappedValue {
    fn from(cell: Cell) -> Self {
        match cell {
            Cell::Null => MappedValue::Null,
            Cell::Bool(b) => MappedValue::Bool(b),
            Cell::Int(n) => MappedValue::Int(n),
            Cell::Float(x) => MappedValue::Float(x),
            Cell::Text(s) => MappedValue::Text(s),
        }
    }
}

impl Serialize for MappedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            MappedValue::Null => serializer.serialize_none(),
            MappedValue::Bool(b) => serializer.serialize_bool(*b),
            MappedValue::Int(n) => serializer.serialize_i64(*n),
            MappedValue::Float(x) => serializer.serialize_f64(*x),
            MappedValue::Text(s) => serializer.serialize_str(s),
            MappedValue::Enum { name, .. } => serializer.serialize_str(name),
            MappedValue::Json(v) => v.serialize(serializer),
        }
    }
}

/// Conversion from a mapped value into a concrete field type
pub trait FromValue: Sized {
    fn from_value(field: &str, value: MappedValue) -> Result<Self>;
}

fn mismatch<T>(field: &str, expected: &'static str, found: &MappedValue) -> Result<T> {
    Err(MapError::TypeMismatch {
        field: field.to_string(),
        expected,
        found: found.type_name().to_string(),
    })
}

impl FromValue for MappedValue {
    fn from_value(_field: &str, value: MappedValue) -> Result<Self> {
        Ok(value)
    }
}

impl FromValue for bool {
    fn from_value(field: &str, value: MappedValue) -> Result<Self> {
        match value {
            MappedValue::Bool(b) => Ok(b),
            other => mismatch(field, "bool", &other),
        }
    }
}

impl FromValue for i64 {
    fn from_value(field: &str, value: MappedValue) -> Result<Self> {
        match value {
            MappedValue::Int(n) => Ok(n),
            MappedValue::Enum { value, .. } => Ok(value),
            other => mismatch(field, "i64", &other),
        }
    }
}

impl FromValue for i32 {
    fn from_value(field: &str, value: MappedValue) -> Result<Self> {
        match value {
            MappedValue::Int(n) => i32::try_from(n).or_else(|_| mismatch(field, "i32", &MappedValue::Int(n))),
            other => mismatch(field, "i32", &other),
        }
    }
}

impl FromValue for f64 {
    fn from_value(field: &str, value: MappedValue) -> Result<Self> {
        match value {
            MappedValue::Float(x) => Ok(x),
            MappedValue::Int(n) => Ok(n as f64),
            other => mismatch(field, "f64", &other),
        }
    }
}

impl FromValue for String {
    fn from_value(field: &str, value: MappedValue) -> Result<Self> {
        match value {
            MappedValue::Text(s) => Ok(s),
            other => mismatch(field, "string", &other),
        }
    }
}

impl FromValue for Value {
    fn from_value(_field: &str, value: MappedValue) -> Result<Self> {
        Ok(match value {
            MappedValue::Json(v) => v,
            other => other.to_json(),
        })
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(field: &str, value: MappedValue) -> Result<Self> {
        if value.is_null() {
            return Ok(None);
        }
        T::from_value(field, value).map(Some)
    }
}

/// The mapped instance: field name to coerced value, in declaration order.
///
/// Skipped fields never appear here; builders fall back to defaults for them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, MappedValue)>,
}

impl Record {
    pub fn new() -> Self {
        Record { fields: Vec::new() }
    }

    pub fn insert(&mut self, field: impl Into<String>, value: MappedValue) {
        let field = field.into();
        match self.fields.iter_mut().find(|(name, _)| *name == field) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((field, value)),
        }
    }

    pub fn get(&self, field: &str) -> Option<&MappedValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MappedValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn remove(&mut self, field: &str) -> Option<MappedValue> {
        let pos = self.fields.iter().position(|(name, _)| name == field)?;
        Some(self.fields.remove(pos).1)
    }

    /// Take a mapped field as `T`; fails if the field was not mapped
    pub fn take<T: FromValue>(&mut self, field: &str) -> Result<T> {
        match self.remove(field) {
            Some(value) => T::from_value(field, value),
            None => Err(MapError::MissingField {
                field: field.to_string(),
            }),
        }
    }

    /// Take a mapped field as `T`, or `T::default()` if it was not mapped
    pub fn take_or_default<T: FromValue + Default>(&mut self, field: &str) -> Result<T> {
        match self.remove(field) {
            Some(value) => T::from_value(field, value),
            None => Ok(T::default()),
        }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (field, value) in &self.fields {
            map.serialize_entry(field, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_deserialize_keeps_column_order() {
        let row: Row = serde_json::from_str(r#"{"b": 1, "a": null, "c": "x", "d": 2.5}"#).unwrap();

        let columns: Vec<&str> = row.columns().collect();
        assert_eq!(columns, vec!["b", "a", "c", "d"]);
        assert_eq!(row.get("a"), Some(&Cell::Null));
        assert_eq!(row.get("c"), Some(&Cell::Text("x".to_string())));
        assert_eq!(row.get("d"), Some(&Cell::Float(2.5)));
    }

    #[test]
    fn test_row_rejects_nested_and_duplicate_values() {
        assert!(serde_json::from_str::<Row>(r#"{"a": {"b": 1}}"#).is_err());
        assert!(serde_json::from_str::<Row>(r#"{"a": 1, "a": 2}"#).is_err());
    }

    #[test]
    fn test_row_get_ignore_case_prefers_exact() {
        let row = Row::new().with("status", 1).with("Status", 2).with("name", "Ann");

        assert_eq!(row.get_ignore_case("Status"), Some(&Cell::Int(2)));
        assert_eq!(row.get_ignore_case("NAME"), Some(&Cell::Text("Ann".to_string())));
        assert_eq!(row.get("NAME"), None);
        assert_eq!(row.get_ignore_case("missing"), None);
    }

    #[test]
    fn test_row_insert_replaces() {
        let mut row = Row::new().with("Id", 1).with("Name", "Alice");
        row.insert("Id", 2);

        assert_eq!(row.len(), 2);
        assert_eq!(row.get("Id"), Some(&Cell::Int(2)));
        assert!(row.contains("Name"));
        assert!(!row.contains("name"));
        assert_eq!(Cell::from(None::<&str>), Cell::Null);
    }

    #[test]
    fn test_record_take() {
        let mut record = Record::new();
        record.insert("Name", MappedValue::Null);
        record.insert("Age", MappedValue::Int(30));
        record.insert("Score", MappedValue::Int(7));

        assert_eq!(record.take::<Option<String>>("Name").unwrap(), None);
        assert_eq!(record.take::<i32>("Age").unwrap(), 30);
        assert_eq!(record.take::<f64>("Score").unwrap(), 7.0);
        assert_eq!(record.take_or_default::<String>("Skipped").unwrap(), "");
        assert!(matches!(
            record.take::<String>("Age"),
            Err(MapError::MissingField { .. })
        ));
    }

    #[test]
    fn test_record_type_mismatch() {
        let mut record = Record::new();
        record.insert("Name", MappedValue::Int(5));

        let err = record.take::<String>("Name").unwrap_err();
        assert!(matches!(
            err,
            MapError::TypeMismatch { expected: "string", .. }
        ));
    }

    #[test]
    fn test_record_serializes_in_order() {
        let mut record = Record::new();
        record.insert("Status", MappedValue::Enum { name: "Active".to_string(), value: 1 });
        record.insert("Level", MappedValue::Text("high".to_string()));
        record.insert("Note", MappedValue::Null);

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"Status":"Active","Level":"high","Note":null}"#);
    }
}

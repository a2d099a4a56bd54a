//! Raw result rows and entity decoding

use crate::{Error, FromValue, Result, Value};
use serde::de::DeserializeOwned;

/// One result row as returned by an executor: column names paired with
/// their values, in projection order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new(columns: Vec<(String, Value)>) -> Self {
        Self { columns }
    }

    /// Build a row from `(column, value)` pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self {
            columns: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// Raw value of the first column called `column`
    pub fn get_value(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Decode a single column into `T`
    pub fn get<T>(&self, column: &str) -> Result<T>
    where
        T: FromValue,
    {
        let value = self
            .get_value(column)
            .ok_or_else(|| Error::decode(column, "column missing from result row"))?;
        decode_value(column, value.clone())
    }

    /// Decode the whole row through serde. Field names match column names
    /// unless overridden with `#[serde(rename = "...")]`.
    ///
    /// `bool` fields accept integer columns, so entities decode the same
    /// way from SQLite as through a [`Mapping`].
    pub fn deserialize<T>(&self) -> Result<T>
    where
        T: DeserializeOwned,
    {
        crate::de::from_row(self)
    }

    pub(crate) fn entries(&self) -> &[(String, Value)] {
        &self.columns
    }
}

fn decode_value<T>(column: &str, value: Value) -> Result<T>
where
    T: FromValue,
{
    let found = value.type_name();
    T::from_value(value).ok_or_else(|| {
        Error::decode(
            column,
            format!("cannot convert {found} into {}", std::any::type_name::<T>()),
        )
    })
}

/// A record type that can be decoded from a result row
pub trait Entity: Sized {
    fn from_row(row: &Row) -> Result<Self>;
}

type Setter<E> = Box<dyn Fn(&mut E, Value) -> Result<()> + Send + Sync>;

struct FieldMapping<E> {
    field: &'static str,
    column: String,
    set: Setter<E>,
}

/// Explicit field-to-column mapping for an entity type, built once and
/// reused for every row.
///
/// # Examples
/// ```
/// use std::sync::LazyLock;
/// use tabula_core::{Entity, Mapping, Result, Row};
///
/// #[derive(Debug, Default)]
/// struct Todo {
///     id: i64,
///     title: String,
/// }
///
/// static TODO: LazyLock<Mapping<Todo>> = LazyLock::new(|| {
///     Mapping::new()
///         .field("id", |t: &mut Todo, v| t.id = v)
///         .field_as("title", "todo_title", |t: &mut Todo, v| t.title = v)
/// });
///
/// impl Entity for Todo {
///     fn from_row(row: &Row) -> Result<Self> {
///         TODO.decode(row)
///     }
/// }
///
/// let row = Row::from_pairs([("id", tabula_core::Value::I64(1)), ("todo_title", "milk".into())]);
/// let todo = Todo::from_row(&row).unwrap();
/// assert_eq!(todo.title, "milk");
/// ```
pub struct Mapping<E> {
    fields: Vec<FieldMapping<E>>,
}

impl<E> Default for Mapping<E> {
    fn default() -> Self {
        Self { fields: Vec::new() }
    }
}

impl<E> std::fmt::Debug for Mapping<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.fields.iter().map(|m| (m.field, &m.column)))
            .finish()
    }
}

impl<E> Mapping<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `field` to the column of the same name
    pub fn field<T, F>(self, field: &'static str, set: F) -> Self
    where
        T: FromValue,
        F: Fn(&mut E, T) + Send + Sync + 'static,
    {
        self.field_as(field, field, set)
    }

    /// Map `field` to an explicitly named column
    pub fn field_as<T, F>(mut self, field: &'static str, column: &str, set: F) -> Self
    where
        T: FromValue,
        F: Fn(&mut E, T) + Send + Sync + 'static,
    {
        let column_name = column.to_string();
        let set: Setter<E> = Box::new(move |entity, value| {
            let decoded = decode_value::<T>(&column_name, value)?;
            set(entity, decoded);
            Ok(())
        });
        self.fields.push(FieldMapping {
            field,
            column: column.to_string(),
            set,
        });
        self
    }

    /// Column names in mapping order
    pub fn columns(&self) -> Vec<&str> {
        self.fields.iter().map(|m| m.column.as_str()).collect()
    }

    /// `(field, column)` pairs in mapping order
    pub fn pairs(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.fields.iter().map(|m| (m.field, m.column.as_str()))
    }

    /// Decode a row into a fresh entity
    pub fn decode(&self, row: &Row) -> Result<E>
    where
        E: Default,
    {
        let mut entity = E::default();
        for mapping in &self.fields {
            let value = row.get_value(&mapping.column).ok_or_else(|| {
                Error::decode(&mapping.column, "column missing from result row")
            })?;
            (mapping.set)(&mut entity, value.clone())?;
        }
        Ok(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, PartialEq, Deserialize)]
    struct Todo {
        id: i64,
        title: String,
        #[serde(rename = "is_done")]
        done: bool,
    }

    fn todo_row() -> Row {
        Row::from_pairs([
            ("id", Value::I64(1)),
            ("title", Value::String("assist Borat".into())),
            ("is_done", Value::Bool(false)),
        ])
    }

    fn mapping() -> Mapping<Todo> {
        Mapping::new()
            .field("id", |t: &mut Todo, v| t.id = v)
            .field("title", |t: &mut Todo, v| t.title = v)
            .field_as("done", "is_done", |t: &mut Todo, v| t.done = v)
    }

    #[test]
    fn test_row_lookup_by_name() {
        let row = todo_row();
        assert_eq!(row.len(), 3);
        assert_eq!(row.get::<i64>("id").unwrap(), 1);
        assert_eq!(row.get::<String>("title").unwrap(), "assist Borat");
        assert!(row.get_value("missing").is_none());
    }

    #[test]
    fn test_first_duplicate_column_wins() {
        let row = Row::from_pairs([("id", 1i64), ("id", 2i64)]);
        assert_eq!(row.get::<i64>("id").unwrap(), 1);
    }

    #[test]
    fn test_get_reports_type_mismatch() {
        let err = todo_row().get::<i64>("title").unwrap_err();
        match err {
            Error::Decode { column, message } => {
                assert_eq!(column, "title");
                assert!(message.contains("TEXT"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_mapping_decode() {
        let todo = mapping().decode(&todo_row()).unwrap();
        assert_eq!(
            todo,
            Todo {
                id: 1,
                title: "assist Borat".into(),
                done: false
            }
        );
    }

    #[test]
    fn test_mapping_columns_in_order() {
        let mapping = mapping();
        assert_eq!(mapping.columns(), vec!["id", "title", "is_done"]);
        assert_eq!(mapping.pairs().nth(2), Some(("done", "is_done")));
    }

    #[test]
    fn test_mapping_missing_column() {
        let row = Row::from_pairs([("id", 1i64)]);
        let err = mapping().decode(&row).unwrap_err();
        assert!(matches!(err, Error::Decode { ref column, .. } if column == "title"));
    }

    #[test]
    fn test_serde_deserialize_with_rename() {
        let todo: Todo = todo_row().deserialize().unwrap();
        assert_eq!(todo.title, "assist Borat");
        assert!(!todo.done);
    }

    #[test]
    fn test_serde_deserialize_type_error() {
        let row = Row::from_pairs([("id", "one"), ("title", "x")]);
        let result: Result<Todo> = row.deserialize();
        assert!(matches!(result, Err(Error::Decode { ref column, .. }) if column == "id"));
    }
}

//! serde deserializer over result rows

use crate::{Error, FromValue, Result, Row, Value};
use serde::de::{
    self, value::SeqDeserializer, DeserializeOwned, DeserializeSeed, Deserializer as _,
    Error as _, IntoDeserializer, MapAccess, Unexpected, Visitor,
};
use serde::forward_to_deserialize_any;

type DeError = serde_json::Error;

/// Decode `row` into `T`, reporting the offending column when a single
/// value fails to convert.
pub(crate) fn from_row<T>(row: &Row) -> Result<T>
where
    T: DeserializeOwned,
{
    let mut fields = RowFields::new(row.entries());
    T::deserialize(&mut fields).map_err(|e| match fields.current {
        Some(column) => Error::decode(column, e.to_string()),
        None => Error::Serialization(e),
    })
}

/// Map access over a row's columns. A repeated column name is skipped
/// after its first occurrence.
struct RowFields<'r> {
    entries: std::slice::Iter<'r, (String, Value)>,
    seen: Vec<&'r str>,
    current: Option<&'r str>,
    value: Option<&'r Value>,
}

impl<'r> RowFields<'r> {
    fn new(entries: &'r [(String, Value)]) -> Self {
        Self {
            entries: entries.iter(),
            seen: Vec::with_capacity(entries.len()),
            current: None,
            value: None,
        }
    }
}

impl<'de, 'r> de::Deserializer<'de> for &mut RowFields<'r> {
    type Error = DeError;

    fn deserialize_any<V>(self, visitor: V) -> std::result::Result<V::Value, DeError>
    where
        V: Visitor<'de>,
    {
        visitor.visit_map(self)
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct newtype_struct seq tuple
        tuple_struct map struct enum identifier ignored_any
    }
}

impl<'de, 'r> MapAccess<'de> for RowFields<'r> {
    type Error = DeError;

    fn next_key_seed<K>(&mut self, seed: K) -> std::result::Result<Option<K::Value>, DeError>
    where
        K: DeserializeSeed<'de>,
    {
        for (name, value) in self.entries.by_ref() {
            if self.seen.contains(&name.as_str()) {
                continue;
            }
            self.seen.push(name.as_str());
            self.current = Some(name.as_str());
            self.value = Some(value);
            return seed.deserialize(name.as_str().into_deserializer()).map(Some);
        }
        self.current = None;
        Ok(None)
    }

    fn next_value_seed<V>(&mut self, seed: V) -> std::result::Result<V::Value, DeError>
    where
        V: DeserializeSeed<'de>,
    {
        let value = self
            .value
            .take()
            .ok_or_else(|| DeError::custom("value requested before its column"))?;
        let decoded = seed.deserialize(ValueDeserializer(value))?;
        self.current = None;
        Ok(decoded)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.entries.len())
    }
}

/// Deserializer for a single column value. Integers stand in for booleans,
/// since SQLite has no boolean storage class.
struct ValueDeserializer<'r>(&'r Value);

impl<'de, 'r> de::Deserializer<'de> for ValueDeserializer<'r> {
    type Error = DeError;

    fn deserialize_any<V>(self, visitor: V) -> std::result::Result<V::Value, DeError>
    where
        V: Visitor<'de>,
    {
        match self.0 {
            Value::Null => visitor.visit_unit(),
            Value::Bool(b) => visitor.visit_bool(*b),
            Value::I32(i) => visitor.visit_i32(*i),
            Value::I64(i) => visitor.visit_i64(*i),
            Value::F32(f) => visitor.visit_f32(*f),
            Value::F64(f) => visitor.visit_f64(*f),
            Value::String(s) => visitor.visit_str(s),
            Value::Bytes(b) => visitor.visit_bytes(b),
            Value::Json(j) => j.clone().deserialize_any(visitor),
        }
    }

    fn deserialize_bool<V>(self, visitor: V) -> std::result::Result<V::Value, DeError>
    where
        V: Visitor<'de>,
    {
        match bool::from_value(self.0.clone()) {
            Some(b) => visitor.visit_bool(b),
            None => Err(DeError::invalid_type(unexpected(self.0), &visitor)),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> std::result::Result<V::Value, DeError>
    where
        V: Visitor<'de>,
    {
        match self.0 {
            Value::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_seq<V>(self, visitor: V) -> std::result::Result<V::Value, DeError>
    where
        V: Visitor<'de>,
    {
        match self.0 {
            Value::Bytes(b) => visitor.visit_seq(SeqDeserializer::new(b.iter().copied())),
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_newtype_struct<V>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> std::result::Result<V::Value, DeError>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> std::result::Result<V::Value, DeError>
    where
        V: Visitor<'de>,
    {
        match self.0 {
            Value::String(s) => visitor.visit_enum(s.as_str().into_deserializer()),
            Value::Json(j) => j.clone().deserialize_enum(name, variants, visitor),
            other => Err(DeError::invalid_type(unexpected(other), &visitor)),
        }
    }

    forward_to_deserialize_any! {
        i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct tuple tuple_struct map struct
        identifier ignored_any
    }
}

fn unexpected(value: &Value) -> Unexpected<'_> {
    match value {
        Value::Null => Unexpected::Unit,
        Value::Bool(b) => Unexpected::Bool(*b),
        Value::I32(i) => Unexpected::Signed(i64::from(*i)),
        Value::I64(i) => Unexpected::Signed(*i),
        Value::F32(f) => Unexpected::Float(f64::from(*f)),
        Value::F64(f) => Unexpected::Float(*f),
        Value::String(s) => Unexpected::Str(s.as_str()),
        Value::Bytes(b) => Unexpected::Bytes(b.as_slice()),
        Value::Json(_) => Unexpected::Other("JSON value"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Todo {
        id: i64,
        title: String,
        done: bool,
        user_id: Option<i64>,
    }

    #[derive(Debug, PartialEq, Deserialize)]
    #[serde(rename_all = "lowercase")]
    enum Priority {
        Low,
        High,
    }

    #[derive(Debug, PartialEq, Deserialize)]
    struct Tagged {
        priority: Priority,
        payload: Vec<u8>,
        meta: serde_json::Value,
    }

    #[test]
    fn test_integer_booleans() {
        let row = Row::from_pairs([
            ("id", Value::I64(1)),
            ("title", "milk".into()),
            ("done", Value::I64(1)),
            ("user_id", Value::Null),
        ]);
        let todo: Todo = from_row(&row).unwrap();
        assert_eq!(
            todo,
            Todo {
                id: 1,
                title: "milk".into(),
                done: true,
                user_id: None
            }
        );

        let row = Row::from_pairs([
            ("id", Value::I64(2)),
            ("title", "eggs".into()),
            ("done", Value::I64(0)),
            ("user_id", Value::I64(7)),
        ]);
        let todo: Todo = from_row(&row).unwrap();
        assert!(!todo.done);
        assert_eq!(todo.user_id, Some(7));
    }

    #[test]
    fn test_missing_option_column_is_none() {
        let row = Row::from_pairs([
            ("id", Value::I64(1)),
            ("title", "milk".into()),
            ("done", Value::Bool(false)),
        ]);
        let todo: Todo = from_row(&row).unwrap();
        assert_eq!(todo.user_id, None);
    }

    #[test]
    fn test_enum_bytes_and_json_columns() {
        let row = Row::from_pairs([
            ("priority", Value::from("high")),
            ("payload", Value::Bytes(vec![1, 2])),
            ("meta", Value::Json(serde_json::json!({"pinned": true}))),
        ]);
        let tagged: Tagged = from_row(&row).unwrap();
        assert_eq!(tagged.priority, Priority::High);
        assert_eq!(tagged.payload, vec![1, 2]);
        assert_eq!(tagged.meta["pinned"], true);
        assert_ne!(tagged.priority, Priority::Low);
    }

    #[test]
    fn test_bad_value_names_column() {
        let row = Row::from_pairs([
            ("id", Value::I64(1)),
            ("title", "milk".into()),
            ("done", Value::from("yes")),
        ]);
        let err = from_row::<Todo>(&row).unwrap_err();
        assert!(matches!(err, Error::Decode { ref column, .. } if column == "done"));
    }

    #[test]
    fn test_missing_required_column() {
        let row = Row::from_pairs([("id", Value::I64(1))]);
        let err = from_row::<Todo>(&row).unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }
}

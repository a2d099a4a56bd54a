//! Value types for SQL parameters and decoded columns

use serde::{Deserialize, Serialize};

/// A SQL value that can be bound as a parameter or read back from a row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// 32-bit integer
    I32(i32),
    /// 64-bit integer
    I64(i64),
    /// 32-bit float
    F32(f32),
    /// 64-bit float
    F64(f64),
    /// String value
    String(String),
    /// Bytes value
    Bytes(Vec<u8>),
    /// JSON value
    Json(serde_json::Value),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get the SQL type name for this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Bool(_) => "BOOLEAN",
            Value::I32(_) => "INTEGER",
            Value::I64(_) => "BIGINT",
            Value::F32(_) => "REAL",
            Value::F64(_) => "DOUBLE PRECISION",
            Value::String(_) => "TEXT",
            Value::Bytes(_) => "BLOB",
            Value::Json(_) => "JSON",
        }
    }

    /// Convert into a `serde_json::Value`
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::I32(i) => serde_json::Value::Number(serde_json::Number::from(*i)),
            Value::I64(i) => serde_json::Value::Number(serde_json::Number::from(*i)),
            Value::F32(f) => serde_json::Number::from_f64(f64::from(*f))
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::F64(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Bytes(b) => serde_json::Value::Array(
                b.iter()
                    .map(|byte| serde_json::Value::Number(serde_json::Number::from(*byte)))
                    .collect(),
            ),
            Value::Json(j) => j.clone(),
        }
    }

    fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I32(i) => Some(i64::from(*i)),
            Value::I64(i) => Some(*i),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }
}

// Implement From for common types
impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(val: bool) -> Self {
        Value::Bool(val)
    }
}

impl From<i32> for Value {
    fn from(val: i32) -> Self {
        Value::I32(val)
    }
}

impl From<i64> for Value {
    fn from(val: i64) -> Self {
        Value::I64(val)
    }
}

impl From<u32> for Value {
    fn from(val: u32) -> Self {
        Value::I64(i64::from(val))
    }
}

impl From<f32> for Value {
    fn from(val: f32) -> Self {
        Value::F32(val)
    }
}

impl From<f64> for Value {
    fn from(val: f64) -> Self {
        Value::F64(val)
    }
}

impl From<String> for Value {
    fn from(val: String) -> Self {
        Value::String(val)
    }
}

impl From<&str> for Value {
    fn from(val: &str) -> Self {
        Value::String(val.to_string())
    }
}

impl From<&String> for Value {
    fn from(val: &String) -> Self {
        Value::String(val.clone())
    }
}

impl From<Vec<u8>> for Value {
    fn from(val: Vec<u8>) -> Self {
        Value::Bytes(val)
    }
}

impl From<serde_json::Value> for Value {
    fn from(val: serde_json::Value) -> Self {
        Value::Json(val)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

#[cfg(feature = "uuid-support")]
impl From<uuid::Uuid> for Value {
    fn from(val: uuid::Uuid) -> Self {
        Value::String(val.to_string())
    }
}

#[cfg(feature = "datetime-support")]
impl From<chrono::NaiveDateTime> for Value {
    fn from(val: chrono::NaiveDateTime) -> Self {
        Value::String(val.format("%Y-%m-%d %H:%M:%S%.f").to_string())
    }
}

#[cfg(feature = "datetime-support")]
impl From<chrono::DateTime<chrono::Utc>> for Value {
    fn from(val: chrono::DateTime<chrono::Utc>) -> Self {
        Value::String(val.to_rfc3339())
    }
}

#[cfg(feature = "decimal-support")]
impl From<rust_decimal::Decimal> for Value {
    fn from(val: rust_decimal::Decimal) -> Self {
        Value::String(val.to_string())
    }
}

/// Conversion from a decoded column value back into a Rust type.
///
/// Returns `None` when the value has an incompatible type or is out of
/// range for the target.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Option<Self>;
}

impl FromValue for Value {
    fn from_value(value: Value) -> Option<Self> {
        Some(value)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(b),
            Value::I32(i) => Some(i != 0),
            Value::I64(i) => Some(i != 0),
            _ => None,
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Option<Self> {
        value.as_i64()
    }
}

impl FromValue for i32 {
    fn from_value(value: Value) -> Option<Self> {
        value.as_i64().and_then(|i| i32::try_from(i).ok())
    }
}

impl FromValue for u32 {
    fn from_value(value: Value) -> Option<Self> {
        value.as_i64().and_then(|i| u32::try_from(i).ok())
    }
}

impl FromValue for u64 {
    fn from_value(value: Value) -> Option<Self> {
        value.as_i64().and_then(|i| u64::try_from(i).ok())
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::F64(f) => Some(f),
            Value::F32(f) => Some(f64::from(f)),
            Value::I32(i) => Some(f64::from(i)),
            Value::I64(i) => Some(i as f64),
            _ => None,
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::F32(f) => Some(f),
            Value::F64(f) => Some(f as f32),
            _ => None,
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s),
            Value::Json(j) => Some(j.to_string()),
            _ => None,
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Bytes(b) => Some(b),
            Value::String(s) => Some(s.into_bytes()),
            _ => None,
        }
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Json(j) => Some(j),
            // SQLite stores JSON as TEXT
            Value::String(s) => serde_json::from_str(&s).ok(),
            Value::Null => Some(serde_json::Value::Null),
            other => Some(other.to_json()),
        }
    }
}

impl<T> FromValue for Option<T>
where
    T: FromValue,
{
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => Some(None),
            other => T::from_value(other).map(Some),
        }
    }
}

#[cfg(feature = "uuid-support")]
impl FromValue for uuid::Uuid {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::String(s) => uuid::Uuid::parse_str(&s).ok(),
            Value::Bytes(b) => uuid::Uuid::from_slice(&b).ok(),
            _ => None,
        }
    }
}

#[cfg(feature = "datetime-support")]
impl FromValue for chrono::NaiveDateTime {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::String(s) => s.parse().ok().or_else(|| {
                chrono::NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S%.f").ok()
            }),
            _ => None,
        }
    }
}

#[cfg(feature = "datetime-support")]
impl FromValue for chrono::DateTime<chrono::Utc> {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::String(s) => chrono::DateTime::parse_from_rfc3339(&s)
                .ok()
                .map(|dt| dt.with_timezone(&chrono::Utc)),
            _ => None,
        }
    }
}

#[cfg(feature = "decimal-support")]
impl FromValue for rust_decimal::Decimal {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::String(s) => s.parse().ok(),
            Value::I32(i) => Some(i.into()),
            Value::I64(i) => Some(i.into()),
            _ => None,
        }
    }
}

/// Trait for positional argument lists passed alongside a SQL fragment
///
/// # Examples
/// ```
/// use tabula_core::IntoArgs;
///
/// assert_eq!(().into_args().len(), 0);
/// assert_eq!(1i64.into_args().len(), 1);
/// assert_eq!((1, "done").into_args().len(), 2);
/// assert_eq!([3, 4, 5].into_args().len(), 3);
/// ```
pub trait IntoArgs {
    fn into_args(self) -> Vec<Value>;
}

impl IntoArgs for () {
    fn into_args(self) -> Vec<Value> {
        Vec::new()
    }
}

impl IntoArgs for Vec<Value> {
    fn into_args(self) -> Vec<Value> {
        self
    }
}

impl<T, const N: usize> IntoArgs for [T; N]
where
    T: Into<Value>,
{
    fn into_args(self) -> Vec<Value> {
        self.into_iter().map(Into::into).collect()
    }
}

macro_rules! scalar_args {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoArgs for $ty {
                fn into_args(self) -> Vec<Value> {
                    vec![self.into()]
                }
            }
        )*
    };
}

scalar_args!(Value, bool, i32, i64, u32, f32, f64, String, &str, &String, Vec<u8>);

macro_rules! tuple_args {
    ($($name:ident),+) => {
        impl<$($name),+> IntoArgs for ($($name,)+)
        where
            $($name: Into<Value>),+
        {
            #[allow(non_snake_case)]
            fn into_args(self) -> Vec<Value> {
                let ($($name,)+) = self;
                vec![$($name.into()),+]
            }
        }
    };
}

tuple_args!(A);
tuple_args!(A, B);
tuple_args!(A, B, C);
tuple_args!(A, B, C, D);
tuple_args!(A, B, C, D, E);
tuple_args!(A, B, C, D, E, F);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_creation() {
        assert_eq!(Value::from(42i32), Value::I32(42));
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from("hello"), Value::String("hello".to_string()));
        assert_eq!(Value::from(()), Value::Null);
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Value::from(Some(42i32)), Value::I32(42));
        assert_eq!(Value::from(None::<i32>), Value::Null);
    }

    #[test]
    fn test_type_names() {
        assert_eq!(Value::I32(42).type_name(), "INTEGER");
        assert_eq!(Value::String("test".to_string()).type_name(), "TEXT");
        assert_eq!(Value::Bytes(vec![1]).type_name(), "BLOB");
        assert_eq!(Value::Null.type_name(), "NULL");
    }

    #[test]
    fn test_integer_narrowing() {
        assert_eq!(i32::from_value(Value::I64(7)), Some(7));
        assert_eq!(i32::from_value(Value::I64(i64::from(i32::MAX) + 1)), None);
        assert_eq!(u32::from_value(Value::I64(-1)), None);
        assert_eq!(i64::from_value(Value::String("7".into())), None);
    }

    #[test]
    fn test_bool_from_integer_storage() {
        assert_eq!(bool::from_value(Value::I64(1)), Some(true));
        assert_eq!(bool::from_value(Value::I64(0)), Some(false));
        assert_eq!(bool::from_value(Value::String("true".into())), None);
    }

    #[test]
    fn test_optional_from_null() {
        assert_eq!(Option::<String>::from_value(Value::Null), Some(None));
        assert_eq!(
            Option::<String>::from_value(Value::String("x".into())),
            Some(Some("x".to_string()))
        );
        assert_eq!(Option::<String>::from_value(Value::I64(1)), None);
        assert_eq!(String::from_value(Value::Null), None);
    }

    #[test]
    fn test_json_from_text() {
        let decoded = serde_json::Value::from_value(Value::String(r#"{"a":1}"#.into()));
        assert_eq!(decoded, Some(serde_json::json!({"a": 1})));
    }

    #[test]
    fn test_into_args_shapes() {
        assert!(().into_args().is_empty());
        assert_eq!(5i64.into_args(), vec![Value::I64(5)]);
        assert_eq!(
            (1, "a", None::<i64>).into_args(),
            vec![Value::I32(1), Value::String("a".into()), Value::Null]
        );
        assert_eq!(["x", "y"].into_args().len(), 2);
        assert_eq!(vec![Value::Null].into_args(), vec![Value::Null]);
    }

    #[test]
    fn test_to_json() {
        assert_eq!(Value::I64(3).to_json(), serde_json::json!(3));
        assert_eq!(Value::Null.to_json(), serde_json::Value::Null);
        assert_eq!(Value::Bytes(vec![1, 2]).to_json(), serde_json::json!([1, 2]));
    }
}

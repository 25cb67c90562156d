//! Structured fields attached to log lines.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Key under which the capture time of each line is stored.
pub const TIME_KEY: &str = "time";

/// The value half of a [`Field`].
///
/// `Nil` fields are never written. `Opaque` carries a best-effort string
/// rendering of values that have no better representation.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Nil,
    Str(String),
    Int(i64),
    Uint(u64),
    Float(f64),
    Bool(bool),
    Bytes(Vec<u8>),
    Time(DateTime<Utc>),
    Duration(Duration),
    Error(String),
    Json(serde_json::Value),
    Opaque(String),
}

impl FieldValue {
    pub fn is_nil(&self) -> bool {
        matches!(self, FieldValue::Nil | FieldValue::Json(serde_json::Value::Null))
    }

    /// Renders an error through its `Display` impl.
    pub fn error(err: &(dyn std::error::Error + '_)) -> Self {
        FieldValue::Error(err.to_string())
    }

    /// Renders any value through its `Debug` impl.
    pub fn debug(value: &impl fmt::Debug) -> Self {
        FieldValue::Opaque(format!("{value:?}"))
    }

    /// Serializes a structured value; falls back to the type name if that fails.
    pub fn serialize<T: Serialize + ?Sized>(value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(json) => json.into(),
            Err(_) => FieldValue::Opaque(std::any::type_name::<T>().to_string()),
        }
    }
}

macro_rules! impl_from {
    ($variant:ident as $target:ty: $($ty:ty),+) => {
        $(
            impl From<$ty> for FieldValue {
                fn from(v: $ty) -> Self {
                    FieldValue::$variant(v as $target)
                }
            }
        )+
    };
    ($variant:ident into $target:ty: $($ty:ty),+) => {
        $(
            impl From<$ty> for FieldValue {
                fn from(v: $ty) -> Self {
                    FieldValue::$variant(<$target>::from(v))
                }
            }
        )+
    };
}

impl_from!(Str into String: String, &str, &String);
impl_from!(Int as i64: i8, i16, i32, i64, isize);
impl_from!(Uint as u64: u8, u16, u32, u64, usize);
impl_from!(Float as f64: f32, f64);
impl_from!(Bool as bool: bool);
impl_from!(Bytes into Vec<u8>: Vec<u8>, &[u8]);
impl_from!(Time into DateTime<Utc>: DateTime<Utc>);
impl_from!(Duration into Duration: Duration);

impl From<serde_json::Value> for FieldValue {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => FieldValue::Nil,
            other => FieldValue::Json(other),
        }
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(FieldValue::Nil, Into::into)
    }
}

/// One structured key/value attribute.
///
/// Keys are not validated, and repeated keys are kept as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub key: String,
    pub value: FieldValue,
}

impl Field {
    pub fn new(key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Shorthand for [`Field::new`].
pub fn field(key: impl Into<String>, value: impl Into<FieldValue>) -> Field {
    Field::new(key, value)
}

/// Turns key/value pairs into fields, in the iterator's order.
///
/// For hash maps that order is unspecified.
pub fn fields_from_map<K, V, I>(pairs: I) -> Vec<Field>
where
    K: Into<String>,
    V: Into<FieldValue>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs.into_iter().map(|(k, v)| Field::new(k, v)).collect()
}

/// Copies `fields`, appending `time = now` unless a non-nil `time` is present.
pub fn with_timestamp(fields: &[Field]) -> Vec<Field> {
    let has_time = fields
        .iter()
        .any(|f| f.key == TIME_KEY && !f.value.is_nil());

    let mut out = Vec::with_capacity(fields.len() + 1);
    out.extend_from_slice(fields);
    if !has_time {
        out.push(Field::new(TIME_KEY, Utc::now()));
    }
    out
}

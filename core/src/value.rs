//! Dynamically typed request parameter values.
//!
//! # Design
//! A configuration's parameters are heterogeneous: the same map may hold a
//! search string, a page number and a list of ids. `ParamValue` closes that
//! set into an enum so query encoding can dispatch on `ValueKind` without
//! runtime reflection, and so body serialization can reject values JSON has
//! no representation for.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde_json::{Map, Number, Value};
use url::Url;

/// Request parameters keyed by name.
pub type Parameters = BTreeMap<String, ParamValue>;

/// A single parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Bool(bool),
    String(String),
    Double(f64),
    Float(f32),
    Int(isize),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt(usize),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Url(Url),
    Date(DateTime<Utc>),
    Array(Vec<ParamValue>),
    Map(BTreeMap<String, ParamValue>),
}

/// Type tag of a `ParamValue`, used to pick a query encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    String,
    Double,
    Float,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Url,
    Date,
    Array,
    Map,
}

impl ValueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::Bool => "bool",
            ValueKind::String => "string",
            ValueKind::Double => "double",
            ValueKind::Float => "float",
            ValueKind::Int => "int",
            ValueKind::Int8 => "int8",
            ValueKind::Int16 => "int16",
            ValueKind::Int32 => "int32",
            ValueKind::Int64 => "int64",
            ValueKind::UInt => "uint",
            ValueKind::UInt8 => "uint8",
            ValueKind::UInt16 => "uint16",
            ValueKind::UInt32 => "uint32",
            ValueKind::UInt64 => "uint64",
            ValueKind::Url => "url",
            ValueKind::Date => "date",
            ValueKind::Array => "array",
            ValueKind::Map => "map",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ParamValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            ParamValue::Bool(_) => ValueKind::Bool,
            ParamValue::String(_) => ValueKind::String,
            ParamValue::Double(_) => ValueKind::Double,
            ParamValue::Float(_) => ValueKind::Float,
            ParamValue::Int(_) => ValueKind::Int,
            ParamValue::Int8(_) => ValueKind::Int8,
            ParamValue::Int16(_) => ValueKind::Int16,
            ParamValue::Int32(_) => ValueKind::Int32,
            ParamValue::Int64(_) => ValueKind::Int64,
            ParamValue::UInt(_) => ValueKind::UInt,
            ParamValue::UInt8(_) => ValueKind::UInt8,
            ParamValue::UInt16(_) => ValueKind::UInt16,
            ParamValue::UInt32(_) => ValueKind::UInt32,
            ParamValue::UInt64(_) => ValueKind::UInt64,
            ParamValue::Url(_) => ValueKind::Url,
            ParamValue::Date(_) => ValueKind::Date,
            ParamValue::Array(_) => ValueKind::Array,
            ParamValue::Map(_) => ValueKind::Map,
        }
    }

    /// Convert to a JSON value for a request body.
    ///
    /// Fails with a description for non-finite floats and for URL and date
    /// values, which have no JSON representation.
    pub fn to_json(&self) -> Result<Value, String> {
        Ok(match self {
            ParamValue::Bool(v) => Value::Bool(*v),
            ParamValue::String(v) => Value::String(v.clone()),
            ParamValue::Double(v) => finite_number(*v)?,
            ParamValue::Float(v) => finite_number(f64::from(*v))?,
            ParamValue::Int(v) => Value::from(*v),
            ParamValue::Int8(v) => Value::from(*v),
            ParamValue::Int16(v) => Value::from(*v),
            ParamValue::Int32(v) => Value::from(*v),
            ParamValue::Int64(v) => Value::from(*v),
            ParamValue::UInt(v) => Value::from(*v),
            ParamValue::UInt8(v) => Value::from(*v),
            ParamValue::UInt16(v) => Value::from(*v),
            ParamValue::UInt32(v) => Value::from(*v),
            ParamValue::UInt64(v) => Value::from(*v),
            ParamValue::Url(_) | ParamValue::Date(_) => {
                return Err(format!("{} values have no JSON representation", self.kind()));
            }
            ParamValue::Array(items) => Value::Array(
                items
                    .iter()
                    .map(ParamValue::to_json)
                    .collect::<Result<_, _>>()?,
            ),
            ParamValue::Map(entries) => Value::Object(map_to_json(entries)?),
        })
    }
}

/// Convert a parameter map into a JSON object.
pub fn map_to_json(entries: &BTreeMap<String, ParamValue>) -> Result<Map<String, Value>, String> {
    entries
        .iter()
        .map(|(key, value)| {
            value
                .to_json()
                .map(|json| (key.clone(), json))
                .map_err(|e| format!("`{key}`: {e}"))
        })
        .collect()
}

fn finite_number(v: f64) -> Result<Value, String> {
    Number::from_f64(v)
        .map(Value::Number)
        .ok_or_else(|| format!("{v} is not a finite number"))
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(v) => write!(f, "{v}"),
            ParamValue::String(v) => write!(f, "{v}"),
            ParamValue::Double(v) => write!(f, "{v}"),
            ParamValue::Float(v) => write!(f, "{v}"),
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::Int8(v) => write!(f, "{v}"),
            ParamValue::Int16(v) => write!(f, "{v}"),
            ParamValue::Int32(v) => write!(f, "{v}"),
            ParamValue::Int64(v) => write!(f, "{v}"),
            ParamValue::UInt(v) => write!(f, "{v}"),
            ParamValue::UInt8(v) => write!(f, "{v}"),
            ParamValue::UInt16(v) => write!(f, "{v}"),
            ParamValue::UInt32(v) => write!(f, "{v}"),
            ParamValue::UInt64(v) => write!(f, "{v}"),
            ParamValue::Url(v) => write!(f, "{v}"),
            ParamValue::Date(v) => write!(f, "{}", v.to_rfc3339()),
            ParamValue::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            ParamValue::Map(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for ParamValue {
                fn from(v: $ty) -> Self {
                    ParamValue::$variant(v)
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    String => String,
    f64 => Double,
    f32 => Float,
    isize => Int,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    usize => UInt,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    Url => Url,
    DateTime<Utc> => Date,
    BTreeMap<String, ParamValue> => Map,
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::String(v.to_owned())
    }
}

impl<T: Into<ParamValue>> From<Vec<T>> for ParamValue {
    fn from(items: Vec<T>) -> Self {
        ParamValue::Array(items.into_iter().map(Into::into).collect())
    }
}

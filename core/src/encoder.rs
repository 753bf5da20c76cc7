//! Query value encoders and their priority-ordered registry.
//!
//! # Design
//! Each `ValueEncoder` owns exactly one `ValueKind`. The registry resolves a
//! value by walking custom encoders (most recently registered first) and
//! then the built-ins in a fixed order; the first encoder whose kind equals
//! the value's kind wins. There is no coercion between kinds, so an `Int32`
//! value is never handled by the `Int64` encoder.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use url::Url;

use crate::error::RequestError;
use crate::value::{ParamValue, ValueKind};

/// Rust types that map one-to-one onto a scalar `ValueKind`.
pub trait Scalar: 'static {
    const KIND: ValueKind;

    fn extract(value: &ParamValue) -> Option<&Self>;
}

macro_rules! impl_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Scalar for $ty {
                const KIND: ValueKind = ValueKind::$variant;

                fn extract(value: &ParamValue) -> Option<&Self> {
                    match value {
                        ParamValue::$variant(v) => Some(v),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_scalar! {
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
}

type EncodeFn = dyn Fn(&ParamValue) -> Option<String> + Send + Sync;

/// Turns values of one kind into query string text.
#[derive(Clone)]
pub struct ValueEncoder {
    kind: ValueKind,
    encode: Arc<EncodeFn>,
}

impl ValueEncoder {
    /// Encoder for values of the Rust type `T`.
    ///
    /// ```
    /// use api_client_core::ValueEncoder;
    ///
    /// let yes_no = ValueEncoder::new(|v: &bool| String::from(if *v { "yes" } else { "no" }));
    /// ```
    pub fn new<T, F>(encode: F) -> Self
    where
        T: Scalar,
        F: Fn(&T) -> String + Send + Sync + 'static,
    {
        Self {
            kind: T::KIND,
            encode: Arc::new(move |value| T::extract(value).map(&encode)),
        }
    }

    /// Absolute URL string.
    pub fn url() -> Self {
        Self::new(|v: &Url| v.as_str().to_owned())
    }

    /// Seconds since the Unix epoch, with a fractional part when needed.
    pub fn date() -> Self {
        Self::new(|v: &DateTime<Utc>| (v.timestamp_millis() as f64 / 1000.0).to_string())
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn matches(&self, value: &ParamValue) -> bool {
        value.kind() == self.kind
    }

    /// Encode `value`, or `None` if it is not of this encoder's kind.
    pub fn encode(&self, value: &ParamValue) -> Option<String> {
        if !self.matches(value) {
            return None;
        }
        (self.encode)(value)
    }
}

impl fmt::Debug for ValueEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueEncoder").field("kind", &self.kind).finish()
    }
}

fn display<T: Scalar + ToString>() -> ValueEncoder {
    ValueEncoder::new(|v: &T| v.to_string())
}

/// Built-in encoders in resolution order.
pub fn builtin_encoders() -> Vec<ValueEncoder> {
    vec![
        display::<bool>(),
        ValueEncoder::new(|v: &String| v.clone()),
        display::<f64>(),
        display::<f32>(),
        display::<isize>(),
        display::<i8>(),
        display::<i16>(),
        display::<i32>(),
        display::<i64>(),
        display::<usize>(),
        display::<u8>(),
        display::<u16>(),
        display::<u32>(),
        display::<u64>(),
    ]
}

/// Ordered set of encoders consulted for every query parameter.
#[derive(Debug, Clone)]
pub struct EncoderRegistry {
    custom: Vec<ValueEncoder>,
    builtin: Vec<ValueEncoder>,
}

impl Default for EncoderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EncoderRegistry {
    pub fn new() -> Self {
        Self {
            custom: Vec::new(),
            builtin: builtin_encoders(),
        }
    }

    /// Add a custom encoder ahead of every encoder already present.
    pub fn register(&mut self, encoder: ValueEncoder) {
        self.custom.insert(0, encoder);
    }

    pub fn with(mut self, encoder: ValueEncoder) -> Self {
        self.register(encoder);
        self
    }

    /// All encoders in resolution order.
    pub fn encoders(&self) -> impl Iterator<Item = &ValueEncoder> {
        self.custom.iter().chain(self.builtin.iter())
    }

    pub fn encode(&self, value: &ParamValue) -> Result<String, RequestError> {
        self.encoders()
            .find_map(|encoder| encoder.encode(value))
            .ok_or_else(|| RequestError::NoEncoderAvailable {
                value: value.clone(),
            })
    }
}

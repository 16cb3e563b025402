//! Property store read by guard expressions

use std::collections::HashMap;
use std::fmt;

/// A loosely typed property value.
///
/// Guards only ever compare scalars, so this is a closed union rather than an
/// open dynamic type.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Scalar {
    /// Boolean value
    Bool(bool),
    /// Numeric value; integers are stored as `f64`
    Number(f64),
    /// String value
    Str(String),
}

impl Scalar {
    /// Returns the boolean if this is a `Bool`
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the number if this is a `Number`
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the string slice if this is a `Str`
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Str(s) => Some(s),
            _ => None,
        }
    }

    /// `false`, `0` and the empty string are falsy, everything else is truthy
    pub fn is_truthy(&self) -> bool {
        match self {
            Scalar::Bool(b) => *b,
            Scalar::Number(n) => *n != 0.0,
            Scalar::Str(s) => !s.is_empty(),
        }
    }

    /// Short name of the variant, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Scalar::Bool(_) => "bool",
            Scalar::Number(_) => "number",
            Scalar::Str(_) => "string",
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Number(n) => write!(f, "{n}"),
            Scalar::Str(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

macro_rules! scalar_from_number {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Scalar {
                fn from(value: $t) -> Self {
                    Scalar::Number(value as f64)
                }
            }
        )*
    };
}

scalar_from_number!(i8, i16, i32, i64, u8, u16, u32, u64, usize, f32, f64);

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Str(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Str(value)
    }
}

/// Flat name → value mapping. Last write wins, nothing else is remembered.
#[derive(Debug, Clone, Default)]
pub struct PropertyStore {
    values: HashMap<String, Scalar>,
}

impl PropertyStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property, returning the previous value if any
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Scalar>) -> Option<Scalar> {
        self.values.insert(name.into(), value.into())
    }

    /// Get a property
    pub fn get(&self, name: &str) -> Option<&Scalar> {
        self.values.get(name)
    }

    /// Get a property, falling back to `default` when it was never set
    pub fn get_or(&self, name: &str, default: impl Into<Scalar>) -> Scalar {
        self.values
            .get(name)
            .cloned()
            .unwrap_or_else(|| default.into())
    }

    /// Whether the property was ever set
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Number of properties
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no property was set
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over all properties in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Scalar)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

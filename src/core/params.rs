//! Decoded path parameters.
//!
//! A matched route carries its parameters either as an ordered sequence
//! (every placeholder unnamed) or as an ordered name → value mapping (at
//! least one placeholder named). The two modes never mix on one route.
use std::fmt;

use serde::{
    Serialize, Serializer,
    ser::{SerializeMap, SerializeSeq},
};

/// A single coerced parameter value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl ParamValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Float(value) => Some(*value),
            ParamValue::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(value) => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Str(value) => f.write_str(value),
            ParamValue::Int(value) => write!(f, "{value}"),
            ParamValue::Float(value) => write!(f, "{value}"),
            ParamValue::Bool(value) => write!(f, "{value}"),
        }
    }
}

/// Parameters extracted from a matched path.
///
/// Exact routes always produce an empty positional collection. The value is
/// also inserted into the request extensions by the dispatcher so middleware
/// and handlers can read individual named parameters with [`Params::get`].
#[derive(Debug, Clone, PartialEq)]
pub enum Params {
    Positional(Vec<ParamValue>),
    Named(Vec<(String, ParamValue)>),
}

impl Default for Params {
    fn default() -> Self {
        Params::Positional(Vec::new())
    }
}

impl Params {
    pub fn is_named(&self) -> bool {
        matches!(self, Params::Named(_))
    }

    pub fn len(&self) -> usize {
        match self {
            Params::Positional(values) => values.len(),
            Params::Named(pairs) => pairs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up a named parameter. Always `None` in positional mode.
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        match self {
            Params::Positional(_) => None,
            Params::Named(pairs) => pairs
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value),
        }
    }

    /// Parameter at `index` in template order, regardless of mode.
    pub fn at(&self, index: usize) -> Option<&ParamValue> {
        match self {
            Params::Positional(values) => values.get(index),
            Params::Named(pairs) => pairs.get(index).map(|(_, value)| value),
        }
    }

    /// Values in template order.
    pub fn values(&self) -> impl Iterator<Item = &ParamValue> {
        (0..self.len()).filter_map(move |index| self.at(index))
    }
}

impl Serialize for Params {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Params::Positional(values) => {
                let mut seq = serializer.serialize_seq(Some(values.len()))?;
                for value in values {
                    seq.serialize_element(value)?;
                }
                seq.end()
            }
            Params::Named(pairs) => {
                let mut map = serializer.serialize_map(Some(pairs.len()))?;
                for (key, value) in pairs {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

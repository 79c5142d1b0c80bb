use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single request parameter before stringification.
///
/// Deserializes from any JSON scalar, so inbound fields such as `subscription`
/// may be sent either as a string or as a number.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl ParamValue {
    /// `true` for an empty string, which callers treat the same as an absent field.
    pub fn is_blank(&self) -> bool {
        matches!(self, ParamValue::Str(s) if s.is_empty())
    }

    /// `true` for values a loose truthiness check rejects: `""`, `0`, `NaN`
    /// and `false`. Required identifiers such as `subscription` must not be falsy.
    pub fn is_falsy(&self) -> bool {
        match self {
            ParamValue::Bool(b) => !b,
            ParamValue::Int(i) => *i == 0,
            ParamValue::Float(v) => *v == 0.0 || v.is_nan(),
            ParamValue::Str(s) => s.is_empty(),
        }
    }
}

/// Renders the value the way the provider stringifies it before hashing:
/// integral numbers never carry a fractional part and booleans are spelled out.
impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{b}"),
            ParamValue::Int(i) => write!(f, "{i}"),
            ParamValue::Float(v) if v.is_nan() => f.write_str("NaN"),
            ParamValue::Float(v) if v.is_infinite() => {
                f.write_str(if *v > 0.0 { "Infinity" } else { "-Infinity" })
            }
            // Covers -0.0 as well.
            ParamValue::Float(v) if *v == 0.0 => f.write_str("0"),
            ParamValue::Float(v) if v.fract() == 0.0 && v.abs() < 1e21 => write!(f, "{v:.0}"),
            ParamValue::Float(v) => write!(f, "{v}"),
            ParamValue::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Str(value.to_owned())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Str(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

/// Flat parameter mapping that gets signed and sent to the provider.
///
/// Keys are kept sorted, so iteration order is already the canonical order.
/// It never contains the `signature` key: that only exists on [`SignedRequest`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignableRequest {
    params: BTreeMap<String, ParamValue>,
}

impl SignableRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.params.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.params.get(key)
    }

    /// Every value converted to its string form, still sorted by key.
    pub fn stringified(&self) -> BTreeMap<String, String> {
        self.params
            .iter()
            .map(|(k, v)| (k.clone(), v.to_string()))
            .collect()
    }

    /// Consumes the request and attaches a signature computed over it.
    pub fn into_signed(self, signature: String) -> SignedRequest {
        SignedRequest {
            params: self.stringified(),
            signature,
        }
    }
}

impl<K, V> FromIterator<(K, V)> for SignableRequest
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut request = SignableRequest::new();
        for (key, value) in iter {
            request.insert(key, value);
        }
        request
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignedRequest {
    params: BTreeMap<String, String>,
    signature: String,
}

impl SignedRequest {
    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    /// Pairs to form-encode: the parameters followed by `signature`.
    pub fn form_pairs(&self) -> Vec<(&str, &str)> {
        self.params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .chain(std::iter::once(("signature", self.signature.as_str())))
            .collect()
    }
}

//! Attribute values
//!
//! Attribute maps are loosely typed: a value may be a number, a string such
//! as `"50%"`, a flag, or a nested object (`{ id = "gradient-1" }`).

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

/// Attributes keyed by name, iterated in name order
pub type AttrMap = BTreeMap<String, AttrValue>;

/// Attribute maps keyed by selector
pub type SelectorAttrs = BTreeMap<String, AttrMap>;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Object(AttrMap),
}

impl AttrValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&AttrMap> {
        match self {
            AttrValue::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self, AttrValue::Object(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AttrValue::Null)
    }

    /// A string ending in `%`
    pub fn is_percentage(&self) -> bool {
        self.as_str().map_or(false, |s| s.ends_with('%'))
    }

    /// Leading numeric value, as in `"50%"` → 50 or `"12px"` → 12
    pub fn parse_float(&self) -> Option<f64> {
        match self {
            AttrValue::Number(n) => Some(*n),
            AttrValue::String(s) => parse_leading_float(s),
            _ => None,
        }
    }

    /// A finite number, or a string that is entirely one
    pub fn as_finite(&self) -> Option<f64> {
        let n = match self {
            AttrValue::Number(n) => *n,
            AttrValue::String(s) if s.trim().is_empty() => 0.0,
            AttrValue::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        n.is_finite().then_some(n)
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            AttrValue::Null => false,
            AttrValue::Bool(b) => *b,
            AttrValue::Number(n) => *n != 0.0 && !n.is_nan(),
            AttrValue::String(s) => !s.is_empty(),
            AttrValue::Object(_) => true,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Null => write!(f, "null"),
            AttrValue::Bool(b) => write!(f, "{}", b),
            AttrValue::Number(n) => write!(f, "{}", format_number(*n)),
            AttrValue::String(s) => write!(f, "{}", s),
            AttrValue::Object(map) => {
                let fields: Vec<String> = map.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
                write!(f, "{{{}}}", fields.join(", "))
            }
        }
    }
}

impl From<f64> for AttrValue {
    fn from(n: f64) -> Self {
        AttrValue::Number(n)
    }
}

impl From<i32> for AttrValue {
    fn from(n: i32) -> Self {
        AttrValue::Number(f64::from(n))
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        AttrValue::Bool(b)
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::String(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::String(s)
    }
}

impl From<AttrMap> for AttrValue {
    fn from(map: AttrMap) -> Self {
        AttrValue::Object(map)
    }
}

/// Build an [`AttrMap`] from name/value pairs
pub fn attr_map<K, V, I>(pairs: I) -> AttrMap
where
    K: Into<String>,
    V: Into<AttrValue>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Format a number the way attribute strings expect: `1` not `1.0`, no `-0`
pub fn format_number(n: f64) -> String {
    if n == 0.0 {
        return "0".to_string();
    }
    format!("{}", n)
}

/// `refWidth` → `ref-width`
pub fn to_kebab_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Recursively merge `source` into `target`; nested objects merge, anything else overwrites
pub fn deep_merge(target: &mut AttrMap, source: &AttrMap) {
    for (key, value) in source {
        match (target.get_mut(key), value) {
            (Some(AttrValue::Object(existing)), AttrValue::Object(incoming)) => {
                deep_merge(existing, incoming);
            }
            _ => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

fn parse_leading_float(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    let mut seen_exp = false;

    while end < bytes.len() {
        let c = bytes[end];
        match c {
            b'+' | b'-' if end == 0 => {}
            b'+' | b'-' if seen_exp && matches!(bytes[end - 1], b'e' | b'E') => {}
            b'0'..=b'9' => seen_digit = true,
            b'.' if !seen_dot && !seen_exp => seen_dot = true,
            b'e' | b'E' if seen_digit && !seen_exp => seen_exp = true,
            _ => break,
        }
        end += 1;
    }

    // back off a dangling exponent such as "5e" or "5e-"
    let mut candidate = &s[..end];
    while !candidate.is_empty() {
        if let Ok(n) = candidate.parse::<f64>() {
            return Some(n);
        }
        candidate = &candidate[..candidate.len() - 1];
    }
    None
}

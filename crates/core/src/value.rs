use std::fmt;

use serde::{Deserialize, Serialize};

/// A single table cell. `Missing` covers masked cells, empty strings and NaN.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Missing,
    Number(f64),
    Text(String),
}

impl Value {
    /// Parse raw text the way archive exports write it.
    pub fn from_input(input: &str) -> Self {
        let trimmed = input.trim();

        if trimmed.is_empty() || is_missing_marker(trimmed) {
            return Value::Missing;
        }

        match trimmed.parse::<f64>() {
            Ok(n) => Value::number(n),
            Err(_) => Value::Text(trimmed.to_string()),
        }
    }

    /// Numeric value; NaN becomes `Missing`.
    pub fn number(n: f64) -> Self {
        if n.is_nan() {
            Value::Missing
        } else {
            Value::Number(n)
        }
    }

    /// Text value; empty text becomes `Missing`.
    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.is_empty() {
            Value::Missing
        } else {
            Value::Text(s)
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn is_present(&self) -> bool {
        !self.is_missing()
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(s) => s.trim().parse::<f64>().ok().filter(|n| !n.is_nan()),
            Value::Missing => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Multiply a numeric value. Text and missing values pass through.
    pub fn scaled(&self, factor: f64) -> Self {
        match self {
            Value::Number(n) => Value::number(n * factor),
            other => other.clone(),
        }
    }

    /// Text used for CSV export and display. Missing is the empty string.
    pub fn to_display(&self) -> String {
        match self {
            Value::Missing => String::new(),
            Value::Number(n) => format!("{n}"),
            Value::Text(s) => s.clone(),
        }
    }
}

fn is_missing_marker(s: &str) -> bool {
    matches!(s, "nan" | "NaN" | "NAN" | "--" | "None" | "null")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::text(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::text(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Missing)
    }
}

/// Per-column metadata carried alongside the values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ColumnMeta {
    pub fn with_unit(unit: impl Into<String>) -> Self {
        Self {
            unit: Some(unit.into()),
            description: None,
        }
    }
}

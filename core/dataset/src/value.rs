//! FILENAME: core/dataset/src/value.rs
//! PURPOSE: Source-agnostic cell value.
//! CONTEXT: Every data-source collaborator (CSV, XLSX, SQL) reduces its native
//! cell type to this enum before handing rows to the `DatasetBuilder`.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Empty,
    Number(f64),
    Text(String),
}

impl Value {
    /// Interprets the value as a measure cell.
    /// `Empty` reads as zero; text is accepted when it parses as a number.
    pub fn as_measure(&self) -> Option<f64> {
        match self {
            Value::Empty => Some(0.0),
            Value::Number(n) => Some(*n),
            Value::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    Some(0.0)
                } else {
                    trimmed.parse::<f64>().ok()
                }
            }
        }
    }

    /// Interprets the value as a categorical label. Text is kept verbatim.
    pub fn into_category(self) -> String {
        match self {
            Value::Empty => String::new(),
            Value::Number(n) => format_number(n),
            Value::Text(s) => s,
        }
    }
}

/// Shortest display form: integral numbers drop the fractional part.
fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Empty => Ok(()),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_measure_reads_as_zero() {
        assert_eq!(Value::Empty.as_measure(), Some(0.0));
        assert_eq!(Value::Text("  ".to_string()).as_measure(), Some(0.0));
    }

    #[test]
    fn numeric_text_is_a_measure() {
        assert_eq!(Value::Text("1204".to_string()).as_measure(), Some(1204.0));
        assert_eq!(Value::Text("n/a".to_string()).as_measure(), None);
    }

    #[test]
    fn categories_are_not_normalized() {
        assert_eq!(Value::Text(" Urban ".to_string()).into_category(), " Urban ");
        assert_eq!(Value::Number(5.0).into_category(), "5");
        assert_eq!(Value::Number(2.5).into_category(), "2.5");
    }
}

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::schema::ColumnType;

/// Scalar attribute value. `Null` doubles as "absent" everywhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
}

impl Value {
    /// Null, or text that is empty/whitespace. Blank values never satisfy
    /// a required column and never count as a usable uid value.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Parse a raw string into a typed value for the given column type.
    /// An empty/whitespace string parses to `Null` regardless of type.
    pub fn parse_typed(kind: ColumnType, raw: &str) -> Result<Self, String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(Self::Null);
        }
        match kind {
            ColumnType::Text => Ok(Self::Text(raw.to_string())),
            ColumnType::Int => trimmed
                .parse::<i64>()
                .map(Self::Int)
                .map_err(|_| format!("cannot parse int '{raw}'")),
            ColumnType::Float => trimmed
                .parse::<f64>()
                .map(Self::Float)
                .map_err(|_| format!("cannot parse float '{raw}'")),
            ColumnType::Bool => match trimmed {
                "true" | "1" => Ok(Self::Bool(true)),
                "false" | "0" => Ok(Self::Bool(false)),
                _ => Err(format!("cannot parse bool '{raw}'")),
            },
            ColumnType::Date => NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .map(Self::Date)
                .map_err(|_| format!("cannot parse date '{raw}'")),
        }
    }

    /// Whether this value is storable under the given column type.
    /// `Null` fits every column; `Int` is accepted where `Float` is declared.
    pub fn fits(&self, kind: ColumnType) -> bool {
        matches!(
            (self, kind),
            (Self::Null, _)
                | (Self::Text(_), ColumnType::Text)
                | (Self::Int(_), ColumnType::Int)
                | (Self::Float(_), ColumnType::Float)
                | (Self::Int(_), ColumnType::Float)
                | (Self::Bool(_), ColumnType::Bool)
                | (Self::Date(_), ColumnType::Date)
        )
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => write!(f, "{s}"),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

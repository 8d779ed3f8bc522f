//! Attribute data types and typed attribute values.
//!
//! An Attributetype declares one of the 19 [`DataType`]s. Every Attribute
//! instance holds an [`AttributeValue`] of the matching variant, and its
//! serialized form (`svalue`) is always derived from that value.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use regex::Regex;
use std::sync::LazyLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use thiserror::Error;

/// Maximum length of a Char value.
pub const MAX_CHAR_LEN: usize = 100;

/// Errors raised while parsing or validating an attribute value.
#[derive(Debug, Error, PartialEq)]
pub enum ValueError {
    #[error("'{raw}' is not a valid {expected} value")]
    Parse { expected: DataType, raw: String },

    #[error("value of type {actual} does not match declared type {expected}")]
    Mismatch { expected: DataType, actual: DataType },

    #[error("{0}")]
    Constraint(String),

    #[error("unknown data type code: {0}")]
    UnknownCode(String),
}

// =============================================================================
// DATA TYPE
// =============================================================================

/// Primitive kind of an Attributetype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    #[default]
    Char,
    Text,
    Integer,
    CommaSeparatedInteger,
    BigInteger,
    PositiveInteger,
    Decimal,
    Float,
    Boolean,
    NullBoolean,
    Date,
    DateTime,
    Time,
    Email,
    File,
    FilePath,
    Image,
    Url,
    IpAddress,
}

impl DataType {
    pub const ALL: [DataType; 19] = [
        Self::Char,
        Self::Text,
        Self::Integer,
        Self::CommaSeparatedInteger,
        Self::BigInteger,
        Self::PositiveInteger,
        Self::Decimal,
        Self::Float,
        Self::Boolean,
        Self::NullBoolean,
        Self::Date,
        Self::DateTime,
        Self::Time,
        Self::Email,
        Self::File,
        Self::FilePath,
        Self::Image,
        Self::Url,
        Self::IpAddress,
    ];

    /// Numeric code ("1".."19") used at the import boundary.
    pub fn code(&self) -> u8 {
        match Self::ALL.iter().position(|t| t == self) {
            Some(idx) => idx as u8 + 1,
            None => 0,
        }
    }

    /// Looks up a data type by its numeric code.
    pub fn from_code(code: &str) -> Result<Self, ValueError> {
        code.trim()
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|idx| Self::ALL.get(idx).copied())
            .ok_or_else(|| ValueError::UnknownCode(code.to_string()))
    }

    /// Field name of the typed value, e.g. "CharField".
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::Char => "CharField",
            Self::Text => "TextField",
            Self::Integer => "IntegerField",
            Self::CommaSeparatedInteger => "CommaSeparatedIntegerField",
            Self::BigInteger => "BigIntegerField",
            Self::PositiveInteger => "PositiveIntegerField",
            Self::Decimal => "DecimalField",
            Self::Float => "FloatField",
            Self::Boolean => "BooleanField",
            Self::NullBoolean => "NullBooleanField",
            Self::Date => "DateField",
            Self::DateTime => "DateTimeField",
            Self::Time => "TimeField",
            Self::Email => "EmailField",
            Self::File => "FileField",
            Self::FilePath => "FilePathField",
            Self::Image => "ImageField",
            Self::Url => "URLField",
            Self::IpAddress => "IPAddressField",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

impl FromStr for DataType {
    type Err = ValueError;

    /// Accepts a numeric code, a field name ("CharField") or a snake_case
    /// name ("char").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.chars().all(|c| c.is_ascii_digit()) && !trimmed.is_empty() {
            return Self::from_code(trimmed);
        }
        let wanted = trimmed.to_ascii_lowercase().replace(['_', '-'], "");
        Self::ALL
            .iter()
            .copied()
            .find(|t| {
                let field = t.field_name().to_ascii_lowercase();
                field == wanted || field.trim_end_matches("field") == wanted
            })
            .ok_or_else(|| ValueError::UnknownCode(s.to_string()))
    }
}

// =============================================================================
// ATTRIBUTE VALUE
// =============================================================================

/// Strongly-typed value of an Attribute. One variant per [`DataType`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AttributeValue {
    Char(String),
    Text(String),
    Integer(i32),
    CommaSeparatedInteger(Vec<i64>),
    BigInteger(i64),
    PositiveInteger(u32),
    Decimal(String),
    Float(f64),
    Boolean(bool),
    NullBoolean(Option<bool>),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    Time(NaiveTime),
    Email(String),
    File(String),
    FilePath(String),
    Image(String),
    Url(String),
    IpAddress(IpAddr),
}

impl AttributeValue {
    /// The data type this value belongs to.
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Char(_) => DataType::Char,
            Self::Text(_) => DataType::Text,
            Self::Integer(_) => DataType::Integer,
            Self::CommaSeparatedInteger(_) => DataType::CommaSeparatedInteger,
            Self::BigInteger(_) => DataType::BigInteger,
            Self::PositiveInteger(_) => DataType::PositiveInteger,
            Self::Decimal(_) => DataType::Decimal,
            Self::Float(_) => DataType::Float,
            Self::Boolean(_) => DataType::Boolean,
            Self::NullBoolean(_) => DataType::NullBoolean,
            Self::Date(_) => DataType::Date,
            Self::DateTime(_) => DataType::DateTime,
            Self::Time(_) => DataType::Time,
            Self::Email(_) => DataType::Email,
            Self::File(_) => DataType::File,
            Self::FilePath(_) => DataType::FilePath,
            Self::Image(_) => DataType::Image,
            Self::Url(_) => DataType::Url,
            Self::IpAddress(_) => DataType::IpAddress,
        }
    }

    /// Serialized string form of the value.
    pub fn svalue(&self) -> String {
        match self {
            Self::Char(s)
            | Self::Text(s)
            | Self::Decimal(s)
            | Self::Email(s)
            | Self::File(s)
            | Self::FilePath(s)
            | Self::Image(s)
            | Self::Url(s) => s.clone(),
            Self::Integer(n) => n.to_string(),
            Self::BigInteger(n) => n.to_string(),
            Self::PositiveInteger(n) => n.to_string(),
            Self::CommaSeparatedInteger(list) => list
                .iter()
                .map(|n| n.to_string())
                .collect::<Vec<_>>()
                .join(","),
            Self::Float(f) => f.to_string(),
            Self::Boolean(b) => b.to_string(),
            Self::NullBoolean(Some(b)) => b.to_string(),
            Self::NullBoolean(None) => "unknown".to_string(),
            Self::Date(d) => d.format("%Y-%m-%d").to_string(),
            Self::DateTime(dt) => dt.to_rfc3339(),
            Self::Time(t) => t.format("%H:%M:%S").to_string(),
            Self::IpAddress(ip) => ip.to_string(),
        }
    }

    /// Parses a raw string into a value of the given type.
    pub fn parse(data_type: DataType, raw: &str) -> Result<Self, ValueError> {
        let invalid = || ValueError::Parse {
            expected: data_type,
            raw: raw.to_string(),
        };
        let trimmed = raw.trim();

        let value = match data_type {
            DataType::Char => Self::Char(raw.to_string()),
            DataType::Text => Self::Text(raw.to_string()),
            DataType::Integer => Self::Integer(trimmed.parse().map_err(|_| invalid())?),
            DataType::BigInteger => Self::BigInteger(trimmed.parse().map_err(|_| invalid())?),
            DataType::PositiveInteger => {
                Self::PositiveInteger(trimmed.parse().map_err(|_| invalid())?)
            }
            DataType::CommaSeparatedInteger => {
                let mut list = Vec::new();
                for part in trimmed.split(',') {
                    list.push(part.trim().parse::<i64>().map_err(|_| invalid())?);
                }
                Self::CommaSeparatedInteger(list)
            }
            DataType::Decimal => {
                if !DECIMAL.is_match(trimmed) {
                    return Err(invalid());
                }
                Self::Decimal(trimmed.to_string())
            }
            DataType::Float => Self::Float(trimmed.parse().map_err(|_| invalid())?),
            DataType::Boolean => Self::Boolean(parse_bool(trimmed).ok_or_else(invalid)?),
            DataType::NullBoolean => match trimmed.to_ascii_lowercase().as_str() {
                "" | "none" | "null" | "unknown" => Self::NullBoolean(None),
                other => Self::NullBoolean(Some(parse_bool(other).ok_or_else(invalid)?)),
            },
            DataType::Date => Self::Date(
                NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map_err(|_| invalid())?,
            ),
            DataType::DateTime => Self::DateTime(
                DateTime::parse_from_rfc3339(trimmed)
                    .map_err(|_| invalid())?
                    .with_timezone(&Utc),
            ),
            DataType::Time => Self::Time(
                NaiveTime::parse_from_str(trimmed, "%H:%M:%S")
                    .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
                    .map_err(|_| invalid())?,
            ),
            DataType::Email => Self::Email(trimmed.to_string()),
            DataType::File => Self::File(trimmed.to_string()),
            DataType::FilePath => Self::FilePath(trimmed.to_string()),
            DataType::Image => Self::Image(trimmed.to_string()),
            DataType::Url => Self::Url(trimmed.to_string()),
            DataType::IpAddress => Self::IpAddress(trimmed.parse().map_err(|_| invalid())?),
        };

        value.validate()?;
        Ok(value)
    }

    /// Checks the intrinsic constraints of the value's type.
    pub fn validate(&self) -> Result<(), ValueError> {
        match self {
            Self::Char(s) if s.chars().count() > MAX_CHAR_LEN => Err(ValueError::Constraint(
                format!("char value exceeds {} characters", MAX_CHAR_LEN),
            )),
            Self::Email(s) if !EMAIL.is_match(s) => {
                Err(ValueError::Parse {
                    expected: DataType::Email,
                    raw: s.clone(),
                })
            }
            Self::Url(s) => match reqwest::Url::parse(s) {
                Ok(url) if matches!(url.scheme(), "http" | "https" | "ftp" | "ftps") => Ok(()),
                _ => Err(ValueError::Parse {
                    expected: DataType::Url,
                    raw: s.clone(),
                }),
            },
            Self::Decimal(s) if !DECIMAL.is_match(s) => Err(ValueError::Parse {
                expected: DataType::Decimal,
                raw: s.clone(),
            }),
            Self::Float(f) if !f.is_finite() => Err(ValueError::Constraint(
                "float value must be finite".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// Checks the field-configuration metadata of an Attributetype.
    pub fn check_field_config(
        &self,
        max_digits: Option<u32>,
        decimal_places: Option<u32>,
        min_length: Option<u32>,
    ) -> Result<(), ValueError> {
        if let Self::Decimal(s) = self {
            let unsigned = s.trim_start_matches('-');
            let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
            if let Some(max) = max_digits {
                if (whole.len() + fraction.len()) as u32 > max {
                    return Err(ValueError::Constraint(format!(
                        "decimal value has more than {} digits",
                        max
                    )));
                }
            }
            if let Some(places) = decimal_places {
                if fraction.len() as u32 > places {
                    return Err(ValueError::Constraint(format!(
                        "decimal value has more than {} decimal places",
                        places
                    )));
                }
            }
        }

        if let Some(min) = min_length {
            if let Self::Char(s) | Self::Text(s) = self {
                if (s.chars().count() as u32) < min {
                    return Err(ValueError::Constraint(format!(
                        "value is shorter than {} characters",
                        min
                    )));
                }
            }
        }

        Ok(())
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.svalue())
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Some(true),
        "false" | "no" | "0" | "off" => Some(false),
        _ => None,
    }
}

static DECIMAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d+(\.\d+)?$").expect("decimal pattern"));

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern"));

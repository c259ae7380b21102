//! Value and `DataType` definitions for sqlbind.

use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Number of days between 0001-01-01 (CE day 1) and 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// SQL column and expression types.
///
/// `Invalid` is the unknown type. It marks an expression whose type has not
/// been derived yet. NULL literals and `*` keep it after binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DataType {
    #[default]
    Invalid,
    Boolean,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Decimal,
    Timestamp,
    Date,
    Varchar,
    Varbinary,
}

impl DataType {
    /// Returns the SQL name of the data type.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Invalid => "INVALID",
            DataType::Boolean => "BOOLEAN",
            DataType::TinyInt => "TINYINT",
            DataType::SmallInt => "SMALLINT",
            DataType::Integer => "INTEGER",
            DataType::BigInt => "BIGINT",
            DataType::Decimal => "DECIMAL",
            DataType::Timestamp => "TIMESTAMP",
            DataType::Date => "DATE",
            DataType::Varchar => "VARCHAR",
            DataType::Varbinary => "VARBINARY",
        }
    }

    /// Returns whether this type is an integer type.
    #[must_use]
    pub fn is_integral(&self) -> bool {
        matches!(
            self,
            DataType::TinyInt | DataType::SmallInt | DataType::Integer | DataType::BigInt
        )
    }

    /// Returns whether this type is numeric.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        self.is_integral() || *self == DataType::Decimal
    }

    /// Returns the widening rank of a numeric type.
    ///
    /// Returns None for non-numeric types.
    #[must_use]
    pub fn numeric_rank(&self) -> Option<u8> {
        match self {
            DataType::TinyInt => Some(0),
            DataType::SmallInt => Some(1),
            DataType::Integer => Some(2),
            DataType::BigInt => Some(3),
            DataType::Decimal => Some(4),
            _ => None,
        }
    }

    /// Returns the wider of two numeric types.
    ///
    /// Returns None if either type is not numeric.
    #[must_use]
    pub fn widest_numeric(self, other: DataType) -> Option<DataType> {
        match (self.numeric_rank(), other.numeric_rank()) {
            (Some(a), Some(b)) => Some(if a >= b { self } else { other }),
            _ => None,
        }
    }

    /// Returns the inclusive value range of an integer type.
    #[must_use]
    pub fn integral_range(&self) -> Option<(i64, i64)> {
        match self {
            DataType::TinyInt => Some((i64::from(i8::MIN), i64::from(i8::MAX))),
            DataType::SmallInt => Some((i64::from(i16::MIN), i64::from(i16::MAX))),
            DataType::Integer => Some((i64::from(i32::MIN), i64::from(i32::MAX))),
            DataType::BigInt => Some((i64::MIN, i64::MAX)),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Literal value carried by constant expressions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Boolean value.
    Boolean(bool),
    /// 8-bit signed integer value.
    TinyInt(i8),
    /// 16-bit signed integer value.
    SmallInt(i16),
    /// 32-bit signed integer value.
    Integer(i32),
    /// 64-bit signed integer value.
    BigInt(i64),
    /// Decimal value.
    Decimal(f64),
    /// Timestamp value (microseconds since Unix epoch).
    Timestamp(i64),
    /// Date value (days since Unix epoch).
    Date(i32),
    /// UTF-8 string value.
    Varchar(String),
    /// Raw bytes.
    Varbinary(Vec<u8>),
    /// Null value.
    Null,
}

impl Value {
    /// Creates a date value from a calendar date.
    #[must_use]
    pub fn date(date: NaiveDate) -> Self {
        Value::Date(date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
    }

    /// Creates a timestamp value from a naive (UTC) date-time.
    #[must_use]
    pub fn timestamp(ts: NaiveDateTime) -> Self {
        Value::Timestamp(ts.and_utc().timestamp_micros())
    }

    /// Returns true if this value is null.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the data type of this value, or None for Null.
    #[must_use]
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Boolean(_) => Some(DataType::Boolean),
            Value::TinyInt(_) => Some(DataType::TinyInt),
            Value::SmallInt(_) => Some(DataType::SmallInt),
            Value::Integer(_) => Some(DataType::Integer),
            Value::BigInt(_) => Some(DataType::BigInt),
            Value::Decimal(_) => Some(DataType::Decimal),
            Value::Timestamp(_) => Some(DataType::Timestamp),
            Value::Date(_) => Some(DataType::Date),
            Value::Varchar(_) => Some(DataType::Varchar),
            Value::Varbinary(_) => Some(DataType::Varbinary),
            Value::Null => None,
        }
    }

    /// Widens any integer value to i64.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::TinyInt(v) => Some(i64::from(*v)),
            Value::SmallInt(v) => Some(i64::from(*v)),
            Value::Integer(v) => Some(i64::from(*v)),
            Value::BigInt(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the calendar date of a date value.
    #[must_use]
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(days) => {
                NaiveDate::from_num_days_from_ce_opt(days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)?)
            }
            _ => None,
        }
    }

    /// Returns the date-time of a timestamp value.
    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Timestamp(micros) => {
                DateTime::from_timestamp_micros(*micros).map(|dt| dt.naive_utc())
            }
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(v) => write!(f, "{v}"),
            Value::TinyInt(v) => write!(f, "{v}"),
            Value::SmallInt(v) => write!(f, "{v}"),
            Value::Integer(v) => write!(f, "{v}"),
            Value::BigInt(v) => write!(f, "{v}"),
            Value::Decimal(v) => write!(f, "{v}"),
            Value::Date(_) => match self.as_date() {
                Some(date) => write!(f, "{}", date.format("%Y-%m-%d")),
                None => f.write_str("<invalid date>"),
            },
            Value::Timestamp(_) => match self.as_timestamp() {
                Some(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S%.f")),
                None => f.write_str("<invalid timestamp>"),
            },
            Value::Varchar(s) => write!(f, "'{s}'"),
            Value::Varbinary(bytes) => {
                f.write_str("\\x")?;
                for b in bytes {
                    write!(f, "{b:02x}")?;
                }
                Ok(())
            }
            Value::Null => f.write_str("NULL"),
        }
    }
}

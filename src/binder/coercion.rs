//! Literal type coercion.
//!
//! Used where a value is stored into a typed column (INSERT VALUES, UPDATE SET).

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::error::{BindError, Result};
use crate::parser::{ExprId, Expression, ExpressionKind, ParseResult};
use crate::types::{DataType, Value};

const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Builds a copy of expression `id` whose value has type `target`.
///
/// Constants (and casts of constants) are reinterpreted into a new constant.
/// A cast of any other expression that already yields `target` is copied.
/// Other numeric expressions headed for a numeric column are wrapped in a new
/// cast node. The source node is left untouched; the caller registers the
/// result in the parse result and rewrites the referencing slot.
///
/// # Errors
///
/// Returns [`BindError::ConversionError`] if the value cannot be represented
/// as `target`.
pub fn convert(pr: &ParseResult, id: ExprId, target: DataType) -> Result<Expression> {
    let expr = &pr[id];
    let constant = match &expr.kind {
        ExpressionKind::Constant(value) => Some(convert_value(value, target)?),
        ExpressionKind::TypeCast(cast_type) => {
            match expr.children.first().and_then(|&child| pr[child].as_constant()) {
                Some(value) => Some(convert_value(&convert_value(value, *cast_type)?, target)?),
                None if *cast_type == target => return Ok(expr.clone()),
                None => None,
            }
        }
        _ => None,
    };

    let mut converted = match constant {
        Some(value) => {
            let name = value.to_string();
            let mut converted = Expression::constant(value);
            converted.name = name;
            converted
        }
        None if expr.return_type.is_numeric() && target.is_numeric() => {
            let mut converted = Expression::cast(id, target);
            converted.depth = expr.depth;
            converted.has_subquery = expr.has_subquery;
            converted.name = format!("CAST({} AS {target})", expr.name);
            converted
        }
        None => {
            return Err(BindError::ConversionError {
                value: expr.name.clone(),
                target,
            })
        }
    };

    // Typed NULL keeps the target type.
    converted.return_type = target;
    if let Some(alias) = &expr.alias {
        converted.alias = Some(alias.clone());
        converted.name = alias.clone();
    }
    Ok(converted)
}

/// Reinterprets `value` as a value of type `target`.
///
/// # Errors
///
/// Returns [`BindError::ConversionError`] if the value cannot be parsed or
/// does not fit in `target`.
#[allow(clippy::cast_precision_loss)]
pub fn convert_value(value: &Value, target: DataType) -> Result<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    if value.data_type() == Some(target) {
        return Ok(value.clone());
    }

    let converted = match (value, target) {
        (Value::Varchar(s), _) => parse_string(s.trim(), target),
        (_, DataType::Varchar) => Some(Value::Varchar(value.to_string())),
        (Value::Decimal(f), _) if target.is_integral() => decimal_to_integral(*f, target),
        (_, DataType::Decimal) => value.as_i64().map(|v| Value::Decimal(v as f64)),
        (_, _) if target.is_integral() => value.as_i64().and_then(|v| integral_value(v, target)),
        (Value::Date(_), DataType::Timestamp) => value
            .as_date()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(Value::timestamp),
        _ => None,
    };

    converted.ok_or_else(|| BindError::ConversionError {
        value: value.to_string(),
        target,
    })
}

fn integral_value(v: i64, target: DataType) -> Option<Value> {
    match target {
        DataType::TinyInt => i8::try_from(v).ok().map(Value::TinyInt),
        DataType::SmallInt => i16::try_from(v).ok().map(Value::SmallInt),
        DataType::Integer => i32::try_from(v).ok().map(Value::Integer),
        DataType::BigInt => Some(Value::BigInt(v)),
        _ => None,
    }
}

#[allow(clippy::cast_precision_loss)]
fn decimal_to_integral(f: f64, target: DataType) -> Option<Value> {
    let (min, max) = target.integral_range()?;
    if !f.is_finite() || f.fract() != 0.0 || f < min as f64 || f > max as f64 {
        return None;
    }
    integral_value(f as i64, target)
}

fn parse_string(s: &str, target: DataType) -> Option<Value> {
    match target {
        DataType::Boolean => match s.to_ascii_lowercase().as_str() {
            "true" | "t" => Some(Value::Boolean(true)),
            "false" | "f" => Some(Value::Boolean(false)),
            _ => None,
        },
        DataType::TinyInt | DataType::SmallInt | DataType::Integer | DataType::BigInt => {
            s.parse::<i64>().ok().and_then(|v| integral_value(v, target))
        }
        DataType::Decimal => s
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Value::Decimal),
        DataType::Date => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .map(Value::date),
        DataType::Timestamp => parse_timestamp(s).map(Value::timestamp),
        DataType::Varbinary => Some(Value::Varbinary(s.as_bytes().to_vec())),
        DataType::Varchar | DataType::Invalid => None,
    }
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_utc()))
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

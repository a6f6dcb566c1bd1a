//! Value serializers
//!
//! A serializer transforms outbound body values before they are encoded and
//! converts inbound data into native types (`to_datetime`, `to_decimal`).

use crate::error::{ApiError, ApiResult};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

/// Pluggable value transformer
pub trait Serializer: Send + Sync {
    /// Transform an outbound value. The default walks objects and arrays and
    /// hands every scalar to [`Serializer::serialize_scalar`].
    fn serialize(&self, value: Value) -> Value {
        match value {
            Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, self.serialize(v)))
                    .collect(),
            ),
            Value::Array(items) => {
                Value::Array(items.into_iter().map(|v| self.serialize(v)).collect())
            }
            scalar => self.serialize_scalar(scalar),
        }
    }

    /// Transform one outbound scalar
    fn serialize_scalar(&self, value: Value) -> Value {
        value
    }

    /// Convert inbound data to a date-time
    fn to_datetime(&self, value: &Value) -> ApiResult<DateTime<FixedOffset>> {
        Err(ApiError::serializer(format!(
            "datetime conversion not supported for {value}"
        )))
    }

    /// Convert inbound data to a decimal
    fn to_decimal(&self, value: &Value) -> ApiResult<Decimal> {
        Err(ApiError::serializer(format!(
            "decimal conversion not supported for {value}"
        )))
    }
}

/// Serializer for ISO 8601 date-times and decimals.
///
/// Outbound values pass through unchanged: `chrono` date-times serialize to
/// RFC 3339 strings and `rust_decimal` values to decimal strings already.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleSerializer;

impl Serializer for SimpleSerializer {
    fn to_datetime(&self, value: &Value) -> ApiResult<DateTime<FixedOffset>> {
        match value {
            Value::String(s) => parse_datetime(s),
            Value::Number(n) => {
                let secs = n
                    .as_f64()
                    .ok_or_else(|| ApiError::serializer(format!("invalid timestamp {n}")))?;
                timestamp_to_datetime(secs)
            }
            other => Err(ApiError::serializer(format!("cannot convert {other} to datetime"))),
        }
    }

    fn to_decimal(&self, value: &Value) -> ApiResult<Decimal> {
        let raw = match value {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            other => {
                return Err(ApiError::serializer(format!("cannot convert {other} to decimal")));
            }
        };
        Decimal::from_str(&raw)
            .or_else(|_| Decimal::from_scientific(&raw))
            .map_err(|e| ApiError::serializer(format!("invalid decimal {raw}: {e}")))
    }
}

fn parse_datetime(s: &str) -> ApiResult<DateTime<FixedOffset>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt);
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(Utc.from_utc_datetime(&naive).fixed_offset());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&naive).fixed_offset());
        }
    }
    Err(ApiError::serializer(format!("invalid datetime {s}")))
}

fn timestamp_to_datetime(secs: f64) -> ApiResult<DateTime<FixedOffset>> {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let (whole, nanos) = (secs.floor() as i64, ((secs - secs.floor()) * 1e9) as u32);
    DateTime::from_timestamp(whole, nanos)
        .map(|dt| dt.fixed_offset())
        .ok_or_else(|| ApiError::serializer(format!("timestamp out of range: {secs}")))
}

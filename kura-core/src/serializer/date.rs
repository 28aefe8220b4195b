//! DateSerializer - ISO-8601 timestamp codec.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use super::Serializer;
use crate::error::{StorageError, StorageResult};

/// Serializer for datetime values.
///
/// Accepts the value form a `chrono::DateTime<Utc>` takes after serde
/// conversion: a string holding an RFC 3339 timestamp. Stores the
/// timestamp normalized to UTC with millisecond precision; anything else
/// is a type error. Round-trips datetimes to the millisecond.
#[derive(Debug, Default, Clone, Copy)]
pub struct DateSerializer;

impl DateSerializer {
    /// Create the serializer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn parse(text: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(text)
            .ok()
            .map(|parsed| parsed.with_timezone(&Utc))
    }

    fn format(datetime: &DateTime<Utc>) -> String {
        datetime.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

impl Serializer for DateSerializer {
    fn serialize(&self, value: &Value) -> StorageResult<String> {
        let text = value.as_str().ok_or_else(|| {
            StorageError::serialize(format!("value is not a datetime: {value}"))
        })?;
        let datetime = Self::parse(text).ok_or_else(|| {
            StorageError::serialize(format!("value is not a valid datetime: {text:?}"))
        })?;
        Ok(Self::format(&datetime))
    }

    fn deserialize(&self, text: &str) -> StorageResult<Value> {
        let datetime = Self::parse(text).ok_or_else(|| {
            StorageError::deserialize(format!("invalid datetime: {text:?}"))
        })?;
        Ok(Value::String(Self::format(&datetime)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_round_trip_millisecond_precision() {
        let serializer = DateSerializer::new();
        let datetime = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        let value = serde_json::to_value(datetime).unwrap();

        let text = serializer.serialize(&value).unwrap();
        let back = serializer.deserialize(&text).unwrap();

        let restored: DateTime<Utc> = serde_json::from_value(back).unwrap();
        assert_eq!(restored, datetime);
        assert_eq!(restored.timestamp_millis(), 1_700_000_000_123);
    }

    #[test]
    fn test_offset_input_is_normalized_to_utc() {
        let serializer = DateSerializer::new();
        let value = json!("2026-03-01T12:00:00.500+02:00");

        let text = serializer.serialize(&value).unwrap();

        assert_eq!(text, "2026-03-01T10:00:00.500Z");
    }

    #[test]
    fn test_non_string_value_is_a_type_error() {
        let serializer = DateSerializer::new();
        let result = serializer.serialize(&json!(42));
        assert!(matches!(result, Err(StorageError::Serialize(_))));
    }

    #[test]
    fn test_unparsable_string_is_a_type_error() {
        let serializer = DateSerializer::new();

        let result = serializer.serialize(&json!("not a date"));
        assert!(matches!(result, Err(StorageError::Serialize(_))));

        let result = serializer.deserialize("also not a date");
        assert!(matches!(result, Err(StorageError::Deserialize(_))));
    }
}

//! Custom scalars

use async_graphql::{InputValueError, InputValueResult, Scalar, ScalarType, Value};
use chrono::{DateTime, TimeZone, Utc};

/// Date scalar carried on the wire as an integer of epoch milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Date(pub DateTime<Utc>);

#[Scalar(name = "Date")]
impl ScalarType for Date {
    fn parse(value: Value) -> InputValueResult<Self> {
        match &value {
            Value::Number(n) => {
                let millis = n
                    .as_i64()
                    .ok_or_else(|| InputValueError::custom("Date expects an integer of epoch milliseconds"))?;
                Utc.timestamp_millis_opt(millis)
                    .single()
                    .map(Date)
                    .ok_or_else(|| InputValueError::custom("Date out of range"))
            }
            _ => Err(InputValueError::expected_type(value)),
        }
    }

    fn to_value(&self) -> Value {
        Value::Number(self.0.timestamp_millis().into())
    }
}

impl From<DateTime<Utc>> for Date {
    fn from(value: DateTime<Utc>) -> Self {
        Date(value)
    }
}

impl From<chrono::DateTime<chrono::FixedOffset>> for Date {
    fn from(value: chrono::DateTime<chrono::FixedOffset>) -> Self {
        Date(value.with_timezone(&Utc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_to_epoch_millis() {
        let date = Date(Utc.timestamp_millis_opt(1_700_000_000_123).unwrap());
        assert_eq!(date.to_value(), Value::Number(1_700_000_000_123i64.into()));
    }

    #[test]
    fn test_parses_epoch_millis() {
        let value = Value::Number(1_700_000_000_123i64.into());
        let date = <Date as ScalarType>::parse(value).unwrap();
        assert_eq!(date.0.timestamp_millis(), 1_700_000_000_123);
    }

    #[test]
    fn test_rejects_strings() {
        let value = Value::String("2023-11-14T22:13:20Z".to_string());
        assert!(<Date as ScalarType>::parse(value).is_err());
    }

    #[test]
    fn test_round_trip() {
        let original = Date(Utc.timestamp_millis_opt(42).unwrap());
        let parsed = <Date as ScalarType>::parse(original.to_value()).unwrap();
        assert_eq!(parsed, original);
    }
}

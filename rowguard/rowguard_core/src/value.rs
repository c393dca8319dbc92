//! Dynamic values.
//!
//! [`AccessValue`] is the closed set of value kinds that can appear in an
//! access context's attributes, in a decision environment, or as a raw
//! predicate operand. Integral kinds widen into [`AccessValue::Integer`] and
//! floating kinds into [`AccessValue::Float`] on conversion, so downstream
//! code only ever sees one numeric type of each family. Integral kinds wider
//! than 64 bits convert through [`TryFrom`].
//!
//! Deserialization is format-neutral: JSON and TOML documents both load, and
//! native TOML dates and times become [`AccessValue::Temporal`].

use chrono::{
    DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc,
};
use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::ValueError;

/// Field name under which the TOML deserializer hands out datetimes.
const TOML_DATETIME_FIELD: &str = "$__toml_private_datetime";

/// A date/time-like value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Temporal {
    /// A calendar date.
    Date(NaiveDate),

    /// A wall-clock time.
    Time(NaiveTime),

    /// A date and time without an offset.
    DateTime(NaiveDateTime),

    /// An instant in UTC.
    Timestamp(DateTime<Utc>),
}

impl Temporal {
    /// ISO-8601 text form of this value.
    pub fn to_iso8601(&self) -> String {
        match self {
            Self::Date(d) => d.format("%Y-%m-%d").to_string(),
            Self::Time(t) => t.format("%H:%M:%S%.f").to_string(),
            Self::DateTime(dt) => dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
            Self::Timestamp(ts) => ts.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        }
    }
}

impl Temporal {
    /// Parse the ISO-8601 forms produced by [`Temporal::to_iso8601`], plus
    /// offset timestamps, which are normalized to UTC.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
            return Some(Self::Timestamp(ts.with_timezone(&Utc)));
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
            return Some(Self::DateTime(dt));
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f") {
            return Some(Self::DateTime(dt));
        }
        if let Ok(d) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
            return Some(Self::Date(d));
        }
        NaiveTime::parse_from_str(text, "%H:%M:%S%.f")
            .ok()
            .map(Self::Time)
    }
}

impl fmt::Display for Temporal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

/// A dynamic value.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum AccessValue {
    /// Null value.
    #[default]
    Null,

    /// Boolean value.
    Bool(bool),

    /// Integer value.
    Integer(i64),

    /// Floating-point value.
    Float(f64),

    /// String value.
    String(String),

    /// Symbolic enum constant, identified by name.
    Enum(String),

    /// Date/time-like value.
    Temporal(Temporal),

    /// Array of values.
    Array(Vec<AccessValue>),

    /// Map of values.
    Map(BTreeMap<String, AccessValue>),
}

impl AccessValue {
    /// Create an enum value from its symbolic name.
    pub fn enumeration(name: impl Into<String>) -> Self {
        Self::Enum(name.into())
    }

    /// Name of this value's kind, used in diagnostics instead of the value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Enum(_) => "enum",
            Self::Temporal(_) => "temporal",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
        }
    }

    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Check if this value is a number (integer or float).
    pub fn is_number(&self) -> bool {
        matches!(self, Self::Integer(_) | Self::Float(_))
    }

    /// Check if this value is a string or a date/time-like value.
    pub fn is_text_or_temporal(&self) -> bool {
        matches!(self, Self::String(_) | Self::Temporal(_))
    }

    /// Check if this value is an array.
    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }

    /// Check if this value is a map.
    pub fn is_map(&self) -> bool {
        matches!(self, Self::Map(_))
    }

    /// Get this value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get this value as an integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get this value as a floating-point number.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Get this value as a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get this value as an array.
    pub fn as_array(&self) -> Option<&[AccessValue]> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Get this value as a map.
    pub fn as_map(&self) -> Option<&BTreeMap<String, AccessValue>> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Get a value from a map by key.
    pub fn get(&self, key: &str) -> Option<&AccessValue> {
        self.as_map().and_then(|m| m.get(key))
    }
}

impl<'de> Deserialize<'de> for AccessValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(AccessValueVisitor)
    }
}

struct AccessValueVisitor;

impl<'de> Visitor<'de> for AccessValueVisitor {
    type Value = AccessValue;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a scalar, date/time, array or map value")
    }

    fn visit_unit<E: de::Error>(self) -> Result<AccessValue, E> {
        Ok(AccessValue::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<AccessValue, E> {
        Ok(AccessValue::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<AccessValue, D::Error>
    where
        D: Deserializer<'de>,
    {
        AccessValue::deserialize(deserializer)
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> Result<AccessValue, E> {
        Ok(AccessValue::Bool(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<AccessValue, E> {
        Ok(AccessValue::Integer(value))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<AccessValue, E> {
        // Beyond i64 the value keeps its magnitude as a float
        Ok(i64::try_from(value)
            .map(AccessValue::Integer)
            .unwrap_or(AccessValue::Float(value as f64)))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<AccessValue, E> {
        Ok(AccessValue::Float(value))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<AccessValue, E> {
        Ok(AccessValue::String(value.to_string()))
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<AccessValue, E> {
        Ok(AccessValue::String(value))
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<AccessValue, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(AccessValue::Array(items))
    }

    fn visit_map<A>(self, mut map: A) -> Result<AccessValue, A::Error>
    where
        A: MapAccess<'de>,
    {
        let first: Option<String> = map.next_key()?;
        if first.as_deref() == Some(TOML_DATETIME_FIELD) {
            let text: String = map.next_value()?;
            return Temporal::parse(&text)
                .map(AccessValue::Temporal)
                .ok_or_else(|| de::Error::custom(format!("unsupported date/time '{}'", text)));
        }

        let mut entries = BTreeMap::new();
        if let Some(key) = first {
            entries.insert(key, map.next_value()?);
            while let Some((key, value)) = map.next_entry()? {
                entries.insert(key, value);
            }
        }
        Ok(AccessValue::Map(entries))
    }
}

impl From<serde_json::Value> for AccessValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => n.as_f64().map(Self::Float).unwrap_or(Self::Null),
            },
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(a) => Self::Array(a.into_iter().map(Self::from).collect()),
            serde_json::Value::Object(o) => {
                Self::Map(o.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

macro_rules! widen_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for AccessValue {
                fn from(value: $t) -> Self {
                    Self::Integer(i64::from(value))
                }
            }
        )*
    };
}

widen_integer!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! checked_integer {
    ($($t:ty),*) => {
        $(
            impl TryFrom<$t> for AccessValue {
                type Error = ValueError;

                fn try_from(value: $t) -> Result<Self, Self::Error> {
                    i64::try_from(value)
                        .map(Self::Integer)
                        .map_err(|_| ValueError::IntegerOutOfRange(stringify!($t)))
                }
            }
        )*
    };
}

checked_integer!(u64, i128, u128, usize, isize);

impl From<f32> for AccessValue {
    fn from(value: f32) -> Self {
        Self::Float(f64::from(value))
    }
}

impl From<f64> for AccessValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for AccessValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for AccessValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for AccessValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Temporal> for AccessValue {
    fn from(value: Temporal) -> Self {
        Self::Temporal(value)
    }
}

impl From<NaiveDate> for AccessValue {
    fn from(value: NaiveDate) -> Self {
        Self::Temporal(Temporal::Date(value))
    }
}

impl From<NaiveTime> for AccessValue {
    fn from(value: NaiveTime) -> Self {
        Self::Temporal(Temporal::Time(value))
    }
}

impl From<NaiveDateTime> for AccessValue {
    fn from(value: NaiveDateTime) -> Self {
        Self::Temporal(Temporal::DateTime(value))
    }
}

impl From<DateTime<Utc>> for AccessValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Temporal(Temporal::Timestamp(value))
    }
}

impl From<DateTime<FixedOffset>> for AccessValue {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Self::Temporal(Temporal::Timestamp(value.with_timezone(&Utc)))
    }
}

impl From<DateTime<Local>> for AccessValue {
    fn from(value: DateTime<Local>) -> Self {
        Self::Temporal(Temporal::Timestamp(value.with_timezone(&Utc)))
    }
}

impl<T: Into<AccessValue>> From<Vec<T>> for AccessValue {
    fn from(value: Vec<T>) -> Self {
        Self::Array(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<AccessValue>> From<Option<T>> for AccessValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Null)
    }
}

impl From<BTreeMap<String, AccessValue>> for AccessValue {
    fn from(value: BTreeMap<String, AccessValue>) -> Self {
        Self::Map(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_integer_widening() {
        assert_eq!(AccessValue::from(7u8), AccessValue::Integer(7));
        assert_eq!(AccessValue::from(-7i16), AccessValue::Integer(-7));
        assert_eq!(AccessValue::from(70_000u32), AccessValue::Integer(70_000));
        assert_eq!(AccessValue::from(1.5f32), AccessValue::Float(1.5));
    }

    #[test]
    fn test_type_predicates() {
        assert!(AccessValue::from(1).is_number());
        assert!(AccessValue::from(1.0).is_number());
        assert!(!AccessValue::from(true).is_number());
        assert!(AccessValue::from("x").is_text_or_temporal());
        assert!(AccessValue::from(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
            .is_text_or_temporal());
        assert!(!AccessValue::enumeration("ACTIVE").is_text_or_temporal());
    }

    #[test]
    fn test_temporal_iso8601() {
        let date = Temporal::Date(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
        assert_eq!(date.to_iso8601(), "2024-03-09");

        let dt = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(8, 5, 0)
            .unwrap();
        assert_eq!(Temporal::DateTime(dt).to_iso8601(), "2024-03-09T08:05:00");

        let ts = Utc.with_ymd_and_hms(2024, 3, 9, 8, 5, 0).unwrap();
        assert_eq!(Temporal::Timestamp(ts).to_iso8601(), "2024-03-09T08:05:00Z");

        let time = NaiveTime::from_hms_opt(23, 59, 1).unwrap();
        assert_eq!(Temporal::Time(time).to_iso8601(), "23:59:01");
    }

    #[test]
    fn test_from_json() {
        let json = serde_json::json!({
            "dept": [10, 11],
            "name": "alice",
            "ratio": 0.5,
            "active": true,
            "missing": null
        });
        let value = AccessValue::from(json);

        assert_eq!(
            value.get("dept"),
            Some(&AccessValue::Array(vec![
                AccessValue::Integer(10),
                AccessValue::Integer(11)
            ]))
        );
        assert_eq!(value.get("name").and_then(|v| v.as_str()), Some("alice"));
        assert_eq!(value.get("ratio").and_then(|v| v.as_float()), Some(0.5));
        assert_eq!(value.get("active").and_then(|v| v.as_bool()), Some(true));
        assert_eq!(value.get("missing"), Some(&AccessValue::Null));
    }

    #[test]
    fn test_serde_roundtrip_of_json_shapes() {
        let value = AccessValue::Array(vec![
            AccessValue::from("a"),
            AccessValue::from(2),
            AccessValue::Null,
        ]);
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"["a",2,null]"#);
        let back: AccessValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_wide_integers_are_checked() {
        assert_eq!(AccessValue::try_from(42u64), Ok(AccessValue::Integer(42)));
        assert_eq!(AccessValue::try_from(-3isize), Ok(AccessValue::Integer(-3)));
        assert_eq!(AccessValue::try_from(7usize), Ok(AccessValue::Integer(7)));
        assert_eq!(
            AccessValue::try_from(u64::MAX),
            Err(ValueError::IntegerOutOfRange("u64"))
        );
        assert_eq!(
            AccessValue::try_from(i128::MIN),
            Err(ValueError::IntegerOutOfRange("i128"))
        );
    }

    #[test]
    fn test_offset_timestamps_normalize_to_utc() {
        let offset = DateTime::parse_from_rfc3339("2024-03-09T10:05:00+02:00").unwrap();
        let expected = Utc.with_ymd_and_hms(2024, 3, 9, 8, 5, 0).unwrap();
        assert_eq!(AccessValue::from(offset), AccessValue::from(expected));

        let local = expected.with_timezone(&Local);
        assert_eq!(AccessValue::from(local), AccessValue::from(expected));
    }

    #[test]
    fn test_toml_datetimes_become_temporal() {
        #[derive(Deserialize)]
        struct Doc {
            values: Vec<AccessValue>,
        }

        let doc: Doc = toml::from_str(
            "values = [2024-01-01, 07:32:00, 2024-01-01T07:32:00, 2024-01-01T07:32:00-02:00]",
        )
        .unwrap();

        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let time = NaiveTime::from_hms_opt(7, 32, 0).unwrap();
        assert_eq!(
            doc.values,
            vec![
                AccessValue::from(date),
                AccessValue::from(time),
                AccessValue::from(date.and_time(time)),
                AccessValue::from(Utc.with_ymd_and_hms(2024, 1, 1, 9, 32, 0).unwrap()),
            ]
        );
    }

    #[test]
    fn test_toml_tables_stay_maps() {
        let value: AccessValue = toml::from_str("region = \"eu\"\nlevel = 3").unwrap();
        assert_eq!(value.get("region"), Some(&AccessValue::from("eu")));
        assert_eq!(value.get("level"), Some(&AccessValue::Integer(3)));
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(AccessValue::from(None::<i32>), AccessValue::Null);
        assert_eq!(AccessValue::from(Some("x")), AccessValue::from("x"));
    }
}

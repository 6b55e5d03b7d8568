use chrono::{DateTime, Datelike, NaiveDateTime, SecondsFormat, SubsecRound, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

use crate::error::{Result, SearchError};

/// Parse pattern matching the canonical form exactly
const CANONICAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// UTC timestamp with the canonical query/JSON representation used by the search API:
/// ISO 8601 extended format, millisecond precision and a literal `Z`,
/// e.g. `2019-03-22T10:07:01.000Z`.
///
/// Sub-millisecond precision is dropped on construction, so a `Time` always equals
/// the value parsed back from its canonical form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Time(DateTime<Utc>);

impl Time {
    /// Create a new Time from a UTC DateTime, truncated to milliseconds
    pub fn new(dt: DateTime<Utc>) -> Self {
        Time(dt.trunc_subsecs(3))
    }

    /// Current time, truncated to milliseconds
    pub fn now() -> Self {
        Time::new(Utc::now())
    }

    /// The wrapped UTC DateTime
    pub fn into_inner(self) -> DateTime<Utc> {
        self.0
    }

    /// Create a Time from a unix timestamp in milliseconds
    pub fn from_unix_millis(millis: i64) -> Result<Self> {
        Utc.timestamp_millis_opt(millis)
            .single()
            .map(Time)
            .ok_or_else(|| SearchError::Encoding(format!("timestamp {} ms is out of range", millis)))
    }

    /// Get the unix timestamp in seconds
    pub fn unix(&self) -> i64 {
        self.0.timestamp()
    }

    /// Get the timestamp in milliseconds
    pub fn unix_milli(&self) -> i64 {
        self.0.timestamp_millis()
    }

    /// Canonical string form.
    ///
    /// Fails when the year cannot be written with four digits.
    pub fn to_canonical(&self) -> Result<String> {
        let year = self.0.year();
        if !(0..=9999).contains(&year) {
            return Err(SearchError::Encoding(format!(
                "year {} has no canonical ISO 8601 form",
                year
            )));
        }
        Ok(self.0.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    /// Parse the canonical string form
    pub fn parse_canonical(raw: &str) -> Result<Self> {
        // chrono accepts signed years and single digit fields, the canonical grammar does not
        let time = NaiveDateTime::parse_from_str(raw, CANONICAL_FORMAT)
            .map(|naive| Time::new(naive.and_utc()))
            .map_err(|_| invalid_date(raw))?;
        match time.to_canonical() {
            Ok(canonical) if canonical == raw => Ok(time),
            _ => Err(invalid_date(raw)),
        }
    }
}

fn invalid_date(raw: &str) -> SearchError {
    SearchError::Parse(format!(
        "'{}' is not a date of the form YYYY-MM-DDTHH:MM:SS.mmmZ",
        raw
    ))
}

impl Deref for Time {
    type Target = DateTime<Utc>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Any offset is normalized to UTC
impl<Tz: TimeZone> From<DateTime<Tz>> for Time {
    fn from(dt: DateTime<Tz>) -> Self {
        Time::new(dt.with_timezone(&Utc))
    }
}

impl From<Time> for DateTime<Utc> {
    fn from(t: Time) -> Self {
        t.0
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

impl FromStr for Time {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        Time::parse_canonical(s)
    }
}

impl Serialize for Time {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let canonical = self.to_canonical().map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&canonical)
    }
}

impl<'de> Deserialize<'de> for Time {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Service responses carry RFC 3339 with arbitrary precision
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(Time::from)
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn test_canonical_format() {
        let time = Time::new(Utc.with_ymd_and_hms(2019, 3, 22, 10, 7, 1).unwrap());
        assert_eq!(time.to_canonical().unwrap(), "2019-03-22T10:07:01.000Z");
    }

    #[test]
    fn test_offset_normalized_to_utc() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let local = offset.with_ymd_and_hms(2019, 3, 22, 12, 7, 1).unwrap();
        let time = Time::from(local);
        assert_eq!(time.to_canonical().unwrap(), "2019-03-22T10:07:01.000Z");
    }

    #[test]
    fn test_millis_truncated() {
        let time = Time::from_unix_millis(1_553_249_221_123).unwrap();
        assert_eq!(time.to_canonical().unwrap(), "2019-03-22T10:07:01.123Z");
        assert_eq!(time.unix(), 1_553_249_221);
    }

    #[test]
    fn test_out_of_range() {
        assert!(matches!(
            Time::from_unix_millis(i64::MAX),
            Err(SearchError::Encoding(_))
        ));

        let far = Time::new(Utc.with_ymd_and_hms(12000, 1, 1, 0, 0, 0).unwrap());
        assert!(matches!(far.to_canonical(), Err(SearchError::Encoding(_))));
    }

    #[test]
    fn test_parse_canonical() {
        let time = Time::parse_canonical("2019-03-22T10:07:01.000Z").unwrap();
        assert_eq!(time.unix(), 1_553_249_221);

        for raw in [
            "2019-03-22T10:07:01Z",
            "2019-03-22T10:07:01.000+00:00",
            "2019-03-22 10:07:01.000Z",
            "2019-3-22T10:07:01.000Z",
            "+2019-3-22T10:07:01.000Z",
            "2019-03-22T10:07:01.0000Z",
            "not a date",
        ] {
            assert!(
                matches!(Time::parse_canonical(raw), Err(SearchError::Parse(_))),
                "accepted {}",
                raw
            );
        }
    }

    #[test]
    fn test_sub_millisecond_instants_truncated() {
        let precise = Utc.timestamp_opt(1_553_249_221, 123_456_789).unwrap();
        let time = Time::from(precise);
        assert_eq!(time.timestamp_subsec_nanos(), 123_000_000);

        let canonical = time.to_canonical().unwrap();
        assert_eq!(canonical, "2019-03-22T10:07:01.123Z");
        assert_eq!(Time::parse_canonical(&canonical).unwrap(), time);
        assert_eq!(Time::now().timestamp_subsec_nanos() % 1_000_000, 0);
    }

    #[test]
    fn test_time_json() {
        let time = Time::parse_canonical("2019-03-22T10:07:01.000Z").unwrap();
        let json = serde_json::to_string(&time).unwrap();
        assert_eq!(json, "\"2019-03-22T10:07:01.000Z\"");

        let parsed: Time = serde_json::from_str("\"2019-03-22T10:07:01.000123456Z\"").unwrap();
        assert_eq!(parsed.unix(), time.unix());
    }
}

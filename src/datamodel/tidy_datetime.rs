use hifitime::{Duration, UNIX_REF_EPOCH, Unit};
use serde::Serializer;

pub type TidyDateTime = hifitime::Epoch;

pub trait TidyDateTimeExt {
    fn from_unix_nanoseconds_i64(timestamp: i64) -> Self;
    fn from_unix_seconds_i64(timestamp: i64) -> Self;
    fn from_unix_nanoseconds_i128(timestamp: i128) -> Self;
    fn to_unix_nanoseconds_i128(&self) -> i128;

    /// Start of the bucket containing this instant, buckets being aligned
    /// on the unix epoch like InfluxDB's `GROUP BY time(..)`.
    fn floor_to_bucket(&self, bucket: Duration) -> Self;

    /// `%Y-%m-%d %H:%M:%S` in UTC.
    fn to_last_entry_string(&self) -> String;

    /// Calendar-free subtraction: `years * 365` days.
    fn years_before(&self, years: u32) -> Self;
}

impl TidyDateTimeExt for TidyDateTime {
    fn from_unix_nanoseconds_i64(timestamp: i64) -> Self {
        Self::from_utc_duration(UNIX_REF_EPOCH.to_utc_duration() + timestamp * Unit::Nanosecond)
    }

    fn from_unix_seconds_i64(timestamp: i64) -> Self {
        Self::from_utc_duration(UNIX_REF_EPOCH.to_utc_duration() + timestamp * Unit::Second)
    }

    fn from_unix_nanoseconds_i128(timestamp: i128) -> Self {
        Self::from_utc_duration(
            UNIX_REF_EPOCH.to_utc_duration() + Duration::from_total_nanoseconds(timestamp),
        )
    }

    fn to_unix_nanoseconds_i128(&self) -> i128 {
        (self.to_utc_duration() - UNIX_REF_EPOCH.to_utc_duration()).total_nanoseconds()
    }

    fn floor_to_bucket(&self, bucket: Duration) -> Self {
        let width = bucket.total_nanoseconds();
        if width <= 0 {
            return *self;
        }
        let nanos = self.to_unix_nanoseconds_i128();
        Self::from_unix_nanoseconds_i128(nanos.div_euclid(width) * width)
    }

    fn to_last_entry_string(&self) -> String {
        let (year, month, day, hour, minute, second, _) = self.to_gregorian_utc();
        format!(
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            year, month, day, hour, minute, second
        )
    }

    fn years_before(&self, years: u32) -> Self {
        let span = (i64::from(years) * 365) * Unit::Day;
        Self::from_unix_nanoseconds_i128(self.to_unix_nanoseconds_i128() - span.total_nanoseconds())
    }
}

/// Serde helper writing an instant as RFC 3339.
pub fn serialize_rfc3339<S: Serializer>(
    datetime: &TidyDateTime,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&datetime.to_rfc3339())
}

//! Row filters for store queries.
//!
//! A [`Filter`] is backend agnostic: it renders to an InfluxQL `WHERE`
//! condition through `Display`, and can be evaluated directly against a
//! point's time and tag set by stores that filter in process.

use crate::datamodel::TidyDateTime;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Tag `key` exactly equals `value`.
    ///
    /// Points that do not carry the tag never match.
    TagEquals { key: String, value: String },

    /// Point time strictly before the cutoff.
    OlderThan(TidyDateTime),

    /// Both filters must match.
    And(Box<Filter>, Box<Filter>),
}

impl Filter {
    pub fn tag_eq(key: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::TagEquals {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn older_than(cutoff: TidyDateTime) -> Self {
        Filter::OlderThan(cutoff)
    }

    pub fn and(self, other: Filter) -> Self {
        Filter::And(Box::new(self), Box::new(other))
    }

    pub fn matches(&self, time: TidyDateTime, tags: &BTreeMap<String, String>) -> bool {
        match self {
            Filter::TagEquals { key, value } => tags.get(key) == Some(value),
            Filter::OlderThan(cutoff) => time < *cutoff,
            Filter::And(left, right) => left.matches(time, tags) && right.matches(time, tags),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::TagEquals { key, value } => {
                write!(f, "{} = {}", quote_identifier(key), quote_literal(value))
            }
            Filter::OlderThan(cutoff) => {
                write!(f, "time < {}", quote_literal(&cutoff.to_rfc3339()))
            }
            Filter::And(left, right) => write!(f, "{} AND {}", left, right),
        }
    }
}

/// Double-quoted InfluxQL identifier.
pub fn quote_identifier(identifier: &str) -> String {
    format!(
        "\"{}\"",
        identifier.replace('\\', "\\\\").replace('"', "\\\"")
    )
}

/// Single-quoted InfluxQL string literal.
pub fn quote_literal(literal: &str) -> String {
    format!("'{}'", literal.replace('\\', "\\\\").replace('\'', "\\'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datamodel::TidyDateTimeExt;

    fn tags(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_tag_equals_matches() {
        let filter = Filter::tag_eq("tag_room", "kitchen");
        let now = TidyDateTime::from_unix_seconds_i64(0);
        assert!(filter.matches(now, &tags(&[("tag_room", "kitchen")])));
        assert!(!filter.matches(now, &tags(&[("tag_room", "garage")])));
        assert!(!filter.matches(now, &tags(&[])));
    }

    #[test]
    fn test_older_than_is_strict() {
        let cutoff = TidyDateTime::from_unix_seconds_i64(100);
        let filter = Filter::older_than(cutoff);
        assert!(filter.matches(TidyDateTime::from_unix_seconds_i64(99), &tags(&[])));
        assert!(!filter.matches(cutoff, &tags(&[])));
    }

    #[test]
    fn test_and_matches() {
        let filter = Filter::older_than(TidyDateTime::from_unix_seconds_i64(100))
            .and(Filter::tag_eq("host", "a"));
        assert!(filter.matches(TidyDateTime::from_unix_seconds_i64(1), &tags(&[("host", "a")])));
        assert!(!filter.matches(TidyDateTime::from_unix_seconds_i64(1), &tags(&[("host", "b")])));
        assert!(!filter.matches(TidyDateTime::from_unix_seconds_i64(200), &tags(&[("host", "a")])));
    }

    #[test]
    fn test_display_escapes_quotes() {
        assert_eq!(
            Filter::tag_eq("room", "o'brien").to_string(),
            "\"room\" = 'o\\'brien'"
        );
        assert_eq!(quote_identifier("we\"ird"), "\"we\\\"ird\"");
    }
}

//! The sync cursor: an instant in UTC.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::Checkpoint;

const SPACED_WITH_OFFSET: &str = "%Y-%m-%d %H:%M:%S%.f%:z";
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Largest effective `updated_at` already delivered to the index.
///
/// Only records strictly newer than the watermark are extracted. Text forms
/// without an offset are read as UTC; the canonical output is RFC 3339 with
/// a `Z` suffix and sub-second digits only when present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Watermark(DateTime<Utc>);

impl Watermark {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self(at)
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.0
    }

    /// Parse any of the accepted text forms.
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        let s = s.trim();

        if let Ok(at) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self(at.with_timezone(&Utc)));
        }
        if let Ok(at) = DateTime::parse_from_str(s, SPACED_WITH_OFFSET) {
            return Ok(Self(at.with_timezone(&Utc)));
        }
        for format in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
                return Ok(Self(naive.and_utc()));
            }
        }

        anyhow::bail!(
            "Invalid {} '{s}': expected RFC 3339 or 'YYYY-MM-DD HH:MM:SS[.ffffff][+HH:MM]'",
            Self::KIND
        )
    }
}

impl Checkpoint for Watermark {
    const KIND: &'static str = "watermark";

    fn to_cli_string(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }

    fn from_cli_string(s: &str) -> anyhow::Result<Self> {
        Self::parse(s)
    }
}

impl FromStr for Watermark {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Watermark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_cli_string())
    }
}

impl From<DateTime<Utc>> for Watermark {
    fn from(at: DateTime<Utc>) -> Self {
        Self(at)
    }
}

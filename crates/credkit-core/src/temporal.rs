//! UTC timestamps with whole-second precision.
//!
//! Proof `created` values are hashed after canonicalization, so their text is
//! part of the signed bytes. Every [`Timestamp`] renders as
//! `YYYY-MM-DDTHH:MM:SSZ`.

use chrono::{DateTime, SubsecRound, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A UTC instant truncated to seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// The current time.
    pub fn now() -> Self {
        Self(Utc::now().trunc_subsecs(0))
    }

    /// Parse an RFC 3339 string that ends in `Z`. Explicit offsets are
    /// rejected, `+00:00` included.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        if !s.ends_with('Z') {
            return Err(CoreError::Timestamp(format!(
                "expected a UTC timestamp ending in Z, got {s:?}"
            )));
        }
        Self::parse_lenient(s)
    }

    /// Parse any RFC 3339 string, converting its offset to UTC.
    ///
    /// Used for values read back from disk or from credentials issued
    /// elsewhere.
    pub fn parse_lenient(s: &str) -> Result<Self, CoreError> {
        let dt = DateTime::parse_from_rfc3339(s)
            .map_err(|e| CoreError::Timestamp(format!("{s:?}: {e}")))?;
        Ok(Self(dt.with_timezone(&Utc).trunc_subsecs(0)))
    }

    /// Seconds since the Unix epoch.
    pub fn epoch_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// `YYYY-MM-DDTHH:MM:SSZ`.
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl Serialize for Timestamp {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_iso8601())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse_lenient(&s).map_err(D::Error::custom)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

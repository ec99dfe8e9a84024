// Scoreline value type. The wire format is exactly `<home>-<away>` with both
// sides unsigned decimal integers; parsing is the only way to construct one
// from untrusted input.

use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid scoreline `{input}`: expected `<home>-<away>` with numeric sides")]
pub struct ParseScorelineError {
    pub input: String,
}

/// A full-time score or a member's predicted score, e.g. `2-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Scoreline {
    pub home: u32,
    pub away: u32,
}

impl Scoreline {
    pub fn new(home: u32, away: u32) -> Self {
        Self { home, away }
    }
}

impl FromStr for Scoreline {
    type Err = ParseScorelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseScorelineError {
            input: s.to_string(),
        };

        let (home, away) = s.split_once('-').ok_or_else(err)?;
        if home.is_empty()
            || away.is_empty()
            || !home.bytes().all(|b| b.is_ascii_digit())
            || !away.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(err());
        }

        Ok(Scoreline {
            home: home.parse().map_err(|_| err())?,
            away: away.parse().map_err(|_| err())?,
        })
    }
}

impl fmt::Display for Scoreline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.home, self.away)
    }
}

// Serialized as the `H-A` string so stored documents keep the original wire
// shape and scorelines can be used directly in JSON maps.
impl Serialize for Scoreline {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Scoreline {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

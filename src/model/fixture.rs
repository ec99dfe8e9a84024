// Fixtures and their identifiers.
//
// Fixture ids are derived from (season, gameweek, slot) at creation time and
// never change afterwards, regardless of what the upstream provider reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::Scoreline;

/// Team name used for fixtures that exist before the real schedule is known.
pub const PLACEHOLDER_TEAM: &str = "TBD";

// ---------------------------------------------------------------------------
// FixtureId
// ---------------------------------------------------------------------------

/// Stable fixture identifier of the form `s<season>-gw<n>-f<slot>`.
///
/// The slot index is allocated locally when the fixture is first created;
/// predictions key off this id, so it must survive upstream renumbering.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FixtureId(String);

impl FixtureId {
    pub fn new(season: &str, gameweek: u32, slot: u32) -> Self {
        FixtureId(format!("s{season}-gw{gameweek}-f{slot}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The slot index encoded in the id. Season names may themselves contain
    /// dashes, so the slot is recovered from the trailing `-f<n>` segment.
    pub fn slot(&self) -> Option<u32> {
        let (_, tail) = self.0.rsplit_once("-f")?;
        tail.parse().ok()
    }
}

impl std::fmt::Display for FixtureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// FixtureStatus
// ---------------------------------------------------------------------------

/// Match status as reported by the upstream provider, reduced to the states
/// the lock machine cares about.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FixtureStatus {
    Scheduled,
    InPlay,
    Paused,
    Finished,
    #[default]
    #[serde(other)]
    Unknown,
}

impl FixtureStatus {
    /// Map a raw upstream status string. `TIMED` and `SCHEDULED` both mean a
    /// future match; anything unrecognized is `Unknown` rather than an error.
    pub fn from_upstream(raw: &str) -> Self {
        match raw {
            "SCHEDULED" | "TIMED" => FixtureStatus::Scheduled,
            "IN_PLAY" => FixtureStatus::InPlay,
            "PAUSED" => FixtureStatus::Paused,
            "FINISHED" => FixtureStatus::Finished,
            _ => FixtureStatus::Unknown,
        }
    }
}

// ---------------------------------------------------------------------------
// Fixture
// ---------------------------------------------------------------------------

/// A single match inside a gameweek.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fixture {
    pub id: FixtureId,
    pub home: String,
    pub away: String,
    /// Kickoff time, when known. Placeholder fixtures have none.
    #[serde(default)]
    pub kickoff: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: FixtureStatus,
    /// Full-time result. Presence of a result marks the fixture finished
    /// even if the status field lags behind.
    #[serde(default)]
    pub result: Option<Scoreline>,
    /// The upstream provider's match id, used only as a reconciliation
    /// correlation hint. Never part of our own id.
    #[serde(default)]
    pub upstream_id: Option<u64>,
}

impl Fixture {
    /// A fixture with no teams or kickoff yet, created when a gameweek is
    /// added before the schedule has been synced.
    pub fn placeholder(id: FixtureId) -> Self {
        Fixture {
            id,
            home: PLACEHOLDER_TEAM.to_string(),
            away: PLACEHOLDER_TEAM.to_string(),
            kickoff: None,
            status: FixtureStatus::Unknown,
            result: None,
            upstream_id: None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.home == PLACEHOLDER_TEAM && self.away == PLACEHOLDER_TEAM
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

// The group document: the single unit of persistence and mutation.
//
// Everything a group owns (members, seasons, fixtures, predictions, settings,
// audit log) lives in one JSON document stored under `group:<id>`. Mutations
// are read-modify-write of the whole document; the newest write wins.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::model::{Fixture, FixtureId, PredictionMap, Scoreline};

// ---------------------------------------------------------------------------
// Gameweeks and seasons
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gameweek {
    pub number: u32,
    pub fixtures: Vec<Fixture>,
}

impl Gameweek {
    /// A gameweek of placeholder fixtures, created before the schedule is
    /// known. Slots are allocated from 0.
    pub fn placeholder(season: &str, number: u32, fixture_count: u32) -> Self {
        let fixtures = (0..fixture_count)
            .map(|slot| Fixture::placeholder(FixtureId::new(season, number, slot)))
            .collect();
        Gameweek { number, fixtures }
    }

    pub fn fixture(&self, id: &FixtureId) -> Option<&Fixture> {
        self.fixtures.iter().find(|f| &f.id == id)
    }

    pub fn fixture_mut(&mut self, id: &FixtureId) -> Option<&mut Fixture> {
        self.fixtures.iter_mut().find(|f| &f.id == id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Season {
    /// Season label, e.g. `2025-26`. Part of every fixture id in the season.
    pub name: String,
    pub gameweeks: Vec<Gameweek>,
}

impl Season {
    pub fn gameweek(&self, number: u32) -> Option<&Gameweek> {
        self.gameweeks.iter().find(|gw| gw.number == number)
    }

    pub fn gameweek_mut(&mut self, number: u32) -> Option<&mut Gameweek> {
        self.gameweeks.iter_mut().find(|gw| gw.number == number)
    }
}

/// Identifies a gameweek across seasons, for settings and audit entries.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GameweekKey {
    pub season: String,
    pub number: u32,
}

impl GameweekKey {
    pub fn new(season: impl Into<String>, number: u32) -> Self {
        GameweekKey {
            season: season.into(),
            number,
        }
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Which seasons standings range over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreScope {
    #[default]
    AllSeasons,
    CurrentSeason,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupSettings {
    #[serde(default)]
    pub score_scope: ScoreScope,
    /// Gameweeks hidden from non-admins (no reads, no writes).
    #[serde(default)]
    pub hidden_gameweeks: BTreeSet<GameweekKey>,
    /// The designated low-effort pick whose use can be capped.
    #[serde(default)]
    pub safe_scoreline: Option<Scoreline>,
    /// How many times per gameweek a member may submit the safe scoreline.
    /// `None` means unlimited.
    #[serde(default)]
    pub max_safe_per_gameweek: Option<u32>,
}

// ---------------------------------------------------------------------------
// Audit log
// ---------------------------------------------------------------------------

/// One admin override of a member's pick. Entries are append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub at: DateTime<Utc>,
    /// The admin who made the change.
    pub actor: String,
    /// The member whose pick was changed.
    pub member: String,
    pub fixture: FixtureId,
    pub gameweek: GameweekKey,
    pub previous: Option<Scoreline>,
    pub new: Option<Scoreline>,
}

// ---------------------------------------------------------------------------
// Group
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    /// 4-digit invite code. The `groupcode:<code>` store key maps it back to
    /// this group's id.
    pub code: String,
    pub creator: String,
    pub members: Vec<String>,
    pub admins: Vec<String>,
    pub seasons: Vec<Season>,
    pub current_season: String,
    pub current_gameweek: u32,
    #[serde(default)]
    pub settings: GroupSettings,
    #[serde(default)]
    pub predictions: PredictionMap,
    #[serde(default)]
    pub audit_log: Vec<AuditEntry>,
}

impl Group {
    /// Create a group with its first season and one placeholder gameweek.
    /// The creator is always both a member and an admin.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        creator: impl Into<String>,
        season: &str,
        placeholder_fixtures: u32,
    ) -> Self {
        let creator = creator.into();
        Group {
            id: id.into(),
            name: name.into(),
            code: Self::generate_invite_code(),
            creator: creator.clone(),
            members: vec![creator.clone()],
            admins: vec![creator],
            seasons: vec![Season {
                name: season.to_string(),
                gameweeks: vec![Gameweek::placeholder(season, 1, placeholder_fixtures)],
            }],
            current_season: season.to_string(),
            current_gameweek: 1,
            settings: GroupSettings::default(),
            predictions: PredictionMap::new(),
            audit_log: Vec::new(),
        }
    }

    /// A random 4-digit numeric invite code. Collision handling is the
    /// caller's concern (the `groupcode:` key is checked before use).
    pub fn generate_invite_code() -> String {
        rand::thread_rng().gen_range(1000..=9999u32).to_string()
    }

    pub fn is_member(&self, user: &str) -> bool {
        self.members.iter().any(|m| m == user)
    }

    pub fn is_admin(&self, user: &str) -> bool {
        self.admins.iter().any(|a| a == user)
    }

    /// Add a member. Idempotent.
    pub fn add_member(&mut self, user: &str) {
        if !self.is_member(user) {
            self.members.push(user.to_string());
        }
    }

    pub fn season(&self, name: &str) -> Option<&Season> {
        self.seasons.iter().find(|s| s.name == name)
    }

    pub fn season_mut(&mut self, name: &str) -> Option<&mut Season> {
        self.seasons.iter_mut().find(|s| s.name == name)
    }

    pub fn gameweek(&self, season: &str, number: u32) -> Option<&Gameweek> {
        self.season(season)?.gameweek(number)
    }

    pub fn gameweek_mut(&mut self, season: &str, number: u32) -> Option<&mut Gameweek> {
        self.season_mut(season)?.gameweek_mut(number)
    }

    pub fn is_hidden(&self, key: &GameweekKey) -> bool {
        self.settings.hidden_gameweeks.contains(key)
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

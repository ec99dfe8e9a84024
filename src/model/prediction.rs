// Prediction storage: an explicit member -> fixture -> scoreline mapping.
//
// Absence of an entry means "no pick"; there is no sentinel value. The map is
// part of the group document and serializes transparently as nested JSON
// objects keyed by member id and fixture id.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{FixtureId, Scoreline};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PredictionMap(BTreeMap<String, BTreeMap<FixtureId, Scoreline>>);

impl PredictionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, member: &str, fixture: &FixtureId) -> Option<Scoreline> {
        self.0.get(member)?.get(fixture).copied()
    }

    /// Insert or overwrite a pick. Returns the previous value, if any.
    pub fn set(&mut self, member: &str, fixture: FixtureId, pick: Scoreline) -> Option<Scoreline> {
        self.0
            .entry(member.to_string())
            .or_default()
            .insert(fixture, pick)
    }

    /// Remove a single pick. Returns the removed value, if any.
    pub fn remove(&mut self, member: &str, fixture: &FixtureId) -> Option<Scoreline> {
        let picks = self.0.get_mut(member)?;
        let removed = picks.remove(fixture);
        if picks.is_empty() {
            self.0.remove(member);
        }
        removed
    }

    /// Remove every member's pick for a fixture (used when a gameweek is
    /// cleared and its fixtures reset).
    pub fn remove_fixture(&mut self, fixture: &FixtureId) {
        self.0.retain(|_, picks| {
            picks.remove(fixture);
            !picks.is_empty()
        });
    }

    /// True if any member has a pick for this fixture.
    pub fn any_for_fixture(&self, fixture: &FixtureId) -> bool {
        self.0.values().any(|picks| picks.contains_key(fixture))
    }

    pub fn member_picks(&self, member: &str) -> Option<&BTreeMap<FixtureId, Scoreline>> {
        self.0.get(member)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

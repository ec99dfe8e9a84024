// Pick visibility: peers' predictions stay hidden until the viewer has
// submitted a pick for every fixture in the gameweek that is still open.
//
// Completion is derived on every read from the current fixture list and lock
// states, never persisted. When reconciliation adds a fixture the gate
// re-closes by itself; when the last fixture locks the requirement becomes
// vacuous and the view unlocks for everyone. Withheld picks are returned
// masked, not omitted, so callers can still render the full grid.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::lockout::{lock_state, LockState};
use crate::model::{Fixture, FixtureId, Gameweek, Group, Scoreline};

// ---------------------------------------------------------------------------
// View types
// ---------------------------------------------------------------------------

/// One cell of the picks grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PickCell {
    /// The pick is visible to the viewer. `None` means no pick was made.
    Revealed(Option<Scoreline>),
    /// The pick (or its absence) is withheld from the viewer.
    Hidden,
}

#[derive(Debug, Clone, Serialize)]
pub struct PickRow {
    pub member: String,
    /// One cell per fixture, in the gameweek's fixture order.
    pub picks: Vec<PickCell>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PicksView {
    /// Fixture ids in grid column order.
    pub fixtures: Vec<FixtureId>,
    pub rows: Vec<PickRow>,
    /// Whether the viewer has met the reveal requirement.
    pub viewer_complete: bool,
    /// Open fixtures the viewer still has to predict.
    pub remaining_open: usize,
}

// ---------------------------------------------------------------------------
// Gate evaluation
// ---------------------------------------------------------------------------

/// Fixtures in the gameweek that still accept predictions.
pub fn open_fixtures<'a>(gameweek: &'a Gameweek, now: DateTime<Utc>) -> Vec<&'a Fixture> {
    gameweek
        .fixtures
        .iter()
        .filter(|f| lock_state(f, now) == LockState::Open)
        .collect()
}

/// Open fixtures the member has not predicted yet.
pub fn remaining_open(group: &Group, member: &str, gameweek: &Gameweek, now: DateTime<Utc>) -> usize {
    open_fixtures(gameweek, now)
        .into_iter()
        .filter(|f| group.predictions.get(member, &f.id).is_none())
        .count()
}

/// True once the member has a pick for every currently-open fixture.
/// Vacuously true when no open fixtures remain.
pub fn has_completed(group: &Group, member: &str, gameweek: &Gameweek, now: DateTime<Utc>) -> bool {
    remaining_open(group, member, gameweek, now) == 0
}

/// Build the picks grid for `viewer`. The viewer always sees their own row;
/// peers' cells are masked until the viewer completes the gameweek.
pub fn build_view(group: &Group, viewer: &str, gameweek: &Gameweek, now: DateTime<Utc>) -> PicksView {
    let remaining = remaining_open(group, viewer, gameweek, now);
    let viewer_complete = remaining == 0;

    let rows = group
        .members
        .iter()
        .map(|member| {
            let reveal = viewer_complete || member == viewer;
            let picks = gameweek
                .fixtures
                .iter()
                .map(|f| {
                    if reveal {
                        PickCell::Revealed(group.predictions.get(member, &f.id))
                    } else {
                        PickCell::Hidden
                    }
                })
                .collect();
            PickRow {
                member: member.clone(),
                picks,
            }
        })
        .collect();

    PicksView {
        fixtures: gameweek.fixtures.iter().map(|f| f.id.clone()).collect(),
        rows,
        viewer_complete,
        remaining_open: remaining,
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FixtureStatus;

    const SEASON: &str = "2025-26";

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    /// Helper: group with two members and `n` open fixtures kicking off at
    /// 15:00.
    fn group_with_open_fixtures(n: u32) -> Group {
        let mut g = Group::new("g1", "League", "alice", SEASON, n);
        g.add_member("bob");
        let gw = g.gameweek_mut(SEASON, 1).unwrap();
        for (i, f) in gw.fixtures.iter_mut().enumerate() {
            f.home = format!("Home{i}");
            f.away = format!("Away{i}");
            f.kickoff = Some(at("2026-01-10T15:00:00Z"));
            f.status = FixtureStatus::Scheduled;
        }
        g
    }

    fn fx(slot: u32) -> FixtureId {
        FixtureId::new(SEASON, 1, slot)
    }

    fn gw(g: &Group) -> &Gameweek {
        g.gameweek(SEASON, 1).unwrap()
    }

    const BEFORE: &str = "2026-01-10T12:00:00Z";
    const AFTER: &str = "2026-01-10T16:00:00Z";

    // -- Gate flips at N-1 -> N --

    #[test]
    fn gate_opens_exactly_when_last_open_fixture_is_predicted() {
        let mut g = group_with_open_fixtures(3);
        g.predictions.set("alice", fx(0), Scoreline::new(1, 1));
        g.predictions.set("alice", fx(1), Scoreline::new(2, 0));

        let now = at(BEFORE);
        assert!(!has_completed(&g, "alice", gw(&g), now));
        assert_eq!(remaining_open(&g, "alice", gw(&g), now), 1);

        g.predictions.set("alice", fx(2), Scoreline::new(0, 0));
        assert!(has_completed(&g, "alice", gw(&g), now));
    }

    #[test]
    fn vacuous_completion_when_all_fixtures_locked() {
        let g = group_with_open_fixtures(2);
        // Nobody predicted anything, but kickoff has passed everywhere.
        let now = at(AFTER);
        assert!(has_completed(&g, "bob", gw(&g), now));
        assert_eq!(remaining_open(&g, "bob", gw(&g), now), 0);
    }

    #[test]
    fn only_open_fixtures_count_toward_the_gate() {
        let mut g = group_with_open_fixtures(2);
        // Fixture 0 locks early; bob only predicts fixture 1.
        g.gameweek_mut(SEASON, 1)
            .unwrap()
            .fixture_mut(&fx(0))
            .unwrap()
            .kickoff = Some(at("2026-01-10T11:00:00Z"));
        g.predictions.set("bob", fx(1), Scoreline::new(1, 0));

        assert!(has_completed(&g, "bob", gw(&g), at(BEFORE)));
    }

    // -- Masking --

    #[test]
    fn incomplete_viewer_sees_masked_peers_but_own_picks() {
        let mut g = group_with_open_fixtures(2);
        g.predictions.set("alice", fx(0), Scoreline::new(1, 1));
        g.predictions.set("bob", fx(0), Scoreline::new(2, 2));
        g.predictions.set("bob", fx(1), Scoreline::new(0, 1));

        let view = build_view(&g, "alice", gw(&g), at(BEFORE));
        assert!(!view.viewer_complete);
        assert_eq!(view.remaining_open, 1);
        assert_eq!(view.fixtures.len(), 2);

        let alice_row = view.rows.iter().find(|r| r.member == "alice").unwrap();
        assert_eq!(alice_row.picks[0], PickCell::Revealed(Some(Scoreline::new(1, 1))));
        assert_eq!(alice_row.picks[1], PickCell::Revealed(None));

        // Bob's picks are masked, not omitted.
        let bob_row = view.rows.iter().find(|r| r.member == "bob").unwrap();
        assert_eq!(bob_row.picks.len(), 2);
        assert!(bob_row.picks.iter().all(|c| *c == PickCell::Hidden));
    }

    #[test]
    fn complete_viewer_sees_everything_including_absences() {
        let mut g = group_with_open_fixtures(2);
        g.predictions.set("alice", fx(0), Scoreline::new(1, 1));
        g.predictions.set("alice", fx(1), Scoreline::new(2, 0));
        g.predictions.set("bob", fx(0), Scoreline::new(2, 2));

        let view = build_view(&g, "alice", gw(&g), at(BEFORE));
        assert!(view.viewer_complete);

        let bob_row = view.rows.iter().find(|r| r.member == "bob").unwrap();
        assert_eq!(bob_row.picks[0], PickCell::Revealed(Some(Scoreline::new(2, 2))));
        // Absence of a pick is revealed as an empty cell, not hidden.
        assert_eq!(bob_row.picks[1], PickCell::Revealed(None));
    }

    #[test]
    fn gate_recloses_when_a_new_open_fixture_appears() {
        let mut g = group_with_open_fixtures(1);
        g.predictions.set("alice", fx(0), Scoreline::new(1, 1));
        assert!(has_completed(&g, "alice", gw(&g), at(BEFORE)));

        // Reconciliation appends a new open fixture the viewer hasn't picked.
        let mut extra = Fixture::placeholder(fx(1));
        extra.home = "Home1".to_string();
        extra.away = "Away1".to_string();
        extra.kickoff = Some(at("2026-01-11T15:00:00Z"));
        extra.status = FixtureStatus::Scheduled;
        g.gameweek_mut(SEASON, 1).unwrap().fixtures.push(extra);

        assert!(!has_completed(&g, "alice", gw(&g), at(BEFORE)));
        let view = build_view(&g, "alice", gw(&g), at(BEFORE));
        assert!(!view.viewer_complete);
        assert_eq!(view.remaining_open, 1);
    }

    // -- Per-member evaluation --

    #[test]
    fn gate_is_evaluated_per_member() {
        let mut g = group_with_open_fixtures(1);
        g.predictions.set("alice", fx(0), Scoreline::new(1, 1));

        let now = at(BEFORE);
        assert!(has_completed(&g, "alice", gw(&g), now));
        assert!(!has_completed(&g, "bob", gw(&g), now));

        let bob_view = build_view(&g, "bob", gw(&g), now);
        let alice_row = bob_view.rows.iter().find(|r| r.member == "alice").unwrap();
        assert!(alice_row.picks.iter().all(|c| *c == PickCell::Hidden));
    }
}

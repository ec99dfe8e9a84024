// Fixture reconciliation: merge an upstream matchday snapshot into a
// gameweek's fixture list without disturbing prediction keys.
//
// Matching runs in two passes (upstream correlation id, then normalized name
// pair); anything still unmatched is appended with a freshly allocated slot.
// Old fixtures that upstream no longer reports survive only if someone has
// predicted them. The whole thing is a pure function over snapshots; the
// caller decides what to do with the outcome.

use tracing::{debug, info};

use crate::model::{Fixture, FixtureId, PredictionMap};
use crate::sync::upstream::UpstreamMatch;

// ---------------------------------------------------------------------------
// Outcome types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// Existing fixtures updated in place.
    pub matched: usize,
    /// Upstream matches appended as new fixtures.
    pub added: usize,
    /// Unmatched old fixtures kept because they carry predictions.
    pub retained: usize,
    /// Unmatched old fixtures with no predictions, removed.
    pub dropped: usize,
}

#[derive(Debug, Clone)]
pub enum ReconcileOutcome {
    /// Upstream returned nothing; the gameweek is left untouched.
    NoMatches,
    /// The new fixture list to store, with counts for reporting.
    Updated {
        fixtures: Vec<Fixture>,
        summary: ReconcileSummary,
    },
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

/// Merge `upstream` into `current` for one gameweek.
///
/// Fixture ids derive from (season, gameweek, slot) and never change once
/// assigned; the upstream match id is only a correlation hint. Running the
/// same upstream input twice yields the same id set and field values.
///
/// Old fixtures that upstream no longer reports are dropped unless at least
/// one member has predicted them: an unpicked fixture has no state worth
/// keeping, and a later sync that reports it again simply re-adds it.
pub fn reconcile(
    season: &str,
    gameweek: u32,
    current: &[Fixture],
    upstream: &[UpstreamMatch],
    predictions: &PredictionMap,
) -> ReconcileOutcome {
    if upstream.is_empty() {
        info!(season, gameweek, "upstream returned no matches; keeping current fixtures");
        return ReconcileOutcome::NoMatches;
    }

    // Wholesale replacement is safe when nothing references the old list:
    // either it only ever held placeholders, or nobody has predicted any of
    // its fixtures yet.
    let all_placeholder = current.iter().all(Fixture::is_placeholder);
    let any_predicted = current.iter().any(|f| predictions.any_for_fixture(&f.id));
    if current.is_empty() || all_placeholder || !any_predicted {
        let fixtures: Vec<Fixture> = upstream
            .iter()
            .enumerate()
            .map(|(slot, m)| build_fixture(FixtureId::new(season, gameweek, slot as u32), m))
            .collect();
        let summary = ReconcileSummary {
            added: fixtures.len(),
            ..ReconcileSummary::default()
        };
        info!(season, gameweek, added = summary.added, "replaced fixtures wholesale");
        return ReconcileOutcome::Updated { fixtures, summary };
    }

    // Pass 1: match by the upstream correlation id.
    let mut claimed_by: Vec<Option<usize>> = vec![None; current.len()];
    let mut upstream_used = vec![false; upstream.len()];

    for (ci, fixture) in current.iter().enumerate() {
        let Some(up_id) = fixture.upstream_id else {
            continue;
        };
        if let Some(ui) = upstream
            .iter()
            .position(|m| m.id == up_id)
            .filter(|&ui| !upstream_used[ui])
        {
            claimed_by[ci] = Some(ui);
            upstream_used[ui] = true;
        }
    }

    // Pass 2: match leftovers by (home, away) name pair.
    for (ci, fixture) in current.iter().enumerate() {
        if claimed_by[ci].is_some() {
            continue;
        }
        let found = upstream.iter().enumerate().find(|(ui, m)| {
            !upstream_used[*ui] && m.home == fixture.home && m.away == fixture.away
        });
        if let Some((ui, _)) = found {
            claimed_by[ci] = Some(ui);
            upstream_used[ui] = true;
        }
    }

    let mut summary = ReconcileSummary::default();
    let mut fixtures: Vec<Fixture> = Vec::with_capacity(current.len());

    for (ci, fixture) in current.iter().enumerate() {
        match claimed_by[ci] {
            Some(ui) => {
                // Matched: keep the id, take the upstream's current view of
                // everything else (including corrected team names).
                fixtures.push(build_fixture(fixture.id.clone(), &upstream[ui]));
                summary.matched += 1;
            }
            None if predictions.any_for_fixture(&fixture.id) => {
                fixtures.push(fixture.clone());
                summary.retained += 1;
            }
            None => {
                debug!(fixture = %fixture.id, "dropping unmatched fixture with no predictions");
                summary.dropped += 1;
            }
        }
    }

    // Append upstream matches nobody claimed, with fresh slots past the
    // highest surviving one.
    let mut next_slot = fixtures
        .iter()
        .filter_map(|f| f.id.slot())
        .max()
        .map(|s| s + 1)
        .unwrap_or(0);

    for (ui, m) in upstream.iter().enumerate() {
        if upstream_used[ui] {
            continue;
        }
        fixtures.push(build_fixture(FixtureId::new(season, gameweek, next_slot), m));
        next_slot += 1;
        summary.added += 1;
    }

    info!(
        season,
        gameweek,
        matched = summary.matched,
        added = summary.added,
        retained = summary.retained,
        dropped = summary.dropped,
        "reconciled gameweek"
    );

    ReconcileOutcome::Updated { fixtures, summary }
}

fn build_fixture(id: FixtureId, m: &UpstreamMatch) -> Fixture {
    Fixture {
        id,
        home: m.home.clone(),
        away: m.away.clone(),
        kickoff: m.kickoff,
        status: m.status,
        result: m.result,
        upstream_id: Some(m.id),
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

// Standings aggregation over a group's scored fixtures.
//
// Totals are summed absolute errors, so lower is better and the table sorts
// ascending. Only fixtures with a result and a prediction contribute; a
// member with no picks simply accrues nothing. Ties are left unbroken (the
// sort is stable, so tied members stay in membership order).

use std::collections::BTreeMap;

use crate::model::{GameweekKey, Group, ScoreScope, Season};
use crate::scoring::score_lines;

// ---------------------------------------------------------------------------
// Standings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct StandingRow {
    pub member: String,
    /// Summed error across all scored fixtures in scope. u64 so even
    /// absurd stored scorelines cannot overflow the aggregate.
    pub total: u64,
    /// How many fixtures actually produced a score.
    pub games_scored: u32,
    /// Exact predictions (error 0).
    pub perfect_count: u32,
    /// Mean error per scored fixture; `None` when nothing is scored.
    pub average: Option<f64>,
    /// Per-gameweek subtotals, in season/gameweek order.
    pub by_gameweek: BTreeMap<GameweekKey, u64>,
}

/// Seasons in scope under the group's score-aggregation setting.
fn seasons_in_scope(group: &Group) -> Vec<&Season> {
    match group.settings.score_scope {
        ScoreScope::AllSeasons => group.seasons.iter().collect(),
        ScoreScope::CurrentSeason => group
            .season(&group.current_season)
            .into_iter()
            .collect(),
    }
}

/// Compute the standings table, sorted ascending by total.
pub fn compute_standings(group: &Group) -> Vec<StandingRow> {
    let mut rows: Vec<StandingRow> = group
        .members
        .iter()
        .map(|member| {
            let mut row = StandingRow {
                member: member.clone(),
                total: 0,
                games_scored: 0,
                perfect_count: 0,
                average: None,
                by_gameweek: BTreeMap::new(),
            };

            for season in seasons_in_scope(group) {
                for gw in &season.gameweeks {
                    let key = GameweekKey::new(season.name.clone(), gw.number);
                    for fixture in &gw.fixtures {
                        let Some(result) = fixture.result else {
                            continue;
                        };
                        let Some(pick) = group.predictions.get(member, &fixture.id) else {
                            continue;
                        };
                        let pts = score_lines(pick, result);
                        row.total += pts;
                        row.games_scored += 1;
                        if pts == 0 {
                            row.perfect_count += 1;
                        }
                        *row.by_gameweek.entry(key.clone()).or_insert(0) += pts;
                    }
                }
            }

            if row.games_scored > 0 {
                row.average = Some(row.total as f64 / f64::from(row.games_scored));
            }
            row
        })
        .collect();

    // Stable sort: tied members keep membership order.
    rows.sort_by_key(|r| r.total);
    rows
}

// ---------------------------------------------------------------------------
// Weekly winners
// ---------------------------------------------------------------------------

/// Members with the lowest summed error across a gameweek's finished
/// fixtures. Empty when no fixture in the gameweek has been scored by anyone.
pub fn weekly_winners(group: &Group, season: &str, gameweek: u32) -> Vec<String> {
    let Some(gw) = group.gameweek(season, gameweek) else {
        return Vec::new();
    };

    let totals: Vec<(String, u64)> = group
        .members
        .iter()
        .filter_map(|member| {
            let mut total: u64 = 0;
            let mut scored = false;
            for fixture in &gw.fixtures {
                let (Some(result), Some(pick)) =
                    (fixture.result, group.predictions.get(member, &fixture.id))
                else {
                    continue;
                };
                total += score_lines(pick, result);
                scored = true;
            }
            scored.then(|| (member.clone(), total))
        })
        .collect();

    let Some(best) = totals.iter().map(|(_, t)| *t).min() else {
        return Vec::new();
    };

    totals
        .into_iter()
        .filter(|(_, t)| *t == best)
        .map(|(m, _)| m)
        .collect()
}

// ---------------------------------------------------------------------------
// Error distribution
// ---------------------------------------------------------------------------

/// Error buckets per member: counts of scored fixtures with error
/// 0, 1, 2, 3, 4, and 5-or-more.
pub fn points_distribution(group: &Group) -> BTreeMap<String, [u32; 6]> {
    let mut dist: BTreeMap<String, [u32; 6]> = BTreeMap::new();

    for member in &group.members {
        let buckets = dist.entry(member.clone()).or_insert([0; 6]);
        for season in seasons_in_scope(group) {
            for gw in &season.gameweeks {
                for fixture in &gw.fixtures {
                    let (Some(result), Some(pick)) =
                        (fixture.result, group.predictions.get(member, &fixture.id))
                    else {
                        continue;
                    };
                    let pts = score_lines(pick, result);
                    buckets[pts.min(5) as usize] += 1;
                }
            }
        }
    }

    dist
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

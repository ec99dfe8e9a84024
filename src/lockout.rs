// Per-fixture lock state, derived on every read from (now, kickoff, status,
// result). Nothing here is persisted and there are no timers; callers pass
// the clock in, which keeps the classification pure and testable.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::{Fixture, FixtureStatus};

/// Whether a fixture still accepts predictions.
///
/// Ordering of the checks matters: a recorded result always means finished,
/// even if the status field is stale; a live signal outranks the kickoff
/// comparison; an unknown kickoff with no other signal stays open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LockState {
    Open,
    Locked,
    Live,
    Finished,
}

pub fn lock_state(fixture: &Fixture, now: DateTime<Utc>) -> LockState {
    if fixture.result.is_some() || fixture.status == FixtureStatus::Finished {
        return LockState::Finished;
    }
    match fixture.status {
        FixtureStatus::InPlay | FixtureStatus::Paused => return LockState::Live,
        _ => {}
    }
    match fixture.kickoff {
        Some(kickoff) if kickoff <= now => LockState::Locked,
        _ => LockState::Open,
    }
}

/// True when non-admin prediction writes must be rejected.
pub fn is_locked(fixture: &Fixture, now: DateTime<Utc>) -> bool {
    lock_state(fixture, now) != LockState::Open
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

// Game engine: validated operations over group documents.
//
// Every mutation is a read-modify-write of the freshly loaded group document
// with a pure transform applied just before the write. The document is the
// concurrency unit: one writer at a time per group, last write wins. Sync is
// triggered synchronously by an admin and never retried automatically.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{info, warn};

use crate::config::GameConfig;
use crate::lockout::is_locked;
use crate::model::scoreline::ParseScorelineError;
use crate::model::{
    AuditEntry, FixtureId, Gameweek, GameweekKey, Group, ScoreScope, Scoreline, User,
};
use crate::standings::{self, StandingRow};
use crate::store::{keys, ObjectStore};
use crate::sync::{
    reconcile, FetchError, FixtureSource, ReconcileOutcome, ReconcileSummary,
};
use crate::visibility::{self, PicksView};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("group `{0}` not found")]
    GroupNotFound(String),

    #[error("group `{0}` already exists")]
    GroupExists(String),

    #[error("no group with invite code `{0}`")]
    CodeNotFound(String),

    #[error("user `{user}` is not a member of group `{group}`")]
    NotAMember { user: String, group: String },

    #[error("user `{0}` is not an admin of this group")]
    AdminOnly(String),

    #[error("gameweek {number} not found in season {season}")]
    GameweekNotFound { season: String, number: u32 },

    #[error("fixture `{0}` not found")]
    FixtureNotFound(FixtureId),

    #[error(transparent)]
    InvalidScoreline(#[from] ParseScorelineError),

    #[error("fixture `{0}` is locked")]
    FixtureLocked(FixtureId),

    #[error("gameweek {number} of season {season} is hidden")]
    GameweekHidden { season: String, number: u32 },

    #[error("the safe scoreline may only be used {limit} times per gameweek")]
    SafePickLimit { limit: u32 },

    #[error("clearing a gameweek deletes its predictions; pass confirm to proceed")]
    ConfirmationRequired,

    #[error("upstream fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

// ---------------------------------------------------------------------------
// GameEngine
// ---------------------------------------------------------------------------

pub struct GameEngine {
    store: Arc<dyn ObjectStore>,
    source: Arc<dyn FixtureSource>,
    placeholder_fixtures: u32,
    audit_display_limit: usize,
}

impl GameEngine {
    pub fn new(store: Arc<dyn ObjectStore>, source: Arc<dyn FixtureSource>) -> Self {
        Self {
            store,
            source,
            placeholder_fixtures: 10,
            audit_display_limit: 50,
        }
    }

    pub fn from_config(
        store: Arc<dyn ObjectStore>,
        source: Arc<dyn FixtureSource>,
        game: &GameConfig,
    ) -> Self {
        Self {
            store,
            source,
            placeholder_fixtures: game.placeholder_fixtures,
            audit_display_limit: game.audit_display_limit,
        }
    }

    // ------------------------------------------------------------------
    // Document plumbing
    // ------------------------------------------------------------------

    fn load_group(&self, id: &str) -> Result<Group, GameError> {
        let value = self
            .store
            .get(&keys::group(id))?
            .ok_or_else(|| GameError::GroupNotFound(id.to_string()))?;
        let group = serde_json::from_value(value)
            .map_err(|e| anyhow::anyhow!("invalid group document for `{id}`: {e}"))?;
        Ok(group)
    }

    fn save_group(&self, group: &Group) -> Result<(), GameError> {
        let value = serde_json::to_value(group)
            .map_err(|e| anyhow::anyhow!("failed to serialize group `{}`: {e}", group.id))?;
        self.store.set(&keys::group(&group.id), &value)?;
        Ok(())
    }

    /// Read-modify-write: load the latest document, apply `transform`, store
    /// the result. Nothing is written when the transform fails.
    fn update_group<F>(&self, id: &str, transform: F) -> Result<Group, GameError>
    where
        F: FnOnce(&mut Group) -> Result<(), GameError>,
    {
        let mut group = self.load_group(id)?;
        transform(&mut group)?;
        self.save_group(&group)?;
        Ok(group)
    }

    /// Record group membership on the user document, creating a minimal one
    /// if the user has never been registered.
    fn touch_user_membership(&self, user_id: &str, group_id: &str) -> Result<(), GameError> {
        let key = keys::user(user_id);
        let mut user: User = match self.store.get(&key)? {
            Some(value) => serde_json::from_value(value)
                .map_err(|e| anyhow::anyhow!("invalid user document for `{user_id}`: {e}"))?,
            None => User::new(user_id, user_id),
        };
        user.join(group_id);
        let value = serde_json::to_value(&user)
            .map_err(|e| anyhow::anyhow!("failed to serialize user `{user_id}`: {e}"))?;
        self.store.set(&key, &value)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Users and groups
    // ------------------------------------------------------------------

    pub fn register_user(&self, id: &str, display_name: &str) -> Result<User, GameError> {
        let user = User::new(id, display_name);
        let value = serde_json::to_value(&user)
            .map_err(|e| anyhow::anyhow!("failed to serialize user `{id}`: {e}"))?;
        self.store.set(&keys::user(id), &value)?;
        Ok(user)
    }

    /// Create a group with a unique invite code. The creator becomes member
    /// and admin; the `groupcode:` mapping is written before the document so
    /// a joining user never resolves a code to a missing group.
    pub fn create_group(
        &self,
        id: &str,
        name: &str,
        creator: &str,
        season: &str,
    ) -> Result<Group, GameError> {
        if self.store.get(&keys::group(id))?.is_some() {
            return Err(GameError::GroupExists(id.to_string()));
        }

        let mut code = Group::generate_invite_code();
        let mut attempts = 0;
        while self.store.get(&keys::group_code(&code))?.is_some() {
            attempts += 1;
            if attempts > 50 {
                return Err(anyhow::anyhow!("could not allocate a unique invite code").into());
            }
            code = Group::generate_invite_code();
        }

        let mut group = Group::new(id, name, creator, season, self.placeholder_fixtures);
        group.code = code.clone();

        self.store.set(&keys::group_code(&code), &json!(group.id))?;
        self.save_group(&group)?;
        self.touch_user_membership(creator, id)?;

        info!(group = id, code = %code, creator, "group created");
        Ok(group)
    }

    /// Join a group by invite code. Idempotent for existing members.
    pub fn join_group(&self, code: &str, user: &str) -> Result<Group, GameError> {
        let value = self
            .store
            .get(&keys::group_code(code))?
            .ok_or_else(|| GameError::CodeNotFound(code.to_string()))?;
        let group_id = value
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("invalid groupcode mapping for `{code}`"))?
            .to_string();

        let group = self.update_group(&group_id, |group| {
            group.add_member(user);
            Ok(())
        })?;
        self.touch_user_membership(user, &group_id)?;

        info!(group = %group_id, user, "user joined group");
        Ok(group)
    }

    pub fn get_group(&self, id: &str, viewer: &str) -> Result<Group, GameError> {
        let group = self.load_group(id)?;
        require_member(&group, viewer)?;
        Ok(group)
    }

    // ------------------------------------------------------------------
    // Predictions
    // ------------------------------------------------------------------

    /// Submit (or overwrite) the caller's own pick for an open fixture.
    pub fn submit_prediction(
        &self,
        group_id: &str,
        member: &str,
        season: &str,
        gameweek: u32,
        fixture: &FixtureId,
        raw: &str,
        now: DateTime<Utc>,
    ) -> Result<(), GameError> {
        self.update_group(group_id, |group| {
            require_member(group, member)?;
            require_visible_gameweek(group, member, season, gameweek)?;

            let gw = require_gameweek(group, season, gameweek)?;
            let fx = gw
                .fixture(fixture)
                .ok_or_else(|| GameError::FixtureNotFound(fixture.clone()))?;
            if is_locked(fx, now) {
                return Err(GameError::FixtureLocked(fixture.clone()));
            }

            let pick: Scoreline = raw.parse()?;

            // Safe-pick cap: count other fixtures in this gameweek already
            // holding the safe scoreline for this member.
            if let (Some(safe), Some(cap)) = (
                group.settings.safe_scoreline,
                group.settings.max_safe_per_gameweek,
            ) {
                if pick == safe {
                    let used = gw
                        .fixtures
                        .iter()
                        .filter(|f| &f.id != fixture)
                        .filter(|f| group.predictions.get(member, &f.id) == Some(safe))
                        .count() as u32;
                    if used >= cap {
                        return Err(GameError::SafePickLimit { limit: cap });
                    }
                }
            }

            group.predictions.set(member, fixture.clone(), pick);
            Ok(())
        })?;
        Ok(())
    }

    /// Remove the caller's own pick for an open fixture.
    pub fn clear_prediction(
        &self,
        group_id: &str,
        member: &str,
        season: &str,
        gameweek: u32,
        fixture: &FixtureId,
        now: DateTime<Utc>,
    ) -> Result<(), GameError> {
        self.update_group(group_id, |group| {
            require_member(group, member)?;
            require_visible_gameweek(group, member, season, gameweek)?;

            let gw = require_gameweek(group, season, gameweek)?;
            let fx = gw
                .fixture(fixture)
                .ok_or_else(|| GameError::FixtureNotFound(fixture.clone()))?;
            if is_locked(fx, now) {
                return Err(GameError::FixtureLocked(fixture.clone()));
            }

            group.predictions.remove(member, fixture);
            Ok(())
        })?;
        Ok(())
    }

    /// Admin override of any member's pick, at any time. Bypasses locks,
    /// hidden gameweeks, and the safe-pick cap; every call appends an audit
    /// entry. `new_raw = None` deletes the pick.
    pub fn admin_set_prediction(
        &self,
        group_id: &str,
        actor: &str,
        member: &str,
        season: &str,
        gameweek: u32,
        fixture: &FixtureId,
        new_raw: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<AuditEntry, GameError> {
        let mut entry_out: Option<AuditEntry> = None;
        self.update_group(group_id, |group| {
            require_admin(group, actor)?;
            require_member(group, member)?;

            let gw = require_gameweek(group, season, gameweek)?;
            if gw.fixture(fixture).is_none() {
                return Err(GameError::FixtureNotFound(fixture.clone()));
            }

            let new = match new_raw {
                Some(raw) => Some(raw.parse::<Scoreline>()?),
                None => None,
            };
            let previous = match new {
                Some(pick) => group.predictions.set(member, fixture.clone(), pick),
                None => group.predictions.remove(member, fixture),
            };

            let entry = AuditEntry {
                at: now,
                actor: actor.to_string(),
                member: member.to_string(),
                fixture: fixture.clone(),
                gameweek: GameweekKey::new(season, gameweek),
                previous,
                new,
            };
            warn!(
                group = group_id,
                actor,
                member,
                fixture = %fixture,
                previous = ?previous,
                new = ?new,
                "admin overrode a prediction"
            );
            group.audit_log.push(entry.clone());
            entry_out = Some(entry);
            Ok(())
        })?;
        // The transform ran exactly once on success.
        entry_out.ok_or_else(|| anyhow::anyhow!("audit entry missing after override").into())
    }

    /// The most recent audit entries, newest last, capped to the display
    /// window. The underlying log is append-only and never truncated.
    pub fn recent_audit(&self, group_id: &str, viewer: &str) -> Result<Vec<AuditEntry>, GameError> {
        let group = self.load_group(group_id)?;
        require_member(&group, viewer)?;
        let skip = group.audit_log.len().saturating_sub(self.audit_display_limit);
        Ok(group.audit_log[skip..].to_vec())
    }

    // ------------------------------------------------------------------
    // Results and gameweek management (admin)
    // ------------------------------------------------------------------

    /// Manually record a full-time result, for fixtures the provider does not
    /// cover (or between syncs).
    pub fn enter_result(
        &self,
        group_id: &str,
        actor: &str,
        season: &str,
        gameweek: u32,
        fixture: &FixtureId,
        raw: &str,
    ) -> Result<(), GameError> {
        self.update_group(group_id, |group| {
            require_admin(group, actor)?;
            let result: Scoreline = raw.parse()?;
            let gw = require_gameweek_mut(group, season, gameweek)?;
            let fx = gw
                .fixture_mut(fixture)
                .ok_or_else(|| GameError::FixtureNotFound(fixture.clone()))?;
            fx.result = Some(result);
            fx.status = crate::model::FixtureStatus::Finished;
            Ok(())
        })?;
        info!(group = group_id, fixture = %fixture, result = raw, "result entered");
        Ok(())
    }

    /// Reset a single fixture from finished back to open. Predictions are
    /// untouched.
    pub fn clear_result(
        &self,
        group_id: &str,
        actor: &str,
        season: &str,
        gameweek: u32,
        fixture: &FixtureId,
    ) -> Result<(), GameError> {
        self.update_group(group_id, |group| {
            require_admin(group, actor)?;
            let gw = require_gameweek_mut(group, season, gameweek)?;
            let fx = gw
                .fixture_mut(fixture)
                .ok_or_else(|| GameError::FixtureNotFound(fixture.clone()))?;
            fx.result = None;
            fx.status = crate::model::FixtureStatus::Scheduled;
            Ok(())
        })?;
        info!(group = group_id, fixture = %fixture, "result cleared");
        Ok(())
    }

    /// Reset every fixture in a gameweek and delete all predictions for
    /// them. Destructive, so it demands an explicit confirmation flag.
    pub fn clear_gameweek(
        &self,
        group_id: &str,
        actor: &str,
        season: &str,
        gameweek: u32,
        confirm: bool,
    ) -> Result<(), GameError> {
        if !confirm {
            return Err(GameError::ConfirmationRequired);
        }
        self.update_group(group_id, |group| {
            require_admin(group, actor)?;
            let gw = require_gameweek_mut(group, season, gameweek)?;
            let ids: Vec<FixtureId> = gw.fixtures.iter().map(|f| f.id.clone()).collect();
            for fx in &mut gw.fixtures {
                fx.result = None;
                fx.status = crate::model::FixtureStatus::Scheduled;
            }
            for id in &ids {
                group.predictions.remove_fixture(id);
            }
            Ok(())
        })?;
        warn!(group = group_id, season, gameweek, "gameweek cleared");
        Ok(())
    }

    /// Append the next gameweek (current max + 1) with placeholder fixtures.
    pub fn add_gameweek(
        &self,
        group_id: &str,
        actor: &str,
        season: &str,
    ) -> Result<u32, GameError> {
        let mut added = 0;
        self.update_group(group_id, |group| {
            require_admin(group, actor)?;
            let placeholder_fixtures = self.placeholder_fixtures;
            let s = group
                .season_mut(season)
                .ok_or_else(|| GameError::GameweekNotFound {
                    season: season.to_string(),
                    number: 0,
                })?;
            let next = s.gameweeks.iter().map(|gw| gw.number).max().unwrap_or(0) + 1;
            s.gameweeks
                .push(Gameweek::placeholder(season, next, placeholder_fixtures));
            added = next;
            Ok(())
        })?;
        info!(group = group_id, season, gameweek = added, "gameweek added");
        Ok(added)
    }

    /// Switch the group's current season and gameweek pointer.
    pub fn set_current_gameweek(
        &self,
        group_id: &str,
        actor: &str,
        season: &str,
        gameweek: u32,
    ) -> Result<(), GameError> {
        self.update_group(group_id, |group| {
            require_admin(group, actor)?;
            require_gameweek(group, season, gameweek)?;
            group.current_season = season.to_string();
            group.current_gameweek = gameweek;
            Ok(())
        })?;
        Ok(())
    }

    /// Hide or unhide a gameweek for non-admins.
    pub fn set_gameweek_hidden(
        &self,
        group_id: &str,
        actor: &str,
        season: &str,
        gameweek: u32,
        hidden: bool,
    ) -> Result<(), GameError> {
        self.update_group(group_id, |group| {
            require_admin(group, actor)?;
            require_gameweek(group, season, gameweek)?;
            let key = GameweekKey::new(season, gameweek);
            if hidden {
                group.settings.hidden_gameweeks.insert(key);
            } else {
                group.settings.hidden_gameweeks.remove(&key);
            }
            Ok(())
        })?;
        Ok(())
    }

    pub fn set_score_scope(
        &self,
        group_id: &str,
        actor: &str,
        scope: ScoreScope,
    ) -> Result<(), GameError> {
        self.update_group(group_id, |group| {
            require_admin(group, actor)?;
            group.settings.score_scope = scope;
            Ok(())
        })?;
        Ok(())
    }

    /// Configure (or remove) the capped safe scoreline.
    pub fn set_safe_pick(
        &self,
        group_id: &str,
        actor: &str,
        safe: Option<&str>,
        cap: Option<u32>,
    ) -> Result<(), GameError> {
        self.update_group(group_id, |group| {
            require_admin(group, actor)?;
            group.settings.safe_scoreline = match safe {
                Some(raw) => Some(raw.parse()?),
                None => None,
            };
            group.settings.max_safe_per_gameweek = cap;
            Ok(())
        })?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Sync
    // ------------------------------------------------------------------

    /// Fetch the matchday from the upstream source and reconcile it into the
    /// gameweek. Returns `None` when upstream reported no matches (the
    /// gameweek is left untouched); fetch errors surface as-is and are never
    /// retried here.
    pub async fn sync_gameweek(
        &self,
        group_id: &str,
        actor: &str,
        competition: &str,
        season: &str,
        gameweek: u32,
    ) -> Result<Option<ReconcileSummary>, GameError> {
        // Validate before spending an upstream request.
        let group = self.load_group(group_id)?;
        require_admin(&group, actor)?;
        require_gameweek(&group, season, gameweek)?;

        let upstream = self.source.fetch_matchday(competition, gameweek).await?;

        // Re-load: the fetch may have taken a while and the document is the
        // unit of concurrency.
        let mut group = self.load_group(group_id)?;
        let outcome = {
            let gw = require_gameweek(&group, season, gameweek)?;
            reconcile(season, gameweek, &gw.fixtures, &upstream, &group.predictions)
        };

        match outcome {
            ReconcileOutcome::NoMatches => {
                warn!(group = group_id, season, gameweek, "sync found no upstream matches");
                Ok(None)
            }
            ReconcileOutcome::Updated { fixtures, summary } => {
                let gw = require_gameweek_mut(&mut group, season, gameweek)?;
                gw.fixtures = fixtures;
                self.save_group(&group)?;
                info!(
                    group = group_id,
                    season,
                    gameweek,
                    matched = summary.matched,
                    added = summary.added,
                    retained = summary.retained,
                    dropped = summary.dropped,
                    "gameweek synced"
                );
                Ok(Some(summary))
            }
        }
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    pub fn standings(&self, group_id: &str, viewer: &str) -> Result<Vec<StandingRow>, GameError> {
        let group = self.load_group(group_id)?;
        require_member(&group, viewer)?;
        Ok(standings::compute_standings(&group))
    }

    pub fn weekly_winners(
        &self,
        group_id: &str,
        viewer: &str,
        season: &str,
        gameweek: u32,
    ) -> Result<Vec<String>, GameError> {
        let group = self.load_group(group_id)?;
        require_member(&group, viewer)?;
        Ok(standings::weekly_winners(&group, season, gameweek))
    }

    pub fn points_distribution(
        &self,
        group_id: &str,
        viewer: &str,
    ) -> Result<std::collections::BTreeMap<String, [u32; 6]>, GameError> {
        let group = self.load_group(group_id)?;
        require_member(&group, viewer)?;
        Ok(standings::points_distribution(&group))
    }

    /// The picks grid for a gameweek, masked per the visibility gate.
    pub fn picks_view(
        &self,
        group_id: &str,
        viewer: &str,
        season: &str,
        gameweek: u32,
        now: DateTime<Utc>,
    ) -> Result<PicksView, GameError> {
        let group = self.load_group(group_id)?;
        require_member(&group, viewer)?;
        require_visible_gameweek(&group, viewer, season, gameweek)?;
        let gw = require_gameweek(&group, season, gameweek)?;
        Ok(visibility::build_view(&group, viewer, gw, now))
    }
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

fn require_member(group: &Group, user: &str) -> Result<(), GameError> {
    if group.is_member(user) {
        Ok(())
    } else {
        Err(GameError::NotAMember {
            user: user.to_string(),
            group: group.id.clone(),
        })
    }
}

fn require_admin(group: &Group, user: &str) -> Result<(), GameError> {
    if group.is_admin(user) {
        Ok(())
    } else {
        Err(GameError::AdminOnly(user.to_string()))
    }
}

fn require_gameweek<'a>(
    group: &'a Group,
    season: &str,
    number: u32,
) -> Result<&'a Gameweek, GameError> {
    group
        .gameweek(season, number)
        .ok_or_else(|| GameError::GameweekNotFound {
            season: season.to_string(),
            number,
        })
}

fn require_gameweek_mut<'a>(
    group: &'a mut Group,
    season: &str,
    number: u32,
) -> Result<&'a mut Gameweek, GameError> {
    group
        .gameweek_mut(season, number)
        .ok_or_else(|| GameError::GameweekNotFound {
            season: season.to_string(),
            number,
        })
}

/// Hidden gameweeks are invisible to non-admins, distinct from the kickoff
/// lock.
fn require_visible_gameweek(
    group: &Group,
    user: &str,
    season: &str,
    number: u32,
) -> Result<(), GameError> {
    if !group.is_admin(user) && group.is_hidden(&GameweekKey::new(season, number)) {
        return Err(GameError::GameweekHidden {
            season: season.to_string(),
            number,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

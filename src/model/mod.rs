// Domain model: scorelines, fixtures, predictions, groups, users.

pub mod fixture;
pub mod group;
pub mod prediction;
pub mod scoreline;
pub mod user;

pub use fixture::{Fixture, FixtureId, FixtureStatus};
pub use group::{AuditEntry, Gameweek, GameweekKey, Group, GroupSettings, ScoreScope, Season};
pub use prediction::PredictionMap;
pub use scoreline::Scoreline;
pub use user::User;

// Upstream synchronization: fixture provider client, team-name
// normalization, and the reconciliation engine that merges upstream data
// into a gameweek without losing predictions.

pub mod names;
pub mod reconcile;
pub mod upstream;

pub use reconcile::{reconcile, ReconcileOutcome, ReconcileSummary};
pub use upstream::{FetchError, FixtureSource, FootballDataClient, UpstreamMatch};

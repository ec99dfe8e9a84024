// Fixture provider client for the football-data.org v4 API.
//
// The engine talks to the provider through the `FixtureSource` trait so
// tests (and any future provider) can substitute a scripted source. Errors
// keep their upstream meaning: an invalid token, a rate limit, and a missing
// matchday are all distinct, and none of them is retried automatically.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::model::{FixtureStatus, Scoreline};
use crate::sync::names;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const FOOTBALL_DATA_BASE_URL: &str = "https://api.football-data.org/v4";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("upstream rejected the API token")]
    Unauthorized,

    #[error("upstream rate limit hit; wait a minute and try again")]
    RateLimited,

    #[error("competition or matchday not found upstream")]
    NotFound,

    #[error("unexpected upstream status {0}")]
    Status(u16),

    #[error("transport error talking to upstream: {0}")]
    Transport(#[from] reqwest::Error),
}

// ---------------------------------------------------------------------------
// UpstreamMatch
// ---------------------------------------------------------------------------

/// One match as reported by the provider, already normalized: short team
/// names, parsed kickoff, reduced status, and a result only when both
/// full-time sides are present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamMatch {
    /// The provider's own match id, kept only as a correlation hint.
    pub id: u64,
    pub home: String,
    pub away: String,
    pub kickoff: Option<DateTime<Utc>>,
    pub status: FixtureStatus,
    pub result: Option<Scoreline>,
}

/// Source of upstream matches for a (competition, matchday) pair. Ordering of
/// the returned list is the provider's and is preserved by reconciliation.
#[async_trait]
pub trait FixtureSource: Send + Sync {
    async fn fetch_matchday(
        &self,
        competition: &str,
        matchday: u32,
    ) -> Result<Vec<UpstreamMatch>, FetchError>;
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct MatchesResponse {
    #[serde(default)]
    matches: Vec<ApiMatch>,
}

#[derive(Debug, Deserialize)]
struct ApiMatch {
    id: u64,
    #[serde(rename = "utcDate")]
    utc_date: Option<String>,
    status: Option<String>,
    #[serde(rename = "homeTeam")]
    home_team: ApiTeam,
    #[serde(rename = "awayTeam")]
    away_team: ApiTeam,
    score: Option<ApiScore>,
}

#[derive(Debug, Deserialize)]
struct ApiTeam {
    name: Option<String>,
    #[serde(rename = "shortName")]
    short_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiScore {
    #[serde(rename = "fullTime")]
    full_time: Option<ApiFullTime>,
}

#[derive(Debug, Deserialize)]
struct ApiFullTime {
    home: Option<u32>,
    away: Option<u32>,
}

impl ApiMatch {
    fn into_upstream(self) -> UpstreamMatch {
        let home = self
            .home_team
            .name
            .or(self.home_team.short_name)
            .unwrap_or_default();
        let away = self
            .away_team
            .name
            .or(self.away_team.short_name)
            .unwrap_or_default();

        let status = self
            .status
            .as_deref()
            .map(FixtureStatus::from_upstream)
            .unwrap_or_default();

        let result = self
            .score
            .and_then(|s| s.full_time)
            .and_then(|ft| match (ft.home, ft.away) {
                (Some(h), Some(a)) => Some(Scoreline::new(h, a)),
                _ => None,
            });

        let kickoff = self.utc_date.as_deref().and_then(parse_utc_date);
        if kickoff.is_none() && self.utc_date.is_some() {
            warn!(match_id = self.id, "could not parse upstream kickoff date");
        }

        UpstreamMatch {
            id: self.id,
            home: names::short_name(&home),
            away: names::short_name(&away),
            kickoff,
            status,
            result,
        }
    }
}

/// Parse the provider's RFC 3339 kickoff timestamp.
pub(crate) fn parse_utc_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

// ---------------------------------------------------------------------------
// FootballDataClient
// ---------------------------------------------------------------------------

/// HTTP client for football-data.org.
pub struct FootballDataClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl FootballDataClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(FOOTBALL_DATA_BASE_URL, token)
    }

    /// Point the client at a non-default base URL (tests, proxies).
    pub fn with_base_url(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            token: token.into(),
        }
    }
}

#[async_trait]
impl FixtureSource for FootballDataClient {
    async fn fetch_matchday(
        &self,
        competition: &str,
        matchday: u32,
    ) -> Result<Vec<UpstreamMatch>, FetchError> {
        let url = format!(
            "{}/competitions/{}/matches?matchday={}",
            self.base_url, competition, matchday
        );
        debug!(%url, "fetching matchday from upstream");

        let response = self
            .http
            .get(&url)
            .header("X-Auth-Token", &self.token)
            .send()
            .await?;

        match response.status().as_u16() {
            403 => return Err(FetchError::Unauthorized),
            429 => return Err(FetchError::RateLimited),
            404 => return Err(FetchError::NotFound),
            code if !(200..300).contains(&code) => return Err(FetchError::Status(code)),
            _ => {}
        }

        let body: MatchesResponse = response.json().await?;
        debug!(count = body.matches.len(), matchday, "upstream matches received");

        Ok(body
            .matches
            .into_iter()
            .map(ApiMatch::into_upstream)
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    // -- Wire parsing --

    const SAMPLE_MATCH: &str = r#"{
        "id": 537831,
        "utcDate": "2026-01-10T15:00:00Z",
        "status": "FINISHED",
        "homeTeam": { "name": "Arsenal FC", "shortName": "Arsenal" },
        "awayTeam": { "name": "Manchester United FC", "shortName": "Man United" },
        "score": { "fullTime": { "home": 2, "away": 1 } }
    }"#;

    #[test]
    fn parses_finished_match() {
        let m: ApiMatch = serde_json::from_str(SAMPLE_MATCH).unwrap();
        let up = m.into_upstream();

        assert_eq!(up.id, 537831);
        assert_eq!(up.home, "Arsenal");
        assert_eq!(up.away, "Man Utd");
        assert_eq!(up.status, FixtureStatus::Finished);
        assert_eq!(up.result, Some(Scoreline::new(2, 1)));
        assert_eq!(up.kickoff, Some("2026-01-10T15:00:00Z".parse().unwrap()));
    }

    #[test]
    fn timed_match_has_no_result() {
        let json = r#"{
            "id": 1,
            "utcDate": "2026-05-01T14:00:00+00:00",
            "status": "TIMED",
            "homeTeam": { "name": "Fulham FC" },
            "awayTeam": { "name": "Everton FC" },
            "score": { "fullTime": { "home": null, "away": null } }
        }"#;
        let m: ApiMatch = serde_json::from_str(json).unwrap();
        let up = m.into_upstream();

        assert_eq!(up.status, FixtureStatus::Scheduled);
        assert!(up.result.is_none());
        assert!(up.kickoff.is_some());
    }

    #[test]
    fn partial_full_time_score_is_not_a_result() {
        let json = r#"{
            "id": 2,
            "status": "IN_PLAY",
            "homeTeam": { "name": "Chelsea FC" },
            "awayTeam": { "name": "Wolverhampton Wanderers FC" },
            "score": { "fullTime": { "home": 1, "away": null } }
        }"#;
        let m: ApiMatch = serde_json::from_str(json).unwrap();
        let up = m.into_upstream();

        assert_eq!(up.status, FixtureStatus::InPlay);
        assert!(up.result.is_none());
        assert_eq!(up.away, "Wolves");
    }

    #[test]
    fn missing_name_falls_back_to_short_name() {
        let json = r#"{
            "id": 3,
            "homeTeam": { "shortName": "Brighton" },
            "awayTeam": { "name": "Brentford FC" }
        }"#;
        let m: ApiMatch = serde_json::from_str(json).unwrap();
        let up = m.into_upstream();
        assert_eq!(up.home, "Brighton");
        assert_eq!(up.away, "Brentford");
        assert_eq!(up.status, FixtureStatus::Unknown);
    }

    #[test]
    fn parse_utc_date_handles_offsets() {
        let dt = parse_utc_date("2026-01-10T16:00:00+01:00").unwrap();
        assert_eq!(dt, "2026-01-10T15:00:00Z".parse::<DateTime<Utc>>().unwrap());
        assert!(parse_utc_date("not a date").is_none());
    }

    // -- Mock server helpers --

    /// Spawn a one-shot HTTP server that answers any request with the given
    /// status line and body, returning its address.
    async fn one_shot_server(status_line: &'static str, body: String) -> std::net::SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();

            let mut buf = vec![0u8; 4096];
            let _ = socket.read(&mut buf).await;

            let response = format!(
                "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.flush().await.unwrap();
        });

        addr
    }

    async fn fetch_against(addr: std::net::SocketAddr) -> Result<Vec<UpstreamMatch>, FetchError> {
        let client = FootballDataClient::with_base_url(format!("http://{addr}"), "test-token");
        client.fetch_matchday("PL", 1).await
    }

    // -- Status mapping through a real HTTP round trip --

    #[tokio::test]
    async fn fetch_parses_matches_from_200() {
        let body = format!(r#"{{ "matches": [{SAMPLE_MATCH}] }}"#);
        let addr = one_shot_server("HTTP/1.1 200 OK", body).await;

        let matches = fetch_against(addr).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].home, "Arsenal");
        assert_eq!(matches[0].result, Some(Scoreline::new(2, 1)));
    }

    #[tokio::test]
    async fn fetch_maps_403_to_unauthorized() {
        let addr = one_shot_server("HTTP/1.1 403 Forbidden", "{}".to_string()).await;
        let err = fetch_against(addr).await.unwrap_err();
        assert!(matches!(err, FetchError::Unauthorized));
    }

    #[tokio::test]
    async fn fetch_maps_429_to_rate_limited() {
        let addr = one_shot_server("HTTP/1.1 429 Too Many Requests", "{}".to_string()).await;
        let err = fetch_against(addr).await.unwrap_err();
        assert!(matches!(err, FetchError::RateLimited));
    }

    #[tokio::test]
    async fn fetch_maps_404_to_not_found() {
        let addr = one_shot_server("HTTP/1.1 404 Not Found", "{}".to_string()).await;
        let err = fetch_against(addr).await.unwrap_err();
        assert!(matches!(err, FetchError::NotFound));
    }

    #[tokio::test]
    async fn fetch_maps_other_statuses_to_status_code() {
        let addr = one_shot_server("HTTP/1.1 500 Internal Server Error", "{}".to_string()).await;
        let err = fetch_against(addr).await.unwrap_err();
        assert!(matches!(err, FetchError::Status(500)));
    }

    #[tokio::test]
    async fn fetch_tolerates_missing_matches_field() {
        let addr = one_shot_server("HTTP/1.1 200 OK", "{}".to_string()).await;
        let matches = fetch_against(addr).await.unwrap();
        assert!(matches.is_empty());
    }
}

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// A tracked player and the match-history endpoint that describes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub api_url: String,
}

impl Player {
    pub fn new(name: impl Into<String>, api_url: impl Into<String>) -> Self {
        Player {
            name: name.into(),
            api_url: api_url.into(),
        }
    }
}

/// Body returned by the match-history endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchesResponse {
    /// Newest first, as ordered by the upstream API.
    #[serde(default)]
    pub matches: Option<Vec<Match>>,
}

/// A single match entry. Only the finish time matters here; the rest of the
/// payload is ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Match {
    /// ISO-8601 timestamp, absent or `null` while the game is still running.
    #[serde(default)]
    pub finished: Option<serde_json::Value>,
}

/// Why a player's matches could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Transport failure or non-2xx status.
    #[error("request failed")]
    RequestFailed,
    /// Body was not the JSON we expected.
    #[error("invalid response")]
    InvalidResponse,
}

/// Outcome of looking up a player's most recent match.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult {
    Error(FetchError),
    NoMatches,
    Latest(Match),
}

/// Last-known clean status per player name, as persisted between runs.
pub type Snapshot = BTreeMap<String, String>;

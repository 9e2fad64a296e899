use async_trait::async_trait;

use crate::models::{FetchError, MatchesResponse, Player};

/// Trait that every match-history source must implement.
#[async_trait]
pub trait MatchSource: Send + Sync {
    /// Fetch the match list for one player.
    async fn fetch_matches(&self, player: &Player) -> Result<MatchesResponse, FetchError>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}

pub mod companion;
pub mod provider;

pub use companion::CompanionApi;
pub use provider::MatchSource;

use futures_util::stream::{self, StreamExt};
use tracing::info;

use crate::models::{MatchResult, MatchesResponse, Player};

/// Pick the most recent match out of a response.
///
/// The upstream API lists matches newest first; that order is trusted as-is.
pub fn latest_match(response: MatchesResponse) -> MatchResult {
    match response.matches.and_then(|m| m.into_iter().next()) {
        Some(m) => MatchResult::Latest(m),
        None => MatchResult::NoMatches,
    }
}

/// Look up one player's most recent match, folding any failure into the result.
pub async fn fetch_player(source: &dyn MatchSource, player: &Player) -> MatchResult {
    match source.fetch_matches(player).await {
        Ok(resp) => latest_match(resp),
        Err(e) => MatchResult::Error(e),
    }
}

/// Fetch every player with at most `concurrency` requests in flight.
///
/// Results come back in the same order as `players`, regardless of which
/// request finishes first.
pub async fn fetch_all(
    source: &dyn MatchSource,
    players: &[Player],
    concurrency: usize,
) -> Vec<(Player, MatchResult)> {
    info!(
        "Fetching {} player(s) from {} (concurrency={})",
        players.len(),
        source.name(),
        concurrency
    );

    stream::iter(players)
        .map(move |player| async move { (player.clone(), fetch_player(source, player).await) })
        .buffered(concurrency.max(1))
        .collect::<Vec<_>>()
        .await
}

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::models::Player;

const MATCHES_API: &str = "https://data.aoe2companion.com/api/matches";

/// (display name, aoe2companion profile id)
const TRACKED_PROFILES: &[(&str, u64)] = &[
    ("Carpincho", 6446904),
    ("alanthekat", 1263162),
    ("thexcarpincho", 18660623),
    ("Dicopato", 255507),
    ("Dicopatito", 6237950),
    ("Nanox", 439001),
    ("Sir Monkey", 903496),
];

/// Match-history URL for one aoe2companion profile.
pub fn profile_url(profile_id: u64) -> String {
    format!("{}?profile_ids={}&search=&page=1", MATCHES_API, profile_id)
}

/// Players tracked when no players file is configured.
pub fn default_players() -> Vec<Player> {
    TRACKED_PROFILES
        .iter()
        .map(|(name, id)| Player::new(*name, profile_url(*id)))
        .collect()
}

/// Read a JSON array of `{"name", "api_url"}` objects.
pub fn load_players_file(path: &Path) -> Result<Vec<Player>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read players file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Players file {} is not a valid player list", path.display()))
}

/// Reject lists the run cannot work with.
pub fn validate_players(players: &[Player]) -> Result<()> {
    if players.is_empty() {
        anyhow::bail!("No players configured");
    }
    for player in players {
        if player.name.trim().is_empty() {
            anyhow::bail!("Player with URL {} has an empty name", player.api_url);
        }
        let url = url::Url::parse(&player.api_url)
            .with_context(|| format!("Invalid API URL for {}: {}", player.name, player.api_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!(
                "API URL for {} must be http or https, got {}",
                player.name,
                url.scheme()
            );
        }
    }
    Ok(())
}

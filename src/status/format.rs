use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use tracing::warn;

use super::escape::escape_markdown_v2;
use crate::models::{MatchResult, Player};

/// Layout used for finish times in status lines.
const FINISH_TIME_FORMAT: &str = "%H:%M on %Y-%m-%d";

/// Offset-less timestamp layouts accepted after RFC 3339, all taken as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// What a player is doing, independent of how it gets rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusKind {
    Error(String),
    NoMatches,
    PlayingNow,
    /// Finish time already converted and formatted in the local timezone.
    Finished(String),
    InvalidFinishTime,
}

/// A player's status in both its plain and its MarkdownV2 form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerStatus {
    pub name: String,
    /// Plain text, compared across runs and persisted.
    pub clean: String,
    /// MarkdownV2 text sent to the chat.
    pub display: String,
}

impl StatusKind {
    pub fn render_clean(&self, name: &str) -> String {
        match self {
            StatusKind::Error(err) => format!("{} encountered an error: {}", name, err),
            StatusKind::NoMatches => format!("{} has no recent matches", name),
            StatusKind::PlayingNow => format!("{} is playing now.", name),
            StatusKind::Finished(time) => format!("{} finished playing at {}", name, time),
            StatusKind::InvalidFinishTime => {
                format!("{} has a match with an invalid finish time", name)
            }
        }
    }

    pub fn render_display(&self, name: &str) -> String {
        let name = format!("*{}*", escape_markdown_v2(name));
        match self {
            StatusKind::Error(err) => {
                format!("{} encountered an error: {}", name, escape_markdown_v2(err))
            }
            StatusKind::NoMatches => format!("{} has no recent matches", name),
            StatusKind::PlayingNow => format!("{} is playing now\\.", name),
            StatusKind::Finished(time) => {
                format!("{} finished playing at {}", name, escape_markdown_v2(time))
            }
            StatusKind::InvalidFinishTime => {
                format!("{} has a match with an invalid finish time", name)
            }
        }
    }
}

/// Decide a player's status from their latest match.
pub fn classify(player_name: &str, result: &MatchResult, tz: Tz) -> StatusKind {
    let latest = match result {
        MatchResult::Error(e) => return StatusKind::Error(e.to_string()),
        MatchResult::NoMatches => return StatusKind::NoMatches,
        MatchResult::Latest(m) => m,
    };

    let raw = match &latest.finished {
        None | Some(serde_json::Value::Null) => return StatusKind::PlayingNow,
        Some(serde_json::Value::String(s)) if s.is_empty() => return StatusKind::PlayingNow,
        Some(serde_json::Value::String(s)) => s,
        Some(other) => {
            warn!("{} has a non-string finish time: {}", player_name, other);
            return StatusKind::InvalidFinishTime;
        }
    };

    match parse_finished(raw) {
        Some(utc) => StatusKind::Finished(
            utc.with_timezone(&tz).format(FINISH_TIME_FORMAT).to_string(),
        ),
        None => {
            warn!("{} has an unparsable finish time: {:?}", player_name, raw);
            StatusKind::InvalidFinishTime
        }
    }
}

/// Parse an ISO-8601 finish time. Offsets are honoured; timestamps without
/// one are UTC.
pub fn parse_finished(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Build both renderings of a player's status.
pub fn format_status(player: &Player, result: &MatchResult, tz: Tz) -> PlayerStatus {
    let kind = classify(&player.name, result, tz);
    PlayerStatus {
        name: player.name.clone(),
        clean: kind.render_clean(&player.name),
        display: kind.render_display(&player.name),
    }
}

use anyhow::{Context, Result};
use chrono_tz::Tz;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::models::Player;
use crate::notify::NotifyMode;
use crate::players;

/// Checks tracked players' latest matches and posts status changes to Telegram
#[derive(Parser, Debug, Clone)]
#[command(name = "matchwatch-bot", version, about)]
pub struct Config {
    /// Telegram bot token
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    pub telegram_bot_token: Option<String>,

    /// Telegram chat that receives the updates
    #[arg(long, env = "TELEGRAM_CHAT_ID")]
    pub telegram_chat_id: Option<String>,

    /// Telegram Bot API base URL
    #[arg(long, env = "TELEGRAM_API_URL", default_value = "https://api.telegram.org")]
    pub telegram_api_url: String,

    /// IANA timezone used to display finish times
    #[arg(long, env = "TIMEZONE", default_value = "America/Argentina/Buenos_Aires")]
    pub timezone: Tz,

    /// Snapshot of the statuses reported by the previous run
    #[arg(long, env = "STATUS_FILE", default_value = "mostrecentmatch.json")]
    pub status_file: PathBuf,

    /// JSON list of {"name", "api_url"} replacing the built-in players
    #[arg(long, env = "PLAYERS_FILE")]
    pub players_file: Option<PathBuf>,

    /// Maximum number of match lookups in flight
    #[arg(long, env = "FETCH_CONCURRENCY", default_value = "4")]
    pub fetch_concurrency: usize,

    /// Per-request HTTP timeout in seconds
    #[arg(long, env = "HTTP_TIMEOUT_SECS", default_value = "10")]
    pub http_timeout_secs: u64,

    /// Send one combined message or one message per change
    #[arg(long, env = "NOTIFY_MODE", value_enum, default_value = "combined")]
    pub notify_mode: NotifyMode,

    /// Log the would-be message instead of sending it
    #[arg(long, env = "DRY_RUN", default_value = "false")]
    pub dry_run: bool,
}

/// Credentials needed to post to Telegram.
#[derive(Debug, Clone)]
pub struct TelegramCredentials {
    pub token: String,
    pub chat_id: String,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if !self.dry_run {
            self.telegram_credentials()?;
        }
        if self.fetch_concurrency == 0 {
            anyhow::bail!("fetch_concurrency must be at least 1");
        }
        if self.http_timeout_secs == 0 {
            anyhow::bail!("http_timeout_secs must be at least 1");
        }
        Ok(())
    }

    /// Both Telegram settings, or an error naming whichever is missing.
    pub fn telegram_credentials(&self) -> Result<TelegramCredentials> {
        let token = non_empty(self.telegram_bot_token.as_deref())
            .context("TELEGRAM_BOT_TOKEN is not configured")?;
        let chat_id = non_empty(self.telegram_chat_id.as_deref())
            .context("TELEGRAM_CHAT_ID is not configured")?;
        Ok(TelegramCredentials {
            token: token.to_string(),
            chat_id: chat_id.to_string(),
        })
    }

    /// Players from the players file if one is set, otherwise the built-in list.
    pub fn players(&self) -> Result<Vec<Player>> {
        let players = match &self.players_file {
            Some(path) => players::load_players_file(path)?,
            None => players::default_players(),
        };
        players::validate_players(&players)?;
        Ok(players)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        let mut argv = vec!["matchwatch-bot"];
        argv.extend_from_slice(args);
        Config::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_credentials_required_outside_dry_run() {
        let config = parse(&["--telegram-chat-id", "42"]);
        if config.telegram_bot_token.is_none() {
            assert!(config.validate().is_err());
        }

        let config = parse(&["--telegram-bot-token", "t", "--telegram-chat-id", "  "]);
        let err = config.telegram_credentials().unwrap_err();
        assert!(err.to_string().contains("TELEGRAM_CHAT_ID"));
    }

    #[test]
    fn test_full_configuration_validates() {
        let config = parse(&[
            "--telegram-bot-token",
            "123:abc",
            "--telegram-chat-id",
            "-100200",
            "--timezone",
            "Europe/Madrid",
            "--notify-mode",
            "per-change",
            "--fetch-concurrency",
            "2",
        ]);
        config.validate().unwrap();
        assert_eq!(config.timezone, chrono_tz::Europe::Madrid);
        assert_eq!(config.notify_mode, NotifyMode::PerChange);
        let creds = config.telegram_credentials().unwrap();
        assert_eq!(creds.token, "123:abc");
        assert_eq!(creds.chat_id, "-100200");
    }

    #[test]
    fn test_dry_run_skips_credentials() {
        let config = parse(&["--dry-run"]);
        config.validate().unwrap();
    }

    #[test]
    fn test_zero_limits_rejected() {
        let config = parse(&["--dry-run", "--fetch-concurrency", "0"]);
        assert!(config.validate().is_err());
        let config = parse(&["--dry-run", "--http-timeout-secs", "0"]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_timezone_rejected() {
        assert!(Config::try_parse_from(["matchwatch-bot", "--timezone", "Mars/Olympus"]).is_err());
    }

    #[test]
    fn test_players_default_and_file() {
        let config = parse(&["--dry-run"]);
        if config.players_file.is_none() {
            assert_eq!(config.players().unwrap().len(), 7);
        }

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("players.json");
        std::fs::write(&path, r#"[{"name": "Solo", "api_url": "http://localhost/m"}]"#).unwrap();
        let config = parse(&["--dry-run", "--players-file", path.to_str().unwrap()]);
        let players = config.players().unwrap();
        assert_eq!(players, vec![Player::new("Solo", "http://localhost/m")]);
    }
}

use anyhow::Result;
use chrono_tz::Tz;
use tracing::error;

use crate::config::Config;
use crate::matches::{fetch_all, CompanionApi, MatchSource};
use crate::models::Player;
use crate::notify::{deliver, DeliveryReport, DryRunNotifier, Notifier, NotifyMode, TelegramClient};
use crate::status::{diff_statuses, format_status, PlayerStatus};
use crate::store::StatusStore;

/// Everything a run needs besides its I/O endpoints.
#[derive(Debug, Clone)]
pub struct WatchSettings {
    pub players: Vec<Player>,
    pub timezone: Tz,
    pub fetch_concurrency: usize,
    pub notify_mode: NotifyMode,
}

/// Summary of a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub checked: usize,
    /// Display lines that were handed to the notifier.
    pub changed: Vec<String>,
    pub snapshot_saved: bool,
    pub delivery: DeliveryReport,
}

/// Runs one check: load snapshot, fetch, format and diff, persist, notify.
pub struct Watcher {
    settings: WatchSettings,
    store: StatusStore,
    source: Box<dyn MatchSource>,
    notifier: Box<dyn Notifier>,
}

impl Watcher {
    pub fn new(
        settings: WatchSettings,
        store: StatusStore,
        source: Box<dyn MatchSource>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        Watcher {
            settings,
            store,
            source,
            notifier,
        }
    }

    /// Wire up the real HTTP source and notifier from a validated config.
    pub fn from_config(config: &Config) -> Result<Self> {
        let settings = WatchSettings {
            players: config.players()?,
            timezone: config.timezone,
            fetch_concurrency: config.fetch_concurrency,
            notify_mode: config.notify_mode,
        };
        let source = CompanionApi::new(config.http_timeout())?;
        let notifier: Box<dyn Notifier> = if config.dry_run {
            Box::new(DryRunNotifier)
        } else {
            let creds = config.telegram_credentials()?;
            Box::new(TelegramClient::new(
                &config.telegram_api_url,
                &creds.token,
                &creds.chat_id,
                config.http_timeout(),
            )?)
        };

        Ok(Watcher::new(
            settings,
            StatusStore::new(config.status_file.clone()),
            Box::new(source),
            notifier,
        ))
    }

    pub async fn run_once(&self) -> RunReport {
        let previous = self.store.load();

        let results = fetch_all(
            self.source.as_ref(),
            &self.settings.players,
            self.settings.fetch_concurrency,
        )
        .await;

        let statuses: Vec<PlayerStatus> = results
            .iter()
            .map(|(player, result)| format_status(player, result, self.settings.timezone))
            .collect();
        let diff = diff_statuses(&previous, &statuses);

        let snapshot_saved = match self.store.save(&diff.current) {
            Ok(()) => true,
            Err(e) => {
                error!(
                    "Could not write status file {}: {:#}",
                    self.store.path().display(),
                    e
                );
                false
            }
        };

        let delivery = deliver(
            self.notifier.as_ref(),
            &diff.changed,
            self.settings.notify_mode,
        )
        .await;

        RunReport {
            checked: statuses.len(),
            changed: diff.changed,
            snapshot_saved,
            delivery,
        }
    }
}

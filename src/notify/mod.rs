pub mod telegram;

pub use telegram::TelegramClient;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{error, info};

/// Telegram refuses messages longer than this many characters.
pub const TELEGRAM_MESSAGE_LIMIT: usize = 4096;

/// Separator placed between status lines in a combined message.
const MESSAGE_SEPARATOR: &str = "\n\n";

/// Something that can deliver a MarkdownV2 message to the configured chat.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Result<()>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}

/// Logs messages instead of delivering them.
pub struct DryRunNotifier;

#[async_trait]
impl Notifier for DryRunNotifier {
    fn name(&self) -> &str {
        "dry-run"
    }

    async fn send(&self, text: &str) -> Result<()> {
        info!("[dry-run] would send:\n{}", text);
        Ok(())
    }
}

/// How changed statuses are grouped into messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum NotifyMode {
    /// One message holding every change, separated by blank lines.
    #[default]
    Combined,
    /// One message per changed player.
    PerChange,
}

/// Counts of what happened while notifying.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub sent: usize,
    pub failed: usize,
}

/// Group status lines into messages that each fit within `limit` characters.
///
/// Lines are never split; a single line longer than `limit` becomes its own
/// message and is left for the API to reject.
pub fn chunk_messages(lines: &[String], limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;
    let sep_len = MESSAGE_SEPARATOR.chars().count();

    for line in lines {
        let line_len = line.chars().count();
        if !current.is_empty() && current_len + sep_len + line_len > limit {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push_str(MESSAGE_SEPARATOR);
            current_len += sep_len;
        }
        current.push_str(line);
        current_len += line_len;
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Send the changed-set. Failures are logged and counted, never retried.
pub async fn deliver(notifier: &dyn Notifier, changed: &[String], mode: NotifyMode) -> DeliveryReport {
    let mut report = DeliveryReport::default();
    if changed.is_empty() {
        info!("No status changes detected. No messages will be sent.");
        return report;
    }

    let messages = match mode {
        NotifyMode::Combined => chunk_messages(changed, TELEGRAM_MESSAGE_LIMIT),
        NotifyMode::PerChange => changed.to_vec(),
    };
    info!(
        "Sending {} update(s) in {} message(s) via {}",
        changed.len(),
        messages.len(),
        notifier.name()
    );

    for message in &messages {
        match notifier.send(message).await {
            Ok(()) => report.sent += 1,
            Err(e) => {
                error!("Failed to send message via {}: {:#}", notifier.name(), e);
                report.failed += 1;
            }
        }
    }
    report
}

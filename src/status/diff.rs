use tracing::info;

use super::format::PlayerStatus;
use crate::models::Snapshot;

/// Result of comparing this run's statuses against the stored snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusDiff {
    /// Clean statuses computed in this run; becomes the next snapshot.
    pub current: Snapshot,
    /// Display lines of the players whose status changed, in player order.
    pub changed: Vec<String>,
}

/// Compare fresh statuses against `previous`. A player with no stored entry
/// always counts as changed.
pub fn diff_statuses(previous: &Snapshot, statuses: &[PlayerStatus]) -> StatusDiff {
    let mut diff = StatusDiff::default();

    for status in statuses {
        if previous.get(&status.name) != Some(&status.clean) {
            info!("Status change for {}: {}", status.name, status.clean);
            diff.changed.push(status.display.clone());
        } else {
            info!("No change for {}: {}", status.name, status.clean);
        }
        diff.current.insert(status.name.clone(), status.clean.clone());
    }

    diff
}

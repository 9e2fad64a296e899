pub mod diff;
pub mod escape;
pub mod format;

pub use diff::diff_statuses;
pub use format::{format_status, PlayerStatus};

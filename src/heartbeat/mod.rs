//! Background health and self-update loops.

pub mod daemon;
pub mod tasks;

pub use daemon::spawn_background_tasks;
pub use tasks::{check_health, refresh_dependencies, HealthReport};

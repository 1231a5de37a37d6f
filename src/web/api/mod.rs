//! API endpoints module.

pub mod command;
pub mod events;
pub mod settings;

pub use command::execute_command;
pub use events::stream_events;
pub use settings::{get_settings, update_settings};

//! NeuroFusion library root.

pub mod capabilities;
pub mod capture;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod heartbeat;
pub mod logging;
pub mod platform;
pub mod web;

pub use capabilities::Capabilities;
pub use cli::Commands;
pub use config::{Settings, SettingsUpdate};
pub use core::{classify, Assistant, Classification, CommandEvent, Intent};
pub use error::{Error, Result};
pub use heartbeat::spawn_background_tasks;
pub use platform::{HttpLookup, Lookup, Platform, SystemPlatform};
pub use web::run_server;

//! External primitives: OS actions and remote lookups.
//!
//! Every primitive may fail. The executor owns turning failures into
//! response text, so implementations just report what went wrong.

use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub mod jokes;
pub mod lookup;
pub mod system;

pub use lookup::HttpLookup;
pub use system::SystemPlatform;

#[derive(Error, Debug)]
pub enum PrimitiveError {
    #[error("{0} is unavailable in this environment")]
    Unavailable(String),

    #[error("{0} is not supported on this OS")]
    Unsupported(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("`{command}` failed ({status}): {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Other(String),
}

impl PrimitiveError {
    pub fn other(s: impl Into<String>) -> Self {
        PrimitiveError::Other(s.into())
    }
}

pub type Result<T> = std::result::Result<T, PrimitiveError>;

/// Media key sent by the volume handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeKey {
    Up,
    Down,
    Mute,
}

/// Delayed power action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerAction {
    Shutdown,
    Restart,
}

/// Captured output of a shell command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShellOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: Option<i32>,
}

/// One live process.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessEntry {
    pub pid: u32,
    pub name: String,
    pub user: Option<String>,
}

/// Resource telemetry for `system monitor`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonitorSnapshot {
    pub cpu_percent: f32,
    pub memory_percent: f32,
    pub disk_percent: f32,
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

/// OS identity plus utilization for `system info`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SystemSnapshot {
    pub os_name: String,
    pub os_version: String,
    pub cpu_percent: f32,
    pub memory_percent: f32,
    pub disk_percent: f32,
}

/// Local OS primitives.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Open an existing local file or directory with its default handler.
    async fn open_path(&self, target: &str) -> Result<()>;

    /// Open a URL in the default browser.
    async fn open_url(&self, url: &str) -> Result<()>;

    async fn press_volume_key(&self, key: VolumeKey) -> Result<()>;

    /// Schedule a shutdown or restart; returns the delay before it happens.
    async fn power(&self, action: PowerAction) -> Result<Duration>;

    async fn run_shell(&self, command: &str) -> Result<ShellOutput>;

    async fn list_processes(&self) -> Result<Vec<ProcessEntry>>;

    async fn monitor_snapshot(&self) -> Result<MonitorSnapshot>;

    async fn system_snapshot(&self) -> Result<SystemSnapshot>;

    /// Write a capture of the primary display to `path`.
    async fn capture_screen(&self, path: &Path) -> Result<()>;

    async fn lock_screen(&self) -> Result<()>;

    async fn tell_joke(&self) -> Result<String>;
}

/// Remote lookups.
#[async_trait]
pub trait Lookup: Send + Sync {
    /// City of the caller's public IP, if the service knows it.
    async fn locate_city(&self) -> Result<Option<String>>;

    /// One-line weather summary. An empty location lets the service decide.
    async fn weather(&self, location: &str) -> Result<String>;
}

//! Runtime capability probe.
//!
//! Probed once at startup; handlers consult the resulting set instead of
//! discovering missing capabilities by failing.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Capabilities {
    /// A display is attached, so keys, captures and locks can work.
    pub gui: bool,
    pub microphone: bool,
    /// Media can be handed to a browser.
    pub media_playback: bool,
    /// The OS exposes power and lock controls we know how to drive.
    pub platform_controls: bool,
}

impl Capabilities {
    /// Inspect the current environment.
    pub fn probe() -> Self {
        let desktop_os = cfg!(any(target_os = "windows", target_os = "macos"));
        let gui = desktop_os || has_display(|name| std::env::var_os(name));
        let microphone = if cfg!(target_os = "linux") {
            std::path::Path::new("/dev/snd").exists()
        } else {
            desktop_os
        };

        let capabilities = Self {
            gui,
            microphone,
            media_playback: gui,
            platform_controls: desktop_os || cfg!(target_os = "linux"),
        };

        tracing::info!("Capabilities: {}", capabilities);
        capabilities
    }

    /// Everything available.
    pub fn all() -> Self {
        Self {
            gui: true,
            microphone: true,
            media_playback: true,
            platform_controls: true,
        }
    }

    /// Nothing available (headless server).
    pub fn none() -> Self {
        Self::default()
    }
}

fn has_display<F>(var: F) -> bool
where
    F: Fn(&str) -> Option<std::ffi::OsString>,
{
    ["DISPLAY", "WAYLAND_DISPLAY"]
        .iter()
        .any(|name| var(name).map_or(false, |v| !v.is_empty()))
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |on: bool| if on { "yes" } else { "no" };
        write!(
            f,
            "gui={} microphone={} media_playback={} platform_controls={}",
            flag(self.gui),
            flag(self.microphone),
            flag(self.media_playback),
            flag(self.platform_controls)
        )
    }
}

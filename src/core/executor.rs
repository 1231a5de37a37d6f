//! Command execution.
//!
//! `Assistant` is the shared context every caller goes through: the capture
//! loop, web handlers and background loops all hold an `Arc<Assistant>`.
//! `execute` classifies an utterance, records it, runs exactly one handler
//! and always answers with text. Primitive failures never escape.

use chrono::Local;
use reqwest::Url;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{broadcast, watch, Mutex, RwLock};

use super::calculator::{self, CalcError};
use super::history::{CommandHistory, CommandRecord};
use super::intent::{classify, Classification, Intent};
use crate::capabilities::Capabilities;
use crate::config::{Settings, SettingsUpdate};
use crate::error::Result;
use crate::platform::{Lookup, Platform, PowerAction, PrimitiveError, VolumeKey};

pub const INVALID_COMMAND: &str = "Invalid command";
pub const FAREWELL: &str = "Goodbye";
pub const VOLUME_UNAVAILABLE: &str = "Volume control unavailable in this environment";
pub const SCREENSHOT_UNAVAILABLE: &str = "Screenshot functionality unavailable in this environment";
pub const LOCK_UNAVAILABLE: &str = "Screen lock unavailable in this environment";
pub const LOCK_UNSUPPORTED: &str = "Screen lock not supported on this OS";
pub const YOUTUBE_UNAVAILABLE: &str = "YouTube playback unavailable in this environment";
pub const SHELL_DISABLED: &str =
    "Shell commands are disabled. Set features.allow_shell_commands to enable them";
pub const MATH_ONLY: &str = "Error: Only basic math operations allowed";

/// Entries shown by `list processes`.
const PROCESS_LIST_LIMIT: usize = 20;

/// Buffered events per web subscriber before the slowest one lags.
const EVENT_BUFFER: usize = 64;

/// Broadcast after every executed command.
#[derive(Debug, Clone, Serialize)]
pub struct CommandEvent {
    pub command: String,
    pub response: String,
}

pub struct Assistant {
    settings: RwLock<Settings>,
    settings_path: Option<PathBuf>,
    capabilities: Capabilities,
    platform: Arc<dyn Platform>,
    lookup: Arc<dyn Lookup>,
    history: Mutex<CommandHistory>,
    running: watch::Sender<bool>,
    events: broadcast::Sender<CommandEvent>,
}

impl Assistant {
    pub fn new(
        settings: Settings,
        capabilities: Capabilities,
        platform: Arc<dyn Platform>,
        lookup: Arc<dyn Lookup>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        let (running, _) = watch::channel(true);
        Self {
            settings: RwLock::new(settings),
            settings_path: None,
            capabilities,
            platform,
            lookup,
            history: Mutex::new(CommandHistory::new()),
            running,
            events,
        }
    }

    /// Persist settings updates to `path`.
    pub fn with_settings_path(mut self, path: PathBuf) -> Self {
        self.settings_path = Some(path);
        self
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn platform(&self) -> &Arc<dyn Platform> {
        &self.platform
    }

    pub fn settings_path(&self) -> Option<&PathBuf> {
        self.settings_path.as_ref()
    }

    pub async fn settings(&self) -> Settings {
        self.settings.read().await.clone()
    }

    /// Validate, apply and persist a settings update.
    pub async fn update_settings(&self, update: &SettingsUpdate) -> Result<Settings> {
        let mut settings = self.settings.write().await;
        let mut updated = settings.clone();
        updated.apply(update)?;
        if let Some(path) = &self.settings_path {
            updated.save(path)?;
        }
        *settings = updated.clone();
        tracing::info!(
            "Settings updated: wake_word={} theme={}",
            updated.wake_word,
            updated.theme
        );
        Ok(updated)
    }

    pub fn is_running(&self) -> bool {
        *self.running.borrow()
    }

    pub fn stop(&self) {
        self.running.send_replace(false);
    }

    /// Resolves once `stop` has been called, by any caller.
    pub async fn stopped(&self) {
        let mut running = self.running.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = running.wait_for(|running| !*running).await;
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CommandEvent> {
        self.events.subscribe()
    }

    /// Recorded commands, oldest first.
    pub async fn history(&self) -> Vec<CommandRecord> {
        self.history.lock().await.snapshot()
    }

    /// Execute one utterance. Never fails; every outcome is response text.
    pub async fn execute(&self, utterance: &str) -> String {
        let max_len = self.settings.read().await.max_command_length;
        let command = utterance.trim();
        if command.is_empty() || utterance.chars().count() > max_len {
            return INVALID_COMMAND.to_string();
        }

        let classification = classify(command);
        self.history.lock().await.push(CommandRecord::new(utterance));
        tracing::info!(
            intent = %classification.intent,
            parameter = %classification.parameter,
            "Executing command: {}",
            command
        );

        let response = self.dispatch(command, classification).await;

        // No subscribers is the normal case outside the web front end.
        let _ = self.events.send(CommandEvent {
            command: command.to_string(),
            response: response.clone(),
        });

        response
    }

    async fn dispatch(&self, command: &str, classification: Classification) -> String {
        let param = classification.parameter.as_str();
        match classification.intent {
            Intent::Open => self.handle_open(param).await,
            Intent::Search => self.handle_search(param).await,
            Intent::Volume => self.handle_volume(param).await,
            Intent::System => self.handle_system(param).await,
            // Echo only: nothing is played for a bare "play X".
            Intent::Media => format!("Playing {}", param),
            Intent::Youtube => self.handle_youtube(param).await,
            // Acknowledgement only: no reminder is scheduled.
            Intent::Reminder => format!("I'll remind you to {}", param),
            Intent::Joke => self.handle_joke().await,
            Intent::Screenshot => self.handle_screenshot().await,
            Intent::Weather => self.handle_weather(param).await,
            Intent::Calculate => handle_calculate(param),
            Intent::SystemInfo => self.handle_system_info().await,
            Intent::Lock => self.handle_lock().await,
            Intent::Time => format!("The time is {}", Local::now().format("%I:%M %p")),
            Intent::Date => format!("Today is {}", Local::now().format("%A, %B %d, %Y")),
            Intent::Unknown => format!("I don't understand: {}", command),
        }
    }

    async fn handle_open(&self, target: &str) -> String {
        match self.platform.open_path(target).await {
            Ok(()) => format!("Opened {}", target),
            Err(e) => {
                tracing::debug!("Opening {} locally failed ({}), trying browser", target, e);
                match self.platform.open_url(&format!("https://{}", target)).await {
                    Ok(()) => format!("Opened {} in browser", target),
                    Err(e) => {
                        tracing::warn!("Open {} failed: {}", target, e);
                        format!("Couldn't open {}: {}", target, e)
                    }
                }
            }
        }
    }

    async fn handle_search(&self, query: &str) -> String {
        let url = match web_url("https://www.google.com/search", "q", query) {
            Ok(url) => url,
            Err(e) => return failure("search", format!("Couldn't search for {}", query), e),
        };
        match self.platform.open_url(url.as_str()).await {
            Ok(()) => format!("Searching for {}", query),
            Err(e) => failure("search", format!("Couldn't search for {}", query), e),
        }
    }

    async fn handle_volume(&self, direction: &str) -> String {
        if !self.capabilities.gui {
            return VOLUME_UNAVAILABLE.to_string();
        }
        let key = match direction {
            "up" => VolumeKey::Up,
            "down" => VolumeKey::Down,
            "mute" => VolumeKey::Mute,
            other => return format!("Unknown volume direction: {}", other),
        };
        match self.platform.press_volume_key(key).await {
            Ok(()) if key == VolumeKey::Mute => "Toggled mute".to_string(),
            Ok(()) => format!("Volume turned {}", direction),
            Err(e) => failure("volume", "Couldn't adjust volume", e),
        }
    }

    async fn handle_system(&self, command: &str) -> String {
        match command {
            "exit" | "quit" => {
                self.stop();
                tracing::info!("Exit requested");
                FAREWELL.to_string()
            }
            "shutdown" => match self.platform.power(PowerAction::Shutdown).await {
                Ok(delay) => format!("Shutting down in {} seconds", delay.as_secs()),
                Err(e) => failure("shutdown", "Couldn't shut down", e),
            },
            "restart" => match self.platform.power(PowerAction::Restart).await {
                Ok(delay) => format!("Restarting in {} seconds", delay.as_secs()),
                Err(e) => failure("restart", "Couldn't restart", e),
            },
            "list processes" => match self.platform.list_processes().await {
                Ok(processes) => {
                    let lines: Vec<String> = processes
                        .iter()
                        .take(PROCESS_LIST_LIMIT)
                        .map(|p| {
                            format!("{} {} {}", p.pid, p.name, p.user.as_deref().unwrap_or("-"))
                        })
                        .collect();
                    format!("Running processes:\n{}", lines.join("\n"))
                }
                Err(e) => failure("list processes", "Error listing processes", e),
            },
            "system monitor" => match self.platform.monitor_snapshot().await {
                Ok(s) => format!(
                    "System Monitor:\nCPU: {:.1}%\nMemory: {:.1}% used\nDisk: {:.1}% used\nNetwork: ↑{}KB ↓{}KB",
                    s.cpu_percent,
                    s.memory_percent,
                    s.disk_percent,
                    s.bytes_sent / 1024,
                    s.bytes_received / 1024
                ),
                Err(e) => failure("system monitor", "Error getting system info", e),
            },
            _ => match shell_command(command) {
                Some(shell) => self.handle_shell(shell).await,
                None => "Unknown system command".to_string(),
            },
        }
    }

    async fn handle_shell(&self, command: &str) -> String {
        if !self.settings.read().await.features.allow_shell_commands {
            tracing::warn!("Refused shell command (disabled): {}", command);
            return SHELL_DISABLED.to_string();
        }
        tracing::warn!("Running shell command: {}", command);
        match self.platform.run_shell(command).await {
            Ok(out) => {
                let stdout = if out.stdout.is_empty() {
                    "No output"
                } else {
                    out.stdout.as_str()
                };
                format!("Command executed:\n{}\n{}", stdout, out.stderr)
            }
            Err(e) => failure("run", "Error executing command", e),
        }
    }

    async fn handle_youtube(&self, query: &str) -> String {
        if !self.capabilities.media_playback {
            return YOUTUBE_UNAVAILABLE.to_string();
        }
        let url = match web_url("https://www.youtube.com/results", "search_query", query) {
            Ok(url) => url,
            Err(e) => return failure("youtube", "Couldn't play video", e),
        };
        match self.platform.open_url(url.as_str()).await {
            Ok(()) => format!("Playing {} on YouTube", query),
            Err(e) => failure("youtube", "Couldn't play video", e),
        }
    }

    async fn handle_joke(&self) -> String {
        match self.platform.tell_joke().await {
            Ok(joke) => joke,
            Err(e) => failure("joke", "Couldn't think of a joke", e),
        }
    }

    async fn handle_screenshot(&self) -> String {
        if !self.capabilities.gui {
            return SCREENSHOT_UNAVAILABLE.to_string();
        }
        let dir = match self.settings.read().await.screenshot_dir() {
            Ok(dir) => dir,
            Err(e) => return failure("screenshot", "Couldn't take screenshot", e),
        };
        if let Err(e) = tokio::fs::create_dir_all(&dir).await {
            return failure("screenshot", "Couldn't take screenshot", e);
        }

        let filename = dir.join(format!(
            "screenshot_{}.png",
            Local::now().format("%Y%m%d_%H%M%S")
        ));
        match self.platform.capture_screen(&filename).await {
            Ok(()) => format!("Screenshot saved as {}", filename.display()),
            Err(e) => failure("screenshot", "Couldn't take screenshot", e),
        }
    }

    async fn handle_weather(&self, location: &str) -> String {
        let location = location.trim();
        let (query, label) = if location.is_empty() {
            match self.lookup.locate_city().await {
                Ok(Some(city)) => (city.clone(), city),
                Ok(None) => (String::new(), "your location".to_string()),
                Err(e) => return failure("weather", "Couldn't get weather", e),
            }
        } else {
            (location.to_string(), location.to_string())
        };

        match self.lookup.weather(&query).await {
            Ok(report) => format!("Weather in {}: {}", label, report),
            Err(e) => failure("weather", "Couldn't get weather", e),
        }
    }

    async fn handle_system_info(&self) -> String {
        match self.platform.system_snapshot().await {
            Ok(s) => format!(
                "System Information:\nOS: {} {}\nCPU: {:.1}% | RAM: {:.1}% | Disk: {:.1}%",
                s.os_name, s.os_version, s.cpu_percent, s.memory_percent, s.disk_percent
            ),
            Err(e) => failure("system info", "Couldn't get system info", e),
        }
    }

    async fn handle_lock(&self) -> String {
        if !self.capabilities.gui {
            return LOCK_UNAVAILABLE.to_string();
        }
        if !self.capabilities.platform_controls {
            return LOCK_UNSUPPORTED.to_string();
        }
        match self.platform.lock_screen().await {
            Ok(()) => "Screen locked".to_string(),
            Err(PrimitiveError::Unsupported(_)) => LOCK_UNSUPPORTED.to_string(),
            Err(e) => failure("lock", "Couldn't lock screen", e),
        }
    }
}

fn handle_calculate(expression: &str) -> String {
    match calculator::evaluate(expression) {
        Ok(value) => format!("Result: {}", calculator::format_number(value)),
        Err(CalcError::Disallowed) => MATH_ONLY.to_string(),
        Err(e) => {
            tracing::warn!("Calculation of {:?} failed: {}", expression, e);
            format!("Calculation error: {}", e)
        }
    }
}

/// `run <command>` with the command text, if `text` has that form.
fn shell_command(text: &str) -> Option<&str> {
    let rest = text.strip_prefix("run")?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let rest = rest.trim();
    (!rest.is_empty()).then_some(rest)
}

fn web_url(base: &str, key: &str, value: &str) -> std::result::Result<Url, PrimitiveError> {
    Url::parse_with_params(base, &[(key, value)])
        .map_err(|e| PrimitiveError::other(format!("Invalid URL: {}", e)))
}

/// Log a handler failure and render it for the user.
fn failure(handler: &str, prefix: impl AsRef<str>, error: impl std::fmt::Display) -> String {
    tracing::warn!("{} handler failed: {}", handler, error);
    format!("{}: {}", prefix.as_ref(), error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::testing::{FakeLookup, FakePlatform};
    use crate::platform::ShellOutput;
    use regex::Regex;
    use tempfile::TempDir;

    struct Harness {
        assistant: Assistant,
        platform: Arc<FakePlatform>,
        lookup: Arc<FakeLookup>,
    }

    fn harness_with(platform: FakePlatform, lookup: FakeLookup, caps: Capabilities) -> Harness {
        crate::logging::init_test();
        let platform = Arc::new(platform);
        let lookup = Arc::new(lookup);
        let assistant = Assistant::new(
            Settings::default(),
            caps,
            platform.clone(),
            lookup.clone(),
        );
        Harness {
            assistant,
            platform,
            lookup,
        }
    }

    fn harness() -> Harness {
        harness_with(
            FakePlatform::default(),
            FakeLookup::default(),
            Capabilities::all(),
        )
    }

    #[tokio::test]
    async fn invalid_input_is_rejected_without_side_effects() {
        let h = harness();
        let too_long = "open ".to_string() + &"x".repeat(1000);

        for input in ["", "   ", too_long.as_str()] {
            assert_eq!(h.assistant.execute(input).await, INVALID_COMMAND);
        }
        assert!(h.platform.calls().is_empty());
        assert!(h.assistant.history().await.is_empty());
    }

    #[tokio::test]
    async fn max_length_is_inclusive() {
        let h = harness();
        let exact = "x".repeat(1000);
        assert_ne!(h.assistant.execute(&exact).await, INVALID_COMMAND);
    }

    #[tokio::test]
    async fn history_keeps_last_ten() {
        let h = harness();
        for i in 0..15 {
            h.assistant.execute(&format!("remind me to task {}", i)).await;
        }

        let history = h.assistant.history().await;
        assert_eq!(history.len(), 10);
        assert_eq!(history[0].command, "remind me to task 5");
        assert_eq!(history[9].command, "remind me to task 14");
    }

    #[tokio::test]
    async fn exit_wakes_stopped_waiters() {
        let h = harness();
        let assistant = Arc::new(h.assistant);
        let waiter = {
            let assistant = assistant.clone();
            tokio::spawn(async move { assistant.stopped().await })
        };

        assert_eq!(assistant.execute("quit").await, FAREWELL);
        tokio::time::timeout(std::time::Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        // Already stopped: returns at once.
        assistant.stopped().await;
    }

    #[tokio::test]
    async fn history_records_utterance_as_given() {
        let h = harness();
        h.assistant.execute("  Remind me to Stretch ").await;

        let history = h.assistant.history().await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].command, "  Remind me to Stretch ");
    }

    #[tokio::test]
    async fn concurrent_execution_respects_history_bound() {
        let h = harness();
        let assistant = Arc::new(h.assistant);
        let mut handles = Vec::new();
        for i in 0..40 {
            let assistant = assistant.clone();
            handles.push(tokio::spawn(async move {
                assistant.execute(&format!("remind me to {}", i)).await
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(assistant.history().await.len(), 10);
    }

    #[tokio::test]
    async fn calculate_evaluates_and_rejects() {
        let h = harness();
        let ok = h.assistant.execute("calculate 2 + 2 * 3").await;
        assert_eq!(ok, "Result: 8");
        assert!(ok.contains('8'));

        assert_eq!(h.assistant.execute("calculate 2; import os").await, MATH_ONLY);
        assert_eq!(
            h.assistant.execute("calculate 1 / 0").await,
            "Calculation error: division by zero"
        );
        assert_eq!(h.assistant.execute("calculate 7 / 2").await, "Result: 3.5");
    }

    #[tokio::test]
    async fn time_and_date_use_fixed_templates() {
        let h = harness();
        let time = h.assistant.execute("what's time").await;
        assert!(
            Regex::new(r"^The time is \d{2}:\d{2} (AM|PM)$").unwrap().is_match(&time),
            "{}",
            time
        );

        let date = h.assistant.execute("what's the date").await;
        assert!(
            Regex::new(r"^Today is [A-Z][a-z]+, [A-Z][a-z]+ \d{2}, \d{4}$")
                .unwrap()
                .is_match(&date),
            "{}",
            date
        );
    }

    #[tokio::test]
    async fn exit_clears_running_flag() {
        let h = harness();
        assert!(h.assistant.is_running());
        assert_eq!(h.assistant.execute("exit").await, FAREWELL);
        assert!(!h.assistant.is_running());
    }

    #[tokio::test]
    async fn quit_also_says_goodbye() {
        let h = harness();
        assert_eq!(h.assistant.execute("Quit").await, FAREWELL);
        assert!(!h.assistant.is_running());
    }

    #[tokio::test]
    async fn headless_capabilities_yield_unavailable_messages() {
        let h = harness_with(
            FakePlatform::default(),
            FakeLookup::default(),
            Capabilities::none(),
        );
        assert_eq!(h.assistant.execute("volume up").await, VOLUME_UNAVAILABLE);
        assert_eq!(h.assistant.execute("screenshot").await, SCREENSHOT_UNAVAILABLE);
        assert_eq!(h.assistant.execute("lock screen").await, LOCK_UNAVAILABLE);
        assert_eq!(
            h.assistant.execute("play jazz on youtube").await,
            YOUTUBE_UNAVAILABLE
        );
        assert!(h.platform.calls().is_empty());
    }

    #[tokio::test]
    async fn lock_without_platform_controls_is_unsupported() {
        let caps = Capabilities {
            platform_controls: false,
            ..Capabilities::all()
        };
        let h = harness_with(FakePlatform::default(), FakeLookup::default(), caps);
        assert_eq!(h.assistant.execute("lock screen").await, LOCK_UNSUPPORTED);
        assert!(h.platform.calls().is_empty());
    }

    #[tokio::test]
    async fn volume_maps_directions_to_keys() {
        let h = harness();
        assert_eq!(h.assistant.execute("volume up").await, "Volume turned up");
        assert_eq!(h.assistant.execute("turn down").await, "Volume turned down");
        assert_eq!(h.assistant.execute("volume mute").await, "Toggled mute");
        assert_eq!(
            h.platform.calls(),
            vec![
                "press_volume_key:Up",
                "press_volume_key:Down",
                "press_volume_key:Mute"
            ]
        );
    }

    #[tokio::test]
    async fn open_falls_back_to_browser() {
        let mut platform = FakePlatform::default();
        platform.existing_paths.insert("notes.txt".to_string());
        let h = harness_with(platform, FakeLookup::default(), Capabilities::all());

        assert_eq!(h.assistant.execute("open notes.txt").await, "Opened notes.txt");
        assert_eq!(
            h.assistant.execute("open github.com").await,
            "Opened github.com in browser"
        );
        assert_eq!(
            h.platform.calls(),
            vec![
                "open_path:notes.txt",
                "open_path:github.com",
                "open_url:https://github.com"
            ]
        );
    }

    #[tokio::test]
    async fn open_reports_when_both_attempts_fail() {
        let h = harness_with(
            FakePlatform::failing(&["open_url"]),
            FakeLookup::default(),
            Capabilities::all(),
        );
        let response = h.assistant.execute("open the void").await;
        assert_eq!(response, "Couldn't open void: open_url exploded");
    }

    #[tokio::test]
    async fn search_opens_encoded_query() {
        let h = harness();
        assert_eq!(
            h.assistant.execute("search for rust & tokio").await,
            "Searching for rust & tokio"
        );
        assert_eq!(
            h.platform.calls(),
            vec!["open_url:https://www.google.com/search?q=rust+%26+tokio"]
        );
    }

    #[tokio::test]
    async fn media_only_echoes_while_youtube_plays() {
        let h = harness();
        assert_eq!(h.assistant.execute("play jazz").await, "Playing jazz");
        assert!(h.platform.calls().is_empty());

        assert_eq!(
            h.assistant.execute("play jazz on youtube").await,
            "Playing jazz on YouTube"
        );
        assert_eq!(
            h.platform.calls(),
            vec!["open_url:https://www.youtube.com/results?search_query=jazz"]
        );
    }

    #[tokio::test]
    async fn reminder_is_acknowledged_only() {
        let h = harness();
        assert_eq!(
            h.assistant.execute("remind me to water the plants").await,
            "I'll remind you to water the plants"
        );
        assert!(h.platform.calls().is_empty());
    }

    #[tokio::test]
    async fn joke_comes_from_platform() {
        let h = harness();
        assert_eq!(
            h.assistant.execute("tell me a joke").await,
            "There are 10 kinds of people."
        );
        assert_eq!(h.platform.calls(), vec!["tell_joke"]);
    }

    #[tokio::test]
    async fn shell_commands_are_opt_in() {
        let h = harness();
        assert_eq!(h.assistant.execute("run ls").await, SHELL_DISABLED);
        assert!(h.platform.calls().is_empty());
    }

    #[tokio::test]
    async fn shell_command_output_is_returned() {
        let platform = FakePlatform {
            shell_output: ShellOutput {
                stdout: String::new(),
                stderr: "warning".to_string(),
                status: Some(0),
            },
            ..Default::default()
        };
        let h = harness_with(platform, FakeLookup::default(), Capabilities::all());
        let mut settings = Settings::default();
        settings.features.allow_shell_commands = true;
        *h.assistant.settings.write().await = settings;

        assert_eq!(
            h.assistant.execute("run ls -la").await,
            "Command executed:\nNo output\nwarning"
        );
        assert_eq!(h.platform.calls(), vec!["run_shell:ls -la"]);
    }

    #[tokio::test]
    async fn process_list_is_truncated() {
        let platform = FakePlatform {
            processes: 30,
            ..Default::default()
        };
        let h = harness_with(platform, FakeLookup::default(), Capabilities::all());
        let response = h.assistant.execute("list processes").await;

        let lines: Vec<&str> = response.lines().collect();
        assert_eq!(lines[0], "Running processes:");
        assert_eq!(lines.len(), 1 + PROCESS_LIST_LIMIT);
        assert_eq!(lines[1], "1 proc0 root");
    }

    #[tokio::test]
    async fn system_monitor_and_info_render_telemetry() {
        let h = harness();
        let monitor = h.assistant.execute("system monitor").await;
        assert!(monitor.starts_with("System Monitor:\nCPU: 12.5%"));
        assert!(monitor.contains("Network: ↑2KB ↓4KB"));

        let info = h.assistant.execute("system info").await;
        assert_eq!(
            info,
            "System Information:\nOS: Linux 6.1\nCPU: 5.0% | RAM: 50.0% | Disk: 25.0%"
        );
    }

    #[tokio::test]
    async fn shutdown_reports_delay() {
        let h = harness();
        assert_eq!(
            h.assistant.execute("shutdown").await,
            "Shutting down in 30 seconds"
        );
        assert_eq!(h.assistant.execute("restart").await, "Restarting in 30 seconds");
        assert!(h.assistant.is_running());
    }

    #[tokio::test]
    async fn primitive_failures_become_text() {
        let h = harness_with(
            FakePlatform::failing(&["power", "press_volume_key", "system_snapshot", "lock_screen"]),
            FakeLookup::default(),
            Capabilities::all(),
        );
        assert_eq!(
            h.assistant.execute("shutdown").await,
            "Couldn't shut down: power exploded"
        );
        assert_eq!(
            h.assistant.execute("volume up").await,
            "Couldn't adjust volume: press_volume_key exploded"
        );
        assert_eq!(
            h.assistant.execute("system info").await,
            "Couldn't get system info: system_snapshot exploded"
        );
        assert_eq!(
            h.assistant.execute("lock screen").await,
            "Couldn't lock screen: lock_screen exploded"
        );
    }

    #[tokio::test]
    async fn screenshot_lands_in_configured_dir() {
        let dir = TempDir::new().unwrap();
        let h = harness();
        let mut settings = Settings::default();
        settings.screenshot_dir = Some(dir.path().join("shots"));
        *h.assistant.settings.write().await = settings;

        let response = h.assistant.execute("take a screenshot").await;
        assert!(response.starts_with("Screenshot saved as "), "{}", response);
        assert!(response.contains("screenshot_"));
        assert!(dir.path().join("shots").is_dir());
        assert_eq!(h.platform.calls().len(), 1);
    }

    #[tokio::test]
    async fn weather_uses_given_location() {
        let h = harness();
        assert_eq!(
            h.assistant.execute("weather in paris").await,
            "Weather in paris: Sunny +21°C ↗11km/h"
        );
        assert_eq!(h.lookup.calls(), vec!["weather:paris"]);
    }

    #[tokio::test]
    async fn weather_without_location_geolocates() {
        let lookup = FakeLookup {
            city: Some("Oslo".to_string()),
            ..Default::default()
        };
        let h = harness_with(FakePlatform::default(), lookup, Capabilities::all());

        for utterance in ["weather", "weather ", "What's the weather", "weather in"] {
            assert_eq!(
                h.assistant.execute(utterance).await,
                "Weather in Oslo: Sunny +21°C ↗11km/h",
                "{:?}",
                utterance
            );
        }
        let expected: Vec<String> = (0..4)
            .flat_map(|_| ["locate_city", "weather:Oslo"])
            .map(String::from)
            .collect();
        assert_eq!(h.lookup.calls(), expected);
    }

    #[tokio::test]
    async fn weather_without_known_city_lets_service_decide() {
        let h = harness();
        assert_eq!(
            h.assistant.execute("weather").await,
            "Weather in your location: Sunny +21°C ↗11km/h"
        );
        assert_eq!(h.lookup.calls(), vec!["locate_city", "weather:"]);
    }

    #[tokio::test]
    async fn weather_failure_is_reported() {
        let lookup = FakeLookup {
            fail: true,
            ..Default::default()
        };
        let h = harness_with(FakePlatform::default(), lookup, Capabilities::all());
        assert_eq!(
            h.assistant.execute("weather at home").await,
            "Couldn't get weather: service down"
        );
    }

    #[tokio::test]
    async fn unknown_echoes_original_text() {
        let h = harness();
        assert_eq!(
            h.assistant.execute("  Sing Me A Song ").await,
            "I don't understand: Sing Me A Song"
        );
    }

    #[tokio::test]
    async fn executed_commands_are_broadcast() {
        let h = harness();
        let mut events = h.assistant.subscribe();
        h.assistant.execute("play jazz").await;

        let event = events.recv().await.unwrap();
        assert_eq!(event.command, "play jazz");
        assert_eq!(event.response, "Playing jazz");
    }

    #[tokio::test]
    async fn settings_updates_are_persisted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let h = harness();
        let assistant = h.assistant.with_settings_path(path.clone());

        let update = SettingsUpdate {
            wake_word: None,
            theme: Some("dark".to_string()),
        };
        let updated = assistant.update_settings(&update).await.unwrap();
        assert_eq!(updated.theme, "dark");
        assert_eq!(Settings::load_or_create(&path).unwrap().theme, "dark");

        let bad = SettingsUpdate {
            wake_word: Some(" ".to_string()),
            theme: None,
        };
        assert!(assistant.update_settings(&bad).await.is_err());
        assert_eq!(assistant.settings().await.theme, "dark");
    }

    #[test]
    fn test_shell_command_form() {
        assert_eq!(shell_command("run ls -la"), Some("ls -la"));
        assert_eq!(shell_command("run   df"), Some("df"));
        assert_eq!(shell_command("running"), None);
        assert_eq!(shell_command("run "), None);
    }
}

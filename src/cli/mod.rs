//! CLI commands for NeuroFusion using clap.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::capabilities::Capabilities;
use crate::capture::{capture_until_exit, StdinSource};
use crate::config::{get_settings_path, Settings, SettingsUpdate};
use crate::core::{classify, Assistant};
use crate::heartbeat::spawn_background_tasks;
use crate::logging::LogOptions;
use crate::platform::{HttpLookup, SystemPlatform};
use crate::web::{run_server, WebServerConfig};

/// How long `run` waits for web connections to drain on exit.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// NeuroFusion - voice and text command assistant.
#[derive(Parser)]
#[command(name = "neurofusion")]
#[command(version)]
#[command(about = "NeuroFusion - turn short commands into desktop actions", long_about = None)]
pub struct Commands {
    /// Settings file (default: ~/.neurofusion/config.json)
    #[arg(long, global = true, env = "NEUROFUSION_CONFIG")]
    pub config: Option<PathBuf>,

    /// Show info and debug logs on the console, not just warnings
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Write the log file as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the web interface, background tasks and the command prompt (default)
    Run,

    /// Start the web interface and background tasks only
    Web {
        /// Port number (overrides settings)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Execute a single command and print the response
    Exec {
        /// Command text
        #[arg(required = true, trailing_var_arg = true)]
        words: Vec<String>,
    },

    /// Show how a command would be classified, without running it
    Classify {
        /// Command text
        #[arg(required = true, trailing_var_arg = true)]
        words: Vec<String>,
    },

    /// Settings commands
    #[command(subcommand)]
    Settings(SettingsCommand),

    /// Show the probed capability set
    Capabilities,
}

#[derive(Subcommand)]
pub enum SettingsCommand {
    /// Print current settings
    Show,

    /// Update wake word and/or theme
    Set {
        /// New wake word
        #[arg(long)]
        wake_word: Option<String>,

        /// Theme: light or dark
        #[arg(long)]
        theme: Option<String>,
    },
}

impl Commands {
    /// Logging options requested on the command line.
    pub fn log_options(&self) -> LogOptions {
        LogOptions {
            verbose: self.verbose,
            json: self.log_json,
        }
    }

    /// Run the command.
    pub async fn run(&self) -> Result<()> {
        match self.command.as_ref().unwrap_or(&Command::Run) {
            Command::Run => cmd_run(self.settings_path()?).await,
            Command::Web { port } => cmd_web(self.settings_path()?, *port).await,
            Command::Exec { words } => cmd_exec(self.settings_path()?, &words.join(" ")).await,
            Command::Classify { words } => cmd_classify(&words.join(" ")),
            Command::Settings(cmd) => cmd_settings(self.settings_path()?, cmd).await,
            Command::Capabilities => cmd_capabilities(),
        }
    }

    fn settings_path(&self) -> Result<PathBuf> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => Ok(get_settings_path()?),
        }
    }
}

/// Build the shared assistant from the settings file and probed environment.
fn build_assistant(settings_path: PathBuf) -> Result<Arc<Assistant>> {
    let settings = Settings::load_or_create(&settings_path)
        .with_context(|| format!("loading settings from {}", settings_path.display()))?;
    let lookup = HttpLookup::new(&settings.lookup).context("building HTTP client")?;

    let assistant = Assistant::new(
        settings,
        Capabilities::probe(),
        Arc::new(SystemPlatform::new()),
        Arc::new(lookup),
    )
    .with_settings_path(settings_path);

    Ok(Arc::new(assistant))
}

fn print_banner() {
    println!(
        r#"
    NEUROFUSION v{}
    Voice and text command assistant
    "#,
        env!("CARGO_PKG_VERSION")
    );
}

// Command implementations

async fn cmd_run(settings_path: PathBuf) -> Result<()> {
    print_banner();
    let assistant = build_assistant(settings_path)?;
    let settings = assistant.settings().await;

    let background = spawn_background_tasks(assistant.clone()).await;

    let (stop_web, web_stopped) = tokio::sync::oneshot::channel::<()>();
    let web = tokio::spawn(run_server(
        assistant.clone(),
        WebServerConfig::from(&settings.web),
        async {
            web_stopped.await.ok();
        },
    ));

    if !assistant.capabilities().microphone {
        tracing::warn!("Microphone unavailable - reading commands from stdin");
    }

    tokio::select! {
        _ = capture_until_exit(assistant.clone(), StdinSource::new()) => {}
        _ = tokio::signal::ctrl_c() => {
            println!("\nShutting down...");
            assistant.stop();
        }
    }

    stop_web.send(()).ok();
    // Event stream clients hold connections open; don't wait on them forever.
    match tokio::time::timeout(SHUTDOWN_GRACE, web).await {
        Ok(Ok(Err(e))) => tracing::error!("Web server error: {}", e),
        Ok(Err(e)) => tracing::error!("Web server task failed: {}", e),
        Ok(Ok(Ok(()))) => {}
        Err(_) => tracing::warn!("Web server still draining after {:?}", SHUTDOWN_GRACE),
    }
    for handle in background {
        handle.abort();
    }

    Ok(())
}

async fn cmd_web(settings_path: PathBuf, port: Option<u16>) -> Result<()> {
    let assistant = build_assistant(settings_path)?;
    let settings = assistant.settings().await;

    let background = spawn_background_tasks(assistant.clone()).await;

    let mut config = WebServerConfig::from(&settings.web);
    if let Some(port) = port {
        config.port = port;
    }

    let result = run_server(assistant, config, async {
        tokio::signal::ctrl_c().await.ok();
    })
    .await;

    for handle in background {
        handle.abort();
    }
    result?;
    Ok(())
}

async fn cmd_exec(settings_path: PathBuf, command: &str) -> Result<()> {
    let assistant = build_assistant(settings_path)?;
    let response = assistant.execute(command).await;
    println!("{}", response);
    Ok(())
}

fn cmd_classify(text: &str) -> Result<()> {
    let classification = classify(text);
    println!("intent:    {}", classification.intent);
    println!("parameter: {}", classification.parameter);
    Ok(())
}

async fn cmd_settings(settings_path: PathBuf, cmd: &SettingsCommand) -> Result<()> {
    let mut settings = Settings::load_or_create(&settings_path)?;

    match cmd {
        SettingsCommand::Show => {
            println!("Settings file: {}", settings_path.display());
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        SettingsCommand::Set { wake_word, theme } => {
            if wake_word.is_none() && theme.is_none() {
                anyhow::bail!("Nothing to update. Pass --wake-word and/or --theme");
            }
            let update = SettingsUpdate {
                wake_word: wake_word.clone(),
                theme: theme.clone(),
            };
            settings.apply(&update)?;
            settings.save(&settings_path)?;
            println!(
                "Updated settings: wake_word={} theme={}",
                settings.wake_word, settings.theme
            );
        }
    }

    Ok(())
}

fn cmd_capabilities() -> Result<()> {
    println!("{}", Capabilities::probe());
    Ok(())
}

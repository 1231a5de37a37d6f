//! Work done by the background loops.

use crate::capabilities::Capabilities;
use crate::config::Settings;
use crate::core::Assistant;
use crate::error::{Error, Result};

/// Outcome of one health check.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthReport {
    pub capabilities: Capabilities,
    /// Capabilities differ from the startup probe.
    pub capabilities_changed: bool,
    pub settings_readable: bool,
}

/// Re-probe capabilities and verify the settings file still parses.
pub async fn check_health(assistant: &Assistant) -> Result<HealthReport> {
    check_health_with(assistant, Capabilities::probe()).await
}

pub(crate) async fn check_health_with(
    assistant: &Assistant,
    current: Capabilities,
) -> Result<HealthReport> {
    let capabilities_changed = current != assistant.capabilities();
    if capabilities_changed {
        tracing::warn!(
            "Capabilities changed since startup: was [{}], now [{}]",
            assistant.capabilities(),
            current
        );
    }

    let settings_readable = match assistant.settings_path() {
        Some(path) => {
            let content = tokio::fs::read_to_string(path).await?;
            serde_json::from_str::<Settings>(&content).is_ok()
        }
        None => true,
    };

    let report = HealthReport {
        capabilities: current,
        capabilities_changed,
        settings_readable,
    };

    if !settings_readable {
        return Err(Error::Config(format!(
            "Settings file is no longer valid JSON ({:?})",
            report
        )));
    }

    tracing::debug!("Health check passed: {}", current);
    Ok(report)
}

/// Run the configured refresh command. Returns false when none is set.
pub async fn refresh_dependencies(assistant: &Assistant) -> Result<bool> {
    let Some(command) = assistant.settings().await.monitoring.refresh_command else {
        tracing::debug!("No refresh command configured");
        return Ok(false);
    };

    tracing::info!("Refreshing dependencies: {}", command);
    let output = assistant
        .platform()
        .run_shell(&command)
        .await
        .map_err(|e| Error::Other(format!("Dependency refresh failed: {}", e)))?;

    if output.status != Some(0) {
        return Err(Error::Other(format!(
            "Dependency refresh exited with {:?}: {}",
            output.status,
            output.stderr.trim()
        )));
    }

    tracing::info!("Dependencies updated successfully");
    Ok(true)
}

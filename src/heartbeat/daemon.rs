//! Background loops: periodic health check and dependency refresh.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::core::Assistant;

use super::tasks::{check_health, refresh_dependencies};

/// Shortest interval accepted from settings.
const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Start both loops. They run for the life of the process; failures are
/// logged and the loop carries on.
pub async fn spawn_background_tasks(assistant: Arc<Assistant>) -> Vec<JoinHandle<()>> {
    let monitoring = assistant.settings().await.monitoring;
    let health_every = Duration::from_secs(monitoring.health_check_interval).max(MIN_INTERVAL);
    let refresh_every = Duration::from_secs(monitoring.refresh_interval).max(MIN_INTERVAL);

    tracing::info!(
        "Starting background tasks (health every {:?}, refresh every {:?})",
        health_every,
        refresh_every
    );

    vec![
        tokio::spawn(health_loop(assistant.clone(), health_every)),
        tokio::spawn(refresh_loop(assistant, refresh_every)),
    ]
}

async fn health_loop(assistant: Arc<Assistant>, period: Duration) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        if let Err(e) = check_health(&assistant).await {
            tracing::error!("Health monitoring error: {}", e);
        }
    }
}

async fn refresh_loop(assistant: Arc<Assistant>, period: Duration) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        if let Err(e) = refresh_dependencies(&assistant).await {
            tracing::error!("Self-improvement error: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::Capabilities;
    use crate::config::Settings;
    use crate::platform::testing::{FakeLookup, FakePlatform};
    use crate::platform::ShellOutput;

    #[tokio::test(start_paused = true)]
    async fn refresh_loop_survives_failures() {
        let mut settings = Settings::default();
        settings.monitoring.refresh_command = Some("upgrade".to_string());
        settings.monitoring.refresh_interval = 10;
        let platform = Arc::new(FakePlatform {
            shell_output: ShellOutput {
                status: Some(2),
                ..Default::default()
            },
            ..Default::default()
        });
        let assistant = Arc::new(Assistant::new(
            settings,
            Capabilities::none(),
            platform.clone(),
            Arc::new(FakeLookup::default()),
        ));

        let handles = spawn_background_tasks(assistant).await;
        tokio::time::sleep(Duration::from_secs(25)).await;

        assert_eq!(platform.calls().len(), 3);
        for handle in &handles {
            assert!(!handle.is_finished());
        }
        for handle in handles {
            handle.abort();
        }
    }
}

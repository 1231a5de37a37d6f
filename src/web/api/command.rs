//! API endpoint for executing commands.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::core::Assistant;

/// Execute command request.
#[derive(Deserialize)]
pub struct CommandRequest {
    #[serde(default)]
    pub command: String,
}

/// Execute command response. Failures are carried as response text.
#[derive(Serialize, Deserialize, Debug)]
pub struct CommandResponse {
    pub response: String,
}

/// Execute a single command.
pub async fn execute_command(
    State(assistant): State<Arc<Assistant>>,
    Json(payload): Json<CommandRequest>,
) -> Json<CommandResponse> {
    let response = assistant.execute(&payload.command).await;
    Json(CommandResponse { response })
}

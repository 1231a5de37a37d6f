//! API endpoints for settings.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::{Settings, SettingsUpdate};
use crate::core::Assistant;
use crate::error::Error;

/// Settings API response.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct SettingsResponse {
    pub wake_word: String,
    pub theme: String,
}

impl From<Settings> for SettingsResponse {
    fn from(settings: Settings) -> Self {
        Self {
            wake_word: settings.wake_word,
            theme: settings.theme,
        }
    }
}

/// Get the user-facing settings.
pub async fn get_settings(State(assistant): State<Arc<Assistant>>) -> Json<SettingsResponse> {
    Json(SettingsResponse::from(assistant.settings().await))
}

/// Update wake word and/or theme.
pub async fn update_settings(
    State(assistant): State<Arc<Assistant>>,
    Json(payload): Json<SettingsUpdate>,
) -> Result<Json<SettingsResponse>, (StatusCode, String)> {
    match assistant.update_settings(&payload).await {
        Ok(settings) => Ok(Json(SettingsResponse::from(settings))),
        Err(Error::Config(msg)) => Err((StatusCode::BAD_REQUEST, msg)),
        Err(e) => {
            tracing::error!("Failed to save settings: {}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

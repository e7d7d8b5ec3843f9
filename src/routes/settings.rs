//! Auto-send settings route.
//!
//! GET returns the current tuning plus system status; POST/PUT merges
//! a partial update after bounds validation. Bounds are checked before
//! any merge so an invalid threshold never half-applies.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use crate::config::AutoSendSettings;
use crate::routes::AppState;
use crate::validate::check_range;

/// Partial settings update, camelCase like the stored settings.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsPatch {
    pub enabled: Option<bool>,
    pub delay_minutes: Option<i64>,
    pub confidence_threshold: Option<i64>,
    pub test_mode: Option<bool>,
    pub max_per_hour: Option<u32>,
    pub allowed_categories: Option<Vec<String>>,
    pub excluded_keywords: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SettingsRequest {
    #[serde(default)]
    pub settings: SettingsPatch,
    pub user_email: Option<String>,
}

pub async fn get_settings(State(state): State<AppState>) -> Response {
    let settings = state.settings.read().await.clone();
    Json(json!({
        "success": true,
        "message": "Paramètres Auto-Send récupérés",
        "timestamp": Utc::now().to_rfc3339(),
        "platform": "Hormur",
        "settings": settings,
        "system_status": {
            "auto_send_operational": settings.enabled,
            "current_mode": if settings.test_mode { "test" } else { "production" },
            "last_updated": Utc::now().to_rfc3339(),
        },
        // Demo metrics until the reporting scenario exposes real ones
        "metrics": {
            "messages_auto_sent_today": 6,
            "messages_pending_auto_send": 2,
            "average_confidence_score": 92,
            "success_rate_24h": 94.5,
            "total_auto_sent_this_week": 42,
        },
    }))
    .into_response()
}

pub async fn update_settings(
    State(state): State<AppState>,
    Json(request): Json<SettingsRequest>,
) -> Response {
    let patch = request.settings;

    // Bounds first — reject before touching stored settings.
    if let Some(threshold) = patch.confidence_threshold {
        if let Err(received) = check_range(threshold, 50, 100) {
            return out_of_range(
                "confidenceThreshold",
                "Seuil de confiance invalide (doit être entre 50 et 100)",
                received,
            );
        }
    }
    if let Some(delay) = patch.delay_minutes {
        if let Err(received) = check_range(delay, 0, 1440) {
            return out_of_range(
                "delayMinutes",
                "Délai invalide (doit être entre 0 et 1440 minutes)",
                received,
            );
        }
    }

    let updated_by = request.user_email.as_deref().unwrap_or("system");
    let mut settings = state.settings.write().await;
    let changes = apply_patch(&mut settings, &patch);

    if patch.enabled.is_some() {
        info!(
            enabled = settings.enabled,
            updated_by, "Auto-send toggled"
        );
    }

    Json(json!({
        "success": true,
        "message": "Paramètres Auto-Send mis à jour avec succès",
        "timestamp": Utc::now().to_rfc3339(),
        "platform": "Hormur",
        "settings": settings.clone(),
        "updated_by": updated_by,
        "changes_applied": changes,
    }))
    .into_response()
}

/// Merge a patch into the stored settings, reporting what changed.
fn apply_patch(settings: &mut AutoSendSettings, patch: &SettingsPatch) -> Value {
    let mut changes = serde_json::Map::new();

    if let Some(enabled) = patch.enabled {
        settings.enabled = enabled;
        changes.insert("enabled".into(), json!(enabled));
    }
    if let Some(delay) = patch.delay_minutes {
        settings.delay_minutes = delay as u32;
        changes.insert("delayMinutes".into(), json!(delay));
    }
    if let Some(threshold) = patch.confidence_threshold {
        settings.confidence_threshold = threshold as u32;
        changes.insert("confidenceThreshold".into(), json!(threshold));
    }
    if let Some(test_mode) = patch.test_mode {
        settings.test_mode = test_mode;
        changes.insert("testMode".into(), json!(test_mode));
    }
    if let Some(max) = patch.max_per_hour {
        settings.max_per_hour = max;
        changes.insert("maxPerHour".into(), json!(max));
    }
    if let Some(categories) = &patch.allowed_categories {
        settings.allowed_categories = categories.clone();
        changes.insert("allowedCategories".into(), json!(categories));
    }
    if let Some(keywords) = &patch.excluded_keywords {
        settings.excluded_keywords = keywords.clone();
        changes.insert("excludedKeywords".into(), json!(keywords));
    }

    Value::Object(changes)
}

fn out_of_range(field: &str, message: &str, received: i64) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": message,
            "field": field,
            "received": received,
        })),
    )
        .into_response()
}

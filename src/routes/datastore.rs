//! Datastore update route — standard HTTP semantics.
//!
//! Unlike send-response, a sink failure here surfaces as a 502 with
//! the upstream status and body echoed: the caller is the dashboard,
//! which shows the error instead of retrying blindly.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde_json::{Value, json};
use tracing::{error, info};

use crate::datastore::{
    UpdateAction, actions_performed, build_update_payload, ui_update_instructions,
};
use crate::error::SinkError;
use crate::routes::{AppState, configuration_missing, missing_fields};
use crate::validate::require;

const REQUIRED: &[&str] = &["action", "message_id"];

pub async fn update_datastore(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    let check = require(&body, REQUIRED);
    if !check.ok() {
        return missing_fields(&check, REQUIRED);
    }

    // Bulk form carries the id list alongside the (ignored) single id.
    if body["action"] == "bulk_archive" {
        let bulk_check = require(&body, &["message_ids"]);
        if !bulk_check.ok() {
            return missing_fields(&bulk_check, &["action", "message_id", "message_ids"]);
        }
    }

    let Some(sink) = &state.datastore_sink else {
        return configuration_missing("MAKE_DATASTORE_UPDATE_WEBHOOK non configuré");
    };

    let action = body["action"].as_str().unwrap_or_default().to_string();
    let message_id = body["message_id"].clone();
    let payload = build_update_payload(&body);

    info!(
        message_id = %payload["key"],
        action = %action,
        updated_by = %payload["updated_by"],
        "Updating datastore"
    );

    match sink.post(&payload).await {
        Ok(datastore_result) => Json(json!({
            "success": true,
            "message": format!("Action '{action}' effectuée avec succès"),
            "timestamp": Utc::now().to_rfc3339(),
            "platform": "Hormur",
            "data": {
                "message_id": message_id,
                "action": action,
                "updated_by": payload["updated_by"],
                "datastore_result": datastore_result,
            },
            "ui_update": ui_update_instructions(UpdateAction::parse(&action)),
            "actions_performed": actions_performed(UpdateAction::parse(&action)),
        }))
        .into_response(),

        Err(err) => {
            error!(
                action = %action,
                error = %err,
                upstream_status = ?err.upstream_status(),
                "Datastore update failed"
            );
            let detail = match &err {
                SinkError::Upstream { status, body, .. } => json!({
                    "error": "Erreur lors de la mise à jour du datastore",
                    "status": status,
                    "details": body,
                }),
                other => json!({
                    "error": "Erreur lors de la mise à jour du datastore",
                    "details": other.to_string(),
                }),
            };
            (StatusCode::BAD_GATEWAY, Json(detail)).into_response()
        }
    }
}

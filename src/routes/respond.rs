//! Send-response route — the fail-soft delivery endpoint.
//!
//! Contract quirk, kept deliberately: apart from field validation this
//! route answers 200 even when every channel failed, with `success:
//! false` in the body. The caller is a Make.com scenario that retries
//! any non-2xx aggressively; a 5xx here turns one outage into a retry
//! storm. Partial failure is reported per channel instead.

use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde_json::{Value, json};
use tracing::info;

use crate::reconciler::DeliveryResult;
use crate::routes::{AppState, missing_fields};
use crate::sanitize::sanitize_text;
use crate::sinks::OutboundReply;
use crate::validate::require;

const REQUIRED: &[&str] = &["message_id", "response_text", "sent_by"];

pub async fn send_response(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    let reply = reply_from_body(&body);
    let result = deliver(&state, &body, &reply).await;

    // Transport mapping: rejection is the only non-200 path. Delivery
    // failure stays a 200 with a body-level flag (see module docs).
    match &result {
        DeliveryResult::Rejected { missing } => missing_fields(
            &crate::validate::FieldCheck {
                missing: missing.clone(),
            },
            REQUIRED,
        ),
        _ => {
            let delivered = result.delivered();
            Json(json!({
                "success": delivered,
                "message": if delivered {
                    "Réponse envoyée"
                } else {
                    "Aucun canal n'a accepté la réponse"
                },
                "timestamp": Utc::now().to_rfc3339(),
                "platform": "Hormur",
                "data": {
                    "message_id": reply.message_id,
                    "original_message_id": reply.original_message_id,
                    "sent_by": reply.sent_by,
                    "response_length": reply.response_text.len(),
                    "status": if delivered { "sent" } else { "failed" },
                    "channels": result.channel_flags(),
                    "channel_report": result.channel_report(),
                },
            }))
            .into_response()
        }
    }
}

/// Validate, then run the reconciler. No channel is attempted when a
/// required field is absent.
async fn deliver(state: &AppState, body: &Value, reply: &OutboundReply) -> DeliveryResult {
    let check = require(body, REQUIRED);
    if !check.ok() {
        return DeliveryResult::Rejected {
            missing: check.missing,
        };
    }

    info!(
        message_id = %reply.message_id,
        sent_by = %reply.sent_by,
        has_visitor_id = reply.has_valid_visitor_id(),
        "Dispatching reply"
    );
    state.reconciler.deliver(reply).await
}

/// Build the outbound reply from the request body, sanitizing the text.
fn reply_from_body(body: &Value) -> OutboundReply {
    let text = body["response_text"].as_str().unwrap_or_default();
    let get = |key: &str| body.get(key).and_then(Value::as_str).map(String::from);

    OutboundReply {
        message_id: body["message_id"].as_str().unwrap_or_default().to_string(),
        original_message_id: get("original_message_id"),
        response_text: sanitize_text(text),
        sent_by: body["sent_by"].as_str().unwrap_or_default().to_string(),
        visitor_id: get("visitor_id"),
        category: get("category"),
        priority: get("priority"),
        channel: get("channel"),
        user_modifications: body
            .get("user_modifications")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        original_ai_response: get("original_ai_response"),
        brevo_contact_id: get("brevo_contact_id"),
    }
}

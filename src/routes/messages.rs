//! Message listing route — live fetch with demo fallback.
//!
//! When the retrieval webhook is configured, messages come from the
//! Make.com scenario; if it is absent or fails, the demo fixture set
//! answers instead so the dashboard always has something to render.

use axum::Json;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};
use uuid::Uuid;

use crate::demo::MessageFilters;
use crate::routes::AppState;

/// GET form: filters ride the query string.
pub async fn get_messages(
    State(state): State<AppState>,
    Query(filters): Query<MessageFilters>,
) -> Response {
    list(state, filters).await
}

/// POST form: filters ride the body under `filters`.
#[derive(Debug, Default, Deserialize)]
pub struct ListRequest {
    #[serde(default)]
    pub filters: MessageFilters,
}

pub async fn post_messages(
    State(state): State<AppState>,
    body: Option<Json<ListRequest>>,
) -> Response {
    let filters = body.map(|Json(req)| req.filters).unwrap_or_default();
    list(state, filters).await
}

async fn list(state: AppState, filters: MessageFilters) -> Response {
    if let Some(sink) = &state.get_messages_sink {
        let payload = json!({
            "filters": filters_as_value(&filters),
            "timestamp": Utc::now().to_rfc3339(),
            "platform": "Hormur",
            "request_id": format!("hormur_{}", Uuid::new_v4()),
        });

        match sink.post(&payload).await {
            Ok(data) => {
                let messages = extract_messages(data);
                info!(count = messages.len(), "Messages fetched from webhook");
                return Json(json!({
                    "success": true,
                    "source": "make_com_brevo",
                    "messages": messages,
                    "total": messages.len(),
                    "timestamp": Utc::now().to_rfc3339(),
                    "filters_applied": filters_as_value(&filters),
                    "platform": "Hormur",
                }))
                .into_response();
            }
            Err(err) => {
                warn!(error = %err, "Retrieval webhook failed, serving demo data");
            }
        }
    } else {
        info!("Retrieval webhook not configured, serving demo data");
    }

    let (messages, stats) = state.demo.filter(&filters);
    Json(json!({
        "success": true,
        "source": "demo_data_hormur",
        "messages": messages,
        "total": messages.len(),
        "timestamp": Utc::now().to_rfc3339(),
        "filters_applied": filters_as_value(&filters),
        "platform": "Hormur",
        "stats": stats,
    }))
    .into_response()
}

/// Pull the message array out of whatever shape the scenario returns.
///
/// Observed variants: a bare array, `{data: [...]}`, `{messages: [...]}`,
/// or a single object (wrapped into a one-element list).
fn extract_messages(data: Value) -> Vec<Value> {
    let inner = match &data {
        Value::Object(map) => map
            .get("data")
            .or_else(|| map.get("messages"))
            .cloned()
            .unwrap_or(data.clone()),
        _ => data,
    };
    match inner {
        Value::Array(items) => items,
        other => vec![other],
    }
}

fn filters_as_value(filters: &MessageFilters) -> Value {
    json!({
        "status": filters.status,
        "category": filters.category,
        "priority": filters.priority,
        "assignedTo": filters.assigned_to,
        "search": filters.search,
        "channel": filters.channel,
        "limit": filters.limit,
    })
}

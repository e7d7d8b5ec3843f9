//! HTTP surface — one route per handler concern.
//!
//! Every route speaks JSON with permissive CORS, answers `OPTIONS`
//! with a bare 200, and rejects wrong methods with a JSON 405 body.

pub mod datastore;
pub mod intake;
pub mod messages;
pub mod respond;
pub mod settings;

use std::sync::Arc;

use axum::http::{HeaderName, Method, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};

use crate::config::{AutoSendSettings, RouterConfig};
use crate::demo::DemoStore;
use crate::reconciler::Reconciler;
use crate::sinks::{AppsScriptSink, BrevoDirect, DeliveryChannel, MakeWebhook};
use crate::validate::FieldCheck;

/// Shared state for all routes.
#[derive(Clone)]
pub struct AppState {
    pub reconciler: Arc<Reconciler>,
    pub datastore_sink: Option<Arc<MakeWebhook>>,
    pub get_messages_sink: Option<Arc<MakeWebhook>>,
    pub b2b_sink: Option<Arc<MakeWebhook>>,
    pub urgent_sink: Option<Arc<MakeWebhook>>,
    pub demo: Arc<DemoStore>,
    pub settings: Arc<RwLock<AutoSendSettings>>,
}

impl AppState {
    /// Wire up sinks and the reconciler from configuration.
    ///
    /// Reply channels in priority order: direct Brevo, Make.com
    /// webhook, Apps Script. An unconfigured channel is simply absent.
    pub fn new(config: RouterConfig) -> Self {
        let mut channels: Vec<Arc<dyn DeliveryChannel>> = Vec::new();

        if config.brevo.api_key.is_some() {
            channels.push(Arc::new(BrevoDirect::new(
                config.brevo.clone(),
                config.timeouts.brevo,
            )));
        }
        if let Some(url) = &config.webhooks.send_response {
            channels.push(Arc::new(MakeWebhook::new(
                "make_com",
                url.clone(),
                "netlify-function",
                config.timeouts.make_webhook,
            )));
        }
        if config.apps_script.is_configured() {
            channels.push(Arc::new(AppsScriptSink::new(
                config.apps_script.clone(),
                config.timeouts.apps_script,
            )));
        }

        let make_sink = |name: &'static str, url: &Option<String>, tag: &'static str| {
            url.as_ref().map(|u| {
                Arc::new(MakeWebhook::new(
                    name,
                    u.clone(),
                    tag,
                    config.timeouts.make_webhook,
                ))
            })
        };

        Self {
            reconciler: Arc::new(Reconciler::new(channels)),
            datastore_sink: make_sink(
                "make_com",
                &config.webhooks.datastore_update,
                "netlify-update-datastore",
            ),
            get_messages_sink: make_sink(
                "make_com",
                &config.webhooks.get_messages,
                "netlify-function",
            ),
            b2b_sink: make_sink("make_com", &config.webhooks.b2b_opportunity, "b2b-system"),
            urgent_sink: make_sink("make_com", &config.webhooks.urgent_alert, "alert-system"),
            demo: Arc::new(DemoStore::new()),
            settings: Arc::new(RwLock::new(config.auto_send.clone())),
        }
    }
}

/// Build the full router with CORS applied.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-api-key"),
        ]);

    Router::new()
        .route("/health", get(health))
        .route(
            "/api/send-response",
            post(respond::send_response)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/datastore",
            post(datastore::update_datastore)
                .put(datastore::update_datastore)
                .delete(datastore::update_datastore)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/messages",
            get(messages::get_messages)
                .post(messages::post_messages)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/auto-send/settings",
            get(settings::get_settings)
                .post(settings::update_settings)
                .put(settings::update_settings)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/auto-send/log",
            post(intake::log_auto_send)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/b2b-opportunity",
            post(intake::b2b_opportunity)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/urgent-alert",
            post(intake::urgent_alert)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/manual-review",
            post(intake::manual_review)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/pending-queue",
            post(intake::pending_queue)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/spam-log",
            post(intake::spam_log)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        .with_state(state)
        .layer(cors)
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "hormur-router"
    }))
}

/// Bare 200 for OPTIONS; the CORS layer supplies the headers.
async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({"error": "Method not allowed"})),
    )
}

/// 400 naming every missing field, in the shape the dashboard expects.
pub(crate) fn missing_fields(check: &FieldCheck, required: &[&str]) -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": "Champs manquants",
            "missing": check.missing,
            "required": required,
        })),
    )
        .into_response()
}

/// 500 for a route whose required endpoint is not configured.
pub(crate) fn configuration_missing(detail: &str) -> axum::response::Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "Configuration manquante",
            "details": detail,
        })),
    )
        .into_response()
}

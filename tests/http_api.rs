//! Integration tests for the HTTP surface.
//!
//! Each test spins up the real router on a random port and drives it
//! with reqwest. Upstream webhooks are stubbed with a second tiny Axum
//! server so the forwarding paths are exercised end to end.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use hormur_router::config::RouterConfig;
use hormur_router::routes::{AppState, router};

/// Start the router with the given config, return its base URL.
async fn start_app(config: RouterConfig) -> String {
    let app = router(AppState::new(config));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;
    format!("http://127.0.0.1:{port}")
}

/// Start a stub webhook that records request bodies and answers with a
/// fixed status and body. Returns (webhook URL, recorded bodies).
async fn start_stub(status: StatusCode, reply: Value) -> (String, Arc<Mutex<Vec<Value>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&seen);
    let app = Router::new().route(
        "/hook",
        post(move |Json(payload): Json<Value>| async move {
            recorder.lock().unwrap().push(payload);
            (status, Json(reply))
        }),
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    (format!("http://127.0.0.1:{port}/hook"), seen)
}

#[tokio::test]
async fn health_responds() {
    let base = start_app(RouterConfig::default()).await;
    let body: Value = reqwest::get(format!("{base}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "hormur-router");
}

#[tokio::test]
async fn options_answers_200_with_cors() {
    let base = start_app(RouterConfig::default()).await;
    let client = reqwest::Client::new();
    for path in ["/api/send-response", "/api/messages", "/api/datastore"] {
        let response = client
            .request(reqwest::Method::OPTIONS, format!("{base}{path}"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200, "OPTIONS {path}");
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .map(|v| v.to_str().unwrap()),
            Some("*"),
            "CORS header on {path}"
        );
    }
}

#[tokio::test]
async fn wrong_method_gets_json_405() {
    let base = start_app(RouterConfig::default()).await;
    let response = reqwest::get(format!("{base}/api/send-response"))
        .await
        .unwrap();
    assert_eq!(response.status(), 405);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Method not allowed");
}

#[tokio::test]
async fn send_response_names_every_missing_field() {
    let base = start_app(RouterConfig::default()).await;
    let client = reqwest::Client::new();
    let response = client
        .post(format!("{base}/api/send-response"))
        .json(&json!({"response_text": "Bonjour"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Champs manquants");
    let missing = body["missing"].as_array().unwrap();
    assert!(missing.contains(&json!("message_id")));
    assert!(missing.contains(&json!("sent_by")));
    assert!(!missing.contains(&json!("response_text")));
}

#[tokio::test]
async fn send_response_is_fail_soft_without_channels() {
    // No channel configured at all: still a 200, with success: false.
    let base = start_app(RouterConfig::default()).await;
    let client = reqwest::Client::new();
    let response = client
        .post(format!("{base}/api/send-response"))
        .json(&json!({
            "message_id": "m1",
            "response_text": "Bonjour, voici la réponse.",
            "sent_by": "eleonore@hormur.com",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["data"]["status"], "failed");
    assert_eq!(body["data"]["channels"]["brevo_direct"], false);
    assert_eq!(body["data"]["channels"]["make_com"], false);
}

#[tokio::test]
async fn send_response_delivers_via_make_webhook() {
    let (hook_url, seen) = start_stub(StatusCode::OK, json!({"accepted": true})).await;
    let config = RouterConfig {
        webhooks: hormur_router::config::WebhookConfig {
            send_response: Some(hook_url),
            ..Default::default()
        },
        ..Default::default()
    };
    let base = start_app(config).await;

    let client = reqwest::Client::new();
    let response = client
        .post(format!("{base}/api/send-response"))
        .json(&json!({
            "message_id": "m1",
            "response_text": "Bonjour",
            "sent_by": "eleonore@hormur.com",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "sent");
    assert_eq!(body["data"]["channels"]["make_com"], true);
    assert_eq!(body["data"]["channels"]["brevo_direct"], false);

    let recorded = seen.lock().unwrap();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0]["message_id"], "m1");
    assert_eq!(recorded[0]["routing_method"], "standard_makecom");
    assert_eq!(recorded[0]["platform"], "Hormur");
}

#[tokio::test]
async fn invalid_visitor_id_skips_direct_channel() {
    // Brevo is configured, but the reply carries a junk visitor id:
    // the direct channel must be skipped (not attempted) and the
    // webhook channel must still deliver.
    let (hook_url, seen) = start_stub(StatusCode::OK, json!({"accepted": true})).await;
    let config = RouterConfig {
        brevo: hormur_router::config::BrevoConfig {
            api_key: Some(secrecy::SecretString::from("xkeysib-test")),
            agent_map: Default::default(),
            default_agent_id: Some("agent_1".into()),
        },
        webhooks: hormur_router::config::WebhookConfig {
            send_response: Some(hook_url),
            ..Default::default()
        },
        ..Default::default()
    };
    let base = start_app(config).await;

    let client = reqwest::Client::new();
    let response = client
        .post(format!("{base}/api/send-response"))
        .json(&json!({
            "message_id": "m1",
            "response_text": "Bonjour",
            "sent_by": "eleonore@hormur.com",
            "visitor_id": "undefined_undefined_undefined",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["channels"]["brevo_direct"], false);
    assert_eq!(body["data"]["channels"]["make_com"], true);

    let report = body["data"]["channel_report"].as_array().unwrap().clone();
    let brevo = report
        .iter()
        .find(|o| o["channel"] == "brevo_direct")
        .unwrap();
    assert_eq!(brevo["attempted"], false);

    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn datastore_without_webhook_is_a_config_error() {
    let base = start_app(RouterConfig::default()).await;
    let client = reqwest::Client::new();
    let response = client
        .post(format!("{base}/api/datastore"))
        .json(&json!({"action": "archive", "message_id": "m1"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Configuration manquante");
}

#[tokio::test]
async fn datastore_archive_round_trips() {
    let (hook_url, seen) = start_stub(StatusCode::OK, json!({"stored": true})).await;
    let config = RouterConfig {
        webhooks: hormur_router::config::WebhookConfig {
            datastore_update: Some(hook_url),
            ..Default::default()
        },
        ..Default::default()
    };
    let base = start_app(config).await;

    let client = reqwest::Client::new();
    let response = client
        .post(format!("{base}/api/datastore"))
        .json(&json!({
            "action": "archive",
            "message_id": "msg_42",
            "updated_by": "eleonore@hormur.com",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["action"], "archive");
    assert_eq!(body["data"]["datastore_result"]["stored"], true);
    assert_eq!(
        body["ui_update"]["refresh_tabs"],
        json!(["dashboard", "all", "archives"])
    );
    assert_eq!(body["ui_update"]["show_toast"], "Message archivé avec succès");
    assert!(
        body["actions_performed"]
            .as_array()
            .unwrap()
            .contains(&json!("Message déplacé vers les archives"))
    );

    let recorded = seen.lock().unwrap();
    assert_eq!(recorded[0]["key"], "msg_42");
    assert_eq!(recorded[0]["action"], "archive");
    assert_eq!(recorded[0]["updates"]["archived"], true);
    assert_eq!(recorded[0]["updates"]["status"], "archived");
}

#[tokio::test]
async fn datastore_echoes_upstream_failure_as_502() {
    let (hook_url, _seen) =
        start_stub(StatusCode::INTERNAL_SERVER_ERROR, json!({"scenario": "down"})).await;
    let config = RouterConfig {
        webhooks: hormur_router::config::WebhookConfig {
            datastore_update: Some(hook_url),
            ..Default::default()
        },
        ..Default::default()
    };
    let base = start_app(config).await;

    let client = reqwest::Client::new();
    let response = client
        .post(format!("{base}/api/datastore"))
        .json(&json!({"action": "assign", "message_id": "m1", "assigned_to": "martin"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 502);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], 500);
    assert!(body["details"].as_str().unwrap().contains("scenario"));
}

#[tokio::test]
async fn messages_fall_back_to_demo_data() {
    let base = start_app(RouterConfig::default()).await;
    let body: Value = reqwest::get(format!("{base}/api/messages"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["source"], "demo_data_hormur");
    assert_eq!(body["total"], 6);
    assert!(body["stats"]["total"].is_number());

    // Filters apply to the demo set too.
    let filtered: Value = reqwest::get(format!("{base}/api/messages?status=spam"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(filtered["total"], 1);
    assert_eq!(filtered["messages"][0]["status"], "spam");
}

#[tokio::test]
async fn settings_reject_out_of_range_before_merging() {
    let base = start_app(RouterConfig::default()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/api/auto-send/settings"))
        .json(&json!({"settings": {"confidenceThreshold": 120}}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["field"], "confidenceThreshold");
    assert_eq!(body["received"], 120);

    // The stored settings are untouched.
    let current: Value = client
        .get(format!("{base}/api/auto-send/settings"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(current["settings"]["confidenceThreshold"], 90);
}

#[tokio::test]
async fn settings_update_merges_and_persists() {
    let base = start_app(RouterConfig::default()).await;
    let client = reqwest::Client::new();

    let response = client
        .put(format!("{base}/api/auto-send/settings"))
        .json(&json!({
            "settings": {"enabled": true, "delayMinutes": 5},
            "user_email": "eleonore@hormur.com",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["settings"]["enabled"], true);
    assert_eq!(body["settings"]["delayMinutes"], 5);
    // Unmentioned fields keep their values.
    assert_eq!(body["settings"]["confidenceThreshold"], 90);
    assert_eq!(body["updated_by"], "eleonore@hormur.com");
    assert_eq!(body["changes_applied"]["enabled"], true);

    let current: Value = client
        .get(format!("{base}/api/auto-send/settings"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(current["settings"]["enabled"], true);
    assert_eq!(current["settings"]["delayMinutes"], 5);
}

#[tokio::test]
async fn b2b_opportunity_is_qualified_inline() {
    let base = start_app(RouterConfig::default()).await;
    let client = reqwest::Client::new();
    let response = client
        .post(format!("{base}/api/b2b-opportunity"))
        .json(&json!({
            "from_email": "direction@ville.fr",
            "subject": "Programmation culturelle annuelle",
            "original_message": "Nous cherchons des artistes pour 12 dates par an.",
            "estimated_value": "high",
            "category": "collectivite",
            "recurring_need": true,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["sales_priority"], "urgent");
    assert_eq!(body["qualification"]["priority_score"], 95);
    assert_eq!(body["metrics"]["estimated_monthly_value"], 3000);
    assert!(body["data"]["opportunity_id"].as_str().unwrap().starts_with("b2b_"));
}

#[tokio::test]
async fn b2b_forward_fills_in_a_ready_made_reply() {
    let (hook_url, seen) = start_stub(StatusCode::OK, json!({"queued": true})).await;
    let config = RouterConfig {
        webhooks: hormur_router::config::WebhookConfig {
            b2b_opportunity: Some(hook_url),
            ..Default::default()
        },
        ..Default::default()
    };
    let base = start_app(config).await;

    let client = reqwest::Client::new();
    let response = client
        .post(format!("{base}/api/b2b-opportunity"))
        .json(&json!({
            "from_email": "direction@ville.fr",
            "subject": "Programmation culturelle",
            "original_message": "Nous cherchons des artistes.",
            "category": "collectivite",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let recorded = seen.lock().unwrap();
    assert_eq!(recorded.len(), 1);
    // No response in the request: sales gets the category's stock text.
    let reply = recorded[0]["response"].as_str().unwrap();
    assert!(reply.contains("collectivité"));
    assert!(reply.contains("Martin"));
    assert_eq!(recorded[0]["signature_type"], "martin");
}

#[tokio::test]
async fn manual_review_acknowledges_with_context() {
    let base = start_app(RouterConfig::default()).await;
    let client = reqwest::Client::new();
    let response = client
        .post(format!("{base}/api/manual-review"))
        .json(&json!({
            "from_email": "hote@exemple.fr",
            "subject": "Question assurance",
            "escalation_reason": "validation experte requise",
            "confidence": 88,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "manual-review");
    assert_eq!(body["data"]["from"], "hote@exemple.fr");
    assert_eq!(body["data"]["confidence"], 88);
}

#[tokio::test]
async fn pending_queue_acknowledges_with_context() {
    let base = start_app(RouterConfig::default()).await;
    let client = reqwest::Client::new();
    let response = client
        .post(format!("{base}/api/pending-queue"))
        .json(&json!({
            "from_email": "artiste@exemple.fr",
            "subject": "Projet flou",
            "clarification_needed": "date et lieu manquants",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["clarification_needed"], "date et lieu manquants");
    assert!(body["data"]["queued_at"].is_string());
}

#[tokio::test]
async fn urgent_alert_requires_a_reason() {
    let base = start_app(RouterConfig::default()).await;
    let client = reqwest::Client::new();
    let response = client
        .post(format!("{base}/api/urgent-alert"))
        .json(&json!({"from_email": "x@y.fr", "subject": "probleme"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["missing"], json!(["alert_reason"]));
}

#[tokio::test]
async fn urgent_alert_forwards_best_effort() {
    let (hook_url, seen) = start_stub(StatusCode::OK, json!({"notified": true})).await;
    let config = RouterConfig {
        webhooks: hormur_router::config::WebhookConfig {
            urgent_alert: Some(hook_url),
            ..Default::default()
        },
        ..Default::default()
    };
    let base = start_app(config).await;

    let client = reqwest::Client::new();
    let response = client
        .post(format!("{base}/api/urgent-alert"))
        .json(&json!({
            "from_email": "artiste@exemple.fr",
            "subject": "Paiement non reçu",
            "alert_reason": "menace juridique",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["team_notified"], true);
    assert_eq!(body["data"]["severity"], "critical");

    let recorded = seen.lock().unwrap();
    assert_eq!(recorded[0]["classification"], "URGENT_ALERT");
    assert_eq!(recorded[0]["alert_reason"], "menace juridique");
}

#[tokio::test]
async fn spam_log_acknowledges() {
    let base = start_app(RouterConfig::default()).await;
    let client = reqwest::Client::new();
    let response = client
        .post(format!("{base}/api/spam-log"))
        .json(&json!({
            "from_email": "spam@example.com",
            "subject": "gagnez 1000€",
            "spam_score": 97,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["status"], "spam");
    assert_eq!(body["data"]["spam_score"], 97);
}

//! Status/action dispatcher for datastore updates.
//!
//! Maps a discrete `action` onto a structured update payload for the
//! external store. Pure data transformation — one dispatch table, no
//! other branching. Whatever the action, the result rides the common
//! envelope `{key, action, updated_by, updated_at, platform, updates}`.

use chrono::Utc;
use serde_json::{Value, json};

/// The discrete actions the dashboard can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateAction {
    Archive,
    Unarchive,
    SendResponse,
    UpdateStatus,
    Assign,
    AddNote,
    MarkSpam,
    UnmarkSpam,
    Escalate,
    UpdateAiResponse,
    BulkArchive,
    /// Unknown action string — caller-supplied `updates` pass through.
    Passthrough,
}

impl UpdateAction {
    pub fn parse(s: &str) -> Self {
        match s {
            "archive" => Self::Archive,
            "unarchive" => Self::Unarchive,
            "send_response" => Self::SendResponse,
            "update_status" => Self::UpdateStatus,
            "assign" => Self::Assign,
            "add_note" => Self::AddNote,
            "mark_spam" => Self::MarkSpam,
            "unmark_spam" => Self::UnmarkSpam,
            "escalate" => Self::Escalate,
            "update_ai_response" => Self::UpdateAiResponse,
            "bulk_archive" => Self::BulkArchive,
            _ => Self::Passthrough,
        }
    }
}

/// Build the update payload for a request body.
///
/// `body` is the already-validated request body; `action` and
/// `message_id` are guaranteed present by the route. Timestamps are
/// taken once at build time.
pub fn build_update_payload(body: &Value) -> Value {
    let action_str = body["action"].as_str().unwrap_or_default();
    let action = UpdateAction::parse(action_str);
    let updated_by = body
        .get("user_email")
        .and_then(Value::as_str)
        .unwrap_or("system");
    let now = Utc::now().to_rfc3339();

    let mut envelope = json!({
        "key": body["message_id"],
        "action": action_str,
        "updated_by": updated_by,
        "updated_at": now,
        "platform": "Hormur",
    });

    let updates = match action {
        UpdateAction::Archive => json!({
            "archived": true,
            "archived_at": now,
            "archived_by": updated_by,
            "status": "archived",
        }),

        UpdateAction::Unarchive => json!({
            "archived": false,
            "archived_at": null,
            "archived_by": null,
            "status": body.get("previous_status").cloned().unwrap_or(json!("pending")),
        }),

        UpdateAction::SendResponse => json!({
            "status": "sent",
            "final_response": body.get("response_text"),
            "sent_by": body.get("sent_by").filter(|v| !v.is_null()).cloned()
                .unwrap_or(json!(updated_by)),
            "sent_at": now,
            "response_modifications": body.get("user_modifications").cloned()
                .unwrap_or(json!(false)),
            "original_ai_response": body.get("original_ai_response"),
            "urls_included": body.get("urls_included").cloned().unwrap_or(json!([])),
        }),

        UpdateAction::UpdateStatus => json!({
            "status": body.get("new_status"),
            "status_reason": body.get("reason"),
            "priority": body.get("priority"),
        }),

        UpdateAction::Assign => json!({
            "assigned_to": body.get("assigned_to"),
            "assignment_reason": body.get("reason"),
        }),

        UpdateAction::AddNote => json!({
            "notes": body.get("notes").cloned().unwrap_or(json!([])),
            "last_note_by": updated_by,
        }),

        UpdateAction::MarkSpam => json!({
            "status": "spam",
            "spam_score": 100,
            "spam_marked_by": updated_by,
            "spam_marked_at": now,
            "spam_reason": body.get("reason").filter(|v| !v.is_null()).cloned()
                .unwrap_or(json!("Marqué manuellement comme spam")),
        }),

        UpdateAction::UnmarkSpam => {
            let current = body
                .get("current_spam_score")
                .and_then(Value::as_i64)
                .unwrap_or(100);
            json!({
                "status": "pending",
                "spam_score": (current - 50).max(0),
                "spam_unmarked_by": updated_by,
                "spam_unmarked_at": now,
            })
        }

        UpdateAction::Escalate => json!({
            "status": "manual-review",
            "priority": "high",
            "escalation_reason": body.get("escalation_reason"),
            "escalated_by": updated_by,
            "escalated_at": now,
        }),

        UpdateAction::UpdateAiResponse => json!({
            "ai_response": body.get("new_ai_response"),
            "ai_response_modified": true,
            "ai_response_modified_by": updated_by,
            "ai_response_modified_at": now,
            "original_ai_response": body.get("original_ai_response"),
        }),

        UpdateAction::BulkArchive => {
            // Bulk form: the sink receives one payload covering all ids,
            // rewritten to the action name its scenario branches on.
            envelope["action"] = json!("bulk_update");
            envelope["message_ids"] = body.get("message_ids").cloned().unwrap_or(json!([]));
            json!({
                "archived": true,
                "archived_at": now,
                "archived_by": updated_by,
                "status": "archived",
            })
        }

        UpdateAction::Passthrough => body.get("updates").cloned().unwrap_or(json!({})),
    };

    envelope["updates"] = updates;
    envelope
}

/// What the dashboard should refresh after a successful update.
pub fn ui_update_instructions(action: UpdateAction) -> Value {
    match action {
        UpdateAction::Archive => json!({
            "refresh_tabs": ["dashboard", "all", "archives"],
            "update_stats": true,
            "close_modal": true,
            "show_toast": "Message archivé avec succès",
        }),
        UpdateAction::Unarchive => json!({
            "refresh_tabs": ["archives", "all"],
            "update_stats": true,
            "show_toast": "Message restauré des archives",
        }),
        UpdateAction::SendResponse => json!({
            "refresh_tabs": ["dashboard", "validation", "all"],
            "update_stats": true,
            "close_modal": true,
            "show_toast": "Réponse envoyée avec succès",
        }),
        UpdateAction::UpdateStatus => json!({
            "refresh_tabs": ["dashboard", "all"],
            "update_stats": true,
            "show_toast": "Statut mis à jour",
        }),
        UpdateAction::Assign => json!({
            "refresh_tabs": ["dashboard", "validation", "all"],
            "show_toast": "Message assigné",
        }),
        UpdateAction::MarkSpam => json!({
            "refresh_tabs": ["dashboard", "all"],
            "update_stats": true,
            "close_modal": true,
            "show_toast": "Message marqué comme spam",
        }),
        UpdateAction::Escalate => json!({
            "refresh_tabs": ["dashboard", "validation", "all"],
            "update_stats": true,
            "show_toast": "Message escaladé en urgence",
        }),
        _ => json!({
            "refresh_tabs": ["all"],
            "show_toast": "Action effectuée",
        }),
    }
}

/// Human-readable recap of what the action did, for the dashboard log.
pub fn actions_performed(action: UpdateAction) -> Vec<&'static str> {
    match action {
        UpdateAction::Archive => vec![
            "Message déplacé vers les archives",
            "Statut mis à jour vers \"archived\"",
            "Horodatage d'archivage ajouté",
        ],
        UpdateAction::SendResponse => vec![
            "Réponse envoyée via Brevo",
            "Statut mis à jour vers \"sent\"",
            "Historique de la conversation mis à jour",
            "Métriques IA enregistrées pour amélioration",
        ],
        UpdateAction::Escalate => vec![
            "Priorité élevée au niveau \"high\"",
            "Statut mis à jour vers \"manual-review\"",
            "Notification d'urgence envoyée à l'équipe",
            "Raison d'escalation enregistrée",
        ],
        UpdateAction::MarkSpam => vec![
            "Message marqué comme spam",
            "Score de spam mis à 100%",
            "Filtres anti-spam mis à jour",
            "Apprentissage automatique du filtre",
        ],
        _ => vec!["Action personnalisée effectuée"],
    }
}

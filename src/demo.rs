//! Demo fixture fallback for message retrieval.
//!
//! When the retrieval webhook is unset or down, the dashboard still
//! needs something to render. This is hand-authored sample data with
//! the same filtering and stats the live path provides — not a cache,
//! no freshness guarantee.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::envelope::{Category, MessageEnvelope, Priority, Status};

/// Filters accepted by the message listing, from query string or body.
///
/// A missing value or the literal `"all"` means no filtering on that
/// dimension.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MessageFilters {
    pub status: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub assigned_to: Option<String>,
    pub search: Option<String>,
    pub channel: Option<String>,
    pub limit: Option<usize>,
}

impl MessageFilters {
    /// Default result cap when none is given.
    pub const DEFAULT_LIMIT: usize = 50;

    fn wants(field: &Option<String>) -> Option<&str> {
        field.as_deref().filter(|v| !v.is_empty() && *v != "all")
    }
}

/// Aggregate counts for the dashboard header.
#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub total: usize,
    pub filtered: usize,
    pub by_status: Value,
    pub by_category: Value,
    pub by_priority: Value,
    pub avg_confidence: u32,
}

/// Fixed demo message set, built once at startup.
pub struct DemoStore {
    messages: Vec<MessageEnvelope>,
}

impl DemoStore {
    pub fn new() -> Self {
        Self {
            messages: fixtures(Utc::now()),
        }
    }

    /// Apply filters and return (messages, stats).
    ///
    /// Sort order is priority desc, then receivedAt desc, so the same
    /// filters always yield the same ordered list.
    pub fn filter(&self, filters: &MessageFilters) -> (Vec<MessageEnvelope>, Stats) {
        let mut selected: Vec<&MessageEnvelope> = self
            .messages
            .iter()
            .filter(|m| {
                MessageFilters::wants(&filters.status)
                    .is_none_or(|want| m.status.as_str() == want)
            })
            .filter(|m| {
                MessageFilters::wants(&filters.category)
                    .is_none_or(|want| m.category.as_str() == want)
            })
            .filter(|m| {
                MessageFilters::wants(&filters.priority)
                    .is_none_or(|want| m.priority.as_str() == want)
            })
            .filter(|m| {
                MessageFilters::wants(&filters.assigned_to)
                    .is_none_or(|want| m.assigned_to.as_deref() == Some(want))
            })
            .filter(|m| {
                MessageFilters::wants(&filters.channel).is_none_or(|want| m.channel == want)
            })
            .filter(|m| {
                MessageFilters::wants(&filters.search).is_none_or(|term| {
                    let term = term.to_lowercase();
                    m.from.to_lowercase().contains(&term)
                        || m.subject.to_lowercase().contains(&term)
                        || m.content.to_lowercase().contains(&term)
                        || m.ai_classification
                            .as_deref()
                            .is_some_and(|c| c.to_lowercase().contains(&term))
                })
            })
            .collect();

        selected.sort_by(|a, b| {
            b.priority
                .rank()
                .cmp(&a.priority.rank())
                .then(b.received_at.cmp(&a.received_at))
        });

        // limit: 0 is treated as "unset", same as a missing value
        let limit = filters
            .limit
            .filter(|l| *l > 0)
            .unwrap_or(MessageFilters::DEFAULT_LIMIT);
        selected.truncate(limit);

        let filtered: Vec<MessageEnvelope> = selected.into_iter().cloned().collect();
        let stats = self.stats(filtered.len());
        (filtered, stats)
    }

    fn stats(&self, filtered: usize) -> Stats {
        let count_status =
            |s: Status| self.messages.iter().filter(|m| m.status == s).count();
        let count_category =
            |c: Category| self.messages.iter().filter(|m| m.category == c).count();
        let count_priority =
            |p: Priority| self.messages.iter().filter(|m| m.priority == p).count();

        let with_confidence: Vec<u32> = self
            .messages
            .iter()
            .filter(|m| m.confidence > 0)
            .map(|m| m.confidence as u32)
            .collect();
        let avg_confidence = if with_confidence.is_empty() {
            0
        } else {
            let sum: u32 = with_confidence.iter().sum();
            (f64::from(sum) / with_confidence.len() as f64).round() as u32
        };

        Stats {
            total: self.messages.len(),
            filtered,
            by_status: json!({
                "auto-sent": count_status(Status::AutoSent),
                "manual-review": count_status(Status::ManualReview),
                "pending": count_status(Status::Pending),
                "spam": count_status(Status::Spam),
                "sent": count_status(Status::Sent),
            }),
            by_category: json!({
                "artiste": count_category(Category::Artiste),
                "hote": count_category(Category::Hote),
                "spectateur": count_category(Category::Spectateur),
                "partenariat": count_category(Category::Partenariat),
                "spam": count_category(Category::Spam),
            }),
            by_priority: json!({
                "high": count_priority(Priority::High),
                "medium": count_priority(Priority::Medium),
                "low": count_priority(Priority::Low),
            }),
            avg_confidence,
        }
    }
}

impl Default for DemoStore {
    fn default() -> Self {
        Self::new()
    }
}

/// The hand-authored sample set: one message per audience category.
fn fixtures(now: DateTime<Utc>) -> Vec<MessageEnvelope> {
    vec![
        MessageEnvelope {
            id: "demo_1".into(),
            from: "artiste.piano@gmail.com".into(),
            subject: "Question SACEM pour concert privé chez particulier".into(),
            content: "Bonjour, je donne un concert de piano classique chez un particulier \
                      pour 18 personnes le 20 juin. Comment gérez-vous la déclaration SACEM ?"
                .into(),
            received_at: now,
            status: Status::AutoSent,
            category: Category::Artiste,
            priority: Priority::Medium,
            confidence: 96,
            spam_score: 3,
            assigned_to: Some("eleonore".into()),
            ai_classification: Some("Question SACEM standard - processus automatisé Hormur".into()),
            ai_response: Some(
                "Salut !\n\nHormur automatise complètement la gestion SACEM pour toi : \
                 déclaration automatique, calcul (34€ minimum ou 10% des recettes) et \
                 déduction directe avant virement.\n\nÉléonore"
                    .into(),
            ),
            urls: vec!["https://hormur.com/sacem-info".into()],
            brevo_contact_id: Some("contact_123".into()),
            visitor_id: Some("b3f1c2d4e5a60718293a4b5c6d7e8f90".into()),
            channel: "email".into(),
            needs_human_review: false,
            escalation_reason: None,
        },
        MessageEnvelope {
            id: "demo_2".into(),
            from: "nouveau.lieu@outlook.fr".into(),
            subject: "Inscription lieu - questions assurance et fréquence événements".into(),
            content: "Bonjour, je souhaite proposer mon appartement (salon 35m² + terrasse) \
                      pour des événements artistiques. Questions sur l'assurance et la fréquence."
                .into(),
            received_at: now - Duration::minutes(30),
            status: Status::ManualReview,
            category: Category::Hote,
            priority: Priority::High,
            confidence: 88,
            spam_score: 5,
            assigned_to: Some("martin".into()),
            ai_classification: Some(
                "Inscription hôte + questions assurance - validation requise".into(),
            ),
            ai_response: Some(
                "Bonjour !\n\nTous les événements Hormur sont couverts par notre partenariat \
                 Beloy x Hiscox (jusqu'à 1 000 000 €), et la fréquence est libre.\n\nMartin"
                    .into(),
            ),
            urls: vec!["https://hormur.com/place/new".into()],
            brevo_contact_id: Some("contact_124".into()),
            visitor_id: None,
            channel: "email".into(),
            needs_human_review: true,
            escalation_reason: Some(
                "Questions assurance spécifiques nécessitant validation experte".into(),
            ),
        },
        MessageEnvelope {
            id: "demo_3".into(),
            from: "spam.crypto@tempmail.com".into(),
            subject: "URGENT: Gagnez des Bitcoin maintenant!!!".into(),
            content: "Félicitations! Vous avez gagné 5 Bitcoin GRATUITS! Cliquez immédiatement."
                .into(),
            received_at: now - Duration::hours(1),
            status: Status::Spam,
            category: Category::Spam,
            priority: Priority::Low,
            confidence: 0,
            spam_score: 97,
            assigned_to: None,
            ai_classification: Some("SPAM évident - filtrage automatique".into()),
            ai_response: None,
            urls: vec![],
            brevo_contact_id: None,
            visitor_id: None,
            channel: "email".into(),
            needs_human_review: false,
            escalation_reason: None,
        },
        MessageEnvelope {
            id: "demo_4".into(),
            from: "spectateur.nantes@gmail.com".into(),
            subject: "Pas d'événements à Nantes - développement Loire-Atlantique ?".into(),
            content: "Bonjour, je suis à Nantes et j'aimerais découvrir des événements Hormur \
                      mais je ne vois rien dans ma région."
                .into(),
            received_at: now - Duration::hours(2),
            status: Status::AutoSent,
            category: Category::Spectateur,
            priority: Priority::Medium,
            confidence: 94,
            spam_score: 2,
            assigned_to: Some("auto".into()),
            ai_classification: Some(
                "Demande expansion géographique - réponse standard".into(),
            ),
            ai_response: Some(
                "Bonjour !\n\nNous développons progressivement l'offre partout en France. \
                 Remplissez vos préférences pour être informé des nouveaux événements.\n\n\
                 L'équipe Hormur"
                    .into(),
            ),
            urls: vec!["https://hormur-preferences-public.netlify.app/".into()],
            brevo_contact_id: Some("contact_125".into()),
            visitor_id: Some("a1b2c3d4e5f60718293a4b5c6d7e8f91".into()),
            channel: "instagram".into(),
            needs_human_review: false,
            escalation_reason: None,
        },
        MessageEnvelope {
            id: "demo_5".into(),
            from: "artiste.theatre@hotmail.fr".into(),
            subject: "Spectacle théâtre intimiste - contraintes techniques et lieux adaptés"
                .into(),
            content: "Bonjour, je suis comédienne et je prépare un spectacle de théâtre \
                      contemporain intimiste pour 15-25 personnes. Quelles contraintes \
                      techniques puis-je demander aux hôtes ? Éclairage, espace scénique \
                      minimum, acoustique... Comment trouver des lieux adaptés ?"
                .into(),
            received_at: now - Duration::hours(3),
            status: Status::ManualReview,
            category: Category::Artiste,
            priority: Priority::Medium,
            confidence: 91,
            spam_score: 4,
            assigned_to: Some("eleonore".into()),
            ai_classification: Some(
                "Demande création projet théâtre - besoins techniques spécifiques".into(),
            ),
            ai_response: Some(
                "Bonjour !\n\nTon projet de théâtre intimiste sonne passionnant ! Hormur a \
                 plusieurs lieux parfaits pour ce type d'expérience.\n\nPour créer ton \
                 projet : https://hormur.com/projet/new\n\nÉléonore\n\
                 Responsable Relations Artistes\nHormur"
                    .into(),
            ),
            urls: vec![
                "https://hormur.com/projet/new".into(),
                "https://vivacious-phosphorus-9a9.notion.site/FAQ-pour-les-artistes-sur-Hormur-18f3052419ea80ce8d1ac4618dc25699".into(),
            ],
            brevo_contact_id: Some("contact_126".into()),
            visitor_id: None,
            channel: "instagram".into(),
            needs_human_review: true,
            escalation_reason: Some(
                "Besoins techniques spécifiques nécessitant expertise théâtrale".into(),
            ),
        },
        MessageEnvelope {
            id: "demo_6".into(),
            from: "contact@ehpad-soleil.fr".into(),
            subject: "Partenariat EHPAD - événements culturels pour résidents".into(),
            content: "Bonjour, nous sommes l'EHPAD Les Jardins du Soleil à Lyon (120 résidents). \
                      Comment établir un partenariat avec Hormur ?"
                .into(),
            received_at: now - Duration::hours(4),
            status: Status::ManualReview,
            category: Category::Partenariat,
            priority: Priority::High,
            confidence: 92,
            spam_score: 1,
            assigned_to: Some("martin".into()),
            ai_classification: Some(
                "Demande partenariat institutionnel B2B - opportunité commerciale".into(),
            ),
            ai_response: Some(
                "Bonjour,\n\nNous serions ravis de développer un partenariat avec votre \
                 EHPAD ! Souhaitez-vous un rendez-vous téléphonique ?\n\nMartin"
                    .into(),
            ),
            urls: vec!["https://hormur.com/place/new".into()],
            brevo_contact_id: Some("contact_127".into()),
            visitor_id: None,
            channel: "email".into(),
            needs_human_review: true,
            escalation_reason: Some(
                "Opportunité commerciale B2B importante - qualification nécessaire".into(),
            ),
        },
    ]
}

//! Configuration from environment variables.
//!
//! Every external endpoint is optional at startup: an absent webhook
//! URL means the corresponding channel is skipped (or the route falls
//! back to demo data). Routes that cannot degrade report the missing
//! variable at the point of use instead.

use std::collections::HashMap;
use std::time::Duration;

use secrecy::SecretString;

/// Full router configuration.
#[derive(Debug, Clone, Default)]
pub struct RouterConfig {
    pub webhooks: WebhookConfig,
    pub brevo: BrevoConfig,
    pub apps_script: AppsScriptConfig,
    pub auto_send: AutoSendSettings,
    pub timeouts: TimeoutConfig,
}

impl RouterConfig {
    pub fn from_env() -> Self {
        Self {
            webhooks: WebhookConfig::from_env(),
            brevo: BrevoConfig::from_env(),
            apps_script: AppsScriptConfig::from_env(),
            auto_send: AutoSendSettings::from_env(),
            timeouts: TimeoutConfig::from_env(),
        }
    }
}

// ── Make.com webhooks ───────────────────────────────────────────────

/// Make.com webhook endpoints, one per scenario.
#[derive(Debug, Clone, Default)]
pub struct WebhookConfig {
    pub send_response: Option<String>,
    pub datastore_update: Option<String>,
    pub get_messages: Option<String>,
    pub b2b_opportunity: Option<String>,
    pub urgent_alert: Option<String>,
}

impl WebhookConfig {
    pub fn from_env() -> Self {
        Self {
            // Older deploys used the NETLIFY_HORMUR_* names
            send_response: env_first(&["MAKE_SEND_RESPONSE_WEBHOOK", "NETLIFY_HORMUR_SEND_WEBHOOK"]),
            datastore_update: env_first(&["MAKE_DATASTORE_UPDATE_WEBHOOK"]),
            get_messages: env_first(&["MAKE_GET_MESSAGES_WEBHOOK", "NETLIFY_HORMUR_GET_WEBHOOK"]),
            b2b_opportunity: env_first(&["MAKE_B2B_OPPORTUNITY_WEBHOOK"]),
            urgent_alert: env_first(&["MAKE_URGENT_ALERT_WEBHOOK"]),
        }
    }
}

// ── Brevo direct channel ────────────────────────────────────────────

/// Direct Brevo conversations API configuration.
#[derive(Debug, Clone, Default)]
pub struct BrevoConfig {
    pub api_key: Option<SecretString>,
    /// `sent_by` address → Brevo agent id.
    pub agent_map: HashMap<String, String>,
    pub default_agent_id: Option<String>,
}

impl BrevoConfig {
    pub fn from_env() -> Self {
        // BREVO_AGENT_MAP is "email=agent_id,email=agent_id"
        let agent_map = std::env::var("BREVO_AGENT_MAP")
            .unwrap_or_default()
            .split(',')
            .filter_map(|pair| {
                let (email, agent) = pair.split_once('=')?;
                let email = email.trim();
                let agent = agent.trim();
                if email.is_empty() || agent.is_empty() {
                    return None;
                }
                Some((email.to_lowercase(), agent.to_string()))
            })
            .collect();

        Self {
            api_key: std::env::var("BREVO_API_KEY").ok().map(SecretString::from),
            agent_map,
            default_agent_id: std::env::var("BREVO_DEFAULT_AGENT_ID").ok(),
        }
    }

    /// Resolve the Brevo agent id for an operator address.
    pub fn agent_for(&self, sent_by: &str) -> Option<&str> {
        self.agent_map
            .get(&sent_by.to_lowercase())
            .or(self.default_agent_id.as_ref())
            .map(String::as_str)
    }
}

// ── Google Apps Script ──────────────────────────────────────────────

/// Spreadsheet-backed script endpoint configuration.
#[derive(Debug, Clone, Default)]
pub struct AppsScriptConfig {
    pub url: Option<String>,
    pub api_key: Option<SecretString>,
}

impl AppsScriptConfig {
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("GOOGLE_APPS_SCRIPT_URL").ok(),
            api_key: std::env::var("HORMUR_API_KEY").ok().map(SecretString::from),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.url.is_some() && self.api_key.is_some()
    }
}

// ── Auto-send tuning ────────────────────────────────────────────────

/// Auto-send tuning, seeded from `AUTO_SEND_*` variables.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoSendSettings {
    pub enabled: bool,
    pub delay_minutes: u32,
    pub confidence_threshold: u32,
    pub test_mode: bool,
    pub max_per_hour: u32,
    pub allowed_categories: Vec<String>,
    pub excluded_keywords: Vec<String>,
}

impl Default for AutoSendSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            delay_minutes: 15,
            confidence_threshold: 90,
            test_mode: true,
            max_per_hour: 10,
            allowed_categories: split_csv("artiste,hote,spectateur"),
            excluded_keywords: split_csv("paiement,urgent,réclamation,avocat"),
        }
    }
}

impl AutoSendSettings {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: env_bool("AUTO_SEND_ENABLED", defaults.enabled),
            delay_minutes: env_parse("AUTO_SEND_DELAY_MINUTES", defaults.delay_minutes),
            confidence_threshold: env_parse(
                "AUTO_SEND_CONFIDENCE_THRESHOLD",
                defaults.confidence_threshold,
            ),
            test_mode: env_bool("AUTO_SEND_TEST_MODE", defaults.test_mode),
            max_per_hour: env_parse("AUTO_SEND_MAX_PER_HOUR", defaults.max_per_hour),
            allowed_categories: std::env::var("AUTO_SEND_ALLOWED_CATEGORIES")
                .map(|s| split_csv(&s))
                .unwrap_or(defaults.allowed_categories),
            excluded_keywords: std::env::var("AUTO_SEND_EXCLUDED_KEYWORDS")
                .map(|s| split_csv(&s))
                .unwrap_or(defaults.excluded_keywords),
        }
    }
}

// ── Per-channel timeouts ────────────────────────────────────────────

/// Per-channel outbound timeouts. On timeout the channel counts as
/// failed; there is no in-process retry.
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    pub brevo: Duration,
    pub make_webhook: Duration,
    pub apps_script: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            brevo: Duration::from_secs(15),
            make_webhook: Duration::from_secs(10),
            apps_script: Duration::from_secs(30),
        }
    }
}

impl TimeoutConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            brevo: env_secs("HORMUR_TIMEOUT_BREVO_SECS", defaults.brevo),
            make_webhook: env_secs("HORMUR_TIMEOUT_MAKE_SECS", defaults.make_webhook),
            apps_script: env_secs("HORMUR_TIMEOUT_APPS_SCRIPT_SECS", defaults.apps_script),
        }
    }
}

// ── Env helpers ─────────────────────────────────────────────────────

fn env_first(names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| std::env::var(name).ok())
        .filter(|s| !s.trim().is_empty())
}

fn env_bool(name: &str, default: bool) -> bool {
    std::env::var(name)
        .map(|s| s == "true")
        .unwrap_or(default)
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn env_secs(name: &str, default: Duration) -> Duration {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}

fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect()
}

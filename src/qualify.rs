//! Commercial qualification of B2B opportunities.
//!
//! Quick heuristics the sales team sees next to each detected
//! opportunity. All pure functions over the classified request.

use serde_json::Value;

/// Estimated deal size bucket from the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstimatedValue {
    High,
    Medium,
}

impl EstimatedValue {
    pub fn parse(s: Option<&str>) -> Self {
        match s {
            Some("high") => Self::High,
            _ => Self::Medium,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
        }
    }

    /// Follow-up window granted to sales, in hours.
    pub fn follow_up_hours(&self) -> i64 {
        match self {
            Self::High => 24,
            Self::Medium => 72,
        }
    }
}

/// Signals extracted from the opportunity request body.
#[derive(Debug, Clone, Default)]
pub struct OpportunitySignals {
    pub estimated_value: Option<String>,
    pub category: Option<String>,
    pub budget_mentioned: bool,
    pub recurring_need: bool,
    pub decision_maker_identified: bool,
    pub business_indicators: Vec<String>,
}

impl OpportunitySignals {
    pub fn from_body(body: &Value) -> Self {
        Self {
            estimated_value: body
                .get("estimated_value")
                .and_then(Value::as_str)
                .map(String::from),
            category: body.get("category").and_then(Value::as_str).map(String::from),
            budget_mentioned: body
                .get("budget_mentioned")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            recurring_need: body
                .get("recurring_need")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            decision_maker_identified: body.get("decision_maker").and_then(Value::as_str)
                == Some("identified"),
            business_indicators: body
                .get("business_indicators")
                .and_then(Value::as_array)
                .map(|a| {
                    a.iter()
                        .filter_map(Value::as_str)
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    pub fn value(&self) -> EstimatedValue {
        EstimatedValue::parse(self.estimated_value.as_deref())
    }
}

/// Priority score in [50, 100].
pub fn priority_score(signals: &OpportunitySignals) -> u32 {
    let mut score = 50u32;
    if signals.value() == EstimatedValue::High {
        score += 30;
    }
    if signals.budget_mentioned {
        score += 20;
    }
    if signals.recurring_need {
        score += 15;
    }
    if signals.business_indicators.len() > 2 {
        score += 10;
    }
    score.min(100)
}

/// Rough monthly revenue estimate in euros.
///
/// A budget figure spotted in the indicators wins; otherwise a table
/// lookup by value bucket and category.
pub fn estimated_monthly_value(signals: &OpportunitySignals) -> u32 {
    for indicator in &signals.business_indicators {
        if let Some(amount) = extract_budget_eur(indicator) {
            return amount;
        }
    }

    let category = signals.category.as_deref().unwrap_or("entreprise");
    match (signals.value(), category) {
        (EstimatedValue::High, "institution") => 8000,
        (EstimatedValue::High, "collectivite") => 3000,
        (EstimatedValue::High, _) => 5000,
        (EstimatedValue::Medium, "institution") => 3000,
        (EstimatedValue::Medium, "collectivite") => 1500,
        (EstimatedValue::Medium, "entreprise") => 2000,
        (EstimatedValue::Medium, _) => 1000,
    }
}

/// Conversion probability in [30, 85] percent.
pub fn conversion_probability(signals: &OpportunitySignals) -> u32 {
    let mut probability = 30u32;
    if signals.value() == EstimatedValue::High {
        probability += 20;
    }
    if signals.budget_mentioned {
        probability += 15;
    }
    if signals.decision_maker_identified {
        probability += 10;
    }
    if signals.recurring_need {
        probability += 10;
    }
    probability.min(85)
}

/// Suggested immediate actions for the sales owner.
pub fn recommended_actions(signals: &OpportunitySignals) -> Vec<&'static str> {
    let mut actions = vec!["Réponse personnalisée immédiate"];
    if signals.value() == EstimatedValue::High {
        actions.push("RDV prioritaire sous 24h");
        actions.push("Préparation présentation sur-mesure");
    }
    if signals.recurring_need {
        actions.push("Proposition d'abonnement");
    }
    actions
}

/// Ready-made first reply for the sales owner, by prospect category.
///
/// Unknown categories get the entreprise text.
pub fn canned_reply(category: Option<&str>) -> &'static str {
    match category {
        Some("institution") => {
            "Bonjour,\n\nNous serions ravis de développer un partenariat avec votre \
             institution !\n\nHormur accompagne déjà plusieurs établissements dans leurs \
             programmations culturelles.\n\nJe vous propose un échange pour comprendre vos \
             besoins spécifiques et vous présenter notre offre institutionnelle.\n\n\
             Martin\nResponsable Partenariats Lieux\nHormur"
        }
        Some("collectivite") => {
            "Bonjour,\n\nExcellente initiative de votre collectivité !\n\nNous avons \
             l'expérience des partenariats publics et pouvons vous accompagner dans vos \
             projets culturels territoriaux.\n\nSouhaitez-vous que nous échangions sur vos \
             objectifs et notre offre dédiée collectivités ?\n\n\
             Martin\nResponsable Partenariats Lieux\nHormur"
        }
        _ => {
            "Bonjour,\n\nVotre projet corporate semble parfaitement aligné avec notre \
             vision !\n\nNous proposons des accompagnements sur-mesure pour les entreprises \
             souhaitant enrichir leur offre culturelle.\n\nPuis-je vous proposer un \
             rendez-vous cette semaine pour vous présenter nos solutions dédiées ?\n\n\
             Martin\nResponsable Partenariats Lieux\nHormur"
        }
    }
}

/// Pull a `1500 €` / `5k €` style figure out of a free-text indicator.
fn extract_budget_eur(indicator: &str) -> Option<u32> {
    let lower = indicator.to_lowercase();
    let euro_pos = lower.find('€')?;
    let prefix = &lower[..euro_pos];

    let mut digits = String::new();
    let mut has_k = false;
    for c in prefix.chars().rev() {
        match c {
            '0'..='9' => digits.insert(0, c),
            'k' if digits.is_empty() && !has_k => has_k = true,
            ' ' if digits.is_empty() => continue,
            _ => break,
        }
    }
    if digits.is_empty() {
        return None;
    }
    let amount: u32 = digits.parse().ok()?;
    Some(if has_k { amount * 1000 } else { amount })
}

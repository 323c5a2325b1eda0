use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A catalog entry. Immutable once the catalog snapshot is loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub rating: Option<f64>,
}

/// Scraped catalogs carry prices like `"1.299,99 Lei"` or `null`; anything that
/// is not a JSON number is treated as absent.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_f64()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    View,
    Wishlist,
    AddToCart,
    Purchase,
}

impl EventKind {
    /// Wishlist, add-to-cart and purchase count as implicit interest; views do not.
    pub fn is_positive(self) -> bool {
        !matches!(self, EventKind::View)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::View => "view",
            EventKind::Wishlist => "wishlist",
            EventKind::AddToCart => "add_to_cart",
            EventKind::Purchase => "purchase",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    pub user_id: String,
    pub product_id: String,
    pub event: EventKind,
    pub timestamp: DateTime<Utc>,
}

/// Baseline ranking result: a catalog product plus its hybrid score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation<'a> {
    #[serde(flatten)]
    pub product: &'a Product,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarProduct<'a> {
    #[serde(flatten)]
    pub product: &'a Product,
    pub similarity: f32,
}

/// Re-ranked result: a catalog product plus the explanation the re-ranker gave.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExplainedRecommendation<'a> {
    #[serde(flatten)]
    pub product: &'a Product,
    pub explanation: String,
}

/// One entry of a re-ranker answer, before it is validated against the candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RerankDecision {
    pub id: String,
    #[serde(default)]
    pub reason: String,
}

/// A user's verdict on one explanation. `model` is `"baseline"` or `"llm"`;
/// other values may appear in old snapshots and are not counted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplanationFeedback {
    pub user_id: String,
    pub product_id: String,
    pub model: String,
    pub helpful: bool,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelFeedback {
    pub total: usize,
    pub helpful: usize,
    /// `None` (JSON `null`) until at least one verdict exists.
    pub helpful_rate: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FeedbackStats {
    pub baseline: ModelFeedback,
    pub llm: ModelFeedback,
}

/// Categories a synthetic user shops in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPreference {
    pub user_id: String,
    pub preferred_categories: Vec<String>,
}

impl UserPreference {
    pub fn new<S: Into<String>>(user_id: impl Into<String>, categories: impl IntoIterator<Item = S>) -> Self {
        Self {
            user_id: user_id.into(),
            preferred_categories: categories.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationReport {
    pub k: usize,
    pub users_evaluated: usize,
    pub precision_at_k: f64,
    pub recall_at_k: f64,
    #[serde(skip)]
    pub per_user: Vec<UserEvaluation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEvaluation {
    pub user_id: String,
    pub train_size: usize,
    pub test_size: usize,
    pub hits: usize,
    pub precision: f64,
    pub recall: f64,
}

/// Outcome of an evaluation run. Having nobody to evaluate is a normal result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EvaluationOutcome {
    Evaluated(EvaluationReport),
    InsufficientData,
}

impl EvaluationOutcome {
    pub fn report(&self) -> Option<&EvaluationReport> {
        match self {
            EvaluationOutcome::Evaluated(report) => Some(report),
            EvaluationOutcome::InsufficientData => None,
        }
    }
}

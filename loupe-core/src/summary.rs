//! Per-interview data model.
//!
//! These types sit at the boundary between untrusted LLM JSON and the
//! aggregation stage, so every field is optional-with-default and numeric
//! ratings use the [`Score`] sum type instead of trusting the model to pick
//! a consistent number-vs-string encoding. List decoding is lenient per
//! item: one malformed record drops that record, not the whole interview.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// A numeric rating that the model may emit as a number, a numeric string,
/// or garbage. Downstream comparisons treat `Unknown` explicitly instead of
/// overloading one field with mixed types.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Score {
    Value(f64),
    #[default]
    Unknown,
}

impl Score {
    /// The numeric value, or `default` when unknown.
    pub fn value_or(&self, default: f64) -> f64 {
        match self {
            Score::Value(v) => *v,
            Score::Unknown => default,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Score::Value(v) => Some(*v),
            Score::Unknown => None,
        }
    }

    /// Coerce a raw JSON value: number, or string parseable as a number.
    pub fn coerce(value: &Value) -> Score {
        match value {
            Value::Number(n) => n.as_f64().map(Score::Value).unwrap_or_default(),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map(Score::Value)
                .unwrap_or_default(),
            _ => Score::Unknown,
        }
    }
}

impl Serialize for Score {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Score::Value(v) => serializer.serialize_f64(*v),
            Score::Unknown => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for Score {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Score::coerce(&value))
    }
}

/// Respondent demographics extracted from one interview.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RespondentProfile {
    #[serde(default)]
    pub age_range: String,
    #[serde(default)]
    pub profession: String,
    #[serde(default)]
    pub tech_literacy: String,
    #[serde(default)]
    pub experience_level: String,
    #[serde(default)]
    pub main_goals: Vec<String>,
    #[serde(default)]
    pub pain_level: Score,
    /// Any additional keys the model chose to add.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyTheme {
    #[serde(default)]
    pub theme: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub quotes: Vec<String>,
    #[serde(default)]
    pub importance: Score,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PainPoint {
    #[serde(default)]
    pub pain: String,
    #[serde(default)]
    pub severity: Score,
    #[serde(default)]
    pub frequency: String,
    #[serde(default)]
    pub quotes: Vec<String>,
    #[serde(default)]
    pub impact: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Need {
    #[serde(default)]
    pub need: String,
    /// Explicit vs latent, as described by the model.
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub priority: Score,
    #[serde(default)]
    pub quotes: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmotionalMoment {
    #[serde(default)]
    pub moment: String,
    #[serde(default)]
    pub emotion: String,
    #[serde(default)]
    pub trigger: String,
    #[serde(default)]
    pub intensity: Score,
    #[serde(default)]
    pub quote: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuoteRecord {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub importance: Score,
    #[serde(default)]
    pub theme: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BusinessPain {
    #[serde(default)]
    pub pain: String,
    #[serde(default)]
    pub impact: String,
    #[serde(default)]
    pub quotes: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProblem {
    #[serde(default)]
    pub problem: String,
    #[serde(default)]
    pub severity: Score,
    #[serde(default)]
    pub quotes: Vec<String>,
}

/// Structured extraction of one interview transcript.
///
/// `interview_id` is 1-based and matches transcript submission order;
/// instances are read-only once produced by the analyzer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InterviewSummary {
    pub interview_id: u32,
    #[serde(default)]
    pub respondent_profile: RespondentProfile,
    #[serde(default)]
    pub key_themes: Vec<KeyTheme>,
    #[serde(default)]
    pub pain_points: Vec<PainPoint>,
    #[serde(default)]
    pub needs: Vec<Need>,
    #[serde(default)]
    pub insights: Vec<String>,
    #[serde(default)]
    pub emotional_journey: Vec<EmotionalMoment>,
    #[serde(default)]
    pub contradictions: Vec<String>,
    #[serde(default)]
    pub quotes: Vec<QuoteRecord>,
    #[serde(default)]
    pub business_pains: Vec<BusinessPain>,
    #[serde(default)]
    pub user_problems: Vec<UserProblem>,
    #[serde(default)]
    pub opportunities: Vec<String>,
    /// Overall sentiment in [-10, 10]; 0.0 when the model gave nothing usable.
    #[serde(default)]
    pub sentiment_score: f64,
    #[serde(default)]
    pub brief_related_findings: Map<String, Value>,
}

impl InterviewSummary {
    /// A fully-empty-but-valid summary, the degrade target for any failed
    /// interview analysis.
    pub fn empty(interview_id: u32) -> Self {
        Self {
            interview_id,
            ..Default::default()
        }
    }

    /// Map decoded LLM JSON into a summary, defaulting every missing or
    /// malformed field.
    pub fn from_value(interview_id: u32, data: &Value) -> Self {
        Self {
            interview_id,
            respondent_profile: data
                .get("respondent_profile")
                .cloned()
                .and_then(|v| serde_json::from_value(v).ok())
                .unwrap_or_default(),
            key_themes: lenient_vec(data.get("key_themes")),
            pain_points: lenient_vec(data.get("pain_points")),
            needs: lenient_vec(data.get("needs")),
            insights: lenient_strings(data.get("insights")),
            emotional_journey: lenient_vec(data.get("emotional_journey")),
            contradictions: lenient_strings(data.get("contradictions")),
            quotes: lenient_vec(data.get("quotes")),
            business_pains: lenient_vec(data.get("business_pains")),
            user_problems: lenient_vec(data.get("user_problems")),
            opportunities: lenient_strings(data.get("opportunities")),
            sentiment_score: data
                .get("sentiment_score")
                .map(Score::coerce)
                .unwrap_or_default()
                .value_or(0.0),
            brief_related_findings: data
                .get("brief_related_findings")
                .and_then(|v| v.as_object())
                .cloned()
                .unwrap_or_default(),
        }
    }
}

/// Decode an array item-by-item, dropping records that fail to parse.
pub(crate) fn lenient_vec<T: DeserializeOwned>(value: Option<&Value>) -> Vec<T> {
    value
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

/// Collect an array of strings, stringifying any non-string scalars.
fn lenient_strings(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

//! Typed answers from the intelligence service.
//!
//! Model output is untrusted: everything goes through [`parse_json`], which
//! tolerates markdown code fences but nothing else, and reports any mismatch
//! as [`IntelligenceError::Malformed`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::IntelligenceError;
use crate::fleet::Assignment;
use crate::shift::Platform;

/// Strip an optional ```json fence around a model answer.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

/// Parse a model answer into `T`, labelling failures with `what`.
pub fn parse_json<T: DeserializeOwned>(text: &str, what: &'static str) -> Result<T, IntelligenceError> {
    serde_json::from_str(strip_code_fence(text)).map_err(|e| IntelligenceError::malformed(what, e))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    Take,
    Stack,
    Decline,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferRecommendation {
    pub recommendation: Recommendation,
    pub reasoning: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EfficiencyRating {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackAnalysis {
    pub recommended_job_ids: Vec<String>,
    pub reasoning: String,
    pub total_projected_pay: f64,
    pub total_distance: f64,
    pub efficiency_rating: EfficiencyRating,
    pub strategy_tip: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DispatchPlan {
    pub assignments: Vec<Assignment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformShare {
    pub platform: Platform,
    pub total_earnings: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsAnalysis {
    pub best_hours: String,
    pub best_zones: Vec<String>,
    pub platform_comparison: Vec<PlatformShare>,
    pub top_performing_day: String,
    pub efficiency_tip: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsForecast {
    pub predicted_rate: f64,
    pub reasoning: String,
    pub peak_time: String,
}

impl EarningsForecast {
    /// Answer used when there is no history to forecast from.
    pub fn baseline() -> Self {
        Self {
            predicted_rate: 18.50,
            reasoning: "General estimate based on typical market conditions.".into(),
            peak_time: "5 PM - 9 PM".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryVerification {
    pub verified: bool,
    pub reason: String,
}

/// Offer fields read from a screenshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferExtraction {
    pub platform: Platform,
    pub restaurant: String,
    pub pay: Option<f64>,
    pub distance: Option<f64>,
    pub address: String,
    pub profit_score: u8,
    pub estimated_time: Option<u32>,
}

impl OfferExtraction {
    /// Read an extraction leniently: keys may be capitalized and numbers may
    /// arrive as strings such as `"$7.50"` or `"3.2 mi"`.
    pub fn from_value(value: &Value) -> Result<Self, IntelligenceError> {
        let Some(obj) = value.as_object() else {
            return Err(IntelligenceError::malformed("offer extraction", "expected a JSON object"));
        };
        let text = |name: &str, fallback: &str| {
            field(obj, name)
                .and_then(Value::as_str)
                .filter(|s| !s.trim().is_empty())
                .map_or_else(|| fallback.to_string(), str::to_string)
        };

        let profit_score = field(obj, "profitScore")
            .and_then(lenient_number)
            .map(|s| s.round().clamp(1.0, 10.0) as u8)
            .unwrap_or(5);

        Ok(Self {
            platform: Platform::from_label(&text("platform", "Other")),
            restaurant: text("restaurant", "Unknown"),
            pay: field(obj, "pay").and_then(lenient_number).filter(|v| *v > 0.0),
            distance: field(obj, "distance").and_then(lenient_number).filter(|v| *v > 0.0),
            address: text("address", "Unknown"),
            profit_score,
            estimated_time: field(obj, "estimatedTime")
                .and_then(lenient_number)
                .filter(|v| *v > 0.0)
                .map(|v| v.round() as u32),
        })
    }
}

fn field<'a>(obj: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    obj.iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v)
}

fn lenient_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s
                .trim()
                .trim_start_matches('$')
                .chars()
                .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect();
            cleaned.parse().ok()
        }
        _ => None,
    };
    number.filter(|v| v.is_finite())
}

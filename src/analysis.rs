//! The Analysis contract: the structured result produced for a document.
//!
//! Model output is accepted only through [`parse_analysis`], which
//! deserialises into the typed [`Analysis`] and then checks the invariants
//! serde cannot express (key-point count, confidence range). Anything else
//! is reported as [`AnalysisFault::StructureInvalid`]; a response is never
//! partially accepted.

use crate::error::AnalysisFault;
use serde::{Deserialize, Serialize};

/// Confidence value stamped on every fallback analysis.
pub const FALLBACK_CONFIDENCE: f64 = 0.75;

/// Allowed range for `summary.keyPoints`.
pub const KEY_POINTS_MIN: usize = 3;
pub const KEY_POINTS_MAX: usize = 5;

/// Three-level rating used for importance, severity and priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    High,
    Medium,
    Low,
}

/// Overall risk of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Kind of money mentioned in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmountType {
    Payment,
    Penalty,
    Deposit,
    Fee,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub tldr: String,
    pub key_points: Vec<String>,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyDate {
    pub date: String,
    pub description: String,
    pub importance: Level,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonetaryAmount {
    pub amount: String,
    pub currency: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: AmountType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyInformation {
    pub parties: Vec<String>,
    pub dates: Vec<KeyDate>,
    pub monetary_amounts: Vec<MonetaryAmount>,
    pub obligations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedFlag {
    pub clause: String,
    pub risk: String,
    pub severity: Level,
    pub explanation: String,
    pub original_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub overall_risk: RiskLevel,
    pub red_flags: Vec<RedFlag>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionItem {
    pub id: String,
    pub task: String,
    pub priority: Level,
    /// Free-form ("Before signing") or absent.
    pub deadline: Option<String>,
    pub completed: bool,
}

/// The structured output produced for a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub summary: Summary,
    pub key_information: KeyInformation,
    pub risk_assessment: RiskAssessment,
    pub action_plan: Vec<ActionItem>,
}

impl Analysis {
    /// Check the invariants the type system does not encode. `actionPlan`
    /// must be present but may be empty.
    pub fn validate(&self) -> Result<(), AnalysisFault> {
        let n = self.summary.key_points.len();
        if !(KEY_POINTS_MIN..=KEY_POINTS_MAX).contains(&n) {
            return Err(AnalysisFault::StructureInvalid(format!(
                "summary.keyPoints has {n} entries, expected {KEY_POINTS_MIN}–{KEY_POINTS_MAX}"
            )));
        }
        let c = self.summary.confidence;
        if !(0.0..=1.0).contains(&c) {
            return Err(AnalysisFault::StructureInvalid(format!(
                "summary.confidence {c} is outside [0, 1]"
            )));
        }
        Ok(())
    }

    /// True when this analysis carries the fixed fallback confidence.
    pub fn is_fallback(&self) -> bool {
        (self.summary.confidence - FALLBACK_CONFIDENCE).abs() < f64::EPSILON
    }
}

const REQUIRED_KEYS: [&str; 4] = ["summary", "keyInformation", "riskAssessment", "actionPlan"];

/// Parse sanitised model output into a validated [`Analysis`].
///
/// Distinguishes "not JSON" ([`AnalysisFault::ResponseParse`]) from "JSON but
/// the wrong shape" ([`AnalysisFault::StructureInvalid`]).
pub fn parse_analysis(json_text: &str) -> Result<Analysis, AnalysisFault> {
    let value: serde_json::Value = serde_json::from_str(json_text)
        .map_err(|e| AnalysisFault::ResponseParse(e.to_string()))?;
    analysis_from_value(value)
}

/// Validate an already-parsed JSON value as an [`Analysis`].
pub fn analysis_from_value(value: serde_json::Value) -> Result<Analysis, AnalysisFault> {
    let obj = value.as_object().ok_or_else(|| {
        AnalysisFault::StructureInvalid("top-level value is not an object".into())
    })?;

    let missing: Vec<&str> = REQUIRED_KEYS
        .iter()
        .copied()
        .filter(|k| obj.get(*k).map_or(true, |v| v.is_null()))
        .collect();
    if !missing.is_empty() {
        return Err(AnalysisFault::StructureInvalid(format!(
            "missing required keys: {}",
            missing.join(", ")
        )));
    }

    let analysis: Analysis = serde_json::from_value(value)
        .map_err(|e| AnalysisFault::StructureInvalid(e.to_string()))?;
    analysis.validate()?;
    Ok(analysis)
}

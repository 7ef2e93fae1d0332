//! Deterministic fallback analysis.
//!
//! Used whenever the model path fails. The output is generic and always
//! satisfies [`Analysis::validate`]; it carries
//! [`FALLBACK_CONFIDENCE`](crate::analysis::FALLBACK_CONFIDENCE) so callers
//! can tell it apart from a genuine analysis.

use crate::analysis::{
    ActionItem, AmountType, Analysis, KeyDate, KeyInformation, Level, MonetaryAmount, RedFlag,
    RiskAssessment, RiskLevel, Summary, FALLBACK_CONFIDENCE,
};
use std::sync::Arc;

/// Category used when neither the text nor the caller names one.
pub const GENERIC_DOCUMENT_TYPE: &str = "document";

/// Strategy that maps document text to a category.
pub trait DocumentClassifier: Send + Sync {
    /// `None` when the text carries no recognisable cue.
    fn classify(&self, text: &str) -> Option<String>;
}

/// Case-insensitive keyword rules, first match wins:
/// lease/rent → `lease`, non-disclosure/confidential → `nda`,
/// agreement/contract → `contract`.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

const KEYWORD_RULES: &[(&[&str], &str)] = &[
    (&["lease", "rent"], "lease"),
    (&["non-disclosure", "confidential"], "nda"),
    (&["agreement", "contract"], "contract"),
];

impl DocumentClassifier for KeywordClassifier {
    fn classify(&self, text: &str) -> Option<String> {
        let lower = text.to_lowercase();
        KEYWORD_RULES
            .iter()
            .find(|(cues, _)| cues.iter().any(|cue| lower.contains(cue)))
            .map(|(_, category)| (*category).to_string())
    }
}

/// Builds the fixed-template analysis.
#[derive(Clone)]
pub struct FallbackAnalyzer {
    classifier: Arc<dyn DocumentClassifier>,
}

impl Default for FallbackAnalyzer {
    fn default() -> Self {
        Self::new(Arc::new(KeywordClassifier))
    }
}

impl std::fmt::Debug for FallbackAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackAnalyzer").finish_non_exhaustive()
    }
}

impl FallbackAnalyzer {
    pub fn new(classifier: Arc<dyn DocumentClassifier>) -> Self {
        Self { classifier }
    }

    /// Category for `text`: classifier cue, else `document_type`, else
    /// `"document"`.
    pub fn detect_type(&self, text: &str, document_type: Option<&str>) -> String {
        self.classifier.classify(text).unwrap_or_else(|| {
            document_type
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .unwrap_or(GENERIC_DOCUMENT_TYPE)
                .to_string()
        })
    }

    pub fn analyze(&self, text: &str, document_type: Option<&str>) -> Analysis {
        let detected = self.detect_type(text, document_type);
        let word_count = text.split_whitespace().count();
        let today = chrono::Utc::now().date_naive().format("%Y-%m-%d").to_string();

        Analysis {
            summary: Summary {
                tldr: format!(
                    "This {detected} contains {word_count} words and appears to be a standard \
                     legal document with key terms and obligations."
                ),
                key_points: vec![
                    format!("Document type: {}", detected.to_uppercase()),
                    "Contains standard legal language and clauses".into(),
                    "Establishes rights and obligations between parties".into(),
                    "Includes termination and dispute resolution terms".into(),
                    "May require legal review for complex provisions".into(),
                ],
                confidence: FALLBACK_CONFIDENCE,
            },
            key_information: KeyInformation {
                parties: vec!["Party A".into(), "Party B".into()],
                dates: vec![KeyDate {
                    date: today,
                    description: "Document effective date".into(),
                    importance: Level::High,
                }],
                monetary_amounts: vec![MonetaryAmount {
                    amount: "$1,000".into(),
                    currency: "USD".into(),
                    description: "Sample monetary amount".into(),
                    kind: AmountType::Payment,
                }],
                obligations: vec![
                    "Comply with all terms and conditions".into(),
                    "Provide required notices".into(),
                    "Maintain confidentiality where applicable".into(),
                    "Pay amounts when due".into(),
                ],
            },
            risk_assessment: RiskAssessment {
                overall_risk: RiskLevel::Medium,
                red_flags: vec![RedFlag {
                    clause: "Broad liability clause".into(),
                    risk: "May expose you to unexpected liability".into(),
                    severity: Level::Medium,
                    explanation:
                        "This clause could make you responsible for damages beyond your control"
                            .into(),
                    original_text: "[Sample clause text would appear here]".into(),
                }],
                recommendations: vec![
                    "Review all financial obligations carefully".into(),
                    "Understand termination procedures".into(),
                    "Consider legal counsel for complex terms".into(),
                    "Clarify any ambiguous language before signing".into(),
                ],
            },
            action_plan: vec![
                action("1", "Review all key terms and obligations", Level::High, Some("Before signing")),
                action("2", "Clarify any unclear provisions", Level::Medium, None),
                action("3", "Consider legal consultation if needed", Level::Low, None),
            ],
        }
    }
}

fn action(id: &str, task: &str, priority: Level, deadline: Option<&str>) -> ActionItem {
    ActionItem {
        id: id.into(),
        task: task.into(),
        priority,
        deadline: deadline.map(Into::into),
        completed: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fallback() -> FallbackAnalyzer {
        FallbackAnalyzer::default()
    }

    #[test]
    fn lease_cue() {
        let a = fallback().analyze("The Tenant shall pay monthly RENT.", None);
        assert!(a.summary.tldr.starts_with("This lease contains"));
        assert_eq!(a.summary.key_points[0], "Document type: LEASE");
    }

    #[test]
    fn nda_cue() {
        let a = fallback().analyze("This Non-Disclosure pact binds both sides.", None);
        assert!(a.summary.tldr.starts_with("This nda contains"));
    }

    #[test]
    fn contract_cue_without_lease_or_nda() {
        let a = fallback().analyze("This AGREEMENT is made today.", None);
        assert!(a.summary.tldr.starts_with("This contract contains"));
    }

    #[test]
    fn lease_wins_over_contract() {
        let a = fallback().analyze("Lease agreement", Some("nda"));
        assert!(a.summary.tldr.starts_with("This lease"));
    }

    #[test]
    fn no_cue_uses_supplied_type_or_document() {
        let f = fallback();
        assert!(f.analyze("Hello world", None).summary.tldr.starts_with("This document contains 2 words"));
        assert!(f.analyze("Hello world", Some("will")).summary.tldr.starts_with("This will"));
        assert!(f.analyze("Hello world", Some("  ")).summary.tldr.starts_with("This document"));
    }

    #[test]
    fn output_is_valid_and_marked_as_fallback() {
        let a = fallback().analyze("", None);
        a.validate().unwrap();
        assert!(a.is_fallback());
        assert_eq!(a.key_information.obligations.len(), 4);
        assert_eq!(a.action_plan.len(), 3);
        assert_eq!(a.risk_assessment.red_flags.len(), 1);
    }

    #[test]
    fn date_is_today() {
        let a = fallback().analyze("text", None);
        let today = chrono::Utc::now().date_naive().format("%Y-%m-%d").to_string();
        assert_eq!(a.key_information.dates[0].date, today);
    }

    #[test]
    fn serialises_with_contract_field_names() {
        let v = serde_json::to_value(fallback().analyze("rent", None)).unwrap();
        assert_eq!(v["keyInformation"]["monetaryAmounts"][0]["type"], "payment");
        assert_eq!(v["actionPlan"][1]["deadline"], serde_json::Value::Null);
        assert_eq!(v["riskAssessment"]["overallRisk"], "medium");
    }

    #[test]
    fn classifier_is_pluggable() {
        struct Always;
        impl DocumentClassifier for Always {
            fn classify(&self, _: &str) -> Option<String> {
                Some("will".into())
            }
        }
        let f = FallbackAnalyzer::new(Arc::new(Always));
        assert_eq!(f.detect_type("lease", None), "will");
    }
}

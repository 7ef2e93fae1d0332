//! Prompt construction for legal document analysis.
//!
//! Every model call uses the same instruction template: the exact JSON
//! schema the response must follow, a short list of style guidelines and a
//! target-language line. The document text is appended once, verbatim,
//! after the `Document to analyze:` marker.

/// Fixed instruction block. The schema spells out every field name and
/// enumerated value accepted by [`crate::analysis::parse_analysis`].
pub const ANALYSIS_INSTRUCTIONS: &str = r#"You are a legal document analysis assistant. Analyze the provided legal document and return a comprehensive analysis in JSON format. Focus on making complex legal language accessible to non-lawyers.

Please analyze the document and respond with ONLY a valid JSON object in this exact format:

{
  "summary": {
    "tldr": "One clear sentence summary in plain English",
    "keyPoints": ["3-5 bullet points of main provisions in simple language"],
    "confidence": 0.85
  },
  "keyInformation": {
    "parties": ["List of parties involved"],
    "dates": [{"date": "YYYY-MM-DD", "description": "what this date is for", "importance": "high/medium/low"}],
    "monetaryAmounts": [{"amount": "$X", "currency": "USD", "description": "what this is for", "type": "payment/penalty/deposit/fee"}],
    "obligations": ["List of key obligations and responsibilities in plain English"]
  },
  "riskAssessment": {
    "overallRisk": "low/medium/high",
    "redFlags": [{"clause": "clause name", "risk": "what could go wrong", "severity": "high/medium/low", "explanation": "why this is risky in simple terms", "originalText": "exact text from document"}],
    "recommendations": ["List of practical recommendations"]
  },
  "actionPlan": [{"id": "1", "task": "specific action to take", "priority": "high/medium/low", "deadline": "when to do this or null", "completed": false}]
}

Important guidelines:
- Use simple, non-legal language that anyone can understand
- Focus on practical implications and risks
- Be specific about dates, amounts, and obligations
- Highlight unusual or concerning clauses
- Provide actionable recommendations
- Ensure all JSON is valid and properly formatted"#;

/// Marker line that precedes the document text.
pub const DOCUMENT_MARKER: &str = "Document to analyze:";

/// Language used when the request omits one or names an unknown code.
pub const DEFAULT_LANGUAGE: &str = "English";

/// Supported ISO 639-1 codes and their display names.
const LANGUAGES: &[(&str, &str)] = &[
    ("en", "English"),
    ("hi", "Hindi"),
    ("kn", "Kannada"),
    ("gu", "Gujarati"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("de", "German"),
    ("zh", "Chinese"),
    ("ja", "Japanese"),
    ("ar", "Arabic"),
];

/// Display name for an ISO code; unknown or empty codes map to English.
pub fn language_name(code: &str) -> &'static str {
    let code = code.trim();
    LANGUAGES
        .iter()
        .find(|(c, _)| c.eq_ignore_ascii_case(code))
        .map_or(DEFAULT_LANGUAGE, |(_, name)| name)
}

/// Render the full prompt for `text` in the given language.
pub fn build_prompt(text: &str, language: Option<&str>) -> String {
    let lang = language_name(language.unwrap_or(""));
    format!(
        "{ANALYSIS_INSTRUCTIONS}\n\n\
         IMPORTANT: Please provide the analysis in {lang} language. \
         All explanations, summaries, and recommendations should be in {lang}.\n\n\
         {DOCUMENT_MARKER}\n\n{text}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "THIS LEASE is made between Alpha LLC and Beta Corp for unit 7Q.";

    #[test]
    fn hindi_code_names_hindi() {
        assert!(build_prompt(DOC, Some("hi")).contains("Hindi"));
    }

    #[test]
    fn unknown_or_missing_code_defaults_to_english() {
        assert!(build_prompt(DOC, Some("xx")).contains("in English language"));
        assert!(build_prompt(DOC, None).contains("in English language"));
        assert_eq!(language_name(""), "English");
    }

    #[test]
    fn codes_are_case_insensitive() {
        assert_eq!(language_name("JA"), "Japanese");
    }

    #[test]
    fn text_appears_exactly_once_at_end() {
        let prompt = build_prompt(DOC, Some("fr"));
        assert_eq!(prompt.matches(DOC).count(), 1);
        assert!(prompt.ends_with(DOC));
    }

    #[test]
    fn text_is_unmodified() {
        let raw = "  line one\n\n\tline {two} \"quoted\"  ";
        assert!(build_prompt(raw, None).ends_with(raw));
    }

    #[test]
    fn schema_names_all_required_keys() {
        for key in ["summary", "keyInformation", "riskAssessment", "actionPlan"] {
            assert!(ANALYSIS_INSTRUCTIONS.contains(&format!("\"{key}\"")));
        }
    }
}

//! Anonymization — reversible PII masking around LLM processing.
//!
//! Regex detectors find emails, phone numbers, SSN-shaped ids and names
//! after honorifics. Each hit is replaced with an indexed placeholder and
//! the mapping kept, so the model output can be de-anonymized afterwards.
//! A risk score summarizes how much PII a text carried.

use crate::report::DemoReport;
use agentry_core::{LlmClient, Result};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;
use tracing::debug;

/// Categories of detected PII.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PiiKind {
    Email,
    Phone,
    NationalId,
    Name,
}

impl PiiKind {
    fn placeholder_tag(self) -> &'static str {
        match self {
            PiiKind::Email => "EMAIL",
            PiiKind::Phone => "PHONE",
            PiiKind::NationalId => "ID",
            PiiKind::Name => "NAME",
        }
    }

    fn weight(self) -> f32 {
        match self {
            PiiKind::NationalId => 0.4,
            PiiKind::Email => 0.25,
            PiiKind::Phone => 0.2,
            PiiKind::Name => 0.15,
        }
    }
}

fn detectors() -> &'static [(PiiKind, Regex)] {
    static DETECTORS: OnceLock<Vec<(PiiKind, Regex)>> = OnceLock::new();
    DETECTORS.get_or_init(|| {
        vec![
            (
                PiiKind::Email,
                Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("valid regex"),
            ),
            (
                PiiKind::Phone,
                Regex::new(r"(?:\+\d{1,3}[- .])?\(?\d{3}\)?[- .]\d{3}[- .]\d{4}")
                    .expect("valid regex"),
            ),
            (
                PiiKind::NationalId,
                Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").expect("valid regex"),
            ),
            (
                PiiKind::Name,
                Regex::new(r"\b(?:Mr|Mrs|Ms|Dr|Prof)\.?\s+[A-Z][a-z]+(?:\s+[A-Z][a-z]+)?")
                    .expect("valid regex"),
            ),
        ]
    })
}

/// Result of anonymizing one text.
#[derive(Debug, Clone)]
pub struct Anonymized {
    pub text: String,
    /// placeholder → original value.
    pub mapping: BTreeMap<String, String>,
    /// PII count per kind.
    pub counts: BTreeMap<PiiKind, usize>,
    /// 0.0 (clean) to 1.0 (dense PII).
    pub risk_score: f32,
}

/// Detect and mask PII, returning the mapping for reversal.
pub fn anonymize(text: &str) -> Anonymized {
    let mut masked = text.to_string();
    let mut mapping = BTreeMap::new();
    let mut counts: BTreeMap<PiiKind, usize> = BTreeMap::new();
    let mut risk: f32 = 0.0;

    // NationalId before Phone: an SSN also matches the looser phone shape.
    let mut ordered: Vec<&(PiiKind, Regex)> = detectors().iter().collect();
    ordered.sort_by_key(|(kind, _)| match kind {
        PiiKind::NationalId => 0,
        PiiKind::Email => 1,
        PiiKind::Phone => 2,
        PiiKind::Name => 3,
    });

    for (kind, regex) in ordered {
        loop {
            let (range, original) = match regex.find(&masked) {
                Some(found) => (found.range(), found.as_str().to_string()),
                None => break,
            };
            let index = counts.entry(*kind).or_insert(0);
            *index += 1;
            let placeholder = format!("[{}_{}]", kind.placeholder_tag(), index);
            risk += kind.weight();
            mapping.insert(placeholder.clone(), original);
            masked.replace_range(range, &placeholder);
        }
    }

    debug!(hits = mapping.len(), "anonymized");
    Anonymized {
        text: masked,
        mapping,
        counts,
        risk_score: risk.min(1.0),
    }
}

/// Restore original values from the mapping.
pub fn deanonymize(text: &str, mapping: &BTreeMap<String, String>) -> String {
    let mut restored = text.to_string();
    for (placeholder, original) in mapping {
        restored = restored.replace(placeholder, original);
    }
    restored
}

/// Recommendations derived from the risk score.
pub fn recommendations(anonymized: &Anonymized) -> Vec<&'static str> {
    let mut recs = Vec::new();
    if anonymized.risk_score >= 0.5 {
        recs.push("treat this document as sensitive; restrict access");
    }
    if anonymized.counts.contains_key(&PiiKind::NationalId) {
        recs.push("national id numbers present; verify retention policy");
    }
    if anonymized.mapping.is_empty() {
        recs.push("no PII detected; safe to process as-is");
    } else {
        recs.push("keep the anonymization mapping out of model context");
    }
    recs
}

/// Outcome of the full anonymize → process → restore round trip.
#[derive(Debug, Clone)]
pub struct PrivacyRunOutcome {
    pub anonymized: Anonymized,
    pub model_output: String,
    pub restored_output: String,
}

/// Run an LLM task over anonymized text and restore PII in the output.
pub async fn process_privately(
    llm: &LlmClient,
    instruction: &str,
    text: &str,
) -> Result<PrivacyRunOutcome> {
    let anonymized = anonymize(text);
    let model_output = llm
        .generate(&format!("{instruction}\n\nText:\n{}", anonymized.text))
        .await?;
    let restored_output = deanonymize(&model_output, &anonymized.mapping);
    Ok(PrivacyRunOutcome {
        anonymized,
        model_output,
        restored_output,
    })
}

/// Demo: summarize a support ticket carrying PII.
pub async fn demo(llm: &LlmClient) -> Result<DemoReport> {
    let ticket = "Dr. Alice Hartman (alice.hartman@example.org, +1 555-201-3344) \
                  reported that her account shows SSN 123-45-6789 in plain text. \
                  Please follow up urgently.";

    let outcome = process_privately(llm, "Summarize this support ticket in one sentence.", ticket)
        .await?;

    let mut report = DemoReport::new("anonymization");
    report.push("Original", ticket);
    report.push("Anonymized", &outcome.anonymized.text);
    report.push(
        "Detections",
        outcome
            .anonymized
            .counts
            .iter()
            .map(|(kind, count)| format!("{kind:?}: {count}"))
            .collect::<Vec<_>>()
            .join("\n"),
    );
    report.push(
        "Risk",
        format!(
            "score: {:.2}\n{}",
            outcome.anonymized.risk_score,
            recommendations(&outcome.anonymized).join("\n")
        ),
    );
    report.push("Model output (masked)", &outcome.model_output);
    report.push("Restored output", &outcome.restored_output);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{scripted, scripted_with_handle};

    #[test]
    fn detects_and_masks_each_kind() {
        let text = "Contact Dr. Jane Doe at jane@example.com or 555-123-4567. SSN 123-45-6789.";
        let result = anonymize(text);
        assert!(!result.text.contains("jane@example.com"));
        assert!(!result.text.contains("123-45-6789"));
        assert!(result.text.contains("[EMAIL_1]"));
        assert!(result.text.contains("[ID_1]"));
        assert!(result.counts[&PiiKind::Email] == 1);
        assert!(result.counts.contains_key(&PiiKind::Name));
    }

    #[test]
    fn ssn_not_double_counted_as_phone() {
        let result = anonymize("id: 123-45-6789");
        assert_eq!(result.counts.get(&PiiKind::NationalId), Some(&1));
        assert_eq!(result.counts.get(&PiiKind::Phone), None);
    }

    #[test]
    fn roundtrip_restores_original() {
        let text = "Email bob@example.net about the 555-123-4567 call.";
        let result = anonymize(text);
        let restored = deanonymize(&result.text, &result.mapping);
        assert_eq!(restored, text);
    }

    #[test]
    fn clean_text_scores_zero() {
        let result = anonymize("Nothing sensitive here at all.");
        assert_eq!(result.risk_score, 0.0);
        assert!(result.mapping.is_empty());
        assert!(recommendations(&result)
            .iter()
            .any(|r| r.contains("no PII")));
    }

    #[test]
    fn risk_score_capped() {
        let text = "a@b.co c@d.co e@f.co g@h.co i@j.co 123-45-6789 987-65-4321";
        assert!(anonymize(text).risk_score <= 1.0);
    }

    #[tokio::test]
    async fn model_sees_only_masked_text() {
        let (llm, provider) =
            scripted_with_handle(&["[NAME_1] reported an issue; follow up with [EMAIL_1]."]);
        let outcome = process_privately(
            &llm,
            "Summarize.",
            "Mr. John Smith wrote from john@example.com.",
        )
        .await
        .unwrap();

        assert!(!provider.prompts()[0].contains("john@example.com"));
        assert!(provider.prompts()[0].contains("[EMAIL_1]"));
        assert!(outcome.restored_output.contains("john@example.com"));
    }

    #[tokio::test]
    async fn restoration_is_noop_without_placeholders() {
        let llm = scripted(&["A summary without placeholders."]);
        let outcome = process_privately(&llm, "Summarize.", "Mr. Al Brown called.")
            .await
            .unwrap();
        assert_eq!(outcome.model_output, outcome.restored_output);
    }
}

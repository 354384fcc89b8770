//! Ensemble — independent perspectives analysed, then aggregated.
//!
//! Four perspective agents (technical, business, user-experience, risk)
//! analyse the same problem concurrently and independently, each returning
//! a recommendation with confidence. Consensus is measured across the
//! recommendations and an aggregator synthesises the final advice.

use crate::report::DemoReport;
use agentry_core::{LlmClient, Result};
use tokio::task::JoinSet;
use tracing::{debug, info};

/// One perspective's analysis.
#[derive(Debug, Clone)]
pub struct PerspectiveAnalysis {
    pub perspective: String,
    pub analysis: String,
    pub recommendation: Recommendation,
    pub confidence: f32,
}

/// The three-way recommendation each perspective must land on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recommendation {
    Proceed,
    ProceedWithCaution,
    Hold,
}

impl Recommendation {
    fn parse(text: &str) -> Self {
        let upper = text.to_uppercase();
        if upper.contains("CAUTION") {
            Recommendation::ProceedWithCaution
        } else if upper.contains("HOLD") {
            Recommendation::Hold
        } else {
            Recommendation::Proceed
        }
    }
}

/// Result of an ensemble run.
#[derive(Debug, Clone)]
pub struct EnsembleResult {
    pub problem: String,
    pub analyses: Vec<PerspectiveAnalysis>,
    /// Fraction of perspectives sharing the modal recommendation.
    pub consensus: f32,
    pub synthesis: String,
}

const PERSPECTIVES: [(&str, &str); 4] = [
    (
        "technical",
        "a senior engineer judging feasibility, complexity and operational load",
    ),
    (
        "business",
        "a product strategist judging cost, market timing and return",
    ),
    (
        "user-experience",
        "a UX researcher judging user value and adoption friction",
    ),
    (
        "risk",
        "a risk officer judging failure modes, compliance and blast radius",
    ),
];

/// The ensemble system.
pub struct Ensemble {
    llm: LlmClient,
}

impl Ensemble {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }

    async fn analyse_one(
        llm: LlmClient,
        perspective: &'static str,
        persona: &'static str,
        problem: String,
    ) -> Result<PerspectiveAnalysis> {
        let response = llm
            .generate(&format!(
                "You are {persona}. Analyse this proposal independently.\n\n\
                 Proposal: {problem}\n\n\
                 Reply in exactly this format:\n\
                 ANALYSIS: <two sentences>\n\
                 RECOMMENDATION: PROCEED, PROCEED_WITH_CAUTION or HOLD\n\
                 CONFIDENCE: 0.0-1.0"
            ))
            .await?;

        let field = |prefix: &str| -> Option<String> {
            response
                .lines()
                .find_map(|l| l.trim().strip_prefix(prefix))
                .map(|s| s.trim().to_string())
        };

        let analysis = field("ANALYSIS:").unwrap_or_else(|| response.clone());
        let recommendation =
            Recommendation::parse(&field("RECOMMENDATION:").unwrap_or_default());
        let confidence = field("CONFIDENCE:")
            .and_then(|s| s.parse::<f32>().ok())
            .unwrap_or(0.5)
            .clamp(0.0, 1.0);

        debug!(perspective, ?recommendation, confidence, "perspective done");
        Ok(PerspectiveAnalysis {
            perspective: perspective.to_string(),
            analysis,
            recommendation,
            confidence,
        })
    }

    /// Fraction of analyses agreeing with the modal recommendation.
    pub fn consensus(analyses: &[PerspectiveAnalysis]) -> f32 {
        if analyses.is_empty() {
            return 0.0;
        }
        let count = |r: Recommendation| analyses.iter().filter(|a| a.recommendation == r).count();
        let modal = [
            Recommendation::Proceed,
            Recommendation::ProceedWithCaution,
            Recommendation::Hold,
        ]
        .into_iter()
        .map(count)
        .max()
        .unwrap_or(0);
        modal as f32 / analyses.len() as f32
    }

    /// Run all perspectives concurrently, then aggregate.
    pub async fn analyse(&self, problem: &str) -> Result<EnsembleResult> {
        let mut set = JoinSet::new();
        for (perspective, persona) in PERSPECTIVES {
            set.spawn(Self::analyse_one(
                self.llm.clone(),
                perspective,
                persona,
                problem.to_string(),
            ));
        }

        let mut analyses = Vec::with_capacity(PERSPECTIVES.len());
        while let Some(joined) = set.join_next().await {
            analyses.push(
                joined.map_err(|e| agentry_core::Error::Internal(format!("task panicked: {e}")))??,
            );
        }
        // Stable presentation order regardless of completion order.
        analyses.sort_by_key(|a| {
            PERSPECTIVES
                .iter()
                .position(|(p, _)| *p == a.perspective)
                .unwrap_or(usize::MAX)
        });

        let consensus = Self::consensus(&analyses);
        info!(consensus, "perspectives collected");

        let summary = analyses
            .iter()
            .map(|a| {
                format!(
                    "[{}] {:?} (confidence {:.1}): {}",
                    a.perspective, a.recommendation, a.confidence, a.analysis
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        let synthesis = self
            .llm
            .generate(&format!(
                "Proposal: {problem}\n\nIndependent analyses:\n{summary}\n\n\
                 Consensus level: {:.0}%\n\n\
                 Synthesize a final recommendation that weighs all perspectives, \
                 noting disagreements explicitly.",
                consensus * 100.0
            ))
            .await?;

        Ok(EnsembleResult {
            problem: problem.to_string(),
            analyses,
            consensus,
            synthesis,
        })
    }
}

/// Demo: evaluate a rewrite-the-backend proposal.
pub async fn demo(llm: &LlmClient) -> Result<DemoReport> {
    let ensemble = Ensemble::new(llm.clone());
    let problem = "Rewrite our monolithic billing backend as microservices over \
                   the next two quarters.";
    let result = ensemble.analyse(problem).await?;

    let mut report = DemoReport::new("ensemble");
    report.push("Proposal", problem);
    for analysis in &result.analyses {
        report.push(
            format!(
                "{} — {:?} ({:.1})",
                analysis.perspective, analysis.recommendation, analysis.confidence
            ),
            &analysis.analysis,
        );
    }
    report.push(
        format!("Synthesis (consensus {:.0}%)", result.consensus * 100.0),
        &result.synthesis,
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::scripted;

    fn analysis(recommendation: Recommendation) -> PerspectiveAnalysis {
        PerspectiveAnalysis {
            perspective: "x".into(),
            analysis: "a".into(),
            recommendation,
            confidence: 0.5,
        }
    }

    #[test]
    fn consensus_fraction() {
        let analyses = vec![
            analysis(Recommendation::Proceed),
            analysis(Recommendation::Proceed),
            analysis(Recommendation::Hold),
            analysis(Recommendation::Proceed),
        ];
        assert!((Ensemble::consensus(&analyses) - 0.75).abs() < 0.01);
        assert_eq!(Ensemble::consensus(&[]), 0.0);
    }

    #[test]
    fn recommendation_parsing() {
        assert_eq!(Recommendation::parse("PROCEED"), Recommendation::Proceed);
        assert_eq!(
            Recommendation::parse("PROCEED_WITH_CAUTION"),
            Recommendation::ProceedWithCaution
        );
        assert_eq!(Recommendation::parse("HOLD off"), Recommendation::Hold);
    }

    #[tokio::test]
    async fn four_perspectives_plus_synthesis() {
        // 4 perspective calls (in any completion order) + 1 synthesis.
        let reply = "ANALYSIS: Looks workable but large.\nRECOMMENDATION: PROCEED_WITH_CAUTION\nCONFIDENCE: 0.7";
        let llm = scripted(&[reply, reply, reply, reply, "Proceed carefully, in phases."]);
        let ensemble = Ensemble::new(llm);
        let result = ensemble.analyse("rewrite backend").await.unwrap();

        assert_eq!(result.analyses.len(), 4);
        assert!((result.consensus - 1.0).abs() < 0.01);
        assert!(result.synthesis.contains("phases"));
        // Presentation order is the declared perspective order.
        assert_eq!(result.analyses[0].perspective, "technical");
        assert_eq!(result.analyses[3].perspective, "risk");
    }

    #[tokio::test]
    async fn malformed_perspective_defaults() {
        let llm = scripted(&[
            "just vibes",
            "just vibes",
            "just vibes",
            "just vibes",
            "synthesis",
        ]);
        let ensemble = Ensemble::new(llm);
        let result = ensemble.analyse("p").await.unwrap();
        assert!(result
            .analyses
            .iter()
            .all(|a| a.recommendation == Recommendation::Proceed && a.confidence == 0.5));
    }
}

//! Chain-of-thought reasoning and its two close relatives.
//!
//! Three sub-patterns share this module, as they share one shape — a fixed
//! prompt scaffold around a reasoning task:
//! - step-by-step reasoning before the answer (17a)
//! - draft → review → corrected solution (17b)
//! - decomposition into ordered sub-problems (17c)

use crate::report::DemoReport;
use agentry_core::{LlmClient, Result};

/// Result of a step-by-step reasoning pass.
#[derive(Debug, Clone)]
pub struct ReasonedAnswer {
    pub problem: String,
    pub reasoning: String,
}

/// Ask for explicit step-by-step reasoning ending in a final answer line.
pub async fn reason_step_by_step(llm: &LlmClient, problem: &str) -> Result<ReasonedAnswer> {
    let prompt = format!(
        "Solve this problem step by step. Show your reasoning for each step, \
         then give the final answer on its own line starting with \"Answer:\".\n\n\
         Problem: {problem}"
    );
    let reasoning = llm.generate(&prompt).await?;
    Ok(ReasonedAnswer {
        problem: problem.to_string(),
        reasoning,
    })
}

/// Result of a draft/review/correct pass.
#[derive(Debug, Clone)]
pub struct CorrectedSolution {
    pub problem: String,
    pub draft: String,
    pub review: String,
    pub corrected: String,
}

/// Draft a solution, review it for errors, produce a corrected version.
pub async fn self_correct(llm: &LlmClient, problem: &str) -> Result<CorrectedSolution> {
    let draft = llm
        .generate(&format!("Solve this problem:\n{problem}"))
        .await?;

    let review = llm
        .generate(&format!(
            "Check this solution for errors — arithmetic slips, wrong \
             assumptions, missed cases.\n\nProblem: {problem}\n\nSolution:\n{draft}\n\n\
             List any errors you find, or say \"No errors found.\""
        ))
        .await?;

    let corrected = if review.to_lowercase().contains("no errors found") {
        draft.clone()
    } else {
        llm.generate(&format!(
            "Problem: {problem}\n\nDraft solution:\n{draft}\n\n\
             Errors found in review:\n{review}\n\n\
             Write the corrected solution."
        ))
        .await?
    };

    Ok(CorrectedSolution {
        problem: problem.to_string(),
        draft,
        review,
        corrected,
    })
}

/// Result of a decomposition pass.
#[derive(Debug, Clone)]
pub struct Decomposition {
    pub problem: String,
    /// Sub-problems in suggested solving order.
    pub sub_problems: Vec<String>,
}

/// Break a problem into ordered sub-problems (numbered-list protocol).
pub async fn decompose(llm: &LlmClient, problem: &str) -> Result<Decomposition> {
    let response = llm
        .generate(&format!(
            "Break this problem into smaller sub-problems, in the order they \
             should be solved. Respond with a numbered list only.\n\n\
             Problem: {problem}"
        ))
        .await?;

    let sub_problems = response
        .lines()
        .filter_map(|line| {
            let trimmed = line.trim();
            let rest = trimmed
                .split_once('.')
                .filter(|(n, _)| n.chars().all(|c| c.is_ascii_digit()) && !n.is_empty())
                .map(|(_, rest)| rest.trim());
            rest.filter(|r| !r.is_empty()).map(String::from)
        })
        .collect();

    Ok(Decomposition {
        problem: problem.to_string(),
        sub_problems,
    })
}

/// Demo 17a: step-by-step arithmetic word problem.
pub async fn demo_reasoning(llm: &LlmClient) -> Result<DemoReport> {
    let problem = "A store sells pencils at 3 for $1.20. How much do 7 pencils cost?";
    let result = reason_step_by_step(llm, problem).await?;

    let mut report = DemoReport::new("chain-of-thought");
    report.push("Problem", problem);
    report.push("Reasoning", &result.reasoning);
    Ok(report)
}

/// Demo 17b: draft, review and correct a logic puzzle.
pub async fn demo_self_correction(llm: &LlmClient) -> Result<DemoReport> {
    let problem = "If all bloops are razzies and some razzies are lazzies, \
                   must some bloops be lazzies?";
    let result = self_correct(llm, problem).await?;

    let mut report = DemoReport::new("self-correction");
    report.push("Problem", problem);
    report.push("Draft", &result.draft);
    report.push("Review", &result.review);
    report.push("Corrected solution", &result.corrected);
    Ok(report)
}

/// Demo 17c: decompose a project-sized problem.
pub async fn demo_decomposition(llm: &LlmClient) -> Result<DemoReport> {
    let problem = "Build a command-line tool that syncs a local folder to cloud storage.";
    let result = decompose(llm, problem).await?;

    let mut report = DemoReport::new("problem-decomposition");
    report.push("Problem", problem);
    report.push(
        "Sub-problems",
        result
            .sub_problems
            .iter()
            .enumerate()
            .map(|(i, s)| format!("{}. {s}", i + 1))
            .collect::<Vec<_>>()
            .join("\n"),
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{scripted, scripted_with_handle};

    #[tokio::test]
    async fn reasoning_prompt_demands_steps() {
        let (llm, provider) = scripted_with_handle(&["Step 1...\nAnswer: $2.80"]);
        let result = reason_step_by_step(&llm, "pencil problem").await.unwrap();
        assert!(result.reasoning.contains("Answer:"));
        assert!(provider.prompts()[0].contains("step by step"));
    }

    #[tokio::test]
    async fn clean_review_skips_correction_call() {
        let llm = scripted(&["draft", "No errors found."]);
        let result = self_correct(&llm, "p").await.unwrap();
        assert_eq!(result.corrected, "draft");
    }

    #[tokio::test]
    async fn errors_trigger_correction() {
        let llm = scripted(&["draft", "Error: wrong conclusion", "fixed solution"]);
        let result = self_correct(&llm, "p").await.unwrap();
        assert_eq!(result.corrected, "fixed solution");
    }

    #[tokio::test]
    async fn decompose_parses_numbered_list() {
        let llm = scripted(&["1. Parse config\n2. Walk the folder\n3. Upload changed files"]);
        let result = decompose(&llm, "sync tool").await.unwrap();
        assert_eq!(result.sub_problems.len(), 3);
        assert_eq!(result.sub_problems[0], "Parse config");
    }

    #[tokio::test]
    async fn decompose_ignores_unnumbered_lines() {
        let llm = scripted(&["Here is the breakdown:\n1. First\nnot a step\n2. Second"]);
        let result = decompose(&llm, "p").await.unwrap();
        assert_eq!(result.sub_problems, vec!["First", "Second"]);
    }
}

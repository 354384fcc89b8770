//! Prompt chaining — each step's prompt receives the previous step's output.
//!
//! The simplest composition in the catalogue: an ordered list of prompt
//! templates, threaded left to right. The demo extracts product specs from
//! free text and then reformats them as JSON.

use crate::report::DemoReport;
use agentry_core::{LlmClient, Result};
use tracing::debug;

/// One step in a chain: a name plus a template with an `{input}` slot.
#[derive(Debug, Clone)]
pub struct ChainStep {
    pub name: String,
    pub template: String,
}

impl ChainStep {
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            template: template.into(),
        }
    }
}

/// Record of one executed step.
#[derive(Debug, Clone)]
pub struct StepRecord {
    pub name: String,
    pub prompt: String,
    pub output: String,
}

/// Result of running a chain.
#[derive(Debug, Clone)]
pub struct ChainResult {
    /// Per-step transcript, in execution order.
    pub steps: Vec<StepRecord>,
    /// The last step's output.
    pub output: String,
}

/// An ordered chain of prompt steps.
pub struct PromptChain {
    steps: Vec<ChainStep>,
}

impl PromptChain {
    pub fn new(steps: Vec<ChainStep>) -> Self {
        Self { steps }
    }

    /// Run the chain on an input, threading each output into the next
    /// step's `{input}` slot.
    pub async fn run(&self, llm: &LlmClient, input: &str) -> Result<ChainResult> {
        let mut current = input.to_string();
        let mut records = Vec::with_capacity(self.steps.len());

        for step in &self.steps {
            let prompt = step.template.replace("{input}", &current);
            debug!(step = %step.name, "chain step");
            let output = llm.generate(&prompt).await?;
            records.push(StepRecord {
                name: step.name.clone(),
                prompt,
                output: output.clone(),
            });
            current = output;
        }

        Ok(ChainResult {
            output: current,
            steps: records,
        })
    }
}

/// Demo: extract laptop specs, then convert them to JSON.
pub async fn demo(llm: &LlmClient) -> Result<DemoReport> {
    let text = "The laptop has an Intel i7 processor, 16GB RAM, and 512GB SSD.";

    let chain = PromptChain::new(vec![
        ChainStep::new(
            "extract",
            "Extract the technical specifications from: {input}",
        ),
        ChainStep::new("format", "Convert these specs to JSON: {input}"),
    ]);

    let result = chain.run(llm, text).await?;

    let mut report = DemoReport::new("prompt-chaining");
    report.push("Input", text);
    for record in &result.steps {
        report.push(format!("Step: {}", record.name), &record.output);
    }
    report.push("Final output", &result.output);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::scripted_with_handle;

    #[tokio::test]
    async fn output_threads_through_steps() {
        let (llm, provider) = scripted_with_handle(&["specs: i7, 16GB", "{\"cpu\": \"i7\"}"]);

        let chain = PromptChain::new(vec![
            ChainStep::new("extract", "Extract from: {input}"),
            ChainStep::new("format", "To JSON: {input}"),
        ]);

        let result = chain.run(&llm, "some text").await.unwrap();
        assert_eq!(result.steps.len(), 2);
        assert_eq!(result.output, "{\"cpu\": \"i7\"}");

        // Second prompt must embed the first output.
        let prompts = provider.prompts();
        assert!(prompts[0].contains("some text"));
        assert!(prompts[1].contains("specs: i7, 16GB"));
    }

    #[tokio::test]
    async fn empty_chain_passes_input_through() {
        let llm = crate::test_helpers::scripted(&[]);
        let chain = PromptChain::new(vec![]);
        let result = chain.run(&llm, "untouched").await.unwrap();
        assert_eq!(result.output, "untouched");
        assert!(result.steps.is_empty());
    }

    #[tokio::test]
    async fn demo_produces_report() {
        let llm = crate::test_helpers::scripted(&["extracted specs", "{\"ram\": \"16GB\"}"]);
        let report = demo(&llm).await.unwrap();
        assert_eq!(report.pattern, "prompt-chaining");
        assert!(report.render().contains("extracted specs"));
        assert!(report.render().contains("Final output"));
    }
}

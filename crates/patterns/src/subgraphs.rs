//! Subgraphs — reusable node sequences composed into a parent workflow.
//!
//! A subgraph is an ordered list of named nodes over a shared string-keyed
//! state. The orchestrator runs registered subgraphs in sequence, handing
//! the state from one to the next, and summarizes what each changed.

use crate::report::DemoReport;
use agentry_core::error::PatternError;
use agentry_core::{LlmClient, Result};
use std::collections::BTreeMap;
use tracing::debug;

/// Shared state threaded through subgraphs.
pub type GraphState = BTreeMap<String, String>;

/// One node: reads state, writes one key.
pub struct SubgraphNode {
    pub name: String,
    /// Key this node writes its output under.
    pub output_key: String,
    /// Prompt template; `{state:<key>}` slots are filled from state.
    pub prompt: String,
}

impl SubgraphNode {
    pub fn new(
        name: impl Into<String>,
        output_key: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            output_key: output_key.into(),
            prompt: prompt.into(),
        }
    }
}

/// A reusable subgraph.
pub struct Subgraph {
    pub name: String,
    pub description: String,
    nodes: Vec<SubgraphNode>,
}

impl Subgraph {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            nodes: Vec::new(),
        }
    }

    pub fn add_node(mut self, node: SubgraphNode) -> Self {
        self.nodes.push(node);
        self
    }

    fn fill(prompt: &str, state: &GraphState) -> String {
        let mut filled = prompt.to_string();
        for (key, value) in state {
            filled = filled.replace(&format!("{{state:{key}}}"), value);
        }
        filled
    }

    /// Execute every node in order against the shared state.
    pub async fn execute(&self, llm: &LlmClient, state: &mut GraphState) -> Result<Vec<String>> {
        let mut visited = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            debug!(subgraph = %self.name, node = %node.name, "executing node");
            let prompt = Self::fill(&node.prompt, state);
            let output = llm.generate(&prompt).await?;
            state.insert(node.output_key.clone(), output);
            visited.push(node.name.clone());
        }
        Ok(visited)
    }
}

/// Summary of one subgraph's run inside a workflow.
#[derive(Debug, Clone)]
pub struct SubgraphSummary {
    pub subgraph: String,
    pub nodes_visited: Vec<String>,
    pub keys_written: Vec<String>,
}

/// Composes registered subgraphs into workflows.
pub struct SubgraphOrchestrator {
    subgraphs: BTreeMap<String, Subgraph>,
}

impl SubgraphOrchestrator {
    pub fn new() -> Self {
        Self {
            subgraphs: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, subgraph: Subgraph) {
        self.subgraphs.insert(subgraph.name.clone(), subgraph);
    }

    pub fn names(&self) -> Vec<&str> {
        self.subgraphs.keys().map(|s| s.as_str()).collect()
    }

    /// Run a sequence of registered subgraphs over one shared state.
    pub async fn run_workflow(
        &self,
        llm: &LlmClient,
        sequence: &[&str],
        mut state: GraphState,
    ) -> Result<(GraphState, Vec<SubgraphSummary>)> {
        let mut summaries = Vec::with_capacity(sequence.len());
        for name in sequence {
            let subgraph = self.subgraphs.get(*name).ok_or_else(|| {
                PatternError::InvalidWorkflow(format!("unknown subgraph '{name}'"))
            })?;

            let before: Vec<String> = state.keys().cloned().collect();
            let nodes_visited = subgraph.execute(llm, &mut state).await?;
            let keys_written = state
                .keys()
                .filter(|k| !before.contains(*k))
                .cloned()
                .collect();

            summaries.push(SubgraphSummary {
                subgraph: name.to_string(),
                nodes_visited,
                keys_written,
            });
        }
        Ok((state, summaries))
    }
}

impl Default for SubgraphOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

/// The demo's three reusable subgraphs.
pub fn sample_orchestrator() -> SubgraphOrchestrator {
    let mut orchestrator = SubgraphOrchestrator::new();

    orchestrator.register(
        Subgraph::new("processing", "Clean and structure the raw input")
            .add_node(SubgraphNode::new(
                "clean",
                "cleaned",
                "Clean up this raw text, fixing obvious noise:\n{state:raw}",
            ))
            .add_node(SubgraphNode::new(
                "structure",
                "structured",
                "Organize this text into labelled sections:\n{state:cleaned}",
            )),
    );

    orchestrator.register(
        Subgraph::new("analysis", "Extract insights from structured data")
            .add_node(SubgraphNode::new(
                "insights",
                "insights",
                "List the key insights in this data:\n{state:structured}",
            ))
            .add_node(SubgraphNode::new(
                "risks",
                "risks",
                "List risks or caveats suggested by:\n{state:insights}",
            )),
    );

    orchestrator.register(
        Subgraph::new("reporting", "Produce the final report").add_node(SubgraphNode::new(
            "report",
            "report",
            "Write a short report.\nInsights:\n{state:insights}\nRisks:\n{state:risks}",
        )),
    );

    orchestrator
}

/// Demo: processing → analysis → reporting over a sample survey blob.
pub async fn demo(llm: &LlmClient) -> Result<DemoReport> {
    let orchestrator = sample_orchestrator();

    let mut state = GraphState::new();
    state.insert(
        "raw".into(),
        "survey responses: 40% cited onboarding friction!! 25% wanted dark mode, \
         rest unsure??  many typos present"
            .into(),
    );

    let (final_state, summaries) = orchestrator
        .run_workflow(llm, &["processing", "analysis", "reporting"], state)
        .await?;

    let mut report = DemoReport::new("subgraphs");
    for summary in &summaries {
        report.push(
            format!("Subgraph: {}", summary.subgraph),
            format!(
                "nodes: {}\nwrote: {}",
                summary.nodes_visited.join(" → "),
                summary.keys_written.join(", ")
            ),
        );
    }
    if let Some(final_report) = final_state.get("report") {
        report.push("Final report", final_report);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{scripted, scripted_with_handle};

    #[tokio::test]
    async fn nodes_thread_state() {
        let (llm, provider) = scripted_with_handle(&["cleaned text", "structured text"]);
        let subgraph = Subgraph::new("processing", "d")
            .add_node(SubgraphNode::new("clean", "cleaned", "Clean: {state:raw}"))
            .add_node(SubgraphNode::new(
                "structure",
                "structured",
                "Structure: {state:cleaned}",
            ));

        let mut state = GraphState::new();
        state.insert("raw".into(), "raw input".into());
        let visited = subgraph.execute(&llm, &mut state).await.unwrap();

        assert_eq!(visited, vec!["clean", "structure"]);
        assert_eq!(state["structured"], "structured text");
        assert!(provider.prompts()[0].contains("raw input"));
        assert!(provider.prompts()[1].contains("cleaned text"));
    }

    #[tokio::test]
    async fn workflow_hands_state_between_subgraphs() {
        let llm = scripted(&["c", "s", "i", "r", "final report"]);
        let orchestrator = sample_orchestrator();
        let mut state = GraphState::new();
        state.insert("raw".into(), "data".into());

        let (final_state, summaries) = orchestrator
            .run_workflow(&llm, &["processing", "analysis", "reporting"], state)
            .await
            .unwrap();

        assert_eq!(summaries.len(), 3);
        assert_eq!(final_state["report"], "final report");
        assert_eq!(summaries[1].keys_written, vec!["insights", "risks"]);
    }

    #[tokio::test]
    async fn unknown_subgraph_is_an_error() {
        let llm = scripted(&[]);
        let orchestrator = sample_orchestrator();
        let err = orchestrator
            .run_workflow(&llm, &["nonexistent"], GraphState::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unknown subgraph"));
    }
}

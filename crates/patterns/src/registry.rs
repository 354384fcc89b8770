//! The pattern catalogue: metadata and demo dispatch.
//!
//! Patterns are addressed by number ("34") or slug ("react"). The catalogue
//! keeps the original numbering, including the gap at 09.

use crate::report::DemoReport;
use agentry_core::error::PatternError;
use agentry_core::{LlmClient, Result};

/// One catalogue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternEntry {
    /// Catalogue number (e.g., "17a")
    pub number: &'static str,
    /// Slug used on the command line
    pub slug: &'static str,
    /// One-line summary
    pub summary: &'static str,
}

/// The full catalogue, in numeric order.
pub const CATALOGUE: &[PatternEntry] = &[
    PatternEntry { number: "01", slug: "prompt-chaining", summary: "Chain prompts so each step transforms the previous output" },
    PatternEntry { number: "02", slug: "routing", summary: "Classify a request and dispatch it to a specialized handler" },
    PatternEntry { number: "03", slug: "parallelization", summary: "Fan independent LLM calls out concurrently and collect results" },
    PatternEntry { number: "04", slug: "reflection", summary: "Generate, critique and revise until the critic approves" },
    PatternEntry { number: "05", slug: "tool-calling", summary: "Let the model pick a tool, execute it, answer from the result" },
    PatternEntry { number: "06", slug: "planning", summary: "Plan steps for a task, execute each, synthesize the results" },
    PatternEntry { number: "07", slug: "multi-agent", summary: "Specialist agents work in sequence, then results are merged" },
    PatternEntry { number: "08", slug: "memory-management", summary: "Rolling conversation window plus extracted user preferences" },
    PatternEntry { number: "10", slug: "mcp", summary: "Discover and call tools behind a mock MCP server interface" },
    PatternEntry { number: "11", slug: "goal-setting", summary: "Track goals with progress, strategies and evaluations" },
    PatternEntry { number: "12", slug: "recovery", summary: "Retry with backoff, fall back, apologize gracefully" },
    PatternEntry { number: "13", slug: "human-in-loop", summary: "Escalate low-confidence answers to a human review queue" },
    PatternEntry { number: "14", slug: "knowledge-retrieval", summary: "Ground answers in a keyword-searched knowledge base" },
    PatternEntry { number: "15", slug: "agent-messaging", summary: "Agents exchange directed and broadcast messages via a hub" },
    PatternEntry { number: "16", slug: "resource-optimization", summary: "Route tasks to cheap or premium lanes by complexity" },
    PatternEntry { number: "17a", slug: "chain-of-thought", summary: "Reason step by step before answering" },
    PatternEntry { number: "17b", slug: "self-correction", summary: "Draft, find errors, produce a corrected solution" },
    PatternEntry { number: "17c", slug: "problem-decomposition", summary: "Split a problem into ordered sub-problems" },
    PatternEntry { number: "18", slug: "guardrails", summary: "Validate input and output against safety rules" },
    PatternEntry { number: "19a", slug: "evaluation", summary: "Judge responses for quality, safety and accuracy" },
    PatternEntry { number: "19b", slug: "monitoring", summary: "Record latency and errors, raise threshold alerts" },
    PatternEntry { number: "20", slug: "prioritization", summary: "Score and schedule tasks by priority, deadline and effort" },
    PatternEntry { number: "21", slug: "exploration", summary: "Generate hypotheses, research them, connect the findings" },
    PatternEntry { number: "22", slug: "structured-output", summary: "Parse model JSON into typed records with a corrective retry" },
    PatternEntry { number: "23", slug: "agentic-rag", summary: "Decide when to retrieve, self-grade the grounded answer" },
    PatternEntry { number: "24", slug: "orchestration", summary: "Run a dependency-ordered workflow DAG of tasks" },
    PatternEntry { number: "25", slug: "subgraphs", summary: "Compose reusable subgraphs into a parent workflow" },
    PatternEntry { number: "26", slug: "state-machine", summary: "Drive an agent lifecycle through an explicit transition table" },
    PatternEntry { number: "27", slug: "recursive-agents", summary: "Recursively decompose problems with a depth cap" },
    PatternEntry { number: "28", slug: "code-execution", summary: "Vet generated code and run it in a restricted harness" },
    PatternEntry { number: "29", slug: "query-rewriter", summary: "Analyse, expand and rewrite queries for retrieval" },
    PatternEntry { number: "30", slug: "relevancy-check", summary: "Score, filter and verify retrieved content" },
    PatternEntry { number: "31", slug: "data-processing", summary: "Clean, chunk and enrich documents for retrieval" },
    PatternEntry { number: "32", slug: "plan-executor", summary: "Parse a structured plan, execute it, adapt on failure" },
    PatternEntry { number: "33", slug: "anonymization", summary: "Mask PII reversibly before processing, restore after" },
    PatternEntry { number: "34", slug: "react", summary: "Thought → Action → Observation loop over tools" },
    PatternEntry { number: "35", slug: "plan-execute-verify", summary: "Plan steps, execute, verify each, retry failures" },
    PatternEntry { number: "36", slug: "blackboard", summary: "Specialists contribute opportunistically to a shared board" },
    PatternEntry { number: "37", slug: "dual-memory", summary: "Episodic experiences plus semantic facts, recalled together" },
    PatternEntry { number: "38", slug: "tree-of-thoughts", summary: "Explore a scored, pruned tree of reasoning paths" },
    PatternEntry { number: "39", slug: "mental-loop", summary: "Simulate candidate actions before committing to one" },
    PatternEntry { number: "40", slug: "meta-controller", summary: "Classify tasks and route them to the best specialist" },
    PatternEntry { number: "41", slug: "graph-memory", summary: "Store knowledge as a graph, answer via multi-hop paths" },
    PatternEntry { number: "42", slug: "ensemble", summary: "Independent perspectives analysed, then aggregated" },
    PatternEntry { number: "43", slug: "dry-run", summary: "Simulate and review actions before live execution" },
    PatternEntry { number: "44", slug: "self-improvement", summary: "Critique drafts, revise, learn from accepted outputs" },
    PatternEntry { number: "45", slug: "cellular-automata", summary: "Local grid rules producing emergent global behaviour" },
    PatternEntry { number: "46", slug: "metacognition", summary: "Reason about own capabilities: answer, tool, escalate or refuse" },
];

/// Look up a pattern by number or slug.
pub fn find(name: &str) -> Option<&'static PatternEntry> {
    let needle = name.trim().to_lowercase();
    CATALOGUE
        .iter()
        .find(|p| p.number == needle || p.slug == needle)
}

/// Run a pattern demo by number or slug.
pub async fn run(name: &str, llm: &LlmClient) -> Result<DemoReport> {
    let entry = find(name).ok_or_else(|| PatternError::UnknownPattern(name.to_string()))?;

    match entry.slug {
        "prompt-chaining" => crate::prompt_chaining::demo(llm).await,
        "routing" => crate::routing::demo(llm).await,
        "parallelization" => crate::parallelization::demo(llm).await,
        "reflection" => crate::reflection::demo(llm).await,
        "tool-calling" => crate::tool_calling::demo(llm).await,
        "planning" => crate::planning::demo(llm).await,
        "multi-agent" => crate::multi_agent::demo(llm).await,
        "memory-management" => crate::memory_management::demo(llm).await,
        "mcp" => crate::mcp::demo(llm).await,
        "goal-setting" => crate::goal_setting::demo(llm).await,
        "recovery" => crate::recovery::demo(llm).await,
        "human-in-loop" => crate::human_in_loop::demo(llm).await,
        "knowledge-retrieval" => crate::knowledge_retrieval::demo(llm).await,
        "agent-messaging" => crate::agent_messaging::demo(llm).await,
        "resource-optimization" => crate::resource_optimization::demo(llm).await,
        "chain-of-thought" => crate::chain_of_thought::demo_reasoning(llm).await,
        "self-correction" => crate::chain_of_thought::demo_self_correction(llm).await,
        "problem-decomposition" => crate::chain_of_thought::demo_decomposition(llm).await,
        "guardrails" => crate::guardrails::demo(llm).await,
        "evaluation" => crate::evaluation::demo(llm).await,
        "monitoring" => crate::monitoring::demo(llm).await,
        "prioritization" => crate::prioritization::demo(llm).await,
        "exploration" => crate::exploration::demo(llm).await,
        "structured-output" => crate::structured_output::demo(llm).await,
        "agentic-rag" => crate::agentic_rag::demo(llm).await,
        "orchestration" => crate::orchestration::demo(llm).await,
        "subgraphs" => crate::subgraphs::demo(llm).await,
        "state-machine" => crate::state_machine::demo(llm).await,
        "recursive-agents" => crate::recursive::demo(llm).await,
        "code-execution" => crate::code_execution::demo(llm).await,
        "query-rewriter" => crate::query_rewriter::demo(llm).await,
        "relevancy-check" => crate::relevancy::demo(llm).await,
        "data-processing" => crate::data_processing::demo(llm).await,
        "plan-executor" => crate::plan_executor::demo(llm).await,
        "anonymization" => crate::anonymization::demo(llm).await,
        "react" => crate::react::demo(llm).await,
        "plan-execute-verify" => crate::pev::demo(llm).await,
        "blackboard" => crate::blackboard::demo(llm).await,
        "dual-memory" => crate::dual_memory::demo(llm).await,
        "tree-of-thoughts" => crate::tree_of_thoughts::demo(llm).await,
        "mental-loop" => crate::mental_loop::demo(llm).await,
        "meta-controller" => crate::meta_controller::demo(llm).await,
        "graph-memory" => crate::graph_memory::demo(llm).await,
        "ensemble" => crate::ensemble::demo(llm).await,
        "dry-run" => crate::dry_run::demo(llm).await,
        "self-improvement" => crate::self_improvement::demo(llm).await,
        "cellular-automata" => crate::cellular_automata::demo(llm).await,
        "metacognition" => crate::metacognition::demo(llm).await,
        other => Err(PatternError::UnknownPattern(other.to_string()).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_by_number_and_slug() {
        assert_eq!(find("34").unwrap().slug, "react");
        assert_eq!(find("react").unwrap().number, "34");
        assert_eq!(find("17b").unwrap().slug, "self-correction");
        assert!(find("09").is_none()); // the catalogue has no 09
        assert!(find("nonsense").is_none());
    }

    #[test]
    fn catalogue_numbers_are_unique() {
        let mut numbers: Vec<&str> = CATALOGUE.iter().map(|p| p.number).collect();
        numbers.sort();
        numbers.dedup();
        assert_eq!(numbers.len(), CATALOGUE.len());
    }

    #[test]
    fn catalogue_slugs_are_unique() {
        let mut slugs: Vec<&str> = CATALOGUE.iter().map(|p| p.slug).collect();
        slugs.sort();
        slugs.dedup();
        assert_eq!(slugs.len(), CATALOGUE.len());
    }

    #[test]
    fn catalogue_covers_46_patterns() {
        assert_eq!(CATALOGUE.len(), 46);
    }

    #[tokio::test]
    async fn run_dispatches_by_number() {
        // Pattern 01 makes exactly two model calls.
        let llm = crate::test_helpers::scripted(&["extracted", "{\"cpu\": \"i7\"}"]);
        let report = run("01", &llm).await.unwrap();
        assert_eq!(report.pattern, "prompt-chaining");
    }

    #[tokio::test]
    async fn run_unknown_pattern_errors() {
        let llm = crate::test_helpers::scripted(&[]);
        let err = run("99", &llm).await.unwrap_err();
        assert!(err.to_string().contains("Unknown pattern"));
    }
}

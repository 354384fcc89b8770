//! ReAct — Thought → Action → Observation loop over tools.
//!
//! The model is prompted to reply with `Thought:` and either
//! `Action: tool[args]` or `Final Answer: ...`. Actions run against the
//! registry; observations are appended to the scratchpad for the next
//! round. The loop is capped, and the full trace comes back in the result.

use crate::report::DemoReport;
use agentry_core::tool::ToolRegistry;
use agentry_core::{LlmClient, Result};
use tracing::{debug, info, warn};

/// Kinds of trace entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceKind {
    Thought,
    Action,
    Observation,
}

/// One entry in the reasoning trace.
#[derive(Debug, Clone)]
pub struct TraceEntry {
    pub kind: TraceKind,
    pub content: String,
}

/// Result of a ReAct run.
#[derive(Debug, Clone)]
pub struct ReactResult {
    pub answer: String,
    pub trace: Vec<TraceEntry>,
    pub iterations: usize,
    /// False when the iteration cap cut the loop short.
    pub completed: bool,
}

/// A parsed `Action: tool[args]` line.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub tool: String,
    pub argument: String,
}

/// Parse `Thought:` content from a reply.
pub fn parse_thought(response: &str) -> Option<String> {
    response.lines().find_map(|line| {
        line.trim()
            .strip_prefix("Thought:")
            .map(|rest| rest.trim().to_string())
            .filter(|t| !t.is_empty())
    })
}

/// Parse an `Action: tool[argument]` line.
pub fn parse_action(response: &str) -> Option<Action> {
    for line in response.lines() {
        let Some(rest) = line.trim().strip_prefix("Action:") else {
            continue;
        };
        let rest = rest.trim();
        let open = rest.find('[')?;
        let close = rest.rfind(']')?;
        if close <= open {
            return None;
        }
        return Some(Action {
            tool: rest[..open].trim().to_string(),
            argument: rest[open + 1..close].trim().to_string(),
        });
    }
    None
}

/// Parse a `Final Answer:` line (rest of the reply after the marker).
pub fn parse_final_answer(response: &str) -> Option<String> {
    let idx = response.find("Final Answer:")?;
    Some(response[idx + "Final Answer:".len()..].trim().to_string())
}

/// The ReAct agent.
pub struct ReactAgent {
    llm: LlmClient,
    tools: ToolRegistry,
    max_iterations: usize,
}

impl ReactAgent {
    pub fn new(llm: LlmClient, tools: ToolRegistry) -> Self {
        Self {
            llm,
            tools,
            max_iterations: 6,
        }
    }

    /// Set the iteration cap.
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    fn argument_key(tool: &str) -> &'static str {
        match tool {
            "calculator" => "expression",
            "weather" => "city",
            "search" => "query",
            "knowledge_base" => "topic",
            "stock" => "symbol",
            _ => "input",
        }
    }

    fn build_prompt(&self, question: &str, scratchpad: &str) -> String {
        format!(
            "Answer the question by reasoning in steps. You may use tools.\n\n\
             Available tools:\n{}\n\n\
             Use this format exactly:\n\
             Thought: <your reasoning>\n\
             Action: tool_name[argument]\n\n\
             When you know the answer, reply instead with:\n\
             Thought: <your reasoning>\n\
             Final Answer: <the answer>\n\n\
             Question: {question}\n\n{scratchpad}",
            self.tools.prompt_listing()
        )
    }

    /// Run the loop.
    pub async fn solve(&self, question: &str) -> Result<ReactResult> {
        let mut trace: Vec<TraceEntry> = Vec::new();
        let mut scratchpad = String::new();

        info!(max_iter = self.max_iterations, "ReAct loop starting");

        for iteration in 1..=self.max_iterations {
            debug!(iteration, "ReAct iteration");
            let response = self
                .llm
                .generate(&self.build_prompt(question, &scratchpad))
                .await?;

            if let Some(thought) = parse_thought(&response) {
                trace.push(TraceEntry {
                    kind: TraceKind::Thought,
                    content: thought,
                });
            }

            if let Some(answer) = parse_final_answer(&response) {
                info!(iterations = iteration, "ReAct loop completed");
                return Ok(ReactResult {
                    answer,
                    trace,
                    iterations: iteration,
                    completed: true,
                });
            }

            let Some(action) = parse_action(&response) else {
                // Neither an action nor a final answer: treat the raw reply
                // as the answer rather than looping on malformed output.
                warn!("reply had no action or final answer; accepting as answer");
                return Ok(ReactResult {
                    answer: response,
                    trace,
                    iterations: iteration,
                    completed: true,
                });
            };

            trace.push(TraceEntry {
                kind: TraceKind::Action,
                content: format!("{}[{}]", action.tool, action.argument),
            });

            let arguments =
                serde_json::json!({ Self::argument_key(&action.tool): action.argument });
            let observation = match self.tools.execute(&action.tool, arguments).await {
                Ok(outcome) => outcome.output,
                Err(e) => format!("Error: {e}"),
            };

            trace.push(TraceEntry {
                kind: TraceKind::Observation,
                content: observation.clone(),
            });

            scratchpad.push_str(&format!(
                "Thought and action so far:\nAction: {}[{}]\nObservation: {}\n",
                action.tool, action.argument, observation
            ));
        }

        warn!(max_iter = self.max_iterations, "ReAct: iteration cap reached");
        Ok(ReactResult {
            answer: "I could not reach a final answer within the step limit.".into(),
            trace,
            iterations: self.max_iterations,
            completed: false,
        })
    }
}

/// Demo: a two-hop question over the default tools.
pub async fn demo(llm: &LlmClient) -> Result<DemoReport> {
    let agent = ReactAgent::new(llm.clone(), agentry_tools::default_registry());
    let question = "What is the weather in Paris, and what is 15% of 240?";
    let result = agent.solve(question).await?;

    let mut report = DemoReport::new("react");
    report.push("Question", question);
    report.push(
        "Trace",
        result
            .trace
            .iter()
            .map(|entry| format!("{:?}: {}", entry.kind, entry.content))
            .collect::<Vec<_>>()
            .join("\n"),
    );
    report.push(
        format!(
            "Answer ({} iteration{})",
            result.iterations,
            if result.iterations == 1 { "" } else { "s" }
        ),
        &result.answer,
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::scripted;

    #[test]
    fn parsers_handle_the_protocol() {
        let reply = "Thought: I need the weather.\nAction: weather[Paris]";
        assert_eq!(parse_thought(reply).unwrap(), "I need the weather.");
        let action = parse_action(reply).unwrap();
        assert_eq!(action.tool, "weather");
        assert_eq!(action.argument, "Paris");
        assert!(parse_final_answer(reply).is_none());
    }

    #[test]
    fn final_answer_parsed() {
        let reply = "Thought: done\nFinal Answer: 42 degrees";
        assert_eq!(parse_final_answer(reply).unwrap(), "42 degrees");
    }

    #[tokio::test]
    async fn tool_loop_then_answer() {
        let llm = scripted(&[
            "Thought: Check Paris weather first.\nAction: weather[Paris]",
            "Thought: Now compute.\nAction: calculator[240 * 0.15]",
            "Thought: I have both.\nFinal Answer: Sunny, 22°C; 15% of 240 is 36.",
        ]);
        let agent = ReactAgent::new(llm, agentry_tools::default_registry());
        let result = agent.solve("weather and math").await.unwrap();

        assert!(result.completed);
        assert_eq!(result.iterations, 3);
        assert!(result.answer.contains("36"));

        let kinds: Vec<TraceKind> = result.trace.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TraceKind::Thought,
                TraceKind::Action,
                TraceKind::Observation,
                TraceKind::Thought,
                TraceKind::Action,
                TraceKind::Observation,
                TraceKind::Thought,
            ]
        );
        // The weather observation must carry the canned Paris data.
        assert!(result.trace[2].content.contains("Sunny"));
        assert!(result.trace[5].content.contains("36"));
    }

    #[tokio::test]
    async fn iteration_cap_bounds_loop() {
        let llm = scripted(&[
            "Thought: hmm\nAction: search[rust]",
            "Thought: hmm\nAction: search[rust]",
        ]);
        let agent =
            ReactAgent::new(llm, agentry_tools::default_registry()).with_max_iterations(2);
        let result = agent.solve("q").await.unwrap();
        assert!(!result.completed);
        assert_eq!(result.iterations, 2);
        assert!(result.answer.contains("step limit"));
    }

    #[tokio::test]
    async fn unknown_tool_becomes_error_observation() {
        let llm = scripted(&[
            "Thought: try it\nAction: teleport[moon]",
            "Thought: ok then\nFinal Answer: cannot teleport",
        ]);
        let agent = ReactAgent::new(llm, agentry_tools::default_registry());
        let result = agent.solve("q").await.unwrap();
        let observation = result
            .trace
            .iter()
            .find(|t| t.kind == TraceKind::Observation)
            .unwrap();
        assert!(observation.content.contains("Error"));
    }

    #[tokio::test]
    async fn malformed_reply_accepted_as_answer() {
        let llm = scripted(&["Just a plain answer with no protocol."]);
        let agent = ReactAgent::new(llm, agentry_tools::default_registry());
        let result = agent.solve("q").await.unwrap();
        assert!(result.completed);
        assert_eq!(result.iterations, 1);
    }
}

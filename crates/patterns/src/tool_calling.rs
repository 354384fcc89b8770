//! Tool calling — the model picks a tool via a text protocol.
//!
//! The prompt advertises the registry and asks the model to answer either
//! directly or with a single `TOOL: name({...json args...})` line. When a
//! tool call is parsed, the tool runs and a follow-up prompt produces the
//! grounded final answer.

use crate::report::DemoReport;
use agentry_core::tool::ToolRegistry;
use agentry_core::{LlmClient, Result};
use tracing::{debug, warn};

/// A parsed `TOOL:` line.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCall {
    pub tool: String,
    pub arguments: serde_json::Value,
}

/// Outcome of answering one query.
#[derive(Debug, Clone)]
pub struct ToolCallOutcome {
    pub query: String,
    /// The model's first reply.
    pub initial_response: String,
    /// The call that was made, if any.
    pub call: Option<ParsedCall>,
    /// What the tool returned, if one ran.
    pub tool_output: Option<String>,
    /// The final user-facing answer.
    pub answer: String,
}

/// Parse a `TOOL: name({...})` or `TOOL: name(arg)` line from a response.
pub fn parse_tool_call(response: &str) -> Option<ParsedCall> {
    for line in response.lines() {
        let line = line.trim();
        let Some(rest) = line.strip_prefix("TOOL:") else {
            continue;
        };
        let rest = rest.trim();
        let open = rest.find('(')?;
        let close = rest.rfind(')')?;
        if close <= open {
            return None;
        }
        let tool = rest[..open].trim().to_string();
        let raw_args = rest[open + 1..close].trim();

        // JSON object preferred; bare strings become {"input": ...}
        let arguments = match serde_json::from_str::<serde_json::Value>(raw_args) {
            Ok(value) if value.is_object() => value,
            _ => {
                let stripped = raw_args.trim_matches(|c| c == '"' || c == '\'');
                serde_json::json!({ "input": stripped })
            }
        };
        return Some(ParsedCall { tool, arguments });
    }
    None
}

/// The tool-calling agent.
pub struct ToolCallingAgent {
    llm: LlmClient,
    tools: ToolRegistry,
}

impl ToolCallingAgent {
    pub fn new(llm: LlmClient, tools: ToolRegistry) -> Self {
        Self { llm, tools }
    }

    /// Answer a query, calling at most one tool.
    pub async fn answer(&self, query: &str) -> Result<ToolCallOutcome> {
        let prompt = format!(
            "You have access to these tools:\n{}\n\n\
             User query: {query}\n\n\
             If you need a tool, respond with a single line:\n\
             TOOL: tool_name({{\"arg\": \"value\"}})\n\n\
             If no tool is needed, respond normally.",
            self.tools.prompt_listing()
        );

        let initial_response = self.llm.generate(&prompt).await?;

        let Some(call) = parse_tool_call(&initial_response) else {
            debug!("no tool call requested");
            return Ok(ToolCallOutcome {
                query: query.to_string(),
                answer: initial_response.clone(),
                initial_response,
                call: None,
                tool_output: None,
            });
        };

        debug!(tool = %call.tool, "executing tool");
        let tool_output = match self.tools.execute(&call.tool, call.arguments.clone()).await {
            Ok(outcome) => outcome.output,
            Err(e) => {
                warn!(tool = %call.tool, error = %e, "tool failed");
                format!("Error: {e}")
            }
        };

        let final_prompt = format!(
            "User query: {query}\n\
             Tool result: {tool_output}\n\n\
             Provide a helpful final response to the user."
        );
        let answer = self.llm.generate(&final_prompt).await?;

        Ok(ToolCallOutcome {
            query: query.to_string(),
            initial_response,
            call: Some(call),
            tool_output: Some(tool_output),
            answer,
        })
    }
}

/// Demo: the catalogue's four sample queries over the default registry.
pub async fn demo(llm: &LlmClient) -> Result<DemoReport> {
    let agent = ToolCallingAgent::new(llm.clone(), agentry_tools::default_registry());
    let queries = [
        "What's 15 * 23 + 45?",
        "What time is it now?",
        "What's the weather like in Paris?",
        "Calculate the square root of 144",
    ];

    let mut report = DemoReport::new("tool-calling");
    for query in queries {
        let outcome = agent.answer(query).await?;
        let body = match (&outcome.call, &outcome.tool_output) {
            (Some(call), Some(output)) => format!(
                "Tool: {}({})\nTool result: {}\nAnswer: {}",
                call.tool, call.arguments, output, outcome.answer
            ),
            _ => format!("No tool needed.\nAnswer: {}", outcome.answer),
        };
        report.push(format!("Query: {query}"), body);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::scripted;

    #[test]
    fn parses_json_arguments() {
        let call = parse_tool_call("TOOL: weather({\"city\": \"Paris\"})").unwrap();
        assert_eq!(call.tool, "weather");
        assert_eq!(call.arguments["city"], "Paris");
    }

    #[test]
    fn parses_bare_string_argument() {
        let call = parse_tool_call("TOOL: search(\"rust language\")").unwrap();
        assert_eq!(call.tool, "search");
        assert_eq!(call.arguments["input"], "rust language");
    }

    #[test]
    fn finds_tool_line_among_prose() {
        let response = "I should check the weather.\nTOOL: weather({\"city\": \"Tokyo\"})\nThanks.";
        assert!(parse_tool_call(response).is_some());
    }

    #[test]
    fn no_tool_line_returns_none() {
        assert!(parse_tool_call("The answer is 42.").is_none());
        assert!(parse_tool_call("TOOL: broken(").is_none());
    }

    #[tokio::test]
    async fn tool_result_feeds_final_answer() {
        let llm = scripted(&[
            "TOOL: calculator({\"expression\": \"15 * 23 + 45\"})",
            "The result is 390.",
        ]);
        let agent = ToolCallingAgent::new(llm, agentry_tools::default_registry());
        let outcome = agent.answer("What's 15 * 23 + 45?").await.unwrap();

        assert_eq!(outcome.call.as_ref().unwrap().tool, "calculator");
        assert!(outcome.tool_output.as_ref().unwrap().contains("390"));
        assert_eq!(outcome.answer, "The result is 390.");
    }

    #[tokio::test]
    async fn direct_answer_skips_tools() {
        let llm = scripted(&["Paris is the capital of France."]);
        let agent = ToolCallingAgent::new(llm, agentry_tools::default_registry());
        let outcome = agent.answer("Capital of France?").await.unwrap();
        assert!(outcome.call.is_none());
        assert!(outcome.answer.contains("Paris"));
    }

    #[tokio::test]
    async fn unknown_tool_becomes_error_observation() {
        let llm = scripted(&["TOOL: teleporter({\"to\": \"Mars\"})", "Sorry, no teleporter."]);
        let agent = ToolCallingAgent::new(llm, agentry_tools::default_registry());
        let outcome = agent.answer("Send me to Mars").await.unwrap();
        assert!(outcome.tool_output.unwrap().contains("Error"));
    }
}

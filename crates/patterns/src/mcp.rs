//! MCP — tool discovery and execution behind a mock server interface.
//!
//! A `MockMcpServer` exposes four tools through the uniform list/call
//! surface a real MCP server would. The client advertises the discovered
//! tools, parses `MCP: tool_name({...})` calls out of model replies,
//! executes them against the server, and asks for a grounded final answer.

use crate::report::DemoReport;
use agentry_core::{LlmClient, Result};
use serde_json::json;
use tracing::debug;

/// A tool as listed by the server.
#[derive(Debug, Clone)]
pub struct McpToolInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: &'static str,
}

/// Mock MCP server: fixed tool list, canned execution.
#[derive(Debug, Default)]
pub struct MockMcpServer;

impl MockMcpServer {
    pub fn new() -> Self {
        Self
    }

    /// Tool discovery.
    pub fn list_tools(&self) -> Vec<McpToolInfo> {
        vec![
            McpToolInfo {
                name: "filesystem_list",
                description: "List files and directories in a given path",
                parameters: "{\"path\": \"string (optional)\"}",
            },
            McpToolInfo {
                name: "filesystem_read",
                description: "Read the content of a specified file",
                parameters: "{\"filepath\": \"string (required)\"}",
            },
            McpToolInfo {
                name: "weather_get",
                description: "Get current weather information for a city",
                parameters: "{\"city\": \"string (required)\"}",
            },
            McpToolInfo {
                name: "math_calculate",
                description: "Calculate mathematical expressions",
                parameters: "{\"expression\": \"string (required)\"}",
            },
        ]
    }

    /// Tool execution. Unknown tools return an error object, like a real
    /// server would, rather than failing the client.
    pub fn call_tool(&self, name: &str, input: &serde_json::Value) -> serde_json::Value {
        match name {
            "filesystem_list" => {
                let path = input["path"].as_str().unwrap_or(".");
                json!({
                    "path": path,
                    "files": ["notes.txt", "readme.md", "config.toml"],
                    "directories": ["src/", "docs/"],
                })
            }
            "filesystem_read" => {
                let filepath = input["filepath"].as_str().unwrap_or("");
                json!({
                    "filepath": filepath,
                    "content": format!("Mock content of {filepath}: sample text for the demo."),
                    "size": 42,
                })
            }
            "weather_get" => {
                let city = input["city"].as_str().unwrap_or("");
                let report = agentry_tools::weather::lookup(city);
                json!({
                    "city": city,
                    "temperature_c": report.temperature_c,
                    "condition": report.conditions,
                    "humidity": format!("{}%", report.humidity),
                })
            }
            "math_calculate" => {
                let expression = input["expression"].as_str().unwrap_or("");
                match agentry_tools::calculator::evaluate(expression) {
                    Ok(value) => json!({"expression": expression, "result": value}),
                    Err(e) => json!({"expression": expression, "error": e}),
                }
            }
            other => json!({"error": format!("Tool '{other}' not found")}),
        }
    }
}

/// A parsed `MCP:` call.
#[derive(Debug, Clone, PartialEq)]
pub struct McpCall {
    pub tool: String,
    pub input: serde_json::Value,
}

/// Parse an `MCP: tool_name({...})` line from a model reply.
pub fn parse_mcp_call(response: &str) -> Option<McpCall> {
    for line in response.lines() {
        let line = line.trim();
        let Some(rest) = line.strip_prefix("MCP:") else {
            continue;
        };
        let rest = rest.trim();
        let open = rest.find('(')?;
        let close = rest.rfind(')')?;
        if close <= open {
            return None;
        }
        let tool = rest[..open].trim().to_string();
        let raw = rest[open + 1..close].trim();
        let input = match serde_json::from_str::<serde_json::Value>(raw) {
            Ok(value) if value.is_object() => value,
            _ => json!({"input": raw.trim_matches(|c| c == '"' || c == '\'')}),
        };
        return Some(McpCall { tool, input });
    }
    None
}

/// Outcome of one query through the MCP client.
#[derive(Debug, Clone)]
pub struct McpOutcome {
    pub query: String,
    pub call: Option<McpCall>,
    pub tool_result: Option<serde_json::Value>,
    pub answer: String,
}

/// Client wiring the LLM to the mock server.
pub struct McpClient {
    llm: LlmClient,
    server: MockMcpServer,
}

impl McpClient {
    pub fn new(llm: LlmClient) -> Self {
        Self {
            llm,
            server: MockMcpServer::new(),
        }
    }

    pub fn tools(&self) -> Vec<McpToolInfo> {
        self.server.list_tools()
    }

    fn tools_description(&self) -> String {
        self.server
            .list_tools()
            .iter()
            .map(|t| format!("- {}: {}\n  Parameters: {}", t.name, t.description, t.parameters))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Process one query, calling at most one MCP tool.
    pub async fn process(&self, query: &str) -> Result<McpOutcome> {
        let prompt = format!(
            "You have access to these MCP tools:\n{}\n\n\
             User query: {query}\n\n\
             If you need an MCP tool, respond with a single line:\n\
             MCP: tool_name({{\"param\": \"value\"}})\n\n\
             If no MCP tool is needed, respond normally.",
            self.tools_description()
        );
        let response = self.llm.generate(&prompt).await?;

        let Some(call) = parse_mcp_call(&response) else {
            return Ok(McpOutcome {
                query: query.to_string(),
                call: None,
                tool_result: None,
                answer: response,
            });
        };

        debug!(tool = %call.tool, "calling MCP tool");
        let tool_result = self.server.call_tool(&call.tool, &call.input);

        let final_prompt = format!(
            "User query: {query}\n\
             MCP tool result: {tool_result}\n\n\
             Provide a helpful final response to the user based on the tool result."
        );
        let answer = self.llm.generate(&final_prompt).await?;

        Ok(McpOutcome {
            query: query.to_string(),
            call: Some(call),
            tool_result: Some(tool_result),
            answer,
        })
    }
}

/// Demo: the catalogue's five sample queries, one of which needs no tool.
pub async fn demo(llm: &LlmClient) -> Result<DemoReport> {
    let client = McpClient::new(llm.clone());

    let mut report = DemoReport::new("mcp");
    report.push(
        "Available MCP tools",
        client
            .tools()
            .iter()
            .map(|t| format!("- {}: {}", t.name, t.description))
            .collect::<Vec<_>>()
            .join("\n"),
    );

    let queries = [
        "List the files in the current directory",
        "Read the content of notes.txt",
        "What's the weather like in Paris?",
        "Calculate 15 * 23 + 45",
        "What is the capital of France?",
    ];

    for query in queries {
        let outcome = client.process(query).await?;
        let body = match (&outcome.call, &outcome.tool_result) {
            (Some(call), Some(result)) => format!(
                "MCP call: {}({})\nResult: {}\nAnswer: {}",
                call.tool, call.input, result, outcome.answer
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
    fn server_lists_four_tools() {
        let server = MockMcpServer::new();
        assert_eq!(server.list_tools().len(), 4);
    }

    #[test]
    fn server_executes_math() {
        let server = MockMcpServer::new();
        let result = server.call_tool("math_calculate", &json!({"expression": "2 + 2"}));
        assert_eq!(result["result"], 4.0);
    }

    #[test]
    fn server_reports_unknown_tool() {
        let server = MockMcpServer::new();
        let result = server.call_tool("nope", &json!({}));
        assert!(result["error"].as_str().unwrap().contains("not found"));
    }

    #[test]
    fn parse_call_with_json_object() {
        let call = parse_mcp_call("MCP: weather_get({\"city\": \"Paris\"})").unwrap();
        assert_eq!(call.tool, "weather_get");
        assert_eq!(call.input["city"], "Paris");
    }

    #[test]
    fn parse_call_absent() {
        assert!(parse_mcp_call("Paris is the capital of France.").is_none());
    }

    #[tokio::test]
    async fn query_with_tool_roundtrip() {
        let llm = scripted(&[
            "MCP: filesystem_list({\"path\": \".\"})",
            "The directory contains notes.txt, readme.md and config.toml.",
        ]);
        let client = McpClient::new(llm);
        let outcome = client.process("List the files").await.unwrap();
        assert_eq!(outcome.call.unwrap().tool, "filesystem_list");
        assert!(outcome.tool_result.unwrap()["files"].is_array());
        assert!(outcome.answer.contains("notes.txt"));
    }

    #[tokio::test]
    async fn query_without_tool_passes_through() {
        let llm = scripted(&["Paris."]);
        let client = McpClient::new(llm);
        let outcome = client.process("Capital of France?").await.unwrap();
        assert!(outcome.call.is_none());
        assert_eq!(outcome.answer, "Paris.");
    }
}

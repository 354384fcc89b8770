//! Code execution — vet generated code, run it in a restricted harness.
//!
//! Generated code is checked against a static denylist before anything
//! runs. "Execution" is a simulated harness: the model is asked to trace
//! the program and report its output, which keeps the demo hermetic while
//! preserving the generate → vet → execute → debug loop. Real sandboxing is
//! out of scope for the catalogue.

use crate::report::DemoReport;
use agentry_core::{LlmClient, Result};
use tracing::{debug, warn};

/// Denylist of constructs the harness refuses to run.
const DENIED_PATTERNS: [&str; 8] = [
    "std::process",
    "std::net",
    "std::fs::remove",
    "unsafe ",
    "libc::",
    "Command::new",
    "TcpStream",
    "include!",
];

/// Result of vetting a piece of code.
#[derive(Debug, Clone)]
pub struct VetReport {
    pub allowed: bool,
    pub violations: Vec<String>,
}

/// Statically vet code against the denylist.
pub fn vet(code: &str) -> VetReport {
    let violations: Vec<String> = DENIED_PATTERNS
        .iter()
        .filter(|p| code.contains(*p))
        .map(|p| p.trim().to_string())
        .collect();
    VetReport {
        allowed: violations.is_empty(),
        violations,
    }
}

/// Outcome of one generate-and-execute round.
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub task: String,
    pub code: String,
    pub vet: VetReport,
    /// Traced output, when the code was allowed to run.
    pub output: Option<String>,
    /// Debug analysis, when the trace reported an error.
    pub debug_notes: Option<String>,
}

/// The code-execution agent.
pub struct CodeExecutor {
    llm: LlmClient,
}

impl CodeExecutor {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }

    /// Generate code for a task.
    pub async fn generate_code(&self, task: &str) -> Result<String> {
        let response = self
            .llm
            .generate(&format!(
                "Write a small, self-contained Rust function (with a tiny \
                 example call) for this task:\n{task}\n\n\
                 Reply with code only, no fences."
            ))
            .await?;
        Ok(strip_fences(&response))
    }

    /// Trace the code in the simulated harness and report its output.
    pub async fn trace(&self, code: &str) -> Result<String> {
        Ok(self
            .llm
            .generate(&format!(
                "Act as a careful interpreter. Trace this code and report \
                 exactly what it would print, or \"ERROR: <reason>\" if it \
                 would fail:\n\n{code}"
            ))
            .await?)
    }

    /// Ask for a debug analysis of a failed trace.
    pub async fn debug(&self, code: &str, error: &str) -> Result<String> {
        Ok(self
            .llm
            .generate(&format!(
                "This code failed with: {error}\n\nCode:\n{code}\n\n\
                 Explain the bug and show the minimal fix."
            ))
            .await?)
    }

    /// The full loop: generate, vet, trace, debug failures.
    pub async fn run(&self, task: &str) -> Result<ExecutionOutcome> {
        let code = self.generate_code(task).await?;
        let vet_report = vet(&code);

        if !vet_report.allowed {
            warn!(violations = ?vet_report.violations, "code rejected by vetting");
            return Ok(ExecutionOutcome {
                task: task.to_string(),
                code,
                vet: vet_report,
                output: None,
                debug_notes: None,
            });
        }

        debug!("code passed vetting, tracing");
        let output = self.trace(&code).await?;

        let debug_notes = if output.trim_start().starts_with("ERROR:") {
            Some(self.debug(&code, &output).await?)
        } else {
            None
        };

        Ok(ExecutionOutcome {
            task: task.to_string(),
            code,
            vet: vet_report,
            output: Some(output),
            debug_notes,
        })
    }
}

fn strip_fences(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Demo: a clean task and a vetting rejection.
pub async fn demo(llm: &LlmClient) -> Result<DemoReport> {
    let executor = CodeExecutor::new(llm.clone());
    let mut report = DemoReport::new("code-execution");

    let outcome = executor
        .run("Compute the first 10 Fibonacci numbers")
        .await?;
    let mut body = format!("Code:\n{}\n\nVetted: {}", outcome.code, outcome.vet.allowed);
    if let Some(output) = &outcome.output {
        body.push_str(&format!("\nTraced output: {output}"));
    }
    if let Some(notes) = &outcome.debug_notes {
        body.push_str(&format!("\nDebug notes: {notes}"));
    }
    report.push("Task: fibonacci", body);

    // Vetting demonstration on locally supplied code.
    let hostile = "use std::process::Command;\nfn main() { Command::new(\"rm\").spawn(); }";
    let vetted = vet(hostile);
    report.push(
        "Vetting hostile code",
        format!(
            "allowed: {}\nviolations: {}",
            vetted.allowed,
            vetted.violations.join(", ")
        ),
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::scripted;

    #[test]
    fn vet_allows_clean_code() {
        let report = vet("fn add(a: i32, b: i32) -> i32 { a + b }");
        assert!(report.allowed);
    }

    #[test]
    fn vet_catches_process_and_net() {
        let report = vet("use std::process::Command; use std::net::TcpStream;");
        assert!(!report.allowed);
        assert!(report.violations.len() >= 2);
    }

    #[test]
    fn fences_stripped() {
        let code = "```rust\nfn main() {}\n```";
        assert_eq!(strip_fences(code), "fn main() {}");
    }

    #[tokio::test]
    async fn clean_code_is_traced() {
        let llm = scripted(&[
            "fn fib(n: u32) -> u64 { if n < 2 { n as u64 } else { fib(n-1) + fib(n-2) } }",
            "0 1 1 2 3 5 8 13 21 34",
        ]);
        let outcome = CodeExecutor::new(llm).run("fibonacci").await.unwrap();
        assert!(outcome.vet.allowed);
        assert!(outcome.output.unwrap().contains("34"));
        assert!(outcome.debug_notes.is_none());
    }

    #[tokio::test]
    async fn denied_code_never_runs() {
        // Only one scripted response: tracing would panic the provider.
        let llm = scripted(&["use std::process::Command; fn main() {}"]);
        let outcome = CodeExecutor::new(llm).run("spawn stuff").await.unwrap();
        assert!(!outcome.vet.allowed);
        assert!(outcome.output.is_none());
    }

    #[tokio::test]
    async fn error_trace_triggers_debugging() {
        let llm = scripted(&[
            "fn main() { let v: Vec<i32> = vec![]; println!(\"{}\", v[0]); }",
            "ERROR: index out of bounds",
            "The vector is empty; check len() before indexing.",
        ]);
        let outcome = CodeExecutor::new(llm).run("print first").await.unwrap();
        assert!(outcome.debug_notes.unwrap().contains("empty"));
    }
}

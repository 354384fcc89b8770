//! Recursive agents — decompose problems recursively with a depth cap.
//!
//! At each level the agent decides: solve directly, or split into
//! sub-problems and recurse. The depth cap forces direct solutions at the
//! bottom, and every call is recorded in a stack trace for inspection.

use crate::report::DemoReport;
use agentry_core::{LlmClient, Result};
use tracing::debug;

/// One node in the solved problem tree.
#[derive(Debug, Clone)]
pub struct SolutionNode {
    pub problem: String,
    pub depth: usize,
    pub solved_directly: bool,
    pub solution: String,
    pub children: Vec<SolutionNode>,
}

/// Trace entry for the call stack log.
#[derive(Debug, Clone)]
pub struct CallRecord {
    pub depth: usize,
    pub problem: String,
    pub decision: String,
}

/// The recursive solver.
pub struct RecursiveSolver {
    llm: LlmClient,
    max_depth: usize,
}

impl RecursiveSolver {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm, max_depth: 3 }
    }

    /// Set the recursion depth cap.
    pub fn with_max_depth(mut self, max: usize) -> Self {
        self.max_depth = max;
        self
    }

    /// Should this problem be decomposed? Returns sub-problems when yes.
    async fn analyze(&self, problem: &str, depth: usize) -> Result<Option<Vec<String>>> {
        if depth >= self.max_depth {
            return Ok(None);
        }
        let response = self
            .llm
            .generate(&format!(
                "Decide whether this problem should be split into sub-problems \
                 or solved directly.\n\nProblem: {problem}\n\n\
                 If it should be split, reply with:\nSPLIT\n1. <sub-problem>\n2. <sub-problem>\n\
                 Otherwise reply with:\nDIRECT"
            ))
            .await?;

        if !response.to_uppercase().contains("SPLIT") {
            return Ok(None);
        }
        let subs: Vec<String> = response
            .lines()
            .filter_map(|line| {
                let trimmed = line.trim();
                trimmed
                    .split_once('.')
                    .filter(|(n, _)| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
                    .map(|(_, rest)| rest.trim().to_string())
                    .filter(|rest| !rest.is_empty())
            })
            .collect();
        Ok((!subs.is_empty()).then_some(subs))
    }

    async fn solve_directly(&self, problem: &str) -> Result<String> {
        Ok(self
            .llm
            .generate(&format!("Solve this problem concisely:\n{problem}"))
            .await?)
    }

    async fn combine(&self, problem: &str, children: &[SolutionNode]) -> Result<String> {
        let parts = children
            .iter()
            .map(|c| format!("- {}: {}", c.problem, c.solution))
            .collect::<Vec<_>>()
            .join("\n");
        Ok(self
            .llm
            .generate(&format!(
                "Original problem: {problem}\n\nSub-problem solutions:\n{parts}\n\n\
                 Combine these into one coherent solution."
            ))
            .await?)
    }

    /// Solve a problem, recursing as the analyzer decides.
    pub async fn solve(&self, problem: &str) -> Result<(SolutionNode, Vec<CallRecord>)> {
        let mut trace = Vec::new();
        let node = self
            .solve_inner(problem.to_string(), 0, &mut trace)
            .await?;
        Ok((node, trace))
    }

    // Recursion through an async fn needs boxing; the problem is passed by
    // value so child futures do not borrow the parent's locals.
    fn solve_inner<'a>(
        &'a self,
        problem: String,
        depth: usize,
        trace: &'a mut Vec<CallRecord>,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<SolutionNode>> + Send + 'a>>
    {
        Box::pin(async move {
            debug!(depth, "solving");
            match self.analyze(&problem, depth).await? {
                Some(subs) => {
                    trace.push(CallRecord {
                        depth,
                        problem: problem.clone(),
                        decision: format!("split into {}", subs.len()),
                    });
                    let mut children = Vec::with_capacity(subs.len());
                    for sub in subs {
                        let child = self.solve_inner(sub, depth + 1, trace).await?;
                        children.push(child);
                    }
                    let solution = self.combine(&problem, &children).await?;
                    Ok(SolutionNode {
                        problem,
                        depth,
                        solved_directly: false,
                        solution,
                        children,
                    })
                }
                None => {
                    trace.push(CallRecord {
                        depth,
                        problem: problem.clone(),
                        decision: "direct".into(),
                    });
                    let solution = self.solve_directly(&problem).await?;
                    Ok(SolutionNode {
                        problem,
                        depth,
                        solved_directly: true,
                        solution,
                        children: Vec::new(),
                    })
                }
            }
        })
    }
}

fn render_tree(node: &SolutionNode, out: &mut String) {
    let indent = "  ".repeat(node.depth);
    let marker = if node.solved_directly { "●" } else { "◆" };
    out.push_str(&format!(
        "{indent}{marker} {} (depth {})\n",
        node.problem, node.depth
    ));
    for child in &node.children {
        render_tree(child, out);
    }
}

/// Demo: recursively plan a conference.
pub async fn demo(llm: &LlmClient) -> Result<DemoReport> {
    let solver = RecursiveSolver::new(llm.clone()).with_max_depth(2);
    let problem = "Organize a two-day technical conference for 300 people";
    let (root, trace) = solver.solve(problem).await?;

    let mut report = DemoReport::new("recursive-agents");
    report.push("Problem", problem);

    let mut tree = String::new();
    render_tree(&root, &mut tree);
    report.push("Decomposition tree (● direct, ◆ combined)", tree);

    report.push(
        "Call stack",
        trace
            .iter()
            .map(|r| format!("{}[d{}] {} → {}", "  ".repeat(r.depth), r.depth, r.problem, r.decision))
            .collect::<Vec<_>>()
            .join("\n"),
    );
    report.push("Solution", &root.solution);
    Ok(report)
}

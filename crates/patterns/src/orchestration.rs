//! Workflow orchestration — a dependency-ordered DAG of tasks.
//!
//! Tasks name their dependencies; the orchestrator validates the graph
//! (missing references, cycles) at build time, computes a topological order,
//! and executes tasks with a shared context map. A failed task halts its
//! dependents but not unrelated branches.

use crate::report::DemoReport;
use agentry_core::error::PatternError;
use agentry_core::{LlmClient, Result};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, warn};

/// Status of one workflow task after a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Completed,
    Failed(String),
    SkippedDependency(String),
}

/// A workflow task: a prompt template over the shared context.
#[derive(Debug, Clone)]
pub struct WorkflowTask {
    pub id: String,
    pub name: String,
    /// Prompt template; `{ctx:<task-id>}` slots are filled from context.
    pub prompt: String,
    pub dependencies: Vec<String>,
}

impl WorkflowTask {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        prompt: impl Into<String>,
        dependencies: &[&str],
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            prompt: prompt.into(),
            dependencies: dependencies.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Result of a workflow run.
#[derive(Debug, Clone)]
pub struct WorkflowRun {
    /// Execution order actually used.
    pub order: Vec<String>,
    pub statuses: BTreeMap<String, TaskStatus>,
    /// Task outputs by id.
    pub context: HashMap<String, String>,
}

/// The orchestrator.
pub struct Orchestrator {
    tasks: Vec<WorkflowTask>,
}

impl Orchestrator {
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    pub fn add_task(mut self, task: WorkflowTask) -> Self {
        self.tasks.push(task);
        self
    }

    /// Validate references and acyclicity; returns topological order.
    pub fn execution_order(&self) -> Result<Vec<String>> {
        let ids: HashSet<&str> = self.tasks.iter().map(|t| t.id.as_str()).collect();
        if ids.len() != self.tasks.len() {
            return Err(PatternError::InvalidWorkflow("duplicate task ids".into()).into());
        }
        for task in &self.tasks {
            for dep in &task.dependencies {
                if !ids.contains(dep.as_str()) {
                    return Err(PatternError::InvalidWorkflow(format!(
                        "task '{}' depends on unknown task '{dep}'",
                        task.id
                    ))
                    .into());
                }
            }
        }

        // Kahn's algorithm
        let mut in_degree: HashMap<&str, usize> = self
            .tasks
            .iter()
            .map(|t| (t.id.as_str(), t.dependencies.len()))
            .collect();
        let mut order = Vec::with_capacity(self.tasks.len());
        let mut ready: Vec<&str> = self
            .tasks
            .iter()
            .filter(|t| t.dependencies.is_empty())
            .map(|t| t.id.as_str())
            .collect();

        while let Some(id) = ready.pop() {
            order.push(id.to_string());
            for task in &self.tasks {
                if task.dependencies.iter().any(|d| d == id) {
                    let entry = in_degree.get_mut(task.id.as_str()).expect("known id");
                    *entry -= 1;
                    if *entry == 0 {
                        ready.push(task.id.as_str());
                    }
                }
            }
        }

        if order.len() != self.tasks.len() {
            return Err(PatternError::InvalidWorkflow("dependency cycle detected".into()).into());
        }
        Ok(order)
    }

    fn fill_template(prompt: &str, context: &HashMap<String, String>) -> String {
        let mut filled = prompt.to_string();
        for (id, output) in context {
            filled = filled.replace(&format!("{{ctx:{id}}}"), output);
        }
        filled
    }

    /// Execute the workflow.
    pub async fn run(&self, llm: &LlmClient) -> Result<WorkflowRun> {
        let order = self.execution_order()?;
        let mut statuses: BTreeMap<String, TaskStatus> = BTreeMap::new();
        let mut context: HashMap<String, String> = HashMap::new();

        for id in &order {
            let task = self
                .tasks
                .iter()
                .find(|t| &t.id == id)
                .expect("id from order");

            // Skip when any dependency did not complete.
            if let Some(failed_dep) = task.dependencies.iter().find(|dep| {
                !matches!(statuses.get(dep.as_str()), Some(TaskStatus::Completed))
            }) {
                warn!(task = %task.id, dep = %failed_dep, "skipping, dependency unmet");
                statuses.insert(
                    task.id.clone(),
                    TaskStatus::SkippedDependency(failed_dep.clone()),
                );
                continue;
            }

            debug!(task = %task.id, "executing");
            let prompt = Self::fill_template(&task.prompt, &context);
            match llm.generate(&prompt).await {
                Ok(output) => {
                    context.insert(task.id.clone(), output);
                    statuses.insert(task.id.clone(), TaskStatus::Completed);
                }
                Err(e) => {
                    warn!(task = %task.id, error = %e, "task failed");
                    statuses.insert(task.id.clone(), TaskStatus::Failed(e.to_string()));
                }
            }
        }

        Ok(WorkflowRun {
            order,
            statuses,
            context,
        })
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

/// The demo workflow: a small product-development pipeline.
pub fn sample_workflow() -> Orchestrator {
    Orchestrator::new()
        .add_task(WorkflowTask::new(
            "requirements",
            "Analyze requirements",
            "List the key requirements for a personal finance tracking app.",
            &[],
        ))
        .add_task(WorkflowTask::new(
            "design",
            "Design architecture",
            "Requirements:\n{ctx:requirements}\n\nSketch a module-level architecture.",
            &["requirements"],
        ))
        .add_task(WorkflowTask::new(
            "prototype",
            "Describe prototype",
            "Architecture:\n{ctx:design}\n\nDescribe a minimal prototype scope.",
            &["design"],
        ))
        .add_task(WorkflowTask::new(
            "tests",
            "Plan tests",
            "Prototype:\n{ctx:prototype}\n\nList the most important test cases.",
            &["prototype"],
        ))
        .add_task(WorkflowTask::new(
            "docs",
            "Draft documentation",
            "Requirements:\n{ctx:requirements}\n\nDraft a short README outline.",
            &["requirements"],
        ))
}

/// Demo: run the pipeline and report per-task status.
pub async fn demo(llm: &LlmClient) -> Result<DemoReport> {
    let workflow = sample_workflow();
    let run = workflow.run(llm).await?;

    let mut report = DemoReport::new("orchestration");
    report.push("Execution order", run.order.join(" → "));
    for id in &run.order {
        let status = &run.statuses[id];
        let body = match status {
            TaskStatus::Completed => run.context[id].clone(),
            TaskStatus::Failed(e) => format!("FAILED: {e}"),
            TaskStatus::SkippedDependency(dep) => format!("SKIPPED (dependency '{dep}' unmet)"),
        };
        report.push(format!("Task: {id}"), body);
    }
    Ok(report)
}

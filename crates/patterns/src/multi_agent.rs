//! Multi-agent — specialists work in sequence, a combiner merges results.
//!
//! Each specialist sees the task plus everything earlier specialists
//! produced, so later roles (writer, reviewer) genuinely build on earlier
//! ones (researcher, analyst).

use crate::report::DemoReport;
use agentry_core::{LlmClient, Result};
use tracing::{debug, info};

/// A specialist role.
#[derive(Debug, Clone)]
pub struct Specialist {
    pub name: String,
    pub role: String,
    pub expertise: String,
}

impl Specialist {
    pub fn new(
        name: impl Into<String>,
        role: impl Into<String>,
        expertise: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
            expertise: expertise.into(),
        }
    }

    /// Produce this specialist's contribution.
    pub async fn work(&self, llm: &LlmClient, task: &str, context: &str) -> Result<String> {
        let prompt = format!(
            "You are {}, a {} with expertise in {}.\n\n\
             Task: {task}\n\
             Context from earlier specialists:\n{context}\n\n\
             Provide your specialized input for this task.",
            self.name, self.role, self.expertise
        );
        Ok(llm.generate(&prompt).await?)
    }
}

/// One specialist's contribution.
#[derive(Debug, Clone)]
pub struct Contribution {
    pub specialist: String,
    pub role: String,
    pub output: String,
}

/// Result of a coordinated run.
#[derive(Debug, Clone)]
pub struct TeamResult {
    pub contributions: Vec<Contribution>,
    pub final_output: String,
}

/// Sequential multi-agent coordinator.
pub struct Team {
    llm: LlmClient,
    specialists: Vec<Specialist>,
}

impl Team {
    pub fn new(llm: LlmClient) -> Self {
        Self {
            llm,
            specialists: Vec::new(),
        }
    }

    /// Add a specialist to the end of the sequence.
    pub fn add_specialist(
        mut self,
        name: impl Into<String>,
        role: impl Into<String>,
        expertise: impl Into<String>,
    ) -> Self {
        self.specialists.push(Specialist::new(name, role, expertise));
        self
    }

    pub fn specialists(&self) -> &[Specialist] {
        &self.specialists
    }

    /// Run every specialist in order, then combine.
    pub async fn run(&self, task: &str) -> Result<TeamResult> {
        info!(specialists = self.specialists.len(), "team starting");
        let mut context = String::new();
        let mut contributions = Vec::with_capacity(self.specialists.len());

        for specialist in &self.specialists {
            debug!(specialist = %specialist.name, "working");
            let output = specialist.work(&self.llm, task, &context).await?;
            context.push_str(&format!(
                "\n{} ({}): {}",
                specialist.name, specialist.role, output
            ));
            contributions.push(Contribution {
                specialist: specialist.name.clone(),
                role: specialist.role.clone(),
                output,
            });
        }

        let results_text = contributions
            .iter()
            .map(|c| format!("{}: {}", c.specialist, c.output))
            .collect::<Vec<_>>()
            .join("\n");

        let combine_prompt = format!(
            "Original task: {task}\n\n\
             Results from specialized agents:\n{results_text}\n\n\
             Combine all the agent results into a comprehensive final response."
        );
        let final_output = self.llm.generate(&combine_prompt).await?;

        Ok(TeamResult {
            contributions,
            final_output,
        })
    }
}

/// Demo: the catalogue's four-role team analyses AI's impact on software.
pub async fn demo(llm: &LlmClient) -> Result<DemoReport> {
    let team = Team::new(llm.clone())
        .add_specialist(
            "Researcher",
            "Research Specialist",
            "gathering and analyzing information",
        )
        .add_specialist(
            "Analyst",
            "Data Analyst",
            "analyzing data and identifying patterns",
        )
        .add_specialist(
            "Writer",
            "Technical Writer",
            "creating clear, engaging content",
        )
        .add_specialist(
            "Reviewer",
            "Quality Reviewer",
            "ensuring accuracy and completeness",
        );

    let task = "Create a comprehensive analysis of the impact of AI on software development";
    let result = team.run(task).await?;

    let mut report = DemoReport::new("multi-agent");
    report.push("Task", task);
    for c in &result.contributions {
        report.push(format!("{} ({})", c.specialist, c.role), &c.output);
    }
    report.push("Final output", &result.final_output);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::scripted_with_handle;

    #[tokio::test]
    async fn specialists_run_in_order_with_context() {
        let (llm, provider) = scripted_with_handle(&[
            "research findings",
            "analysis of findings",
            "combined output",
        ]);

        let team = Team::new(llm)
            .add_specialist("Researcher", "Research Specialist", "research")
            .add_specialist("Analyst", "Data Analyst", "analysis");

        let result = team.run("analyze X").await.unwrap();
        assert_eq!(result.contributions.len(), 2);
        assert_eq!(result.final_output, "combined output");

        // The analyst's prompt must contain the researcher's output.
        let prompts = provider.prompts();
        assert!(prompts[1].contains("research findings"));
        // The combiner sees both contributions.
        assert!(prompts[2].contains("research findings"));
        assert!(prompts[2].contains("analysis of findings"));
    }

    #[tokio::test]
    async fn empty_team_still_combines() {
        let llm = crate::test_helpers::scripted(&["nothing to combine"]);
        let result = Team::new(llm).run("task").await.unwrap();
        assert!(result.contributions.is_empty());
        assert_eq!(result.final_output, "nothing to combine");
    }
}

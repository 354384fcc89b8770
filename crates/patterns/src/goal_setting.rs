//! Goal setting — track goals, generate strategies, evaluate progress.
//!
//! Goals carry a target and current value; status transitions are derived,
//! never set directly. Strategy and evaluation are LLM prompts over the
//! goal's current numbers.

use crate::report::DemoReport;
use agentry_core::{LlmClient, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Derived goal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    NotStarted,
    InProgress,
    Completed,
}

/// A tracked goal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub name: String,
    pub description: String,
    pub target_value: u32,
    pub current_value: u32,
}

impl Goal {
    pub fn new(name: impl Into<String>, description: impl Into<String>, target_value: u32) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            target_value,
            current_value: 0,
        }
    }

    pub fn status(&self) -> GoalStatus {
        if self.current_value >= self.target_value && self.target_value > 0 {
            GoalStatus::Completed
        } else if self.current_value > 0 {
            GoalStatus::InProgress
        } else {
            GoalStatus::NotStarted
        }
    }

    /// Progress percentage, capped at 100.
    pub fn progress_pct(&self) -> f32 {
        if self.target_value == 0 {
            return if self.current_value > 0 { 100.0 } else { 0.0 };
        }
        (self.current_value as f32 / self.target_value as f32 * 100.0).min(100.0)
    }

    fn prompt_context(&self) -> String {
        format!(
            "Goal: {}\nDescription: {}\nCurrent Progress: {}/{} ({:.1}%)\nStatus: {:?}",
            self.name,
            self.description,
            self.current_value,
            self.target_value,
            self.progress_pct(),
            self.status()
        )
    }
}

/// Tracks multiple goals.
pub struct GoalTracker {
    llm: LlmClient,
    goals: BTreeMap<String, Goal>,
}

impl GoalTracker {
    pub fn new(llm: LlmClient) -> Self {
        Self {
            llm,
            goals: BTreeMap::new(),
        }
    }

    pub fn add_goal(&mut self, goal: Goal) {
        self.goals.insert(goal.name.clone(), goal);
    }

    /// Update progress; returns false for unknown goals.
    pub fn update(&mut self, name: &str, new_value: u32) -> bool {
        match self.goals.get_mut(name) {
            Some(goal) => {
                goal.current_value = new_value;
                true
            }
            None => false,
        }
    }

    pub fn goal(&self, name: &str) -> Option<&Goal> {
        self.goals.get(name)
    }

    pub fn goals(&self) -> impl Iterator<Item = &Goal> {
        self.goals.values()
    }

    /// Ask for an actionable strategy toward a goal.
    pub async fn strategy(&self, name: &str) -> Result<String> {
        let goal = self.goals.get(name).ok_or_else(|| {
            agentry_core::Error::Internal(format!("unknown goal: {name}"))
        })?;
        let prompt = format!(
            "{}\n\nGenerate a specific strategy to help achieve this goal. \
             Provide actionable steps.",
            goal.prompt_context()
        );
        Ok(self.llm.generate(&prompt).await?)
    }

    /// Ask for a progress evaluation and next steps.
    pub async fn evaluate(&self, name: &str) -> Result<String> {
        let goal = self.goals.get(name).ok_or_else(|| {
            agentry_core::Error::Internal(format!("unknown goal: {name}"))
        })?;
        let prompt = format!(
            "{}\n\nEvaluate the current progress and suggest specific \
             improvements or next steps.",
            goal.prompt_context()
        );
        Ok(self.llm.generate(&prompt).await?)
    }
}

/// Demo: track three learning goals through an update cycle.
pub async fn demo(llm: &LlmClient) -> Result<DemoReport> {
    let mut tracker = GoalTracker::new(llm.clone());
    tracker.add_goal(Goal::new(
        "rust_learning",
        "Learn Rust programming fundamentals",
        10,
    ));
    tracker.add_goal(Goal::new("project", "Complete a Rust project", 1));
    tracker.add_goal(Goal::new("code_reviews", "Participate in code reviews", 5));

    let mut report = DemoReport::new("goal-setting");

    let strategy = tracker.strategy("rust_learning").await?;
    report.push("Strategy for rust_learning", strategy);

    // Simulated progress updates
    tracker.update("rust_learning", 4);
    tracker.update("project", 1);
    tracker.update("code_reviews", 2);

    let evaluation = tracker.evaluate("rust_learning").await?;
    report.push("Evaluation for rust_learning", evaluation);

    let status = tracker
        .goals()
        .map(|g| {
            format!(
                "{}: {:?} ({:.0}%, {}/{})",
                g.name,
                g.status(),
                g.progress_pct(),
                g.current_value,
                g.target_value
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    report.push("Goal status", status);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::scripted;

    #[test]
    fn status_transitions_are_derived() {
        let mut goal = Goal::new("g", "d", 10);
        assert_eq!(goal.status(), GoalStatus::NotStarted);
        goal.current_value = 4;
        assert_eq!(goal.status(), GoalStatus::InProgress);
        goal.current_value = 10;
        assert_eq!(goal.status(), GoalStatus::Completed);
    }

    #[test]
    fn progress_pct_capped() {
        let mut goal = Goal::new("g", "d", 10);
        goal.current_value = 15;
        assert_eq!(goal.progress_pct(), 100.0);
    }

    #[test]
    fn zero_target_goal() {
        let mut goal = Goal::new("g", "d", 0);
        assert_eq!(goal.progress_pct(), 0.0);
        goal.current_value = 1;
        assert_eq!(goal.progress_pct(), 100.0);
    }

    #[tokio::test]
    async fn update_unknown_goal_returns_false() {
        let llm = scripted(&[]);
        let mut tracker = GoalTracker::new(llm);
        assert!(!tracker.update("missing", 5));
    }

    #[tokio::test]
    async fn strategy_embeds_goal_numbers() {
        let (llm, provider) = crate::test_helpers::scripted_with_handle(&["study daily"]);
        let mut tracker = GoalTracker::new(llm);
        let mut goal = Goal::new("g", "learn things", 10);
        goal.current_value = 3;
        tracker.add_goal(goal);

        let strategy = tracker.strategy("g").await.unwrap();
        assert_eq!(strategy, "study daily");
        assert!(provider.prompts()[0].contains("3/10"));
        assert!(provider.prompts()[0].contains("30.0%"));
    }

    #[tokio::test]
    async fn strategy_for_unknown_goal_errors() {
        let llm = scripted(&[]);
        let tracker = GoalTracker::new(llm);
        assert!(tracker.strategy("missing").await.is_err());
    }
}

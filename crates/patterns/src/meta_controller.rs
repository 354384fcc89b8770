//! Meta-controller — classify tasks and route them to the best specialist.
//!
//! The controller classifies each incoming task into a category, scores
//! every specialist's fit for it, and hands the task to the best match.
//! Routing decisions are recorded so the dispatch behaviour is auditable.

use crate::report::DemoReport;
use agentry_core::{LlmClient, Result};
use tracing::{debug, info};

/// Task categories the controller understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskCategory {
    Research,
    Creative,
    Technical,
    General,
}

impl TaskCategory {
    fn parse(text: &str) -> Self {
        let upper = text.to_uppercase();
        if upper.contains("RESEARCH") {
            TaskCategory::Research
        } else if upper.contains("CREATIVE") {
            TaskCategory::Creative
        } else if upper.contains("TECHNICAL") {
            TaskCategory::Technical
        } else {
            TaskCategory::General
        }
    }
}

/// A specialist in the pool.
#[derive(Debug, Clone)]
pub struct SpecialistProfile {
    pub name: String,
    pub persona: String,
    pub specialties: Vec<TaskCategory>,
    pub skills: Vec<String>,
}

impl SpecialistProfile {
    /// Fit score for a task: specialty match plus skill keyword overlap.
    pub fn fit(&self, category: TaskCategory, task: &str) -> u32 {
        let mut score = 0;
        if self.specialties.contains(&category) {
            score += 10;
        }
        let lower = task.to_lowercase();
        score += self
            .skills
            .iter()
            .filter(|skill| lower.contains(skill.as_str()))
            .count() as u32;
        score
    }
}

/// One routing decision.
#[derive(Debug, Clone)]
pub struct RoutingRecord {
    pub task: String,
    pub category: TaskCategory,
    pub chosen: String,
    pub fit_score: u32,
    pub output: String,
}

/// The meta-controller.
pub struct MetaController {
    llm: LlmClient,
    pool: Vec<SpecialistProfile>,
    log: Vec<RoutingRecord>,
}

impl MetaController {
    pub fn new(llm: LlmClient) -> Self {
        Self {
            llm,
            pool: Vec::new(),
            log: Vec::new(),
        }
    }

    pub fn add_specialist(mut self, profile: SpecialistProfile) -> Self {
        self.pool.push(profile);
        self
    }

    /// The demo's standard pool.
    pub fn with_default_pool(self) -> Self {
        self.add_specialist(SpecialistProfile {
            name: "scholar".into(),
            persona: "a meticulous research analyst who cites evidence".into(),
            specialties: vec![TaskCategory::Research],
            skills: vec!["analyze".into(), "compare".into(), "sources".into()],
        })
        .add_specialist(SpecialistProfile {
            name: "wordsmith".into(),
            persona: "an imaginative writer with a flair for narrative".into(),
            specialties: vec![TaskCategory::Creative],
            skills: vec!["story".into(), "slogan".into(), "poem".into()],
        })
        .add_specialist(SpecialistProfile {
            name: "engineer".into(),
            persona: "a pragmatic software engineer who values working code".into(),
            specialties: vec![TaskCategory::Technical],
            skills: vec!["debug".into(), "code".into(), "design".into(), "api".into()],
        })
    }

    pub fn routing_log(&self) -> &[RoutingRecord] {
        &self.log
    }

    /// Classify a task.
    pub async fn classify(&self, task: &str) -> Result<TaskCategory> {
        let response = self
            .llm
            .generate(&format!(
                "Classify this task into exactly one category: RESEARCH, \
                 CREATIVE, TECHNICAL or GENERAL.\nTask: {task}\n\
                 Reply with the category word only."
            ))
            .await?;
        Ok(TaskCategory::parse(&response))
    }

    /// Pick the best-fitting specialist; None when the pool is empty.
    pub fn select(&self, category: TaskCategory, task: &str) -> Option<(&SpecialistProfile, u32)> {
        self.pool
            .iter()
            .map(|p| (p, p.fit(category, task)))
            .max_by_key(|(_, score)| *score)
    }

    /// Route one task end to end.
    pub async fn route(&mut self, task: &str) -> Result<RoutingRecord> {
        let category = self.classify(task).await?;
        debug!(?category, "task classified");

        let (profile, fit_score) = match self.select(category, task) {
            Some(found) => (found.0.clone(), found.1),
            None => {
                return Err(agentry_core::Error::Internal(
                    "specialist pool is empty".into(),
                ))
            }
        };

        info!(specialist = %profile.name, fit_score, "routing task");
        let output = self
            .llm
            .generate(&format!(
                "You are {}, {}.\n\nTask: {task}\n\nComplete the task.",
                profile.name, profile.persona
            ))
            .await?;

        let record = RoutingRecord {
            task: task.to_string(),
            category,
            chosen: profile.name.clone(),
            fit_score,
            output,
        };
        self.log.push(record.clone());
        Ok(record)
    }
}

/// Demo: three tasks landing on three different specialists.
pub async fn demo(llm: &LlmClient) -> Result<DemoReport> {
    let mut controller = MetaController::new(llm.clone()).with_default_pool();

    let tasks = [
        "Compare the energy density of current battery chemistries using recent sources.",
        "Write a two-line slogan for a bicycle courier service.",
        "Debug why this api endpoint returns 500 under load and propose a fix.",
    ];

    let mut report = DemoReport::new("meta-controller");
    for task in tasks {
        let record = controller.route(task).await?;
        report.push(
            format!("Task: {task}"),
            format!(
                "category: {:?}\nrouted to: {} (fit {})\n{}",
                record.category, record.chosen, record.fit_score, record.output
            ),
        );
    }

    report.push(
        "Routing log",
        controller
            .routing_log()
            .iter()
            .map(|r| format!("{:?} → {}", r.category, r.chosen))
            .collect::<Vec<_>>()
            .join("\n"),
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::scripted;

    fn pool_controller(llm: agentry_core::LlmClient) -> MetaController {
        MetaController::new(llm).with_default_pool()
    }

    #[test]
    fn category_parsing() {
        assert_eq!(TaskCategory::parse("TECHNICAL"), TaskCategory::Technical);
        assert_eq!(TaskCategory::parse("it's creative"), TaskCategory::Creative);
        assert_eq!(TaskCategory::parse("dunno"), TaskCategory::General);
    }

    #[test]
    fn fit_combines_specialty_and_skills() {
        let profile = SpecialistProfile {
            name: "engineer".into(),
            persona: "p".into(),
            specialties: vec![TaskCategory::Technical],
            skills: vec!["debug".into(), "api".into()],
        };
        let on_speciality = profile.fit(TaskCategory::Technical, "debug the api handler");
        let off_speciality = profile.fit(TaskCategory::Creative, "write a poem");
        assert_eq!(on_speciality, 12);
        assert_eq!(off_speciality, 0);
    }

    #[tokio::test]
    async fn technical_task_routes_to_engineer() {
        let llm = scripted(&["TECHNICAL", "Add a connection pool; the handler leaks sockets."]);
        let mut controller = pool_controller(llm);
        let record = controller.route("debug this api under load").await.unwrap();
        assert_eq!(record.chosen, "engineer");
        assert_eq!(record.category, TaskCategory::Technical);
        assert_eq!(controller.routing_log().len(), 1);
    }

    #[tokio::test]
    async fn creative_task_routes_to_wordsmith() {
        let llm = scripted(&["CREATIVE", "Fast wheels, faster smiles."]);
        let mut controller = pool_controller(llm);
        let record = controller.route("write a slogan for couriers").await.unwrap();
        assert_eq!(record.chosen, "wordsmith");
    }

    #[tokio::test]
    async fn empty_pool_is_an_error() {
        let llm = scripted(&["GENERAL"]);
        let mut controller = MetaController::new(llm);
        assert!(controller.route("anything").await.is_err());
    }
}

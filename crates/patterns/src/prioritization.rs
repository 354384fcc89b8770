//! Prioritization — score and schedule tasks by several strategies.
//!
//! Tasks carry priority, optional deadline and effort estimates. Local
//! strategies sort by each of those; the LLM strategy asks for a ranked
//! ordering and falls back to the priority sort when the reply cannot be
//! parsed. A workload manager tracks pending/in-progress/done transitions.

use crate::report::DemoReport;
use agentry_core::{LlmClient, Result};
use chrono::{DateTime, Duration, Utc};
use tracing::debug;

/// Task priority levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

/// A schedulable task.
#[derive(Debug, Clone)]
pub struct Task {
    pub id: u32,
    pub title: String,
    pub priority: Priority,
    pub deadline: Option<DateTime<Utc>>,
    pub estimated_minutes: u32,
}

impl Task {
    pub fn new(id: u32, title: impl Into<String>, priority: Priority) -> Self {
        Self {
            id,
            title: title.into(),
            priority,
            deadline: None,
            estimated_minutes: 60,
        }
    }

    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_estimate(mut self, minutes: u32) -> Self {
        self.estimated_minutes = minutes;
        self
    }

    /// Urgency: hours to deadline inverted; no deadline scores zero.
    pub fn urgency(&self, now: DateTime<Utc>) -> f64 {
        match self.deadline {
            Some(deadline) => {
                let hours = (deadline - now).num_minutes() as f64 / 60.0;
                if hours <= 0.0 {
                    100.0 // overdue
                } else {
                    (48.0 / hours).min(100.0)
                }
            }
            None => 0.0,
        }
    }
}

/// Ordering strategies.
pub struct Prioritizer;

impl Prioritizer {
    /// Highest priority first; ties keep id order.
    pub fn by_priority(mut tasks: Vec<Task>) -> Vec<Task> {
        tasks.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.id.cmp(&b.id)));
        tasks
    }

    /// Nearest deadline first; deadline-less tasks go last.
    pub fn by_deadline(mut tasks: Vec<Task>) -> Vec<Task> {
        tasks.sort_by(|a, b| match (a.deadline, b.deadline) {
            (Some(da), Some(db)) => da.cmp(&db),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.id.cmp(&b.id),
        });
        tasks
    }

    /// Smallest effort first.
    pub fn by_effort(mut tasks: Vec<Task>) -> Vec<Task> {
        tasks.sort_by(|a, b| {
            a.estimated_minutes
                .cmp(&b.estimated_minutes)
                .then(a.id.cmp(&b.id))
        });
        tasks
    }

    /// Ask the model to rank by id; falls back to priority order on a
    /// malformed reply.
    pub async fn by_llm(llm: &LlmClient, tasks: Vec<Task>) -> Result<Vec<Task>> {
        let listing = tasks
            .iter()
            .map(|t| {
                format!(
                    "#{} {} (priority {:?}, ~{}min{})",
                    t.id,
                    t.title,
                    t.priority,
                    t.estimated_minutes,
                    t.deadline
                        .map(|d| format!(", due {}", d.format("%Y-%m-%d %H:%M")))
                        .unwrap_or_default()
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = format!(
            "Rank these tasks in the order they should be tackled, considering \
             priority, deadlines and effort.\n\n{listing}\n\n\
             Reply with the task ids in order, comma separated, e.g.: 3,1,2"
        );
        let response = llm.generate(&prompt).await?;

        let ids: Vec<u32> = response
            .split(|c: char| !c.is_ascii_digit())
            .filter(|s| !s.is_empty())
            .filter_map(|s| s.parse().ok())
            .collect();

        // Valid only when every task appears exactly once.
        let mut seen = ids.clone();
        seen.sort();
        seen.dedup();
        if seen.len() != tasks.len() || !tasks.iter().all(|t| seen.contains(&t.id)) {
            debug!("LLM ranking unparseable, falling back to priority order");
            return Ok(Self::by_priority(tasks));
        }

        let mut ranked = Vec::with_capacity(tasks.len());
        for id in ids {
            if let Some(task) = tasks.iter().find(|t| t.id == id) {
                if !ranked.iter().any(|t: &Task| t.id == id) {
                    ranked.push(task.clone());
                }
            }
        }
        Ok(ranked)
    }
}

/// Task lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    InProgress,
    Done,
}

/// Tracks task states through a work session.
#[derive(Debug, Default)]
pub struct WorkloadManager {
    entries: Vec<(Task, TaskState)>,
}

impl WorkloadManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, task: Task) {
        self.entries.push((task, TaskState::Pending));
    }

    pub fn start(&mut self, id: u32) -> bool {
        self.transition(id, TaskState::Pending, TaskState::InProgress)
    }

    pub fn complete(&mut self, id: u32) -> bool {
        self.transition(id, TaskState::InProgress, TaskState::Done)
    }

    fn transition(&mut self, id: u32, from: TaskState, to: TaskState) -> bool {
        for (task, state) in &mut self.entries {
            if task.id == id && *state == from {
                *state = to;
                return true;
            }
        }
        false
    }

    pub fn in_state(&self, state: TaskState) -> Vec<&Task> {
        self.entries
            .iter()
            .filter(|(_, s)| *s == state)
            .map(|(t, _)| t)
            .collect()
    }

    pub fn summary(&self) -> String {
        format!(
            "pending: {}  in progress: {}  done: {}",
            self.in_state(TaskState::Pending).len(),
            self.in_state(TaskState::InProgress).len(),
            self.in_state(TaskState::Done).len()
        )
    }
}

fn sample_tasks(now: DateTime<Utc>) -> Vec<Task> {
    vec![
        Task::new(1, "Fix login bug", Priority::Critical)
            .with_deadline(now + Duration::hours(4))
            .with_estimate(90),
        Task::new(2, "Write release notes", Priority::Medium)
            .with_deadline(now + Duration::hours(30))
            .with_estimate(45),
        Task::new(3, "Refactor config loader", Priority::Low).with_estimate(120),
        Task::new(4, "Review security patch", Priority::High)
            .with_deadline(now + Duration::hours(8))
            .with_estimate(30),
    ]
}

/// Demo: rank the sample backlog four ways, then walk the workload.
pub async fn demo(llm: &LlmClient) -> Result<DemoReport> {
    let now = Utc::now();
    let tasks = sample_tasks(now);

    let render = |tasks: &[Task]| {
        tasks
            .iter()
            .map(|t| format!("#{} {}", t.id, t.title))
            .collect::<Vec<_>>()
            .join(" → ")
    };

    let mut report = DemoReport::new("prioritization");
    report.push("By priority", render(&Prioritizer::by_priority(tasks.clone())));
    report.push("By deadline", render(&Prioritizer::by_deadline(tasks.clone())));
    report.push("By effort", render(&Prioritizer::by_effort(tasks.clone())));

    let llm_ranked = Prioritizer::by_llm(llm, tasks.clone()).await?;
    report.push("By LLM analysis", render(&llm_ranked));

    let mut workload = WorkloadManager::new();
    for task in tasks {
        workload.add(task);
    }
    workload.start(1);
    workload.complete(1);
    workload.start(4);
    report.push("Workload", workload.summary());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::scripted;

    fn tasks() -> Vec<Task> {
        sample_tasks(Utc::now())
    }

    #[test]
    fn priority_order() {
        let ranked = Prioritizer::by_priority(tasks());
        assert_eq!(ranked[0].id, 1); // Critical
        assert_eq!(ranked[1].id, 4); // High
        assert_eq!(ranked[3].id, 3); // Low
    }

    #[test]
    fn deadline_order_puts_undated_last() {
        let ranked = Prioritizer::by_deadline(tasks());
        assert_eq!(ranked[0].id, 1);
        assert_eq!(ranked.last().unwrap().id, 3);
    }

    #[test]
    fn effort_order() {
        let ranked = Prioritizer::by_effort(tasks());
        assert_eq!(ranked[0].id, 4); // 30min
        assert_eq!(ranked.last().unwrap().id, 3); // 120min
    }

    #[test]
    fn overdue_tasks_max_urgency() {
        let now = Utc::now();
        let task = Task::new(9, "late", Priority::Low).with_deadline(now - Duration::hours(1));
        assert_eq!(task.urgency(now), 100.0);
    }

    #[tokio::test]
    async fn llm_ranking_parsed() {
        let llm = scripted(&["4,1,2,3"]);
        let ranked = Prioritizer::by_llm(&llm, tasks()).await.unwrap();
        let ids: Vec<u32> = ranked.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![4, 1, 2, 3]);
    }

    #[tokio::test]
    async fn malformed_llm_ranking_falls_back() {
        let llm = scripted(&["do the important one first"]);
        let ranked = Prioritizer::by_llm(&llm, tasks()).await.unwrap();
        assert_eq!(ranked[0].id, 1); // priority order fallback
    }

    #[tokio::test]
    async fn incomplete_llm_ranking_falls_back() {
        let llm = scripted(&["1,2"]);
        let ranked = Prioritizer::by_llm(&llm, tasks()).await.unwrap();
        assert_eq!(ranked.len(), 4);
        assert_eq!(ranked[0].id, 1);
    }

    #[test]
    fn workload_transitions_are_checked() {
        let mut w = WorkloadManager::new();
        w.add(Task::new(1, "t", Priority::Low));
        assert!(!w.complete(1)); // can't complete a pending task
        assert!(w.start(1));
        assert!(!w.start(1)); // already started
        assert!(w.complete(1));
        assert_eq!(w.in_state(TaskState::Done).len(), 1);
    }
}

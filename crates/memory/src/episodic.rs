//! Dual memory: episodic records plus semantic triples.
//!
//! Episodic memory holds what happened (interactions, scored by importance
//! and tagged); semantic memory holds what is known (subject-relation-object
//! facts). Retrieval is keyword overlap over both, mirroring the document
//! store's scoring.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One remembered interaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Episode {
    pub id: String,
    pub user_input: String,
    pub agent_response: String,
    pub importance: f32,
    pub tags: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// One subject-relation-object fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    pub subject: String,
    pub relation: String,
    pub object: String,
    pub source: String,
}

/// The dual store.
#[derive(Debug, Default)]
pub struct MemorySystem {
    episodes: Vec<Episode>,
    facts: Vec<Fact>,
}

impl MemorySystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an interaction with a pre-computed importance score.
    pub fn store_episode(
        &mut self,
        user_input: impl Into<String>,
        agent_response: impl Into<String>,
        importance: f32,
        tags: Vec<String>,
    ) -> String {
        let id = Uuid::new_v4().to_string();
        self.episodes.push(Episode {
            id: id.clone(),
            user_input: user_input.into(),
            agent_response: agent_response.into(),
            importance: importance.clamp(0.0, 1.0),
            tags,
            timestamp: Utc::now(),
        });
        id
    }

    /// Record a semantic fact; exact duplicates are dropped.
    pub fn store_fact(&mut self, fact: Fact) -> bool {
        if self.facts.contains(&fact) {
            return false;
        }
        self.facts.push(fact);
        true
    }

    /// Heuristic importance of an exchange: preference statements, personal
    /// facts and corrections score higher than chit-chat.
    pub fn score_importance(user_input: &str, agent_response: &str) -> f32 {
        let combined = format!("{user_input} {agent_response}").to_lowercase();
        let mut score: f32 = 0.3;
        for marker in ["prefer", "favorite", "always", "never", "my name", "i am", "i work"] {
            if combined.contains(marker) {
                score += 0.2;
            }
        }
        if combined.contains("actually") || combined.contains("correction") {
            score += 0.2;
        }
        score.min(1.0)
    }

    /// Episodes relevant to a query, most important first.
    pub fn recall_episodes(&self, query: &str, limit: usize) -> Vec<&Episode> {
        let query_words = words(query);
        let mut matched: Vec<(&Episode, usize)> = self
            .episodes
            .iter()
            .filter_map(|e| {
                let text = format!("{} {} {}", e.user_input, e.agent_response, e.tags.join(" "));
                let overlap = overlap_count(&words(&text), &query_words);
                (overlap > 0).then_some((e, overlap))
            })
            .collect();
        matched.sort_by(|a, b| {
            b.1.cmp(&a.1).then(
                b.0.importance
                    .partial_cmp(&a.0.importance)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
        });
        matched.into_iter().take(limit).map(|(e, _)| e).collect()
    }

    /// Facts whose subject or object overlaps with the query.
    pub fn recall_facts(&self, query: &str, limit: usize) -> Vec<&Fact> {
        let query_words = words(query);
        self.facts
            .iter()
            .filter(|f| {
                let text = format!("{} {} {}", f.subject, f.relation, f.object);
                overlap_count(&words(&text), &query_words) > 0
            })
            .take(limit)
            .collect()
    }

    pub fn episode_count(&self) -> usize {
        self.episodes.len()
    }

    pub fn fact_count(&self) -> usize {
        self.facts.len()
    }
}

fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2)
        .map(String::from)
        .collect()
}

fn overlap_count(a: &[String], b: &[String]) -> usize {
    b.iter().filter(|w| a.contains(w)).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn episodes_recalled_by_keyword() {
        let mut mem = MemorySystem::new();
        mem.store_episode(
            "I prefer Python for scripting",
            "Noted, Python it is.",
            0.8,
            vec!["preference".into()],
        );
        mem.store_episode("What time is it?", "It's noon.", 0.2, vec![]);

        let recalled = mem.recall_episodes("python scripting help", 5);
        assert_eq!(recalled.len(), 1);
        assert!(recalled[0].user_input.contains("Python"));
    }

    #[test]
    fn recall_orders_by_importance_on_ties() {
        let mut mem = MemorySystem::new();
        mem.store_episode("rust question one", "answer", 0.2, vec![]);
        mem.store_episode("rust question two", "answer", 0.9, vec![]);

        let recalled = mem.recall_episodes("rust question", 2);
        assert_eq!(recalled.len(), 2);
        assert!(recalled[0].importance > recalled[1].importance);
    }

    #[test]
    fn duplicate_facts_dropped() {
        let mut mem = MemorySystem::new();
        let fact = Fact {
            subject: "Ada".into(),
            relation: "works_at".into(),
            object: "Acme".into(),
            source: "conversation".into(),
        };
        assert!(mem.store_fact(fact.clone()));
        assert!(!mem.store_fact(fact));
        assert_eq!(mem.fact_count(), 1);
    }

    #[test]
    fn facts_recalled_by_entity() {
        let mut mem = MemorySystem::new();
        mem.store_fact(Fact {
            subject: "Ada".into(),
            relation: "works_at".into(),
            object: "Acme".into(),
            source: "chat".into(),
        });
        let facts = mem.recall_facts("where does Ada work?", 3);
        assert_eq!(facts.len(), 1);
    }

    #[test]
    fn importance_scoring_favours_preferences() {
        let pref = MemorySystem::score_importance("I prefer tea over coffee", "Noted.");
        let chat = MemorySystem::score_importance("hello", "hi");
        assert!(pref > chat);
        assert!(pref <= 1.0);
    }

    #[test]
    fn importance_is_clamped() {
        let mut mem = MemorySystem::new();
        mem.store_episode("x", "y", 7.0, vec![]);
        assert!(mem.episodes[0].importance <= 1.0);
    }
}

//! Dual memory — episodic experiences plus semantic facts.
//!
//! Every exchange is stored as an episode (importance-scored, tagged) and
//! mined for `subject|relation|object` facts. Responding recalls both
//! stores and folds what was found into the prompt.

use crate::report::DemoReport;
use agentry_core::{LlmClient, Result};
use agentry_memory::episodic::{Fact, MemorySystem};
use tracing::debug;

/// One memory-aware turn.
#[derive(Debug, Clone)]
pub struct MemoryTurn {
    pub user_input: String,
    pub recalled_episodes: usize,
    pub recalled_facts: usize,
    pub extracted_facts: Vec<Fact>,
    pub response: String,
}

/// Parse `FACT: subject|relation|object` lines.
pub fn parse_facts(response: &str, source: &str) -> Vec<Fact> {
    response
        .lines()
        .filter_map(|line| {
            let rest = line.trim().strip_prefix("FACT:")?;
            let mut parts = rest.split('|').map(str::trim);
            let subject = parts.next()?.to_string();
            let relation = parts.next()?.to_string();
            let object = parts.next()?.to_string();
            if subject.is_empty() || relation.is_empty() || object.is_empty() {
                return None;
            }
            Some(Fact {
                subject,
                relation,
                object,
                source: source.to_string(),
            })
        })
        .collect()
}

/// The dual-memory agent.
pub struct DualMemoryAgent {
    llm: LlmClient,
    memory: MemorySystem,
    recall_limit: usize,
}

impl DualMemoryAgent {
    pub fn new(llm: LlmClient) -> Self {
        Self {
            llm,
            memory: MemorySystem::new(),
            recall_limit: 3,
        }
    }

    pub fn memory(&self) -> &MemorySystem {
        &self.memory
    }

    /// Extract semantic facts from one exchange.
    async fn extract_facts(&self, user_input: &str, response: &str) -> Result<Vec<Fact>> {
        let reply = self
            .llm
            .generate(&format!(
                "Extract durable facts from this exchange, one per line, as:\n\
                 FACT: subject|relation|object\n\
                 If there are none, reply NONE.\n\n\
                 User: {user_input}\nAssistant: {response}"
            ))
            .await?;
        Ok(parse_facts(&reply, "conversation"))
    }

    /// One turn: recall, respond, store.
    pub async fn turn(&mut self, user_input: &str) -> Result<MemoryTurn> {
        let episodes = self.memory.recall_episodes(user_input, self.recall_limit);
        let facts = self.memory.recall_facts(user_input, self.recall_limit);
        let recalled_episodes = episodes.len();
        let recalled_facts = facts.len();
        debug!(recalled_episodes, recalled_facts, "recall");

        let episode_context = if episodes.is_empty() {
            "(none)".to_string()
        } else {
            episodes
                .iter()
                .map(|e| format!("- they said: {} / you said: {}", e.user_input, e.agent_response))
                .collect::<Vec<_>>()
                .join("\n")
        };
        let fact_context = if facts.is_empty() {
            "(none)".to_string()
        } else {
            facts
                .iter()
                .map(|f| format!("- {} {} {}", f.subject, f.relation, f.object))
                .collect::<Vec<_>>()
                .join("\n")
        };

        let response = self
            .llm
            .generate(&format!(
                "You are an assistant with long-term memory.\n\n\
                 Relevant past exchanges:\n{episode_context}\n\n\
                 Known facts:\n{fact_context}\n\n\
                 User: {user_input}\n\
                 Respond naturally, using what you remember."
            ))
            .await?;

        let importance = MemorySystem::score_importance(user_input, &response);
        self.memory
            .store_episode(user_input, &response, importance, Vec::new());

        let extracted = self.extract_facts(user_input, &response).await?;
        for fact in &extracted {
            self.memory.store_fact(fact.clone());
        }

        Ok(MemoryTurn {
            user_input: user_input.to_string(),
            recalled_episodes,
            recalled_facts,
            extracted_facts: extracted,
            response,
        })
    }
}

/// Demo: a three-turn conversation where later turns lean on memory.
pub async fn demo(llm: &LlmClient) -> Result<DemoReport> {
    let mut agent = DualMemoryAgent::new(llm.clone());

    let turns = [
        "My name is Ada and I work at Acme on the billing team.",
        "I prefer receiving summaries as bullet points.",
        "What do you remember about me and my work?",
    ];

    let mut report = DemoReport::new("dual-memory");
    for (i, input) in turns.iter().enumerate() {
        let turn = agent.turn(input).await?;
        let facts = if turn.extracted_facts.is_empty() {
            "(none)".to_string()
        } else {
            turn.extracted_facts
                .iter()
                .map(|f| format!("{} {} {}", f.subject, f.relation, f.object))
                .collect::<Vec<_>>()
                .join("; ")
        };
        report.push(
            format!("Turn {}", i + 1),
            format!(
                "User: {input}\nRecalled: {} episodes, {} facts\nAssistant: {}\nNew facts: {facts}",
                turn.recalled_episodes, turn.recalled_facts, turn.response
            ),
        );
    }
    report.push(
        "Memory state",
        format!(
            "episodes: {}  facts: {}",
            agent.memory().episode_count(),
            agent.memory().fact_count()
        ),
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{scripted, scripted_with_handle};

    #[test]
    fn fact_lines_parse() {
        let facts = parse_facts(
            "FACT: Ada|works_at|Acme\nFACT: Ada|prefers|bullet points\nnoise",
            "chat",
        );
        assert_eq!(facts.len(), 2);
        assert_eq!(facts[0].relation, "works_at");
    }

    #[test]
    fn malformed_fact_lines_skipped() {
        assert!(parse_facts("FACT: only|two", "s").is_empty());
        assert!(parse_facts("NONE", "s").is_empty());
        assert!(parse_facts("FACT: a||b", "s").is_empty());
    }

    #[tokio::test]
    async fn turn_stores_episode_and_facts() {
        let llm = scripted(&[
            "Nice to meet you, Ada!",
            "FACT: Ada|works_at|Acme",
        ]);
        let mut agent = DualMemoryAgent::new(llm);
        let turn = agent.turn("I'm Ada, I work at Acme").await.unwrap();

        assert_eq!(turn.extracted_facts.len(), 1);
        assert_eq!(agent.memory().episode_count(), 1);
        assert_eq!(agent.memory().fact_count(), 1);
    }

    #[tokio::test]
    async fn later_turns_recall_earlier_ones() {
        let (llm, provider) = scripted_with_handle(&[
            "Hello Ada!",
            "FACT: Ada|works_at|Acme",
            "You work at Acme, Ada.",
            "NONE",
        ]);
        let mut agent = DualMemoryAgent::new(llm);
        agent.turn("I'm Ada and I work at Acme").await.unwrap();
        let turn = agent.turn("Where does Ada work?").await.unwrap();

        assert!(turn.recalled_episodes >= 1);
        assert!(turn.recalled_facts >= 1);
        // The response prompt (3rd call) must carry the recalled fact.
        assert!(provider.prompts()[2].contains("Ada works_at Acme"));
    }
}

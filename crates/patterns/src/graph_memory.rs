//! Graph memory — knowledge as a graph, answers via multi-hop paths.
//!
//! The model extracts `REL: source|relation|target` triples from text into
//! the [`KnowledgeGraph`]; questions are answered from the neighbourhood of
//! the entities they mention, with BFS paths for multi-hop connections.

use crate::report::DemoReport;
use agentry_core::{LlmClient, Result};
use agentry_memory::KnowledgeGraph;
use tracing::debug;

/// Result of ingesting one text.
#[derive(Debug, Clone)]
pub struct Ingested {
    pub triples_added: usize,
}

/// Result of answering one question.
#[derive(Debug, Clone)]
pub struct GraphAnswer {
    pub question: String,
    pub entities_matched: Vec<String>,
    pub paths_used: Vec<Vec<String>>,
    pub answer: String,
}

/// Parse `REL: a|relation|b` lines.
pub fn parse_triples(response: &str) -> Vec<(String, String, String)> {
    response
        .lines()
        .filter_map(|line| {
            let rest = line.trim().strip_prefix("REL:")?;
            let mut parts = rest.split('|').map(str::trim);
            let source = parts.next()?.to_string();
            let relation = parts.next()?.to_string();
            let target = parts.next()?.to_string();
            if source.is_empty() || relation.is_empty() || target.is_empty() {
                return None;
            }
            Some((source, relation, target))
        })
        .collect()
}

/// The graph-memory agent.
pub struct GraphMemoryAgent {
    llm: LlmClient,
    graph: KnowledgeGraph,
    max_hops: usize,
}

impl GraphMemoryAgent {
    pub fn new(llm: LlmClient) -> Self {
        Self {
            llm,
            graph: KnowledgeGraph::new(),
            max_hops: 3,
        }
    }

    pub fn graph(&self) -> &KnowledgeGraph {
        &self.graph
    }

    /// Extract triples from text and add them to the graph.
    pub async fn ingest(&mut self, text: &str) -> Result<Ingested> {
        let response = self
            .llm
            .generate(&format!(
                "Extract entity relationships from this text, one per line, as:\n\
                 REL: source|relation|target\n\
                 Use short entity names. If there are none, reply NONE.\n\n\
                 Text: {text}"
            ))
            .await?;

        let triples = parse_triples(&response);
        let mut added = 0;
        for (source, relation, target) in &triples {
            if self
                .graph
                .add_relationship(source, target, relation.clone())
                .is_some()
            {
                added += 1;
            }
        }
        debug!(added, "triples ingested");
        Ok(Ingested {
            triples_added: added,
        })
    }

    /// Entities from the graph that appear in the question.
    fn match_entities(&self, question: &str) -> Vec<String> {
        let lower = question.to_lowercase();
        self.graph
            .entities()
            .iter()
            .filter(|e| lower.contains(&e.name.to_lowercase()))
            .map(|e| e.name.clone())
            .collect()
    }

    /// Answer a question from the graph neighbourhood of its entities.
    pub async fn answer(&self, question: &str) -> Result<GraphAnswer> {
        let entities = self.match_entities(question);

        let mut context_lines: Vec<String> = Vec::new();
        for entity in &entities {
            for (relation, neighbour, outgoing) in self.graph.neighbourhood(entity) {
                context_lines.push(if outgoing {
                    format!("{entity} {relation} {neighbour}")
                } else {
                    format!("{neighbour} {relation} {entity}")
                });
            }
        }

        // Multi-hop paths between each pair of matched entities.
        let mut paths = Vec::new();
        for i in 0..entities.len() {
            for j in i + 1..entities.len() {
                if let Some(path) = self.graph.find_path(&entities[i], &entities[j], self.max_hops)
                {
                    context_lines.push(format!("path: {}", path.join(" → ")));
                    paths.push(path);
                }
            }
        }

        let context = if context_lines.is_empty() {
            "(the graph holds nothing about these entities)".to_string()
        } else {
            context_lines.join("\n")
        };

        let answer = self
            .llm
            .generate(&format!(
                "Answer the question using only this knowledge graph context.\n\n\
                 Graph context:\n{context}\n\nQuestion: {question}"
            ))
            .await?;

        Ok(GraphAnswer {
            question: question.to_string(),
            entities_matched: entities,
            paths_used: paths,
            answer,
        })
    }
}

/// Demo: ingest two texts, answer a multi-hop question.
pub async fn demo(llm: &LlmClient) -> Result<DemoReport> {
    let mut agent = GraphMemoryAgent::new(llm.clone());

    let texts = [
        "Ada leads the billing team at Acme. Acme is headquartered in London.",
        "Acme acquired Widgets Ltd last year. Widgets Ltd builds payment terminals.",
    ];

    let mut report = DemoReport::new("graph-memory");
    for text in texts {
        let ingested = agent.ingest(text).await?;
        report.push(
            format!("Ingested: {text}"),
            format!("triples added: {}", ingested.triples_added),
        );
    }

    report.push(
        "Graph size",
        format!(
            "{} entities, {} relationships",
            agent.graph().entity_count(),
            agent.graph().relationship_count()
        ),
    );

    let answer = agent.answer("How is Ada connected to Widgets Ltd?").await?;
    report.push(
        format!("Question: {}", answer.question),
        format!(
            "entities matched: {}\npaths: {}\nanswer: {}",
            answer.entities_matched.join(", "),
            answer
                .paths_used
                .iter()
                .map(|p| p.join(" → "))
                .collect::<Vec<_>>()
                .join("; "),
            answer.answer
        ),
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{scripted, scripted_with_handle};

    #[test]
    fn triples_parse() {
        let triples = parse_triples("REL: Ada|works_at|Acme\nREL: Acme|based_in|London\nnoise");
        assert_eq!(triples.len(), 2);
        assert_eq!(triples[0].1, "works_at");
    }

    #[test]
    fn malformed_triples_skipped() {
        assert!(parse_triples("REL: a|b").is_empty());
        assert!(parse_triples("NONE").is_empty());
    }

    #[tokio::test]
    async fn ingest_builds_graph() {
        let llm = scripted(&["REL: Ada|works_at|Acme\nREL: Acme|based_in|London"]);
        let mut agent = GraphMemoryAgent::new(llm);
        let ingested = agent.ingest("Ada works at Acme in London").await.unwrap();
        assert_eq!(ingested.triples_added, 2);
        assert_eq!(agent.graph().entity_count(), 3);
    }

    #[tokio::test]
    async fn answer_uses_neighbourhood_and_paths() {
        let (llm, provider) = scripted_with_handle(&[
            "REL: Ada|works_at|Acme\nREL: Acme|acquired|Widgets",
            "Ada works at Acme, which acquired Widgets.",
        ]);
        let mut agent = GraphMemoryAgent::new(llm);
        agent.ingest("text").await.unwrap();

        let answer = agent.answer("How is Ada linked to Widgets?").await.unwrap();
        assert!(answer.entities_matched.contains(&"Ada".to_string()));
        assert!(answer.entities_matched.contains(&"Widgets".to_string()));
        assert_eq!(answer.paths_used.len(), 1);
        assert_eq!(answer.paths_used[0], vec!["Ada", "Acme", "Widgets"]);
        // Prompt carries the graph context.
        assert!(provider.prompts()[1].contains("Ada works_at Acme"));
        assert!(provider.prompts()[1].contains("path: Ada → Acme → Widgets"));
    }

    #[tokio::test]
    async fn unknown_entities_get_empty_context() {
        let (llm, provider) = scripted_with_handle(&["I have no information about that."]);
        let agent = GraphMemoryAgent::new(llm);
        let answer = agent.answer("Who is Zorblax?").await.unwrap();
        assert!(answer.entities_matched.is_empty());
        assert!(provider.prompts()[0].contains("holds nothing"));
    }
}

//! Agentic RAG — decide when to retrieve, self-grade the answer.
//!
//! A router prompt classifies each query as needing retrieval or not.
//! Retrieved answers are self-assessed; a low grade triggers one retrieval
//! retry with an expanded query before the answer ships as-is.

use crate::report::DemoReport;
use agentry_core::{LlmClient, Result};
use agentry_memory::DocumentStore;
use tracing::{debug, info};

/// How a query was served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServePath {
    Direct,
    Retrieved,
    RetrievedAfterRetry,
}

/// Outcome of one agentic RAG query.
#[derive(Debug, Clone)]
pub struct AgenticAnswer {
    pub query: String,
    pub path: ServePath,
    pub sources: Vec<String>,
    pub grade: Option<u8>,
    pub answer: String,
}

/// The agentic RAG engine.
pub struct AgenticRag {
    llm: LlmClient,
    store: DocumentStore,
    top_k: usize,
    grade_floor: u8,
}

impl AgenticRag {
    pub fn new(llm: LlmClient, store: DocumentStore) -> Self {
        Self {
            llm,
            store,
            top_k: 3,
            grade_floor: 6,
        }
    }

    /// Minimum self-grade before a retrieval retry kicks in.
    pub fn with_grade_floor(mut self, floor: u8) -> Self {
        self.grade_floor = floor.min(10);
        self
    }

    /// Should this query hit the document store?
    pub async fn needs_retrieval(&self, query: &str) -> Result<bool> {
        let response = self
            .llm
            .generate(&format!(
                "Does answering this question require looking up stored \
                 documentation, or is it general knowledge?\n\
                 Question: {query}\n\
                 Reply with exactly RETRIEVE or DIRECT."
            ))
            .await?;
        Ok(response.to_uppercase().contains("RETRIEVE"))
    }

    async fn answer_with_documents(
        &self,
        query: &str,
        search_query: &str,
    ) -> Result<(String, Vec<String>)> {
        let hits = self.store.search(search_query, self.top_k);
        let sources: Vec<String> = hits.iter().map(|h| h.document.title.clone()).collect();
        let context = hits
            .iter()
            .map(|h| format!("[{}] {}", h.document.title, h.document.content))
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = if context.is_empty() {
            format!("No documents matched. Answer from general knowledge:\n{query}")
        } else {
            format!(
                "Answer using this context, citing bracketed titles:\n{context}\n\n\
                 Question: {query}"
            )
        };
        let answer = self.llm.generate(&prompt).await?;
        Ok((answer, sources))
    }

    /// Grade an answer 1-10 against the query.
    pub async fn grade(&self, query: &str, answer: &str) -> Result<u8> {
        let response = self
            .llm
            .generate(&format!(
                "Grade how well this answer addresses the question, 1-10.\n\
                 Question: {query}\nAnswer: {answer}\n\
                 Reply with just the number."
            ))
            .await?;
        let grade = response
            .split(|c: char| !c.is_ascii_digit())
            .find(|s| !s.is_empty())
            .and_then(|s| s.parse::<u8>().ok())
            .unwrap_or(5)
            .min(10);
        Ok(grade)
    }

    /// Process one query through route → retrieve → grade → maybe retry.
    pub async fn process(&self, query: &str) -> Result<AgenticAnswer> {
        if !self.needs_retrieval(query).await? {
            debug!("router chose direct answer");
            let answer = self.llm.generate(query).await?;
            return Ok(AgenticAnswer {
                query: query.to_string(),
                path: ServePath::Direct,
                sources: Vec::new(),
                grade: None,
                answer,
            });
        }

        let (answer, sources) = self.answer_with_documents(query, query).await?;
        let grade = self.grade(query, &answer).await?;

        if grade >= self.grade_floor {
            return Ok(AgenticAnswer {
                query: query.to_string(),
                path: ServePath::Retrieved,
                sources,
                grade: Some(grade),
                answer,
            });
        }

        info!(grade, floor = self.grade_floor, "low grade, retrying retrieval");
        let expanded = self
            .llm
            .generate(&format!(
                "Rewrite this question with more specific search terms:\n{query}"
            ))
            .await?;
        let (answer, sources) = self.answer_with_documents(query, &expanded).await?;
        let grade = self.grade(query, &answer).await?;

        Ok(AgenticAnswer {
            query: query.to_string(),
            path: ServePath::RetrievedAfterRetry,
            sources,
            grade: Some(grade),
            answer,
        })
    }
}

fn sample_store() -> DocumentStore {
    let mut store = DocumentStore::new();
    store.add(
        "Deployment runbook",
        "Deploys go out Tuesday and Thursday after the 14:00 UTC freeze window; \
         rollbacks use the blue-green switch.",
        vec!["ops".into(), "deploy".into()],
    );
    store.add(
        "Incident process",
        "Sev1 incidents page the on-call immediately; post-mortems are due \
         within five working days.",
        vec!["ops".into(), "incident".into()],
    );
    store
}

/// Demo: one retrieval query, one direct query.
pub async fn demo(llm: &LlmClient) -> Result<DemoReport> {
    let rag = AgenticRag::new(llm.clone(), sample_store());

    let queries = [
        "When do deploys go out and how do we roll back?",
        "What is the capital of Japan?",
    ];

    let mut report = DemoReport::new("agentic-rag");
    for query in queries {
        let result = rag.process(query).await?;
        report.push(
            format!("Query: {query}"),
            format!(
                "Path: {:?}\nSources: {}\nGrade: {}\nAnswer: {}",
                result.path,
                if result.sources.is_empty() {
                    "(none)".into()
                } else {
                    result.sources.join(", ")
                },
                result
                    .grade
                    .map(|g| g.to_string())
                    .unwrap_or_else(|| "-".into()),
                result.answer
            ),
        );
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::scripted;

    #[tokio::test]
    async fn direct_path_skips_store() {
        let llm = scripted(&["DIRECT", "Tokyo."]);
        let rag = AgenticRag::new(llm, sample_store());
        let result = rag.process("Capital of Japan?").await.unwrap();
        assert_eq!(result.path, ServePath::Direct);
        assert!(result.sources.is_empty());
        assert!(result.grade.is_none());
    }

    #[tokio::test]
    async fn retrieval_path_with_good_grade() {
        let llm = scripted(&[
            "RETRIEVE",
            "Deploys ship Tuesday/Thursday [Deployment runbook].",
            "9",
        ]);
        let rag = AgenticRag::new(llm, sample_store());
        let result = rag.process("When do deploys go out?").await.unwrap();
        assert_eq!(result.path, ServePath::Retrieved);
        assert_eq!(result.grade, Some(9));
        assert!(result.sources.iter().any(|s| s.contains("runbook")));
    }

    #[tokio::test]
    async fn low_grade_triggers_one_retry() {
        let llm = scripted(&[
            "RETRIEVE",
            "Vague first answer.",
            "3",
            "deployment schedule rollback runbook",
            "Tuesday and Thursday, blue-green rollback [Deployment runbook].",
            "8",
        ]);
        let rag = AgenticRag::new(llm, sample_store());
        let result = rag.process("When do deploys go out?").await.unwrap();
        assert_eq!(result.path, ServePath::RetrievedAfterRetry);
        assert_eq!(result.grade, Some(8));
    }

    #[tokio::test]
    async fn unparseable_grade_defaults_to_midpoint() {
        let llm = scripted(&["a perfectly fine answer, I'd say"]);
        let rag = AgenticRag::new(llm, sample_store());
        let grade = rag.grade("q", "a").await.unwrap();
        assert_eq!(grade, 5);
    }
}

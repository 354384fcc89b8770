//! Knowledge retrieval (RAG) — ground answers in a searched knowledge base.
//!
//! Retrieval is the keyword-scored [`DocumentStore`]; hits are rendered as
//! context for a grounded answer prompt. When nothing matches, the agent
//! answers from general knowledge and says so.

use crate::report::DemoReport;
use agentry_core::{LlmClient, Result};
use agentry_memory::{DocumentStore, ScoredDocument};
use tracing::debug;

/// Outcome of one RAG query.
#[derive(Debug, Clone)]
pub struct RagAnswer {
    pub question: String,
    /// Titles of retrieved documents, best first.
    pub sources: Vec<String>,
    pub grounded: bool,
    pub answer: String,
}

/// Retrieval-augmented answering over a document store.
pub struct RagSystem {
    llm: LlmClient,
    store: DocumentStore,
    top_k: usize,
}

impl RagSystem {
    pub fn new(llm: LlmClient, store: DocumentStore) -> Self {
        Self {
            llm,
            store,
            top_k: 3,
        }
    }

    /// Set how many documents to retrieve per query.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut DocumentStore {
        &mut self.store
    }

    fn render_context(hits: &[ScoredDocument]) -> String {
        hits.iter()
            .map(|h| format!("[{}] {}", h.document.title, h.document.content))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Answer a question, grounding in retrieved documents when possible.
    pub async fn query(&self, question: &str) -> Result<RagAnswer> {
        let hits = self.store.search(question, self.top_k);
        debug!(hits = hits.len(), "retrieval");

        if hits.is_empty() {
            let prompt = format!(
                "Answer this question from general knowledge, and note that no \
                 internal documentation was found for it:\n{question}"
            );
            let answer = self.llm.generate(&prompt).await?;
            return Ok(RagAnswer {
                question: question.to_string(),
                sources: Vec::new(),
                grounded: false,
                answer,
            });
        }

        let sources: Vec<String> = hits.iter().map(|h| h.document.title.clone()).collect();
        let prompt = format!(
            "Use the following knowledge to answer the question. Cite the \
             bracketed source titles you rely on.\n\n\
             Knowledge:\n{}\n\nQuestion: {question}",
            Self::render_context(&hits)
        );
        let answer = self.llm.generate(&prompt).await?;

        Ok(RagAnswer {
            question: question.to_string(),
            sources,
            grounded: true,
            answer,
        })
    }
}

/// The sample knowledge base the demo ships with.
pub fn sample_knowledge() -> DocumentStore {
    let mut store = DocumentStore::new();
    store.add(
        "Rust error handling",
        "Rust models recoverable errors with Result<T, E> and the ? operator; \
         panics are reserved for unrecoverable bugs.",
        vec!["rust".into(), "errors".into()],
    );
    store.add(
        "Rust ownership",
        "Each value has a single owner; moves transfer ownership and borrows \
         grant temporary access, checked at compile time.",
        vec!["rust".into(), "memory".into()],
    );
    store.add(
        "Cargo workspaces",
        "A Cargo workspace shares one Cargo.lock and target directory across \
         member crates, keeping dependency versions aligned.",
        vec!["rust".into(), "cargo".into(), "build".into()],
    );
    store
}

/// Demo: two grounded questions and one that misses the knowledge base.
pub async fn demo(llm: &LlmClient) -> Result<DemoReport> {
    let rag = RagSystem::new(llm.clone(), sample_knowledge());

    let questions = [
        "How does Rust handle errors?",
        "What does a Cargo workspace share between crates?",
        "Who painted the Mona Lisa?",
    ];

    let mut report = DemoReport::new("knowledge-retrieval");
    for question in questions {
        let result = rag.query(question).await?;
        let sources = if result.sources.is_empty() {
            "(none — answered from general knowledge)".to_string()
        } else {
            result.sources.join(", ")
        };
        report.push(
            format!("Question: {question}"),
            format!("Sources: {sources}\nAnswer: {}", result.answer),
        );
    }
    Ok(report)
}

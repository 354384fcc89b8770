//! Keyword-scored document store.
//!
//! Scoring is word overlap between the query and the document's title,
//! content and tags, with title and tag hits weighted above body hits.
//! That is all the catalogue's retrieval demos need, and it keeps search
//! fully deterministic.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
}

/// A document with its search score.
#[derive(Debug, Clone)]
pub struct ScoredDocument {
    pub document: Document,
    pub score: f32,
}

/// In-memory keyword-scored document store.
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: Vec<Document>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document; returns its generated id.
    pub fn add(
        &mut self,
        title: impl Into<String>,
        content: impl Into<String>,
        tags: Vec<String>,
    ) -> String {
        let id = Uuid::new_v4().to_string();
        self.documents.push(Document {
            id: id.clone(),
            title: title.into(),
            content: content.into(),
            tags,
        });
        id
    }

    /// Get a document by id.
    pub fn get(&self, id: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == id)
    }

    /// All documents in insertion order.
    pub fn all(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Search by keyword overlap; returns up to `limit` results with a
    /// positive score, best first. Ties keep insertion order.
    pub fn search(&self, query: &str, limit: usize) -> Vec<ScoredDocument> {
        let query_words = normalize_words(query);
        if query_words.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<ScoredDocument> = self
            .documents
            .iter()
            .filter_map(|doc| {
                let score = score_document(doc, &query_words);
                (score > 0.0).then(|| ScoredDocument {
                    document: doc.clone(),
                    score,
                })
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        scored
    }
}

fn normalize_words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2) // skip stopword-sized tokens
        .map(String::from)
        .collect()
}

fn score_document(doc: &Document, query_words: &[String]) -> f32 {
    let title_words = normalize_words(&doc.title);
    let content_words = normalize_words(&doc.content);
    let tag_words: Vec<String> = doc.tags.iter().flat_map(|t| normalize_words(t)).collect();

    let mut score = 0.0;
    for word in query_words {
        if title_words.contains(word) {
            score += 3.0;
        }
        if tag_words.contains(word) {
            score += 2.0;
        }
        if content_words.contains(word) {
            score += 1.0;
        }
    }
    score / query_words.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_store() -> DocumentStore {
        let mut store = DocumentStore::new();
        store.add(
            "Python basics",
            "Python is a high-level language known for readability.",
            vec!["programming".into(), "python".into()],
        );
        store.add(
            "Rust ownership",
            "Rust enforces memory safety through ownership and borrowing.",
            vec!["programming".into(), "rust".into()],
        );
        store.add(
            "Sourdough starter",
            "Feed the starter daily with equal parts flour and water.",
            vec!["baking".into()],
        );
        store
    }

    #[test]
    fn search_ranks_title_matches_first() {
        let store = sample_store();
        let results = store.search("rust ownership model", 3);
        assert!(!results.is_empty());
        assert_eq!(results[0].document.title, "Rust ownership");
    }

    #[test]
    fn search_respects_limit() {
        let store = sample_store();
        let results = store.search("programming language", 1);
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn irrelevant_query_returns_empty() {
        let store = sample_store();
        assert!(store.search("astrophysics quasar", 3).is_empty());
    }

    #[test]
    fn empty_query_returns_empty() {
        let store = sample_store();
        assert!(store.search("", 3).is_empty());
        assert!(store.search("a an", 3).is_empty()); // all short tokens dropped
    }

    #[test]
    fn get_by_id() {
        let mut store = DocumentStore::new();
        let id = store.add("T", "content here", vec![]);
        assert_eq!(store.get(&id).unwrap().title, "T");
        assert!(store.get("missing").is_none());
    }
}

//! Data processing — clean, chunk and enrich documents for retrieval.
//!
//! A local pipeline (cleaning, metadata, validation, overlapping chunks)
//! with two LLM enrichment steps (summary, key phrases). Batch processing
//! aggregates statistics over many documents.

use crate::report::DemoReport;
use agentry_core::{LlmClient, Result};
use tracing::debug;

/// Metadata extracted from a document.
#[derive(Debug, Clone)]
pub struct DocMetadata {
    pub word_count: usize,
    pub line_count: usize,
    pub has_code: bool,
}

/// One retrieval-ready chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub index: usize,
    pub text: String,
}

/// A fully processed document.
#[derive(Debug, Clone)]
pub struct ProcessedDocument {
    pub source: String,
    pub cleaned: String,
    pub metadata: DocMetadata,
    pub chunks: Vec<Chunk>,
    pub summary: String,
    pub key_phrases: Vec<String>,
}

/// Normalize whitespace and strip control characters.
pub fn clean_text(text: &str) -> String {
    let stripped: String = text
        .chars()
        .filter(|c| !c.is_control() || *c == '\n')
        .collect();
    stripped
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Extract cheap metadata.
pub fn extract_metadata(text: &str) -> DocMetadata {
    DocMetadata {
        word_count: text.split_whitespace().count(),
        line_count: text.lines().count(),
        has_code: text.contains("fn ") || text.contains("```") || text.contains("def "),
    }
}

/// Validate a document is worth processing.
pub fn validate(text: &str) -> std::result::Result<(), String> {
    let words = text.split_whitespace().count();
    if words < 5 {
        return Err(format!("too short: {words} words"));
    }
    if words > 50_000 {
        return Err(format!("too long: {words} words"));
    }
    Ok(())
}

/// Split into word-based chunks with overlap.
pub fn chunk_text(text: &str, chunk_words: usize, overlap_words: usize) -> Vec<Chunk> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() || chunk_words == 0 {
        return Vec::new();
    }
    let step = chunk_words.saturating_sub(overlap_words).max(1);

    let mut chunks = Vec::new();
    let mut start = 0;
    let mut index = 0;
    while start < words.len() {
        let end = (start + chunk_words).min(words.len());
        chunks.push(Chunk {
            index,
            text: words[start..end].join(" "),
        });
        index += 1;
        if end == words.len() {
            break;
        }
        start += step;
    }
    chunks
}

/// The document processor.
pub struct DataProcessor {
    llm: LlmClient,
    chunk_words: usize,
    overlap_words: usize,
}

impl DataProcessor {
    pub fn new(llm: LlmClient) -> Self {
        Self {
            llm,
            chunk_words: 120,
            overlap_words: 20,
        }
    }

    /// Override chunking geometry.
    pub fn with_chunking(mut self, chunk_words: usize, overlap_words: usize) -> Self {
        self.chunk_words = chunk_words.max(1);
        self.overlap_words = overlap_words.min(self.chunk_words - 1);
        self
    }

    /// Process one document end to end.
    pub async fn process(
        &self,
        source: &str,
        raw: &str,
    ) -> Result<std::result::Result<ProcessedDocument, String>> {
        let cleaned = clean_text(raw);
        if let Err(reason) = validate(&cleaned) {
            debug!(source, %reason, "document rejected");
            return Ok(Err(reason));
        }

        let metadata = extract_metadata(&cleaned);
        let chunks = chunk_text(&cleaned, self.chunk_words, self.overlap_words);

        let summary = self
            .llm
            .generate(&format!("Summarize this document in two sentences:\n{cleaned}"))
            .await?;
        let phrases_raw = self
            .llm
            .generate(&format!(
                "List the 5 most important key phrases in this document, \
                 comma separated, nothing else:\n{cleaned}"
            ))
            .await?;
        let key_phrases = phrases_raw
            .split(',')
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();

        Ok(Ok(ProcessedDocument {
            source: source.to_string(),
            cleaned,
            metadata,
            chunks,
            summary,
            key_phrases,
        }))
    }

    /// Process a batch; returns (processed, rejections).
    pub async fn process_batch(
        &self,
        documents: &[(&str, &str)],
    ) -> Result<(Vec<ProcessedDocument>, Vec<(String, String)>)> {
        let mut processed = Vec::new();
        let mut rejected = Vec::new();
        for (source, raw) in documents {
            match self.process(source, raw).await? {
                Ok(doc) => processed.push(doc),
                Err(reason) => rejected.push((source.to_string(), reason)),
            }
        }
        Ok((processed, rejected))
    }
}

/// Demo: process two documents (one too short) and report statistics.
pub async fn demo(llm: &LlmClient) -> Result<DemoReport> {
    let processor = DataProcessor::new(llm.clone()).with_chunking(40, 8);

    let long_doc = "Observability   starts with structured logs.\n\n\
        Metrics give you aggregate health:  request rates, error counts, and \
        latency percentiles reveal trends that individual log lines cannot. \
        Traces tie the story together by following one request across services, \
        which makes slow hops obvious. Teams that invest in all three pillars \
        debug incidents faster and spend less time guessing. Start with logs, \
        add metrics once traffic grows, and introduce tracing when the service \
        count makes request paths hard to follow.";

    let (processed, rejected) = processor
        .process_batch(&[("observability.md", long_doc), ("stub.md", "too short")])
        .await?;

    let mut report = DemoReport::new("data-processing");
    for doc in &processed {
        report.push(
            format!("Document: {}", doc.source),
            format!(
                "words: {}  lines: {}  code: {}\nchunks: {}\nsummary: {}\nkey phrases: {}",
                doc.metadata.word_count,
                doc.metadata.line_count,
                doc.metadata.has_code,
                doc.chunks.len(),
                doc.summary,
                doc.key_phrases.join(", ")
            ),
        );
    }
    report.push(
        "Rejected",
        rejected
            .iter()
            .map(|(source, reason)| format!("{source}: {reason}"))
            .collect::<Vec<_>>()
            .join("\n"),
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::scripted;

    #[test]
    fn cleaning_normalizes_whitespace() {
        let cleaned = clean_text("hello   world\n\n\n  spaced \t out ");
        assert_eq!(cleaned, "hello world\nspaced out");
    }

    #[test]
    fn chunks_overlap() {
        let text = (1..=10)
            .map(|i| format!("w{i}"))
            .collect::<Vec<_>>()
            .join(" ");
        let chunks = chunk_text(&text, 4, 2);
        assert_eq!(chunks[0].text, "w1 w2 w3 w4");
        assert_eq!(chunks[1].text, "w3 w4 w5 w6");
        // Final chunk ends at the last word
        assert!(chunks.last().unwrap().text.ends_with("w10"));
    }

    #[test]
    fn chunking_handles_short_input() {
        let chunks = chunk_text("only three words", 10, 2);
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn validation_bounds() {
        assert!(validate("a b").is_err());
        assert!(validate("this document has more than five words total").is_ok());
    }

    #[test]
    fn metadata_detects_code() {
        assert!(extract_metadata("fn main() {}").has_code);
        assert!(!extract_metadata("plain prose here").has_code);
    }

    #[tokio::test]
    async fn batch_separates_rejections() {
        let llm = scripted(&["a summary", "logs, metrics, traces"]);
        let processor = DataProcessor::new(llm);
        let (processed, rejected) = processor
            .process_batch(&[
                ("good.md", "structured logs and metrics and traces help teams debug faster"),
                ("bad.md", "nope"),
            ])
            .await
            .unwrap();
        assert_eq!(processed.len(), 1);
        assert_eq!(rejected.len(), 1);
        assert_eq!(processed[0].key_phrases.len(), 3);
        assert!(rejected[0].1.contains("too short"));
    }
}

//! Tree of thoughts — scored, pruned exploration of reasoning paths.
//!
//! Breadth-limited search: at each depth the model proposes candidate next
//! thoughts per surviving path, each extended path is scored 0-10 by a
//! judge prompt, and paths below the pruning threshold are dropped. The
//! best surviving path at the depth cap (or a terminal path) becomes the
//! final solution.

use crate::report::DemoReport;
use agentry_core::{LlmClient, Result};
use tracing::{debug, info};

/// One explored path through the tree.
#[derive(Debug, Clone)]
pub struct ThoughtPath {
    /// Thoughts from root to leaf.
    pub thoughts: Vec<String>,
    pub score: f32,
    pub terminal: bool,
}

/// Result of a tree search.
#[derive(Debug, Clone)]
pub struct TreeSearchResult {
    pub best_path: ThoughtPath,
    pub explored_paths: usize,
    pub pruned_paths: usize,
    pub solution: String,
}

/// The tree-of-thoughts searcher.
pub struct TreeOfThoughts {
    llm: LlmClient,
    max_depth: usize,
    branching: usize,
    beam_width: usize,
    prune_below: f32,
}

impl TreeOfThoughts {
    pub fn new(llm: LlmClient) -> Self {
        Self {
            llm,
            max_depth: 3,
            branching: 3,
            beam_width: 2,
            prune_below: 4.0,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth.max(1);
        self
    }

    pub fn with_branching(mut self, branching: usize) -> Self {
        self.branching = branching.max(1);
        self
    }

    /// Paths kept per depth level.
    pub fn with_beam_width(mut self, width: usize) -> Self {
        self.beam_width = width.max(1);
        self
    }

    /// Scores below this are pruned.
    pub fn with_prune_threshold(mut self, threshold: f32) -> Self {
        self.prune_below = threshold;
        self
    }

    /// Propose candidate next thoughts for a path.
    async fn propose(&self, problem: &str, path: &[String]) -> Result<Vec<String>> {
        let so_far = if path.is_empty() {
            "(start)".to_string()
        } else {
            path.join(" → ")
        };
        let response = self
            .llm
            .generate(&format!(
                "Problem: {problem}\nReasoning so far: {so_far}\n\n\
                 Propose {} distinct next reasoning steps. Reply with a \
                 numbered list only.",
                self.branching
            ))
            .await?;

        Ok(response
            .lines()
            .filter_map(|line| {
                let trimmed = line.trim();
                trimmed
                    .split_once('.')
                    .filter(|(n, _)| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
                    .map(|(_, rest)| rest.trim().to_string())
                    .filter(|rest| !rest.is_empty())
            })
            .take(self.branching)
            .collect())
    }

    /// Score a path 0-10; also reports whether it reached a solution.
    async fn evaluate(&self, problem: &str, path: &[String]) -> Result<(f32, bool)> {
        let response = self
            .llm
            .generate(&format!(
                "Problem: {problem}\nReasoning path: {}\n\n\
                 Rate how promising this path is (0-10) and whether it already \
                 reaches a solution.\n\
                 Reply with two lines:\nSCORE: <n>\nTERMINAL: YES or NO",
                path.join(" → ")
            ))
            .await?;

        let score = response
            .lines()
            .find_map(|l| l.trim().strip_prefix("SCORE:"))
            .and_then(|s| s.trim().split('/').next())
            .and_then(|s| s.trim().parse::<f32>().ok())
            .unwrap_or(5.0)
            .clamp(0.0, 10.0);
        let terminal = response
            .lines()
            .find_map(|l| l.trim().strip_prefix("TERMINAL:"))
            .map(|s| s.trim().to_uppercase().starts_with("YES"))
            .unwrap_or(false);
        Ok((score, terminal))
    }

    /// Run the search.
    pub async fn search(&self, problem: &str) -> Result<TreeSearchResult> {
        let mut frontier: Vec<ThoughtPath> = vec![ThoughtPath {
            thoughts: Vec::new(),
            score: 0.0,
            terminal: false,
        }];
        let mut best: Option<ThoughtPath> = None;
        let mut explored = 0usize;
        let mut pruned = 0usize;

        for depth in 1..=self.max_depth {
            let mut next_frontier: Vec<ThoughtPath> = Vec::new();

            for path in &frontier {
                let candidates = self.propose(problem, &path.thoughts).await?;
                for candidate in candidates {
                    let mut thoughts = path.thoughts.clone();
                    thoughts.push(candidate);
                    let (score, terminal) = self.evaluate(problem, &thoughts).await?;
                    explored += 1;
                    debug!(depth, score, terminal, "evaluated path");

                    let extended = ThoughtPath {
                        thoughts,
                        score,
                        terminal,
                    };

                    if score < self.prune_below {
                        pruned += 1;
                        continue;
                    }
                    if terminal {
                        match &best {
                            Some(b) if b.score >= extended.score => {}
                            _ => best = Some(extended.clone()),
                        }
                        continue;
                    }
                    next_frontier.push(extended);
                }
            }

            next_frontier.sort_by(|a, b| {
                b.score
                    .partial_cmp(&a.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            pruned += next_frontier.len().saturating_sub(self.beam_width);
            next_frontier.truncate(self.beam_width);

            if next_frontier.is_empty() {
                info!(depth, "frontier exhausted");
                break;
            }
            frontier = next_frontier;
        }

        // Terminal best wins; otherwise the strongest surviving non-root path.
        let best_path = match best {
            Some(path) => path,
            None => frontier
                .into_iter()
                .filter(|p| !p.thoughts.is_empty())
                .max_by(|a, b| {
                    a.score
                        .partial_cmp(&b.score)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .unwrap_or(ThoughtPath {
                    thoughts: vec!["no viable path found".into()],
                    score: 0.0,
                    terminal: false,
                }),
        };

        let solution = self
            .llm
            .generate(&format!(
                "Problem: {problem}\nChosen reasoning path: {}\n\n\
                 Write out the final solution this path leads to.",
                best_path.thoughts.join(" → ")
            ))
            .await?;

        Ok(TreeSearchResult {
            best_path,
            explored_paths: explored,
            pruned_paths: pruned,
            solution,
        })
    }
}

/// Demo: a constrained scheduling puzzle.
pub async fn demo(llm: &LlmClient) -> Result<DemoReport> {
    let searcher = TreeOfThoughts::new(llm.clone())
        .with_max_depth(2)
        .with_branching(2)
        .with_beam_width(2);

    let problem = "Three talks (A 30min, B 45min, C 60min) must fit into two rooms \
                   over a 90-minute window. A's speaker can only start after B ends. \
                   Find a valid schedule.";
    let result = searcher.search(problem).await?;

    let mut report = DemoReport::new("tree-of-thoughts");
    report.push("Problem", problem);
    report.push(
        "Search",
        format!(
            "paths explored: {}  pruned: {}\nbest path (score {:.1}, terminal {}):\n{}",
            result.explored_paths,
            result.pruned_paths,
            result.best_path.score,
            result.best_path.terminal,
            result
                .best_path
                .thoughts
                .iter()
                .enumerate()
                .map(|(i, t)| format!("  {}. {t}", i + 1))
                .collect::<Vec<_>>()
                .join("\n")
        ),
    );
    report.push("Solution", &result.solution);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::scripted;

    #[tokio::test]
    async fn terminal_path_wins() {
        let llm = scripted(&[
            // depth 1: propose from root
            "1. Put C alone in room 1\n2. Put A first",
            // evaluate candidate 1 → terminal
            "SCORE: 9\nTERMINAL: YES",
            // evaluate candidate 2
            "SCORE: 6\nTERMINAL: NO",
            // depth 2: propose from surviving non-terminal path
            "1. Then add B after",
            // evaluate
            "SCORE: 5\nTERMINAL: NO",
            // final solution from best (terminal) path
            "C in room 1, B then A in room 2.",
        ]);
        let searcher = TreeOfThoughts::new(llm)
            .with_max_depth(2)
            .with_branching(2)
            .with_beam_width(2);
        let result = searcher.search("schedule").await.unwrap();
        assert!(result.best_path.terminal);
        assert!((result.best_path.score - 9.0).abs() < 0.01);
        assert!(result.solution.contains("room"));
    }

    #[tokio::test]
    async fn low_scores_are_pruned() {
        let llm = scripted(&[
            "1. Bad idea\n2. Worse idea",
            "SCORE: 1\nTERMINAL: NO",
            "SCORE: 2\nTERMINAL: NO",
            "fallback solution text",
        ]);
        let searcher = TreeOfThoughts::new(llm)
            .with_max_depth(3)
            .with_branching(2)
            .with_prune_threshold(4.0);
        let result = searcher.search("p").await.unwrap();
        assert_eq!(result.pruned_paths, 2);
        assert_eq!(result.best_path.thoughts[0], "no viable path found");
    }

    #[tokio::test]
    async fn beam_width_limits_frontier() {
        let llm = scripted(&[
            // depth 1: three candidates
            "1. a\n2. b\n3. c",
            "SCORE: 8\nTERMINAL: NO",
            "SCORE: 7\nTERMINAL: NO",
            "SCORE: 6\nTERMINAL: NO",
            // depth 2: only beam_width=1 path proposes
            "1. a2",
            "SCORE: 8\nTERMINAL: NO",
            "solution",
        ]);
        let searcher = TreeOfThoughts::new(llm)
            .with_max_depth(2)
            .with_branching(3)
            .with_beam_width(1);
        let result = searcher.search("p").await.unwrap();
        // depth1: 3 evaluated, 2 cut by beam; depth2: 1 evaluated
        assert_eq!(result.explored_paths, 4);
        assert_eq!(result.best_path.thoughts, vec!["a", "a2"]);
    }

    #[tokio::test]
    async fn unparseable_score_defaults() {
        let llm = scripted(&[
            "1. only",
            "looks promising to me",
            "1. next",
            "SCORE: 6\nTERMINAL: NO",
            "solution",
        ]);
        let searcher = TreeOfThoughts::new(llm)
            .with_max_depth(2)
            .with_branching(1)
            .with_beam_width(1);
        let result = searcher.search("p").await.unwrap();
        // default 5.0 survives the 4.0 threshold
        assert_eq!(result.best_path.thoughts.len(), 2);
    }
}

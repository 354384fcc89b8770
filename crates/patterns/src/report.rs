//! Demo report — the narration a pattern demo hands back to the CLI.
//!
//! Library crates never print; each demo returns its progress as ordered
//! sections and the CLI renders them. This keeps every engine testable and
//! the console output in one place.

/// One titled block of demo narration.
#[derive(Debug, Clone)]
pub struct Section {
    pub title: String,
    pub body: String,
}

/// The full narration of one demo run.
#[derive(Debug, Clone)]
pub struct DemoReport {
    /// Pattern slug (e.g., "react")
    pub pattern: &'static str,
    pub sections: Vec<Section>,
}

impl DemoReport {
    pub fn new(pattern: &'static str) -> Self {
        Self {
            pattern,
            sections: Vec::new(),
        }
    }

    /// Append a titled section.
    pub fn push(&mut self, title: impl Into<String>, body: impl Into<String>) {
        self.sections.push(Section {
            title: title.into(),
            body: body.into(),
        });
    }

    /// Render the report for the console.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for section in &self.sections {
            out.push_str("--- ");
            out.push_str(&section.title);
            out.push_str(" ---\n");
            out.push_str(section.body.trim_end());
            out.push_str("\n\n");
        }
        out.trim_end().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_joins_sections() {
        let mut report = DemoReport::new("routing");
        report.push("Step 1", "classified as booking");
        report.push("Step 2", "handled");
        let rendered = report.render();
        assert!(rendered.contains("--- Step 1 ---"));
        assert!(rendered.contains("classified as booking"));
        assert!(rendered.contains("--- Step 2 ---"));
    }

    #[test]
    fn render_trims_trailing_whitespace() {
        let mut report = DemoReport::new("x");
        report.push("Only", "body\n\n");
        assert!(report.render().ends_with("body"));
    }
}

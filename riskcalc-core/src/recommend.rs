//! Merges the advice attached to several findings into one ordered list.

use crate::Severity;

#[derive(Debug, Clone)]
struct Line {
    severity: Severity,
    text: String,
}

/// Collects advice lines and at most one urgent override.
///
/// Lines are emitted most severe first, keeping insertion order inside a
/// severity level. Duplicate lines are dropped. When several overrides fire,
/// the most severe one wins and ties go to the first registered.
#[derive(Debug, Clone, Default)]
pub struct RecommendationBuilder {
    lines: Vec<Line>,
    urgent: Option<Line>,
}

impl RecommendationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, severity: Severity, text: impl Into<String>) -> &mut Self {
        self.lines.push(Line {
            severity,
            text: text.into(),
        });
        self
    }

    pub fn extend<I, S>(&mut self, severity: Severity, texts: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for text in texts {
            self.add(severity, text);
        }
        self
    }

    pub fn urgent(&mut self, severity: Severity, text: impl Into<String>) -> &mut Self {
        let candidate = Line {
            severity,
            text: text.into(),
        };
        match &self.urgent {
            Some(current) if current.severity <= candidate.severity => {}
            _ => self.urgent = Some(candidate),
        }
        self
    }

    pub fn has_urgent(&self) -> bool {
        self.urgent.is_some()
    }

    /// Ordered lines, and whether an urgent line was prepended.
    pub fn finish(self) -> (Vec<String>, bool) {
        let mut lines = self.lines;
        lines.sort_by_key(|line| line.severity);

        let urgent = self.urgent.is_some();
        let mut output: Vec<String> = Vec::with_capacity(lines.len() + 1);
        if let Some(line) = self.urgent {
            output.push(line.text);
        }
        for line in lines {
            if !output.contains(&line.text) {
                output.push(line.text);
            }
        }
        (output, urgent)
    }
}

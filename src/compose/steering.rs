//! Heading-keyed steering sections.

use serde::{Deserialize, Serialize};

/// One guidance section, keyed by its heading text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SteeringSection {
    pub heading: String,
    pub content: String,
}

impl SteeringSection {
    #[must_use]
    pub fn new(heading: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            content: content.into(),
        }
    }
}

/// Split a markdown document on `#` and `##` headings.
///
/// Text before the first heading is keyed by the empty heading and dropped
/// when blank. Headings inside fenced code blocks are content. Deeper
/// headings (`###` and below) stay inside their parent section.
#[must_use]
pub fn split_sections(markdown: &str) -> Vec<SteeringSection> {
    let mut sections = Vec::new();
    let mut heading = String::new();
    let mut body: Vec<&str> = Vec::new();
    let mut in_fence = false;

    for line in markdown.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
            body.push(line);
            continue;
        }

        match section_heading(line).filter(|_| !in_fence) {
            Some(next) => {
                flush(&mut sections, &heading, &body);
                heading = next.to_string();
                body.clear();
            }
            None => body.push(line),
        }
    }
    flush(&mut sections, &heading, &body);

    sections
}

fn section_heading(line: &str) -> Option<&str> {
    let rest = line
        .strip_prefix("## ")
        .or_else(|| line.strip_prefix("# "))?;
    let text = rest.trim().trim_end_matches('#').trim();
    Some(text)
}

fn flush(sections: &mut Vec<SteeringSection>, heading: &str, body: &[&str]) {
    let content = body.join("\n").trim().to_string();
    if heading.is_empty() && content.is_empty() {
        return;
    }
    sections.push(SteeringSection::new(heading, content));
}

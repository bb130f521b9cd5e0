//! Section splitting of narrative markdown.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// A second-level heading line: "## " followed by a title.
static SECTION_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^## .+$").expect("valid heading pattern"));

/// A rendered chart attached to a section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionChart {
    pub caption: String,
    /// PNG bytes.
    #[serde(skip)]
    pub png: Vec<u8>,
}

/// One unit of narrative text, delimited by second-level headings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSection {
    /// Heading text without the marker. Empty for text preceding the first
    /// heading.
    pub heading: String,
    pub body: String,
    pub charts: Vec<SectionChart>,
}

impl ReportSection {
    pub fn new(heading: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            body: body.into(),
            charts: Vec::new(),
        }
    }

    pub fn attach_chart(&mut self, caption: impl Into<String>, png: Vec<u8>) {
        self.charts.push(SectionChart {
            caption: caption.into(),
            png,
        });
    }
}

/// Split text into sections on "## " heading lines.
///
/// Non-blank text before the first heading becomes a section with an empty
/// heading. Deeper headings ("### ...") stay inside their section's body.
pub fn extract_sections(text: &str) -> Vec<ReportSection> {
    let headings: Vec<_> = SECTION_HEADING.find_iter(text).collect();
    let mut sections = Vec::with_capacity(headings.len() + 1);

    let preamble_end = headings.first().map(|m| m.start()).unwrap_or(text.len());
    let preamble = text[..preamble_end].trim();
    if !preamble.is_empty() {
        sections.push(ReportSection::new("", preamble));
    }

    for (i, heading) in headings.iter().enumerate() {
        let body_end = headings.get(i + 1).map(|m| m.start()).unwrap_or(text.len());
        let title = heading.as_str().trim().trim_start_matches('#').trim();
        sections.push(ReportSection::new(title, text[heading.end()..body_end].trim()));
    }

    sections
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sections_split_on_level_two_headings() {
        let text = "# Report\nIntro line\n\n## Sales\nUp 10%.\n### Detail\nmore\n## Costs\nFlat.\n";
        let sections = extract_sections(text);

        let headings: Vec<&str> = sections.iter().map(|s| s.heading.as_str()).collect();
        assert_eq!(headings, vec!["", "Sales", "Costs"]);
        assert_eq!(sections[0].body, "# Report\nIntro line");
        assert_eq!(sections[1].body, "Up 10%.\n### Detail\nmore");
        assert_eq!(sections[2].body, "Flat.");
    }

    #[test]
    fn test_blank_preamble_is_dropped() {
        let sections = extract_sections("\n\n## Only\nbody");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].heading, "Only");
    }

    #[test]
    fn test_text_without_headings_is_one_section() {
        let sections = extract_sections("just text");
        assert_eq!(sections, vec![ReportSection::new("", "just text")]);
    }

    #[test]
    fn test_heading_marker_needs_a_space() {
        let sections = extract_sections("##NoSpace\n## Real\nx");
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].body, "##NoSpace");
        assert_eq!(sections[1].heading, "Real");
    }

    #[test]
    fn test_empty_text() {
        assert!(extract_sections("").is_empty());
    }
}

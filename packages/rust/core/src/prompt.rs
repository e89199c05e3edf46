//! Analysis payload and the instruction prompt sent to the generative service.

/// Version of [`PROMPT_TEMPLATE`]. Bump whenever the section structure or the
/// output rules change.
pub const PROMPT_VERSION: u32 = 1;

/// Every generated document must start with this marker.
pub const DOCUMENT_START_MARKER: &str = r"\documentclass";

/// Every generated document must contain this marker.
pub const DOCUMENT_END_MARKER: &str = r"\end{document}";

/// Separator between source texts in the payload.
pub const SOURCE_SEPARATOR: &str = "\n\n";

/// Fixed instruction block. The payload is appended verbatim after it.
pub const PROMPT_TEMPLATE: &str = r"You are a LaTeX generator. Analyze the content below for SEO insights and produce one complete, compilable LaTeX document.
Compare MY WEBSITE CONTENT (the first block of text) against the COMPETITOR WEBSITES (every block after it) and identify strengths, weaknesses, and opportunities.
Make every suggestion specific to the keywords found, and reference concrete differences between my website and the competitor content.

The document must contain exactly these sections, in this order:

\section{Introduction}
Summarize the overall topic and intent of my website and of the competitor content.
Name the primary keywords and themes.

\section{Keyword Analysis}
List the top keywords and phrases with how often they occur across all content.
Suggest long-tail keywords worth targeting.

\section{Content Gaps and Recommendations}
Identify gaps in my website and in the competitor content.
Suggest additional topics, keywords, or sections that would improve SEO.

\section{Competitor Insights}
Describe how the competitor content is structured and any standout SEO strategies.
Point out where my website can outperform them.

\section{Technical SEO Suggestions}
Recommend technical improvements such as meta descriptions and internal links.
Suggest ways to improve readability and accessibility.

\section{Conclusion}
Summarize the key takeaways for improving SEO and content quality.

Output rules:
1) Do not use Markdown or code fences (no ```latex or ``` markers).
2) The response must start with \documentclass and must include \begin{document} and \end{document}.
3) Every LaTeX command must be syntactically correct; escape special characters (& % $ # _ { } ~ ^ \) that appear in quoted text.
4) Output nothing except the LaTeX document: no explanations, no comments before or after it.

Here is the content to analyze:
";

// ---------------------------------------------------------------------------
// AnalysisPayload
// ---------------------------------------------------------------------------

/// Combined raw text of the own site followed by every competitor, in fetch order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisPayload(String);

impl AnalysisPayload {
    /// Join the own-site text and competitor texts with blank lines.
    /// Competitors that produced no text are left out; the own site is always first.
    pub fn assemble<'a, I>(own_text: &str, competitor_texts: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut combined = own_text.to_string();
        for text in competitor_texts {
            if text.is_empty() {
                continue;
            }
            combined.push_str(SOURCE_SEPARATOR);
            combined.push_str(text);
        }
        Self(combined)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Build the full prompt: the fixed template followed by the payload.
pub fn build_prompt(payload: &AnalysisPayload) -> String {
    let mut prompt = String::with_capacity(PROMPT_TEMPLATE.len() + payload.len());
    prompt.push_str(PROMPT_TEMPLATE);
    prompt.push_str(payload.as_str());
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_is_template_then_payload() {
        let payload = AnalysisPayload::assemble("own words", ["rival words"]);
        let prompt = build_prompt(&payload);

        assert!(prompt.starts_with(PROMPT_TEMPLATE));
        assert!(prompt.ends_with("own words\n\nrival words"));
    }

    #[test]
    fn prompt_is_idempotent() {
        let payload = AnalysisPayload::assemble("Fast shipping", ["Great prices", "Every day"]);
        assert_eq!(build_prompt(&payload).as_bytes(), build_prompt(&payload).as_bytes());
    }

    #[test]
    fn template_names_every_section_and_marker() {
        for section in [
            "Introduction",
            "Keyword Analysis",
            "Content Gaps and Recommendations",
            "Competitor Insights",
            "Technical SEO Suggestions",
            "Conclusion",
        ] {
            assert!(
                PROMPT_TEMPLATE.contains(&format!("\\section{{{section}}}")),
                "missing section {section}"
            );
        }
        assert!(PROMPT_TEMPLATE.contains(DOCUMENT_START_MARKER));
        assert!(PROMPT_TEMPLATE.contains(DOCUMENT_END_MARKER));
        assert!(PROMPT_TEMPLATE.contains(r"\begin{document}"));
    }

    #[test]
    fn payload_keeps_fetch_order_and_skips_empty_competitors() {
        let payload = AnalysisPayload::assemble("self", ["first", "", "second"]);
        assert_eq!(payload.as_str(), "self\n\nfirst\n\nsecond");
    }

    #[test]
    fn payload_with_empty_own_site_still_includes_competitors() {
        let payload = AnalysisPayload::assemble("", ["rival"]);
        assert_eq!(payload.as_str(), "\n\nrival");
    }

    #[test]
    fn payload_is_not_truncated() {
        let long = "word ".repeat(50_000);
        let payload = AnalysisPayload::assemble(&long, std::iter::empty());
        assert_eq!(build_prompt(&payload).len(), PROMPT_TEMPLATE.len() + long.len());
    }
}

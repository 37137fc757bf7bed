//! Prompt templates
//!
//! Placeholders are written as `{name}` and filled by plain substitution.

/// Grounded question answering over retrieved chunks
pub const QA_TEMPLATE: &str = "Based on the following context from research papers, answer the question grounded in the text. Cite chunks if possible.

Context: {context}

Question: {question}

Answer:";

/// Whole-paper academic summary
pub const SUMMARY_TEMPLATE: &str = "
You are a research assistant specializing in technical and mathematical summarization of academic papers.
Read the text below and produce a **concise yet detailed summary** that captures both the conceptual and mathematical essence of the work.

Guidelines:
- Summarize the **research objective, methodology, key contributions, and main results**.
- Include important **mathematical formulations, algorithms, or model components** (e.g., equations, metrics, or optimization functions) when present.
- Highlight how **mathematics supports the model's logic or performance** (e.g., loss functions, probabilistic models, GCN updates).
- Keep the tone **academic and precise**, around **200-250 words**.
- Do **not** simply restate section titles or long quotes.
- Format short equations or expressions inline (e.g., `RMSE = sqrt((1/n) Σ (xi - x'i)^2)`).

Paper text:
{text}
";

/// Five bullet highlights
pub const HIGHLIGHTS_TEMPLATE: &str = "
You are a research summarization assistant.
Read the following academic paper and extract **exactly 5 key highlights** that capture its main contributions, findings, and significance.

Guidelines:
- Write in **clear bullet points**.
- Use **precise technical language**, not generic phrases.
- Each highlight should focus on **a unique contribution or insight**.
- Avoid repeating background information or citations.
- Do not exceed 2 lines per bullet.

Paper text:
{text}
";

/// Per-section summary used by section-wise summarization
pub const SECTION_TEMPLATE: &str = "Summarize this section: {section}";

/// Comparison across labelled paper summaries
pub const COMPARE_TEMPLATE: &str = "Compare and contrast the following papers based on their summaries:
{combined}

Comparison:";

/// Separator placed between labelled summaries in [`COMPARE_TEMPLATE`]
pub const SUMMARY_SEPARATOR: &str = "\n\n---\n\n";

/// Number of bullets the highlights template asks for
pub const EXPECTED_HIGHLIGHTS: usize = 5;

/// Substitute each `{key}` in `template` with its value. Values are not
/// scanned for placeholders, so text containing braces passes through.
pub fn render(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(
        template.len() + values.iter().map(|(_, v)| v.len()).sum::<usize>(),
    );
    let mut rest = template;

    'scan: while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        if let Some(close) = after.find('}') {
            let key = &after[..close];
            if let Some((_, value)) = values.iter().find(|(k, _)| *k == key) {
                out.push_str(value);
                rest = &after[close + 1..];
                continue 'scan;
            }
        }
        out.push('{');
        rest = after;
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_qa() {
        let prompt = render(QA_TEMPLATE, &[("context", "ctx"), ("question", "why?")]);
        assert!(prompt.contains("Context: ctx\n\nQuestion: why?\n\nAnswer:"));
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let prompt = render(SECTION_TEMPLATE, &[("section", "f(x) = {x}")]);
        assert_eq!(prompt, "Summarize this section: f(x) = {x}");
    }

    #[test]
    fn test_unknown_placeholders_kept() {
        assert_eq!(render("a {b} {c", &[("x", "y")]), "a {b} {c");
    }

    #[test]
    fn test_templates_have_placeholders() {
        assert!(SUMMARY_TEMPLATE.contains("{text}"));
        assert!(HIGHLIGHTS_TEMPLATE.contains("{text}"));
        assert!(COMPARE_TEMPLATE.contains("{combined}"));
    }
}

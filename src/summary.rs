use super::*;

const ELLIPSIS: &str = "...";

/// Repairs a summary whose last math expression was cut off by truncation.
///
/// The truncated expression is replaced with its full text from the body
/// (matched by position) followed by an ellipsis, and the MathJax script is
/// appended. The result goes into the `summary` metadata and the memoized
/// summary is dropped. Returns whether the item was changed.
pub fn repair_summary(
    content: &mut Content,
    inspector: &dyn HtmlInspector,
    mathjax_script: &str,
) -> bool {
    let summary = content.summary();
    let math = inspector.find_class(&summary, MATH_TAG_CLASS);
    let Some(last) = math.last() else {
        return false;
    };
    if last.text.chars().count() <= ELLIPSIS.len() || !last.text.ends_with(ELLIPSIS) {
        return false;
    }

    let full = inspector.find_class(&content.body, MATH_TAG_CLASS);
    let Some(full_math) = full.get(math.len() - 1) else {
        warn!(
            "{}: summary has {} math expressions but the body only {}, leaving it as is",
            content.source_path.display(),
            math.len(),
            full.len()
        );
        return false;
    };

    let repaired = html::replace_inner(
        &summary,
        last,
        &html::escape_text(&format!("{} {ELLIPSIS}", full_math.text)),
    );
    debug!("Repaired summary of {}", content.source_path.display());
    content
        .metadata
        .insert("summary".to_owned(), format!("{repaired}{}", script_tag(mathjax_script)));
    content.invalidate_summary();
    true
}

//
// Tests
//

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = concat!(
        r#"<p>Start <span class="math">a</span> then "#,
        r#"<span class="math">x^2 + y^2 = z^2</span> and more words here.</p>"#
    );

    fn article(summary: &str) -> Content {
        let mut content = Content::new("content/post.md", BODY);
        content
            .metadata
            .insert("summary".to_owned(), summary.to_owned());
        content
    }

    #[test]
    fn truncated_math_is_completed() {
        let mut content = article(concat!(
            r#"<p>Start <span class="math">a</span> then "#,
            r#"<span class="math">x^2 + ...</span></p>"#
        ));
        assert!(repair_summary(&mut content, &MarkupScanner, "loadMathJax();"));
        let summary = content.summary();
        assert_eq!(
            summary,
            concat!(
                r#"<p>Start <span class="math">a</span> then "#,
                r#"<span class="math">x^2 + y^2 = z^2 ...</span></p>"#,
                "<script type='text/javascript'>loadMathJax();</script>"
            )
        );
        let math = MarkupScanner.find_class(&summary, MATH_TAG_CLASS);
        assert_eq!(math.last().unwrap().text, "x^2 + y^2 = z^2 ...");
        assert_eq!(summary.matches("<script").count(), 1);
    }

    #[test]
    fn truncated_by_word_limit() {
        let mut content = Content::new("content/post.md", BODY).with_summary_length(6, "...");
        assert_eq!(
            content.summary(),
            concat!(
                r#"<p>Start <span class="math">a</span> then "#,
                r#"<span class="math">x^2 + y^2 ...</span></p>"#
            )
        );
        assert!(repair_summary(&mut content, &MarkupScanner, "loadMathJax();"));
        assert!(content
            .summary()
            .contains(r#"<span class="math">x^2 + y^2 = z^2 ...</span></p><script"#));
    }

    #[test]
    fn repaired_text_is_escaped() {
        let mut content = Content::new(
            "content/post.md",
            r#"<p><span class="math">a &lt; b</span></p>"#,
        );
        content.metadata.insert(
            "summary".to_owned(),
            r#"<p><span class="math">a &lt; ...</span></p>"#.to_owned(),
        );
        assert!(repair_summary(&mut content, &MarkupScanner, ""));
        assert!(content
            .summary()
            .starts_with(r#"<p><span class="math">a &lt; b ...</span></p>"#));
    }

    #[test]
    fn complete_math_is_left_alone() {
        let summary = r#"<p>Start <span class="math">a</span> then</p>"#;
        let mut content = article(summary);
        assert!(!repair_summary(&mut content, &MarkupScanner, "loadMathJax();"));
        assert_eq!(content.summary(), summary);
    }

    #[test]
    fn no_math_is_left_alone() {
        let summary = "<p>Start then ...</p>";
        let mut content = article(summary);
        assert!(!repair_summary(&mut content, &MarkupScanner, "loadMathJax();"));
        assert_eq!(content.summary(), summary);
    }

    #[test]
    fn bare_ellipsis_is_not_truncation() {
        let summary = r#"<p><span class="math">...</span></p>"#;
        let mut content = article(summary);
        assert!(!repair_summary(&mut content, &MarkupScanner, "loadMathJax();"));
    }

    #[test]
    fn body_with_fewer_expressions() {
        let mut content = Content::new("content/post.md", "<p>No math in the body.</p>");
        content.metadata.insert(
            "summary".to_owned(),
            r#"<p><span class="math">x + ...</span></p>"#.to_owned(),
        );
        assert!(!repair_summary(&mut content, &MarkupScanner, "loadMathJax();"));
    }

    #[test]
    fn unavailable_inspector() {
        let mut content = article(r#"<p><span class="math">x^2 + ...</span></p>"#);
        assert!(!repair_summary(&mut content, &NoInspector, "loadMathJax();"));
    }
}

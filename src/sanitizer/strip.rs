//! Regex-based tag stripping.

use regex::RegexBuilder;

/// Remove every opening, closing and self-closing tag named in `tags`,
/// keeping whatever the tags enclosed.
///
/// An empty `tags` slice leaves the input unchanged.
///
/// ```
/// use post_parser::sanitizer::strip_tags;
///
/// let out = strip_tags(r#"see <a href="/x">here</a><img src="y.png"/>"#, &["a", "img"]);
/// assert_eq!(out, "see here");
/// ```
pub fn strip_tags(html: &str, tags: &[&str]) -> String {
    if tags.is_empty() {
        return html.to_string();
    }

    let names = tags
        .iter()
        .map(|t| regex::escape(t))
        .collect::<Vec<_>>()
        .join("|");
    let pattern = format!(r"</?(?:{names})(?:\s+[^<>]*?)?\s*/?>");

    match RegexBuilder::new(&pattern).case_insensitive(true).build() {
        Ok(re) => re.replace_all(html, "").into_owned(),
        Err(e) => {
            tracing::warn!("Cannot strip tags {tags:?}: {e}");
            html.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_links_keeping_text() {
        assert_eq!(strip_tags(r#"<a href="x">t</a>"#, &["a"]), "t");
    }

    #[test]
    fn strips_images() {
        assert_eq!(
            strip_tags(r#"<p>pic <img src="a.png"> <IMG SRC="b.png" /></p>"#, &["img"]),
            "<p>pic  </p>"
        );
    }

    #[test]
    fn leaves_other_tags() {
        let html = r#"<abbr title="x">ab</abbr> <a href="/">a</a>"#;
        assert_eq!(strip_tags(html, &["a"]), r#"<abbr title="x">ab</abbr> a"#);
    }

    #[test]
    fn no_tags_is_noop() {
        let html = r#"<a href="x">t</a>"#;
        assert_eq!(strip_tags(html, &[]), html);
    }
}

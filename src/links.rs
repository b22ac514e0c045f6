//! Rewriting relative URL attributes into absolute ones.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::error::{PipelineError, Result};

static HREF: LazyLock<AttributeRule> = LazyLock::new(|| AttributeRule {
    pattern: Regex::new(r#"href="([^"]+)""#).expect("static href pattern"),
    prefix_len: 6,
});

static SRC: LazyLock<AttributeRule> = LazyLock::new(|| AttributeRule {
    pattern: Regex::new(r#"src="([^"]+)""#).expect("static src pattern"),
    prefix_len: 5,
});

/// Dummy base used only to check that a relative reference is well formed.
static PROBE_BASE: LazyLock<Option<Url>> =
    LazyLock::new(|| Url::parse("http://probe.invalid/").ok());

/// Where a rewritable attribute value sits inside a regex match.
///
/// `pattern` has exactly one capture group holding the value, and
/// `prefix_len` is the byte length of the literal text before that group
/// (`href="` is 6).
#[derive(Debug, Clone)]
pub struct AttributeRule {
    pattern: Regex,
    prefix_len: usize,
}

impl AttributeRule {
    /// Build a rule, rejecting patterns that do not have exactly one group.
    pub fn new(pattern: &str, prefix_len: usize) -> Result<Self> {
        let pattern = Regex::new(pattern).map_err(|e| PipelineError::Config(e.to_string()))?;
        if pattern.captures_len() != 2 {
            return Err(PipelineError::Config(format!(
                "attribute rule `{pattern}` must have exactly one capture group"
            )));
        }
        Ok(Self {
            pattern,
            prefix_len,
        })
    }

    /// Matches `href="…"`.
    pub fn href() -> Self {
        HREF.clone()
    }

    /// Matches `src="…"`.
    pub fn src() -> Self {
        SRC.clone()
    }

    pub fn prefix_len(&self) -> usize {
        self.prefix_len
    }
}

/// Make every relative URL matched by `rule` absolute.
///
/// - Values with a scheme are left alone.
/// - Site-relative values (`/topic/1`) get `base_url` prepended.
/// - Anything else is treated as a host reference and made
///   protocol-relative (`//other.com/x`).
///
/// Values that are not valid URL references are logged and skipped. After
/// each rewrite, scanning continues on the rewritten text right after the
/// new value.
///
/// ```
/// use post_parser::links::{absolutize, AttributeRule};
///
/// let out = absolutize(r#"<a href="/topic/1">t</a>"#, &AttributeRule::href(), "https://example.com");
/// assert_eq!(out, r#"<a href="https://example.com/topic/1">t</a>"#);
/// ```
pub fn absolutize(text: &str, rule: &AttributeRule, base_url: &str) -> String {
    let mut content = text.to_string();
    let mut cursor = 0;

    while cursor <= content.len() {
        let Some(caps) = rule.pattern.captures_at(&content, cursor) else {
            break;
        };
        let (Some(whole), Some(value)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        let next = if whole.as_str().is_empty() {
            step_past(&content, whole.end())
        } else {
            whole.end()
        };

        if value.start() != whole.start() + rule.prefix_len {
            tracing::warn!(
                "Attribute rule `{}` prefix length {} does not match its capture group",
                rule.pattern,
                rule.prefix_len
            );
            cursor = next;
            continue;
        }
        if value.as_str().is_empty() {
            cursor = next;
            continue;
        }

        let range = value.range();
        match rewrite(value.as_str(), base_url) {
            Ok(Some(absolute)) => {
                let resume = range.start + absolute.len();
                content.replace_range(range, &absolute);
                cursor = resume;
            }
            Ok(None) => cursor = next,
            Err(e) => {
                tracing::debug!("Skipping URL rewrite: {e}");
                cursor = next;
            }
        }
    }

    content
}

/// The offset just after the char at `pos`, or past the end of `text`.
fn step_past(text: &str, pos: usize) -> usize {
    text[pos..]
        .chars()
        .next()
        .map_or(text.len() + 1, |c| pos + c.len_utf8())
}

/// The absolute form of `value`, or `None` if it already has a scheme.
fn rewrite(value: &str, base_url: &str) -> Result<Option<String>> {
    match Url::parse(value) {
        Ok(_) => Ok(None),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            if let Some(probe) = PROBE_BASE.as_ref() {
                probe
                    .join(value)
                    .map_err(|e| PipelineError::InvalidUrl(format!("{value}: {e}")))?;
            }
            if value.starts_with('/') {
                Ok(Some(format!("{base_url}{value}")))
            } else {
                Ok(Some(format!("//{value}")))
            }
        }
        Err(e) => Err(PipelineError::InvalidUrl(format!("{value}: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://example.com";

    #[test]
    fn site_relative_gets_base() {
        assert_eq!(
            absolutize(r#"href="/topic/1""#, &AttributeRule::href(), BASE),
            r#"href="https://example.com/topic/1""#
        );
    }

    #[test]
    fn bare_host_becomes_protocol_relative() {
        assert_eq!(
            absolutize(r#"href="other.com/x""#, &AttributeRule::href(), BASE),
            r#"href="//other.com/x""#
        );
    }

    #[test]
    fn absolute_left_alone() {
        let html = r#"href="https://x.com""#;
        assert_eq!(absolutize(html, &AttributeRule::href(), BASE), html);

        let html = r#"<a href="mailto:a@b.c">m</a>"#;
        assert_eq!(absolutize(html, &AttributeRule::href(), BASE), html);
    }

    #[test]
    fn every_match_is_rewritten_after_splicing() {
        let html = r#"<a href="/a">1</a><a href="b.org">2</a><a href="http://c">3</a><a href="/d">4</a>"#;
        assert_eq!(
            absolutize(html, &AttributeRule::href(), BASE),
            concat!(
                r#"<a href="https://example.com/a">1</a>"#,
                r#"<a href="//b.org">2</a>"#,
                r#"<a href="http://c">3</a>"#,
                r#"<a href="https://example.com/d">4</a>"#,
            )
        );
    }

    #[test]
    fn protocol_relative_output_not_rewritten_again() {
        let out = absolutize(r#"href="cdn.net/a" href="cdn.net/b""#, &AttributeRule::href(), BASE);
        assert_eq!(out, r#"href="//cdn.net/a" href="//cdn.net/b""#);
    }

    #[test]
    fn src_rule() {
        assert_eq!(
            absolutize(r#"<img src="/assets/a.png">"#, &AttributeRule::src(), BASE),
            r#"<img src="https://example.com/assets/a.png">"#
        );
        assert_eq!(AttributeRule::src().prefix_len(), 5);
        assert_eq!(AttributeRule::href().prefix_len(), 6);
    }

    #[test]
    fn malformed_value_is_skipped() {
        let html = r#"<a href="http://exa mple.com">x</a><a href="/ok">y</a>"#;
        assert_eq!(
            absolutize(html, &AttributeRule::href(), BASE),
            r#"<a href="http://exa mple.com">x</a><a href="https://example.com/ok">y</a>"#
        );
    }

    #[test]
    fn malformed_relative_is_skipped() {
        let html = r#"<a href="//[bad">x</a>"#;
        assert_eq!(absolutize(html, &AttributeRule::href(), BASE), html);
    }

    #[test]
    fn multibyte_text_around_matches() {
        assert_eq!(
            absolutize(r#"é <a href="/ü">ß</a>"#, &AttributeRule::href(), BASE),
            r#"é <a href="https://example.com/ü">ß</a>"#
        );
    }

    #[test]
    fn custom_rule() {
        let rule = AttributeRule::new(r#"poster="([^"]+)""#, 8).unwrap();
        assert_eq!(
            absolutize(r#"<video poster="/p.jpg">"#, &rule, BASE),
            r#"<video poster="https://example.com/p.jpg">"#
        );
    }

    #[test]
    fn rule_needs_one_group() {
        assert!(AttributeRule::new(r#"href="[^"]+""#, 6).is_err());
        assert!(AttributeRule::new(r#"(a)(b)"#, 0).is_err());
        assert!(AttributeRule::new(r#"("#, 0).is_err());
    }

    #[test]
    fn empty_matches_advance_the_scan() {
        let rule = AttributeRule::new(r"(x*)", 0).unwrap();
        assert_eq!(absolutize("abc", &rule, BASE), "abc");
        assert_eq!(absolutize("é", &rule, BASE), "é");
        assert_eq!(absolutize("", &rule, BASE), "");

        let rule = AttributeRule::new(r"(x*)", 3).unwrap();
        assert_eq!(absolutize("ab", &rule, BASE), "ab");
    }

    #[test]
    fn wrong_prefix_len_skips_match() {
        let rule = AttributeRule::new(r#"href="([^"]+)""#, 5).unwrap();
        let html = r#"href="/x""#;
        assert_eq!(absolutize(html, &rule, BASE), html);
    }
}

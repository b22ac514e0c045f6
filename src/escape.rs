//! Final escaping of rendered content.

/// Escapes rendered content before it is cached and returned.
///
/// Called exactly once per pipeline run; implementations need not be
/// idempotent.
pub trait Escaper: Send + Sync {
    fn escape(&self, text: &str) -> String;
}

/// Neutralizes `[[…]]` translation tokens so user content can never be
/// resolved as a translation key.
///
/// ```
/// use post_parser::{Escaper, TranslatorEscaper};
///
/// assert_eq!(
///     TranslatorEscaper.escape("[[error:no-privileges]]"),
///     "&#91;&#91;error:no-privileges&#93;&#93;"
/// );
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TranslatorEscaper;

impl Escaper for TranslatorEscaper {
    fn escape(&self, text: &str) -> String {
        text.replace("[[", "&#91;&#91;").replace("]]", "&#93;&#93;")
    }
}

impl<F> Escaper for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn escape(&self, text: &str) -> String {
        self(text)
    }
}

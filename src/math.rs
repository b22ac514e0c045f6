//! `$$…$$` and `$…$` math expansion.
//!
//! Expansion is plain text substitution in two passes: block spans first,
//! then inline spans over the result. A span that fails to render is left as
//! its literal source and does not affect its neighbours.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::error::{PipelineError, Result};

static BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\$\$(.*?)\$\$").expect("static block pattern"));
static INLINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\$(.*?)\$").expect("static inline pattern"));

/// How a span is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathMode {
    /// `$$…$$`, rendered as a display block.
    Block,
    /// `$…$`, rendered in the line.
    Inline,
}

/// Renders math source into markup.
pub trait MathRenderer: Send + Sync {
    /// Render `source`, returning [`PipelineError::Render`] if it is malformed.
    fn render(&self, source: &str, mode: MathMode) -> Result<String>;
}

/// Renders MathML through KaTeX.
#[cfg(feature = "katex")]
#[derive(Debug, Clone, Copy, Default)]
pub struct KatexRenderer;

#[cfg(feature = "katex")]
impl MathRenderer for KatexRenderer {
    fn render(&self, source: &str, mode: MathMode) -> Result<String> {
        let opts = katex::Opts::builder()
            .display_mode(mode == MathMode::Block)
            .output_type(katex::OutputType::Mathml)
            .throw_on_error(true)
            .build()
            .map_err(|e| PipelineError::Render(e.to_string()))?;
        katex::render_with_opts(source, &opts).map_err(|e| PipelineError::Render(e.to_string()))
    }
}

/// Rejects every span, leaving math as typed.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledRenderer;

impl MathRenderer for DisabledRenderer {
    fn render(&self, _source: &str, _mode: MathMode) -> Result<String> {
        Err(PipelineError::Render("math rendering is disabled".into()))
    }
}

enum Piece {
    /// Eligible for the inline pass.
    Text(String),
    /// A block span that failed to render, kept verbatim.
    Literal(String),
}

/// Expand every math span in `text`.
pub fn expand(text: &str, renderer: &dyn MathRenderer) -> String {
    let mut pieces = Vec::new();
    let mut current = String::with_capacity(text.len());
    let mut last = 0;

    for caps in BLOCK.captures_iter(text) {
        let whole = caps.get(0).map_or(0..0, |m| m.range());
        current.push_str(&text[last..whole.start]);
        last = whole.end;

        match render_span(renderer, &caps[1], MathMode::Block) {
            Some(rendered) => current.push_str(&rendered),
            None => {
                pieces.push(Piece::Text(std::mem::take(&mut current)));
                pieces.push(Piece::Literal(caps[0].to_string()));
            }
        }
    }
    current.push_str(&text[last..]);
    pieces.push(Piece::Text(current));

    pieces
        .into_iter()
        .map(|piece| match piece {
            Piece::Text(text) => INLINE
                .replace_all(&text, |caps: &Captures| {
                    render_span(renderer, &caps[1], MathMode::Inline)
                        .unwrap_or_else(|| caps[0].to_string())
                })
                .into_owned(),
            Piece::Literal(text) => text,
        })
        .collect()
}

fn render_span(renderer: &dyn MathRenderer, source: &str, mode: MathMode) -> Option<String> {
    match renderer.render(source, mode) {
        // A raw `$` in the output would open a new inline span.
        Ok(markup) => Some(markup.replace('$', "&#36;")),
        Err(e) => {
            tracing::debug!("Leaving {mode:?} math unrendered: {e}");
            None
        }
    }
}

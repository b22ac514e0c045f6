//! # post_parser
//!
//! Renders user-submitted post bodies and signatures into HTML that is safe
//! to embed, with math expanded, profanity masked, and an extensible filter
//! chain in between.
//!
//! ## Overview
//!
//! A [`Parser`] runs each post through the same ordered stages:
//!
//! 1. content cache lookup by post id ([`CacheStore`]);
//! 2. the `parse.post` [filter chain](hooks), whose core stage runs the
//!    [`Sanitizer`] (profanity masking, then allow-list cleaning);
//! 3. `$$…$$` / `$…$` [math expansion](math);
//! 4. final escaping ([`Escaper`]);
//! 5. cache store.
//!
//! Signatures take a shorter path through `parse.signature` and are never
//! cached. Relative links can be made absolute with
//! [`Parser::relative_to_absolute`].
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use post_parser::{MemoryCache, ParserBuilder, PostData};
//!
//! # async fn example() -> post_parser::Result<()> {
//! let parser = ParserBuilder::new(MemoryCache::new())
//!     .base_url("https://forum.example.com")
//!     .build()
//!     .await?;
//!
//! let post = parser
//!     .parse_post(PostData::new(Some(1), "<p>Euler: $e^{i\\pi}+1=0$</p>"))
//!     .await?;
//! println!("{}", post.content);
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `katex` | **yes** | Enables [`KatexRenderer`](math::KatexRenderer) and makes it the default math renderer. Without it math is left as typed. |

pub mod cache;
pub mod config;
pub mod error;
pub mod escape;
pub mod hooks;
pub mod links;
pub mod math;
pub mod parser;
pub mod post;
pub mod sanitizer;

pub use cache::{CacheKey, CacheStore, MemoryCache};
pub use config::{ConfigStore, ParserBuilder, Settings};
pub use error::{BoxError, PipelineError, Result};
pub use escape::{Escaper, TranslatorEscaper};
pub use hooks::{Filter, FilterChain, Hooks, PostHookData, SignatureHookData};
pub use links::{AttributeRule, absolutize};
#[cfg(feature = "katex")]
pub use math::KatexRenderer;
pub use math::{DisabledRenderer, MathMode, MathRenderer, expand};
pub use parser::Parser;
pub use post::{OwnerId, PostData, SignatureData};
pub use sanitizer::{FinalizedPolicy, ProfanityFilter, SanitizePolicy, Sanitizer};

use std::any::Any;
use std::sync::OnceLock;

// Global state for the optional singleton pattern
static GLOBAL: OnceLock<Box<dyn Any + Send + Sync>> = OnceLock::new();

/// Build the global [`Parser`] singleton.
///
/// Call once at application startup, after every filter has been registered
/// on the builder. Afterwards any part of the application can reach the
/// parser through [`global()`].
///
/// Returns [`PipelineError::Config`] if a global parser already exists.
pub async fn init<C: CacheStore>(builder: ParserBuilder<C>) -> Result<&'static Parser<C>> {
    if GLOBAL.get().is_some() {
        return Err(PipelineError::Config(
            "global parser already initialized".into(),
        ));
    }

    let parser = builder.build().await?;
    GLOBAL
        .set(Box::new(parser))
        .map_err(|_| PipelineError::Config("global parser already initialized".into()))?;

    global::<C>().ok_or_else(|| PipelineError::Config("global parser type mismatch".into()))
}

/// Retrieve the global [`Parser`] previously built with [`init()`].
///
/// Returns `None` if [`init()`] has not been called or if the cache type `C`
/// does not match the one used during initialization.
pub fn global<C: CacheStore>() -> Option<&'static Parser<C>> {
    GLOBAL
        .get()
        .and_then(|any| any.downcast_ref::<Parser<C>>())
}

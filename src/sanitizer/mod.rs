//! HTML sanitization: profanity masking followed by allow-list cleaning.
//!
//! - [`SanitizePolicy`] / [`FinalizedPolicy`] -- the tag, attribute and class
//!   allow-list, frozen once finalized.
//! - [`ProfanityFilter`] -- word-list masking.
//! - [`Sanitizer`] -- runs both, in that order.
//! - [`strip_tags`] -- regex tag removal used for signatures.

mod policy;
mod profanity;
mod strip;

pub use policy::{FinalizedPolicy, SanitizePolicy};
pub use profanity::ProfanityFilter;
pub use strip::strip_tags;

use std::fmt;
use std::sync::Arc;

/// Applies a [`FinalizedPolicy`] to untrusted text.
///
/// Profanity masking always runs first. Its output is still treated as
/// untrusted, and the allow-list pass that follows is what makes the result
/// safe to embed.
///
/// # Example
///
/// ```
/// use post_parser::hooks::FilterChain;
/// use post_parser::{ProfanityFilter, SanitizePolicy, Sanitizer};
///
/// # async fn example() -> post_parser::Result<()> {
/// let policy = SanitizePolicy::default()
///     .finalize(&FilterChain::new("sanitize.config"))
///     .await?;
/// let sanitizer = Sanitizer::new(policy, ProfanityFilter::with_words(["darn"]));
/// assert_eq!(
///     sanitizer.apply(r#"<p onclick="x()">darn</p><script>x()</script>"#),
///     "<p>****</p>"
/// );
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Sanitizer {
    policy: FinalizedPolicy,
    profanity: ProfanityFilter,
    cleaner: Arc<ammonia::Builder<'static>>,
}

impl fmt::Debug for Sanitizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sanitizer")
            .field("policy", &self.policy)
            .field("profanity", &self.profanity)
            .finish_non_exhaustive()
    }
}

impl Sanitizer {
    pub fn new(policy: FinalizedPolicy, profanity: ProfanityFilter) -> Self {
        let cleaner = Arc::new(policy.cleaner());
        Self {
            policy,
            profanity,
            cleaner,
        }
    }

    pub fn policy(&self) -> &FinalizedPolicy {
        &self.policy
    }

    pub fn profanity(&self) -> &ProfanityFilter {
        &self.profanity
    }

    /// Mask profanity, then strip everything the policy does not allow.
    pub fn apply(&self, text: &str) -> String {
        let masked = self.profanity.mask(text);
        self.cleaner.clean(&masked).to_string()
    }
}

//! Settings and the builder that assembles a [`Parser`].

use std::collections::HashMap;
use std::sync::Arc;

use url::Url;

use crate::cache::CacheStore;
use crate::error::{BoxError, PipelineError, Result};
use crate::escape::{Escaper, TranslatorEscaper};
use crate::hooks::{Filter, Hooks, PostHookData, SignatureHookData};
use crate::math::MathRenderer;
use crate::parser::Parser;
use crate::sanitizer::{ProfanityFilter, SanitizePolicy, Sanitizer};

pub const BASE_URL_KEY: &str = "base_url";
pub const DISABLE_LINKS_KEY: &str = "signatures:disableLinks";
pub const DISABLE_IMAGES_KEY: &str = "signatures:disableImages";

/// Read-only application configuration lookup.
pub trait ConfigStore {
    fn get(&self, key: &str) -> Option<String>;
}

impl ConfigStore for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

impl ConfigStore for HashMap<&str, &str> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).map(|v| v.to_string())
    }
}

/// Site settings the pipeline reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    /// Prepended to site-relative links, without a trailing `/`.
    pub base_url: String,
    /// Strip `a` tags from signatures.
    pub disable_signature_links: bool,
    /// Strip `img` tags from signatures.
    pub disable_signature_images: bool,
}

impl Settings {
    /// Read settings from a configuration store.
    ///
    /// Flags accept `1`, `true`, `on` and `yes` (any case) as set.
    pub fn from_store(store: &impl ConfigStore) -> Result<Self> {
        let settings = Self {
            base_url: store.get(BASE_URL_KEY).unwrap_or_default(),
            disable_signature_links: store.get(DISABLE_LINKS_KEY).is_some_and(|v| truthy(&v)),
            disable_signature_images: store.get(DISABLE_IMAGES_KEY).is_some_and(|v| truthy(&v)),
        };
        settings.validated()
    }

    /// Check the base URL and trim its trailing `/`.
    pub(crate) fn validated(mut self) -> Result<Self> {
        let trimmed = self.base_url.trim().trim_end_matches('/');
        if !trimmed.is_empty() {
            Url::parse(trimmed)
                .map_err(|e| PipelineError::Config(format!("invalid base_url `{trimmed}`: {e}")))?;
        }
        self.base_url = trimmed.to_string();
        Ok(self)
    }
}

fn truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "on" | "yes"
    )
}

/// Builder for configuring and finalizing a [`Parser`].
///
/// Filters can only be registered here; once [`build`](Self::build) runs the
/// hook set is closed.
///
/// # Example
///
/// ```rust,no_run
/// use post_parser::{BoxError, MemoryCache, ParserBuilder, PostData};
///
/// # async fn example() -> post_parser::Result<()> {
/// let parser = ParserBuilder::new(MemoryCache::bounded(10_000))
///     .base_url("https://forum.example.com")
///     .disable_signature_images(true)
///     .filter_parse_post("emoji", |mut data: post_parser::hooks::PostHookData| async move {
///         data.post_data.content = data.post_data.content.replace(":)", "🙂");
///         Ok::<_, BoxError>(data)
///     })
///     .build()
///     .await?;
///
/// let post = parser.parse_post(PostData::new(Some(1), "hi :)")).await?;
/// # Ok(())
/// # }
/// ```
pub struct ParserBuilder<C: CacheStore> {
    cache: C,
    settings: Settings,
    policy: SanitizePolicy,
    profanity: ProfanityFilter,
    renderer: Box<dyn MathRenderer>,
    escaper: Box<dyn Escaper>,
    hooks: Hooks,
}

impl<C: CacheStore> ParserBuilder<C> {
    /// Create a builder with the given cache and defaults for everything else.
    ///
    /// Defaults: empty base URL, signature links and images allowed, the
    /// default sanitize policy and word list, KaTeX rendering when the
    /// `katex` feature is enabled, and [`TranslatorEscaper`].
    pub fn new(cache: C) -> Self {
        Self {
            cache,
            settings: Settings::default(),
            policy: SanitizePolicy::default(),
            profanity: ProfanityFilter::default(),
            renderer: default_renderer(),
            escaper: Box::new(TranslatorEscaper),
            hooks: Hooks::new(),
        }
    }

    /// Replace all settings at once.
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.settings.base_url = base_url.into();
        self
    }

    pub fn disable_signature_links(mut self, disable: bool) -> Self {
        self.settings.disable_signature_links = disable;
        self
    }

    pub fn disable_signature_images(mut self, disable: bool) -> Self {
        self.settings.disable_signature_images = disable;
        self
    }

    /// Starting allow-list, before global attributes are merged.
    pub fn policy(mut self, policy: SanitizePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn profanity(mut self, profanity: ProfanityFilter) -> Self {
        self.profanity = profanity;
        self
    }

    pub fn math_renderer(mut self, renderer: impl MathRenderer + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    pub fn escaper(mut self, escaper: impl Escaper + 'static) -> Self {
        self.escaper = Box::new(escaper);
        self
    }

    /// Register filters with explicit priorities.
    pub fn hooks(mut self, register: impl FnOnce(&mut Hooks)) -> Self {
        register(&mut self.hooks);
        self
    }

    pub fn filter_parse_post(
        mut self,
        plugin: impl Into<String>,
        filter: impl Filter<PostHookData> + 'static,
    ) -> Self {
        self.hooks.parse_post.register(plugin, filter);
        self
    }

    pub fn filter_parse_raw(
        mut self,
        plugin: impl Into<String>,
        filter: impl Filter<String> + 'static,
    ) -> Self {
        self.hooks.parse_raw.register(plugin, filter);
        self
    }

    pub fn filter_parse_aboutme(
        mut self,
        plugin: impl Into<String>,
        filter: impl Filter<String> + 'static,
    ) -> Self {
        self.hooks.parse_aboutme.register(plugin, filter);
        self
    }

    pub fn filter_parse_signature(
        mut self,
        plugin: impl Into<String>,
        filter: impl Filter<SignatureHookData> + 'static,
    ) -> Self {
        self.hooks.parse_signature.register(plugin, filter);
        self
    }

    pub fn filter_sanitize_config(
        mut self,
        plugin: impl Into<String>,
        filter: impl Filter<SanitizePolicy> + 'static,
    ) -> Self {
        self.hooks.sanitize_config.register(plugin, filter);
        self
    }

    /// Finalize the sanitize policy, register the core stages, and return
    /// the ready [`Parser`].
    ///
    /// Fails if the base URL is invalid or a `sanitize.config` filter errors.
    pub async fn build(self) -> Result<Parser<C>> {
        let settings = self.settings.validated()?;
        let mut hooks = self.hooks;

        let policy = self.policy.finalize(&hooks.sanitize_config).await?;
        let sanitizer = Arc::new(Sanitizer::new(policy, self.profanity));
        register_core_stages(&mut hooks, &sanitizer);

        tracing::info!(
            "Parser ready: {} parse.post filter(s), base_url `{}`",
            hooks.parse_post.len(),
            settings.base_url
        );

        Ok(Parser::new(
            settings,
            sanitizer,
            hooks,
            self.cache,
            self.renderer,
            self.escaper,
        ))
    }
}

fn register_core_stages(hooks: &mut Hooks, sanitizer: &Arc<Sanitizer>) {
    let s = sanitizer.clone();
    hooks.parse_post.register_core(move |mut data: PostHookData| {
        data.post_data.content = s.apply(&data.post_data.content);
        async move { Ok::<_, BoxError>(data) }
    });

    let s = sanitizer.clone();
    hooks.parse_raw.register_core(move |content: String| {
        let cleaned = s.apply(&content);
        async move { Ok::<_, BoxError>(cleaned) }
    });

    let s = sanitizer.clone();
    hooks.parse_aboutme.register_core(move |content: String| {
        let cleaned = s.apply(&content);
        async move { Ok::<_, BoxError>(cleaned) }
    });

    let s = sanitizer.clone();
    hooks.parse_signature.register_core(move |mut data: SignatureHookData| {
        data.user_data.signature = s.apply(&data.user_data.signature);
        async move { Ok::<_, BoxError>(data) }
    });
}

#[cfg(feature = "katex")]
fn default_renderer() -> Box<dyn MathRenderer> {
    Box::new(crate::math::KatexRenderer)
}

#[cfg(not(feature = "katex"))]
fn default_renderer() -> Box<dyn MathRenderer> {
    Box::new(crate::math::DisabledRenderer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;

    #[test]
    fn settings_from_store() {
        let store: HashMap<&str, &str> = HashMap::from([
            ("base_url", "https://forum.example.com/"),
            ("signatures:disableLinks", "1"),
            ("signatures:disableImages", "off"),
        ]);
        let settings = Settings::from_store(&store).unwrap();
        assert_eq!(settings.base_url, "https://forum.example.com");
        assert!(settings.disable_signature_links);
        assert!(!settings.disable_signature_images);
    }

    #[test]
    fn empty_store_gives_defaults() {
        let store: HashMap<String, String> = HashMap::new();
        assert_eq!(Settings::from_store(&store).unwrap(), Settings::default());
    }

    #[test]
    fn invalid_base_url_rejected() {
        let store: HashMap<&str, &str> = HashMap::from([("base_url", "not a url")]);
        assert!(matches!(
            Settings::from_store(&store),
            Err(PipelineError::Config(_))
        ));
    }

    #[test]
    fn truthy_values() {
        for v in ["1", "true", "TRUE", " on ", "yes"] {
            assert!(truthy(v), "{v} should be truthy");
        }
        for v in ["0", "false", "", "no", "off"] {
            assert!(!truthy(v), "{v} should be falsy");
        }
    }

    #[tokio::test]
    async fn build_rejects_bad_base_url() {
        let result = ParserBuilder::new(MemoryCache::new())
            .base_url("::nope")
            .build()
            .await;
        assert!(matches!(result, Err(PipelineError::Config(_))));
    }

    #[tokio::test]
    async fn build_registers_core_stages() {
        let parser = ParserBuilder::new(MemoryCache::new())
            .filter_parse_post("plugin", |data: PostHookData| async move {
                Ok::<_, BoxError>(data)
            })
            .build()
            .await
            .unwrap();
        assert_eq!(parser.hooks().parse_post.plugins(), vec!["core", "plugin"]);
        assert_eq!(parser.hooks().parse_raw.plugins(), vec!["core"]);
        assert_eq!(parser.hooks().parse_aboutme.plugins(), vec!["core"]);
        assert_eq!(parser.hooks().parse_signature.plugins(), vec!["core"]);
        assert!(parser.hooks().sanitize_config.is_empty());
    }
}

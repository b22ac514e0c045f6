//! The post rendering pipeline.

use std::sync::Arc;

use serde_json::Value;

use crate::cache::{CacheKey, CacheStore};
use crate::config::Settings;
use crate::error::Result;
use crate::escape::Escaper;
use crate::hooks::{Hooks, PostHookData, SignatureHookData};
use crate::links::{self, AttributeRule};
use crate::math::{self, MathRenderer};
use crate::post::{OwnerId, PostData, SignatureData};
use crate::sanitizer::{Sanitizer, strip_tags};

/// Renders user content into HTML that is safe to embed.
///
/// Built by [`ParserBuilder`](crate::ParserBuilder). A `Parser` is
/// `Send + Sync`; share it across tasks by reference or in an `Arc`.
pub struct Parser<C: CacheStore> {
    settings: Settings,
    sanitizer: Arc<Sanitizer>,
    hooks: Hooks,
    cache: C,
    renderer: Box<dyn MathRenderer>,
    escaper: Box<dyn Escaper>,
}

impl<C: CacheStore> Parser<C> {
    pub(crate) fn new(
        settings: Settings,
        sanitizer: Arc<Sanitizer>,
        hooks: Hooks,
        cache: C,
        renderer: Box<dyn MathRenderer>,
        escaper: Box<dyn Escaper>,
    ) -> Self {
        Self {
            settings,
            sanitizer,
            hooks,
            cache,
            renderer,
            escaper,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn sanitizer(&self) -> &Sanitizer {
        &self.sanitizer
    }

    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Render a post body.
    ///
    /// Cached posts are returned straight from the cache. Otherwise the
    /// content is run through `parse.post` (which sanitizes it), math is
    /// expanded, the result is escaped, and it is cached if the post has an
    /// id.
    pub async fn parse_post(&self, mut post: PostData) -> Result<PostData> {
        let key = post.cache_key();

        if let CacheKey::Identified(k) = &key {
            if let Some(cached) = self.cache.get(k).await {
                tracing::debug!("Cache hit for post {k}");
                post.content = cached;
                return Ok(post);
            }
        }

        let data = self
            .hooks
            .parse_post
            .fire(PostHookData { post_data: post })
            .await?;
        let mut post = data.post_data;

        post.content = math::expand(&post.content, self.renderer.as_ref());
        post.content = self.escaper.escape(&post.content);

        if let CacheKey::Identified(k) = &key {
            self.cache.set(k, post.content.clone()).await;
            tracing::debug!("Cached rendered post {k}");
        }

        Ok(post)
    }

    /// Render a post given as JSON.
    ///
    /// `null` is returned unchanged. Anything that is not an object, or has
    /// a non-string `content`, is rejected as invalid input.
    pub async fn parse_post_value(&self, value: Value) -> Result<Value> {
        if value.is_null() {
            return Ok(value);
        }
        let post = PostData::from_value(value)?;
        self.parse_post(post).await?.into_value()
    }

    /// Render a user signature.
    ///
    /// The signature is escaped, `a`/`img` tags are stripped according to
    /// the settings, and the result goes through `parse.signature`.
    /// Signatures are never cached.
    pub async fn parse_signature(
        &self,
        mut user_data: SignatureData,
        uid: Option<OwnerId>,
    ) -> Result<SignatureHookData> {
        user_data.signature = self.sanitize_signature(&user_data.signature);
        self.hooks
            .parse_signature
            .fire(SignatureHookData { user_data, uid })
            .await
    }

    fn sanitize_signature(&self, signature: &str) -> String {
        let escaped = self.escaper.escape(signature);

        let mut tags = Vec::new();
        if self.settings.disable_signature_links {
            tags.push("a");
        }
        if self.settings.disable_signature_images {
            tags.push("img");
        }

        strip_tags(&escaped, &tags)
    }

    /// Run raw content through `parse.raw`.
    pub async fn parse_raw(&self, content: impl Into<String>) -> Result<String> {
        self.hooks.parse_raw.fire(content.into()).await
    }

    /// Run a profile "about me" through `parse.aboutme`.
    pub async fn parse_aboutme(&self, content: impl Into<String>) -> Result<String> {
        self.hooks.parse_aboutme.fire(content.into()).await
    }

    /// Expand math in a post without any other pipeline stage.
    pub fn render_math(&self, mut post: PostData) -> PostData {
        post.content = math::expand(&post.content, self.renderer.as_ref());
        post
    }

    /// Make relative URLs matched by `rule` absolute against the base URL.
    pub fn relative_to_absolute(&self, content: &str, rule: &AttributeRule) -> String {
        links::absolutize(content, rule, &self.settings.base_url)
    }

    /// Mask profanity and apply the allow-list.
    pub fn sanitize(&self, content: &str) -> String {
        self.sanitizer.apply(content)
    }

    /// Mask profanity only.
    pub fn filter_profanity(&self, content: &str) -> String {
        self.sanitizer.profanity().mask(content)
    }
}

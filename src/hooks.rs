//! Named, ordered filter chains that external code can hook into.
//!
//! Every hook point owns a [`FilterChain`] typed by the payload it carries.
//! Filters run strictly one after another: each receives the output of the
//! previous one, and the first error aborts the chain.

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::error::{BoxError, PipelineError, Result};
use crate::post::{OwnerId, PostData, SignatureData};
use crate::sanitizer::SanitizePolicy;

pub const PARSE_POST: &str = "parse.post";
pub const PARSE_RAW: &str = "parse.raw";
pub const PARSE_ABOUTME: &str = "parse.aboutme";
pub const PARSE_SIGNATURE: &str = "parse.signature";
pub const SANITIZE_CONFIG: &str = "sanitize.config";

/// Priority used when none is given. Lower priorities run first.
pub const DEFAULT_PRIORITY: i32 = 10;

/// Plugin id the built-in stages are registered under.
pub const CORE_PLUGIN: &str = "core";

/// A single stage of a filter chain.
///
/// Implemented for every `Fn(T) -> Future<Output = Result<T, BoxError>>`, so
/// async closures can be registered directly:
///
/// ```
/// use post_parser::hooks::FilterChain;
///
/// # async fn example() {
/// let mut chain = FilterChain::<String>::new("parse.raw");
/// chain.register("shout", |text: String| async move {
///     Ok::<_, post_parser::BoxError>(text.to_uppercase())
/// });
/// assert_eq!(chain.fire("hi".to_string()).await.unwrap(), "HI");
/// # }
/// ```
pub trait Filter<T>: Send + Sync {
    fn apply(&self, payload: T) -> BoxFuture<'_, std::result::Result<T, BoxError>>;
}

impl<T, F, Fut> Filter<T> for F
where
    F: Fn(T) -> Fut + Send + Sync,
    Fut: Future<Output = std::result::Result<T, BoxError>> + Send + 'static,
{
    fn apply(&self, payload: T) -> BoxFuture<'_, std::result::Result<T, BoxError>> {
        Box::pin(self(payload))
    }
}

struct Registered<T> {
    plugin: String,
    priority: i32,
    seq: u64,
    filter: Arc<dyn Filter<T>>,
}

/// An ordered list of filters attached to one hook name.
///
/// Filters are ordered by priority, then by registration order.
pub struct FilterChain<T> {
    hook: &'static str,
    filters: Vec<Registered<T>>,
    next_seq: u64,
}

impl<T: Send + 'static> FilterChain<T> {
    /// Create an empty chain for `hook`.
    pub fn new(hook: &'static str) -> Self {
        Self {
            hook,
            filters: Vec::new(),
            // 0 is reserved for core stages so they lead their priority band.
            next_seq: 1,
        }
    }

    /// The hook name this chain is attached to.
    pub fn hook(&self) -> &'static str {
        self.hook
    }

    /// Register a filter at [`DEFAULT_PRIORITY`].
    pub fn register(&mut self, plugin: impl Into<String>, filter: impl Filter<T> + 'static) {
        self.register_with_priority(plugin, DEFAULT_PRIORITY, filter);
    }

    /// Register a filter at an explicit priority.
    pub fn register_with_priority(
        &mut self,
        plugin: impl Into<String>,
        priority: i32,
        filter: impl Filter<T> + 'static,
    ) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.insert(plugin.into(), priority, seq, Arc::new(filter));
    }

    pub(crate) fn register_core(&mut self, filter: impl Filter<T> + 'static) {
        self.insert(CORE_PLUGIN.to_string(), DEFAULT_PRIORITY, 0, Arc::new(filter));
    }

    fn insert(&mut self, plugin: String, priority: i32, seq: u64, filter: Arc<dyn Filter<T>>) {
        let at = self
            .filters
            .partition_point(|r| (r.priority, r.seq) <= (priority, seq));
        self.filters.insert(
            at,
            Registered {
                plugin,
                priority,
                seq,
                filter,
            },
        );
    }

    /// Plugin ids in execution order.
    pub fn plugins(&self) -> Vec<&str> {
        self.filters.iter().map(|r| r.plugin.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Run every filter in order, threading the payload through.
    pub async fn fire(&self, mut payload: T) -> Result<T> {
        for registered in &self.filters {
            payload = registered
                .filter
                .apply(payload)
                .await
                .map_err(|source| PipelineError::Filter {
                    hook: self.hook,
                    plugin: registered.plugin.clone(),
                    source,
                })?;
        }
        Ok(payload)
    }
}

/// Payload of the `parse.post` hook.
#[derive(Debug, Clone, PartialEq)]
pub struct PostHookData {
    pub post_data: PostData,
}

/// Payload of the `parse.signature` hook.
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureHookData {
    pub user_data: SignatureData,
    pub uid: Option<OwnerId>,
}

/// Every hook point the pipeline fires.
pub struct Hooks {
    pub parse_post: FilterChain<PostHookData>,
    pub parse_raw: FilterChain<String>,
    pub parse_aboutme: FilterChain<String>,
    pub parse_signature: FilterChain<SignatureHookData>,
    pub sanitize_config: FilterChain<SanitizePolicy>,
}

impl Hooks {
    pub fn new() -> Self {
        Self {
            parse_post: FilterChain::new(PARSE_POST),
            parse_raw: FilterChain::new(PARSE_RAW),
            parse_aboutme: FilterChain::new(PARSE_ABOUTME),
            parse_signature: FilterChain::new(PARSE_SIGNATURE),
            sanitize_config: FilterChain::new(SANITIZE_CONFIG),
        }
    }
}

impl Default for Hooks {
    fn default() -> Self {
        Self::new()
    }
}

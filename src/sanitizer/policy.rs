//! Allow-list configuration for the HTML sanitizer.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::{LazyLock, Mutex, PoisonError};

use crate::error::Result;
use crate::hooks::FilterChain;

/// Tags allowed by default, before the forum-specific additions.
const BASE_TAGS: &[&str] = &[
    "address", "article", "aside", "footer", "header", "h1", "h2", "h3", "h4", "h5", "h6",
    "hgroup", "main", "nav", "section", "blockquote", "dd", "div", "dl", "dt", "figcaption",
    "figure", "hr", "li", "ol", "p", "pre", "ul", "a", "abbr", "b", "bdi", "bdo", "br", "cite",
    "code", "data", "dfn", "em", "i", "kbd", "mark", "q", "rb", "rp", "rt", "rtc", "ruby", "s",
    "samp", "small", "span", "strong", "sub", "sup", "time", "u", "var", "wbr", "caption", "col",
    "colgroup", "table", "tbody", "td", "tfoot", "th", "thead", "tr",
];

const EXTRA_TAGS: &[&str] = &[
    "sup", "ins", "del", "img", "button", "video", "audio", "iframe", "embed",
];

const TAG_ATTRIBUTES: &[(&str, &[&str])] = &[
    ("a", &["href", "name", "hreflang", "media", "rel", "target", "type"]),
    ("img", &["alt", "height", "ismap", "src", "usemap", "width", "srcset"]),
    ("iframe", &["height", "name", "src", "width"]),
    (
        "video",
        &["autoplay", "controls", "height", "loop", "muted", "poster", "preload", "src", "width"],
    ),
    ("audio", &["autoplay", "controls", "loop", "muted", "preload", "src"]),
    ("embed", &["height", "src", "type", "width"]),
];

const GLOBAL_ATTRIBUTES: &[&str] = &[
    "accesskey", "class", "contenteditable", "dir", "draggable", "dropzone", "hidden", "id",
    "lang", "spellcheck", "style", "tabindex", "title", "translate", "aria-expanded", "data-*",
];

/// Tags whose content is dropped along with the tag unless explicitly allowed.
const CLEAN_CONTENT_TAGS: &[&str] = &["script", "style"];

/// Mutable allow-list, editable until [`finalize`](SanitizePolicy::finalize).
///
/// Attribute names ending in `*` match by prefix, so `data-*` allows every
/// `data-` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizePolicy {
    pub allowed_tags: BTreeSet<String>,
    pub allowed_attributes: BTreeMap<String, BTreeSet<String>>,
    pub allowed_classes: BTreeMap<String, BTreeSet<String>>,
    pub global_attributes: BTreeSet<String>,
}

impl SanitizePolicy {
    /// A policy that allows nothing.
    pub fn empty() -> Self {
        Self {
            allowed_tags: BTreeSet::new(),
            allowed_attributes: BTreeMap::new(),
            allowed_classes: BTreeMap::new(),
            global_attributes: BTreeSet::new(),
        }
    }

    pub fn allow_tags<I, S>(&mut self, tags: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn allow_attributes<I, S>(&mut self, tag: &str, attributes: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_attributes
            .entry(tag.to_string())
            .or_default()
            .extend(attributes.into_iter().map(Into::into));
        self
    }

    /// Restrict the `class` attribute of `tag` to the given class names.
    pub fn allow_classes<I, S>(&mut self, tag: &str, classes: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_classes
            .entry(tag.to_string())
            .or_default()
            .extend(classes.into_iter().map(Into::into));
        self
    }

    /// Union the global attributes into every allowed tag's attribute list.
    ///
    /// Idempotent.
    pub fn merge_global_attributes(&mut self) {
        for tag in &self.allowed_tags {
            self.allowed_attributes
                .entry(tag.clone())
                .or_default()
                .extend(self.global_attributes.iter().cloned());
        }
    }

    /// Merge global attributes, let `sanitize.config` filters adjust the
    /// result, and freeze it.
    pub async fn finalize(
        mut self,
        extensions: &FilterChain<SanitizePolicy>,
    ) -> Result<FinalizedPolicy> {
        self.merge_global_attributes();
        let policy = extensions.fire(self).await?;
        tracing::info!(
            "Sanitize policy finalized with {} tags after {} extension(s)",
            policy.allowed_tags.len(),
            extensions.len()
        );
        Ok(FinalizedPolicy { policy })
    }
}

impl Default for SanitizePolicy {
    fn default() -> Self {
        let mut policy = Self::empty();
        policy.allow_tags(BASE_TAGS.iter().chain(EXTRA_TAGS).copied());
        for (tag, attributes) in TAG_ATTRIBUTES {
            policy.allow_attributes(tag, attributes.iter().copied());
        }
        policy
            .global_attributes
            .extend(GLOBAL_ATTRIBUTES.iter().map(|a| a.to_string()));
        policy
    }
}

/// An allow-list that can no longer change.
///
/// Only obtainable through [`SanitizePolicy::finalize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedPolicy {
    policy: SanitizePolicy,
}

impl FinalizedPolicy {
    pub fn policy(&self) -> &SanitizePolicy {
        &self.policy
    }

    pub fn allows_tag(&self, tag: &str) -> bool {
        self.policy.allowed_tags.contains(tag)
    }

    /// Whether `attribute` may appear on `tag`, honouring prefix wildcards.
    pub fn allows_attribute(&self, tag: &str, attribute: &str) -> bool {
        self.policy.permits_attribute(tag, attribute)
    }

    /// Build the `ammonia` cleaner for this policy.
    ///
    /// Entries for tags outside `allowed_tags` are dropped. Wildcard
    /// attributes are handed to ammonia as generic prefixes, so an attribute
    /// filter narrows every attribute back to its own tag's allow-list.
    pub(crate) fn cleaner(&self) -> ammonia::Builder<'static> {
        let policy = &self.policy;

        let tags: HashSet<&'static str> = policy.allowed_tags.iter().map(|t| intern(t)).collect();

        let mut tag_attributes: HashMap<&'static str, HashSet<&'static str>> = HashMap::new();
        let mut prefixes: HashSet<&'static str> = HashSet::new();
        for (tag, attributes) in &policy.allowed_attributes {
            if !policy.allowed_tags.contains(tag) {
                continue;
            }
            let class_restricted = policy.allowed_classes.contains_key(tag);
            let allowed = tag_attributes.entry(intern(tag)).or_default();
            for attribute in attributes {
                if let Some(prefix) = attribute.strip_suffix('*') {
                    prefixes.insert(intern(prefix));
                } else if !(class_restricted && attribute == "class") {
                    allowed.insert(intern(attribute));
                }
            }
        }

        let classes: HashMap<&'static str, HashSet<&'static str>> = policy
            .allowed_classes
            .iter()
            .filter(|(tag, _)| policy.allowed_tags.contains(*tag))
            .map(|(tag, classes)| (intern(tag), classes.iter().map(|c| intern(c)).collect()))
            .collect();

        let clean_content: HashSet<&'static str> = CLEAN_CONTENT_TAGS
            .iter()
            .copied()
            .filter(|tag| !tags.contains(tag))
            .collect();

        let frozen = policy.clone();

        let mut builder = ammonia::Builder::default();
        builder
            .tags(tags)
            .clean_content_tags(clean_content)
            .tag_attributes(tag_attributes)
            .generic_attributes(HashSet::new())
            .generic_attribute_prefixes(prefixes)
            .allowed_classes(classes)
            .link_rel(None)
            .attribute_filter(move |element, attribute, value| {
                if frozen.permits_attribute(element, attribute) {
                    Some(value.into())
                } else {
                    None
                }
            });
        builder
    }
}

impl SanitizePolicy {
    /// A class-restricted tag always keeps `class`; ammonia filters its values.
    fn permits_attribute(&self, tag: &str, attribute: &str) -> bool {
        if attribute == "class" && self.allowed_classes.contains_key(tag) {
            return true;
        }
        self.allowed_attributes.get(tag).is_some_and(|allowed| {
            allowed.iter().any(|a| match a.strip_suffix('*') {
                Some(prefix) => attribute.starts_with(prefix),
                None => a == attribute,
            })
        })
    }
}

/// Tag, attribute and class names handed to ammonia.
///
/// Each distinct name is allocated once per process and lives for the rest
/// of it.
static NAMES: LazyLock<Mutex<HashSet<&'static str>>> = LazyLock::new(Default::default);

fn intern(name: &str) -> &'static str {
    let mut names = NAMES.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(&interned) = names.get(name) {
        return interned;
    }
    let interned: &'static str = Box::leak(name.to_owned().into_boxed_str());
    names.insert(interned);
    interned
}

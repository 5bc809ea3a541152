//! Metric name and tag resolution.
//!
//! A raw registry identifier such as `jvm.gc.G1-Young-Generation.count` is
//! turned into a display name plus tags (`jvm.gc.count`,
//! `collector:G1-Young-Generation`) by the first resolver in the chain that
//! recognizes it. Identifiers nobody recognizes are reported verbatim. The
//! reporter's global tags are appended after the resolver's own tags.

pub mod presets;
mod segment;

use thiserror::Error;

pub use segment::SegmentResolver;

/// Display name and tags derived from a registry identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricInfo {
    pub name: String,
    pub tags: Vec<String>,
}

impl MetricInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tags: Vec::new(),
        }
    }

    pub fn with_tag(mut self, label: &str, value: &str) -> Self {
        self.push_tag(format!("{label}:{value}"));
        self
    }

    fn push_tag(&mut self, tag: String) {
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to resolve metric `{metric}`: {reason}")]
pub struct ResolveError {
    pub metric: String,
    pub reason: String,
}

/// Strategy recognizing a family of metric identifiers.
///
/// Implementations must be free of side effects: they run once per metric on
/// every reporting cycle.
pub trait MetricInfoResolver: Send + Sync {
    fn can_resolve(&self, id: &str) -> bool;

    fn resolve(&self, id: &str) -> Result<MetricInfo, ResolveError>;
}

impl<R: MetricInfoResolver + ?Sized> MetricInfoResolver for Box<R> {
    fn can_resolve(&self, id: &str) -> bool {
        (**self).can_resolve(id)
    }

    fn resolve(&self, id: &str) -> Result<MetricInfo, ResolveError> {
        (**self).resolve(id)
    }
}

/// Ordered resolvers plus the global tags appended to every result.
#[derive(Default)]
pub struct ResolverChain {
    resolvers: Vec<Box<dyn MetricInfoResolver>>,
    global_tags: Vec<String>,
}

impl ResolverChain {
    pub fn new(resolvers: Vec<Box<dyn MetricInfoResolver>>, global_tags: Vec<String>) -> Self {
        Self {
            resolvers,
            global_tags,
        }
    }

    pub fn global_tags(&self) -> &[String] {
        &self.global_tags
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }

    /// First matching resolver wins, unmatched identifiers keep their name.
    /// An empty resulting name is an error.
    pub fn resolve(&self, id: &str) -> Result<MetricInfo, ResolveError> {
        let mut info = match self.resolvers.iter().find(|r| r.can_resolve(id)) {
            Some(resolver) => resolver.resolve(id)?,
            None => MetricInfo::new(id),
        };
        if info.name.is_empty() {
            return Err(ResolveError {
                metric: id.to_string(),
                reason: "resolved name is empty".to_string(),
            });
        }

        for tag in &self.global_tags {
            info.push_tag(tag.clone());
        }
        Ok(info)
    }
}

impl std::fmt::Debug for ResolverChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverChain")
            .field("resolvers", &self.resolvers.len())
            .field("global_tags", &self.global_tags)
            .finish()
    }
}

use super::MetricInfo;
use super::MetricInfoResolver;
use super::ResolveError;

/// Resolver lifting dot-separated identifier segments into tags.
///
/// For prefix `jvm.gc` and labels `["collector"]` the identifier
/// `jvm.gc.G1-Old-Generation.time` resolves to name `jvm.gc.time` with tag
/// `collector:G1-Old-Generation`. When nothing follows the labelled segments
/// the name is the prefix itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentResolver {
    prefix: String,
    labels: Vec<String>,
    allowed: Option<Vec<String>>,
}

impl SegmentResolver {
    pub fn new(prefix: impl Into<String>, labels: &[&str]) -> Self {
        Self {
            prefix: prefix.into(),
            labels: labels.iter().map(|l| l.to_string()).collect(),
            allowed: None,
        }
    }

    /// Only match when the first labelled segment is one of `values`.
    pub fn with_values(mut self, values: &[&str]) -> Self {
        self.allowed = Some(values.iter().map(|v| v.to_string()).collect());
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    // Segments following the prefix, `None` when the prefix does not match.
    fn segments<'a>(&self, id: &'a str) -> Option<Vec<&'a str>> {
        let rest = id.strip_prefix(self.prefix.as_str())?.strip_prefix('.')?;
        let segments: Vec<&str> = rest.split('.').collect();

        if segments.len() < self.labels.len() || segments.iter().any(|s| s.is_empty()) {
            return None;
        }
        if let (Some(allowed), Some(first)) = (&self.allowed, segments.first()) {
            if !allowed.iter().any(|a| a == first) {
                return None;
            }
        }
        Some(segments)
    }
}

impl MetricInfoResolver for SegmentResolver {
    fn can_resolve(&self, id: &str) -> bool {
        self.segments(id).is_some()
    }

    fn resolve(&self, id: &str) -> Result<MetricInfo, ResolveError> {
        let segments = self.segments(id).ok_or_else(|| ResolveError {
            metric: id.to_string(),
            reason: format!("identifier does not start with `{}.`", self.prefix),
        })?;

        let (captured, remainder) = segments.split_at(self.labels.len());
        let name = if remainder.is_empty() {
            self.prefix.clone()
        } else {
            format!("{}.{}", self.prefix, remainder.join("."))
        };

        Ok(self
            .labels
            .iter()
            .zip(captured)
            .fold(MetricInfo::new(name), |info, (label, value)| {
                info.with_tag(label, value)
            }))
    }
}

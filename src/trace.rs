//! Trace annotations and metadata for the current invocation.
//!
//! Annotations are small indexed values (strings, numbers) used to search
//! traces; metadata holds arbitrary JSON for inspection. Both are emitted as
//! one structured event under the `xray` target when the invocation ends.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Log target segments are emitted on.
pub const TRACE_TARGET: &str = "xray";

/// Log filter for the service: `RUST_LOG` when given, `info` otherwise. The
/// trace target is always let through so segments survive a quieter level.
pub fn log_filter(directives: Option<&str>) -> EnvFilter {
    let base = directives.filter(|d| !d.trim().is_empty()).unwrap_or("info");
    EnvFilter::new(format!("{base},{TRACE_TARGET}=info"))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Annotation {
    Str(String),
    Int(i64),
}

impl From<&str> for Annotation {
    fn from(s: &str) -> Self {
        Annotation::Str(s.to_string())
    }
}

impl From<String> for Annotation {
    fn from(s: String) -> Self {
        Annotation::Str(s)
    }
}

impl From<i64> for Annotation {
    fn from(n: i64) -> Self {
        Annotation::Int(n)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Segment {
    annotations: BTreeMap<String, Annotation>,
    metadata: BTreeMap<String, Value>,
}

impl Segment {
    pub fn put_annotation(&mut self, key: &str, value: impl Into<Annotation>) {
        self.annotations.insert(key.to_string(), value.into());
    }

    pub fn put_metadata<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) {
        match serde_json::to_value(value) {
            Ok(v) => {
                self.metadata.insert(key.to_string(), v);
            }
            Err(e) => warn!(key, error = %e, "dropping unserializable trace metadata"),
        }
    }

    pub fn annotation(&self, key: &str) -> Option<&Annotation> {
        self.annotations.get(key)
    }

    pub fn metadata(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty() && self.metadata.is_empty()
    }

    pub fn flush(&mut self) {
        if self.is_empty() {
            return;
        }
        let annotations = serde_json::to_string(&self.annotations).unwrap_or_default();
        let metadata = serde_json::to_string(&self.metadata).unwrap_or_default();
        info!(target: TRACE_TARGET, annotations = %annotations, metadata = %metadata, "segment");
        self.annotations.clear();
        self.metadata.clear();
    }
}

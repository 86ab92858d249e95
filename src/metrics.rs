//! Per-invocation counters, published as one CloudWatch Embedded Metric
//! Format (EMF) record on stdout when the invocation ends. The Lambda log
//! agent turns that record into CloudWatch metrics; no API calls are made.

use std::io::Write;

use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

/// Counters for a single invocation. Every counter shares the same set of
/// dimensions, which always starts with `service`.
#[derive(Debug, Clone)]
pub struct Metrics {
    namespace: String,
    dimensions: Vec<(String, String)>,
    counts: Vec<(&'static str, u64)>,
}

impl Metrics {
    pub fn new(namespace: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            dimensions: vec![("service".to_string(), service.into())],
            counts: Vec::new(),
        }
    }

    /// Add or replace a dimension.
    pub fn add_dimension(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.dimensions.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value,
            None => self.dimensions.push((name.to_string(), value)),
        }
    }

    /// Add `value` to the counter `name`.
    pub fn add_count(&mut self, name: &'static str, value: u64) {
        match self.counts.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 += value,
            None => self.counts.push((name, value)),
        }
    }

    pub fn count(&self, name: &str) -> Option<u64> {
        self.counts
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| *v)
    }

    pub fn dimension(&self, name: &str) -> Option<&str> {
        self.dimensions
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// The EMF record for the counters collected so far, or `None` if there
    /// is nothing to publish.
    pub fn to_emf(&self, timestamp_ms: i64) -> Option<Value> {
        if self.counts.is_empty() {
            return None;
        }
        let dimension_names: Vec<&str> = self.dimensions.iter().map(|(n, _)| n.as_str()).collect();
        let definitions: Vec<Value> = self
            .counts
            .iter()
            .map(|(name, _)| json!({"Name": name, "Unit": "Count"}))
            .collect();

        let mut record = Map::new();
        record.insert(
            "_aws".into(),
            json!({
                "Timestamp": timestamp_ms,
                "CloudWatchMetrics": [{
                    "Namespace": self.namespace,
                    "Dimensions": [dimension_names],
                    "Metrics": definitions,
                }],
            }),
        );
        for (name, value) in &self.dimensions {
            record.insert(name.clone(), Value::from(value.as_str()));
        }
        for (name, value) in &self.counts {
            record.insert((*name).to_string(), Value::from(*value));
        }
        Some(Value::Object(record))
    }

    /// Write the EMF record to stdout and reset the counters.
    pub fn flush(&mut self) {
        // EMF has to be a bare JSON line, so it bypasses the log formatter.
        self.publish(&mut std::io::stdout().lock(), Utc::now().timestamp_millis());
    }

    fn publish(&mut self, out: &mut impl Write, timestamp_ms: i64) {
        match self.to_emf(timestamp_ms) {
            Some(record) => {
                if let Err(e) = writeln!(out, "{record}") {
                    warn!(error = %e, "dropping metrics record");
                }
            }
            None => debug!("no metrics to publish"),
        }
        self.counts.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_metrics_publish_nothing() {
        let m = Metrics::new("NotesApp", "NotesApi");
        assert!(m.is_empty());
        assert_eq!(m.to_emf(0), None);
    }

    #[test]
    fn emf_record_layout() {
        let mut m = Metrics::new("NotesApp", "NotesApi");
        m.add_dimension("user_id", "u1");
        m.add_count("NoteCreated", 1);

        let emf = m.to_emf(1_700_000_000_000).unwrap();
        assert_eq!(
            emf,
            json!({
                "_aws": {
                    "Timestamp": 1_700_000_000_000i64,
                    "CloudWatchMetrics": [{
                        "Namespace": "NotesApp",
                        "Dimensions": [["service", "user_id"]],
                        "Metrics": [{"Name": "NoteCreated", "Unit": "Count"}],
                    }],
                },
                "service": "NotesApi",
                "user_id": "u1",
                "NoteCreated": 1,
            })
        );
    }

    #[test]
    fn counts_accumulate_and_dimensions_replace() {
        let mut m = Metrics::new("NotesApp", "NotesApi");
        m.add_dimension("user_id", "u1");
        m.add_dimension("user_id", "u2");
        m.add_count("NotesListed", 3);
        m.add_count("NotesListed", 2);
        assert_eq!(m.dimension("user_id"), Some("u2"));
        assert_eq!(m.count("NotesListed"), Some(5));
    }

    #[test]
    fn flush_resets_counts() {
        let mut m = Metrics::new("NotesApp", "NotesApi");
        m.add_count("NoteDeleted", 1);
        m.flush();
        assert!(m.is_empty());
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn publish_writes_one_line_per_record() {
        let mut m = Metrics::new("NotesApp", "NotesApi");
        m.add_count("NoteCreated", 1);
        let mut out = Vec::new();
        m.publish(&mut out, 1_700_000_000_000);
        let line = String::from_utf8(out).unwrap();
        assert_eq!(line.lines().count(), 1);
        let record: Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(record["NoteCreated"], 1);
        assert!(m.is_empty());
    }

    #[test]
    fn publish_survives_a_closed_stdout() {
        let mut m = Metrics::new("NotesApp", "NotesApi");
        m.add_count("NoteDeleted", 1);
        m.publish(&mut ClosedPipe, 1_700_000_000_000);
        assert!(m.is_empty());
    }
}

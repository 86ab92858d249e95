use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name}={value:?} is not one of {expected}")]
    Invalid {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Dynamodb,
    /// Process-local table; lost on cold start. For local runs only.
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Process configuration, read once from the environment at cold start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub table: String,
    pub note_id_index: String,
    pub store: StoreKind,
    pub service_name: String,
    pub metrics_namespace: String,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |k: &str| lookup(k).filter(|v| !v.trim().is_empty());

        let table = var("NOTES_TABLE").ok_or(ConfigError::Missing("NOTES_TABLE"))?;
        let store = match var("NOTES_STORE").as_deref() {
            None | Some("dynamodb") => StoreKind::Dynamodb,
            Some("memory") => StoreKind::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "NOTES_STORE",
                    value: other.to_string(),
                    expected: "dynamodb, memory",
                })
            }
        };
        let log_format = match var("LOG_FORMAT").as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "LOG_FORMAT",
                    value: other.to_string(),
                    expected: "text, json",
                })
            }
        };

        Ok(Self {
            table,
            note_id_index: var("NOTES_NOTE_ID_INDEX").unwrap_or_else(|| "note_id-index".into()),
            store,
            service_name: var("POWERTOOLS_SERVICE_NAME").unwrap_or_else(|| "NotesApi".into()),
            metrics_namespace: var("POWERTOOLS_METRICS_NAMESPACE")
                .unwrap_or_else(|| "NotesApp".into()),
            log_format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults() {
        let c = config(&[("NOTES_TABLE", "notes")]).unwrap();
        assert_eq!(c.table, "notes");
        assert_eq!(c.note_id_index, "note_id-index");
        assert_eq!(c.store, StoreKind::Dynamodb);
        assert_eq!(c.service_name, "NotesApi");
        assert_eq!(c.metrics_namespace, "NotesApp");
        assert_eq!(c.log_format, LogFormat::Text);
    }

    #[test]
    fn table_is_required() {
        assert_eq!(config(&[]), Err(ConfigError::Missing("NOTES_TABLE")));
        assert_eq!(
            config(&[("NOTES_TABLE", " ")]),
            Err(ConfigError::Missing("NOTES_TABLE"))
        );
    }

    #[test]
    fn overrides() {
        let c = config(&[
            ("NOTES_TABLE", "notes-dev"),
            ("NOTES_NOTE_ID_INDEX", "by-note"),
            ("NOTES_STORE", "memory"),
            ("LOG_FORMAT", "json"),
            ("POWERTOOLS_METRICS_NAMESPACE", "Dev"),
        ])
        .unwrap();
        assert_eq!(c.note_id_index, "by-note");
        assert_eq!(c.store, StoreKind::Memory);
        assert_eq!(c.log_format, LogFormat::Json);
        assert_eq!(c.metrics_namespace, "Dev");
    }

    #[test]
    fn rejects_unknown_store() {
        assert!(matches!(
            config(&[("NOTES_TABLE", "notes"), ("NOTES_STORE", "redis")]),
            Err(ConfigError::Invalid {
                name: "NOTES_STORE",
                ..
            })
        ));
    }
}

use std::collections::BTreeMap;

use guide_core::model::{ProgressRecord, SectionId};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::repository::StorageError;

/// Persisted shape of a progress record.
///
/// Mirrors `ProgressRecord` with string keys so that stored data written by
/// older or newer schemas still loads: unknown sections, unknown top-level
/// fields, malformed challenge keys and non-boolean flags are dropped,
/// missing fields default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgressDocument {
    #[serde(serialize_with = "label_as_string")]
    pub visitor_label: Option<String>,
    pub visited_sections: BTreeMap<String, Value>,
    pub active_section: Option<String>,
    pub challenge_completion: BTreeMap<String, Value>,
}

impl ProgressDocument {
    #[must_use]
    pub fn from_record(record: &ProgressRecord) -> Self {
        Self {
            visitor_label: record.visitor_label().map(str::to_owned),
            visited_sections: record
                .visited_sections()
                .iter()
                .map(|(id, seen)| (id.as_str().to_owned(), Value::Bool(*seen)))
                .collect(),
            active_section: record.active_section().map(|id| id.as_str().to_owned()),
            challenge_completion: record
                .challenge_completion()
                .iter()
                .map(|(idx, done)| (idx.to_string(), Value::Bool(*done)))
                .collect(),
        }
    }

    /// Convert into a domain record, gap-filling against the current section set.
    #[must_use]
    pub fn into_record(self) -> ProgressRecord {
        let visited = self.visited_sections.into_iter().filter_map(|(key, seen)| {
            let Some(id) = SectionId::from_name(&key) else {
                tracing::debug!(section = %key, "ignoring unknown section in stored progress");
                return None;
            };
            flag(&key, &seen).map(|seen| (id, seen))
        });

        let active = self.active_section.as_deref().and_then(|name| {
            let id = SectionId::from_name(name);
            if id.is_none() && !name.is_empty() {
                tracing::debug!(section = %name, "ignoring unknown active section in stored progress");
            }
            id
        });

        let challenges = self
            .challenge_completion
            .into_iter()
            .filter_map(|(key, done)| match key.trim().parse::<u32>() {
                Ok(idx) => flag(&key, &done).map(|done| (idx, done)),
                Err(_) => {
                    tracing::debug!(key = %key, "ignoring malformed challenge key in stored progress");
                    None
                }
            });

        ProgressRecord::from_persisted(self.visitor_label, visited, active, challenges)
    }
}

fn flag(key: &str, value: &Value) -> Option<bool> {
    let flag = value.as_bool();
    if flag.is_none() {
        tracing::debug!(key, %value, "ignoring non-boolean flag in stored progress");
    }
    flag
}

fn label_as_string<S: Serializer>(label: &Option<String>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(label.as_deref().unwrap_or(""))
}

/// Serialize a record into its stored JSON payload.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if encoding fails.
pub fn encode(record: &ProgressRecord) -> Result<String, StorageError> {
    serde_json::to_string(&ProgressDocument::from_record(record))
        .map_err(|err| StorageError::Serialization(err.to_string()))
}

/// Parse a stored JSON payload into a record.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if the payload is not a JSON object
/// matching the document shape.
pub fn decode(payload: &str) -> Result<ProgressRecord, StorageError> {
    let value: Value = serde_json::from_str(payload)
        .map_err(|err| StorageError::Serialization(err.to_string()))?;
    if !value.is_object() {
        return Err(StorageError::Serialization(
            "stored progress is not a JSON object".into(),
        ));
    }
    serde_json::from_value::<ProgressDocument>(value)
        .map(ProgressDocument::into_record)
        .map_err(|err| StorageError::Serialization(err.to_string()))
}

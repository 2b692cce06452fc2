// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Records exchanged with the remote logging service.
//!
//! Logs are typed records that keep unknown fields in `extra`. Entries are kept as the raw object
//! the service sent, so they go back to the browser exactly as the service produced them.

use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Kind tag of the log that collects telemetry from tools that don't know about catalogs.
pub const DEFAULT_LOG_GENUS_TYPE: &str = "log-genus-type%3Adefault-clix%40ODL.MIT.EDU";
pub const DEFAULT_LOG_NAME: &str = "Default CLIx log";
pub const DEFAULT_LOG_DESCRIPTION: &str =
    "For logging info from unplatform and tools, which do not know about catalog IDs";

/// Localized text as the logging service represents names, descriptions and entry blobs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayText {
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_type_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_type_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_type_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Log {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genus_type_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<DisplayText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<DisplayText>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Log {
    pub fn is_default(&self) -> bool {
        self.genus_type_id.as_deref() == Some(DEFAULT_LOG_GENUS_TYPE)
    }
}

/// Creation time of an entry, broken down the way the service reports it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EntryTimestamp {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    #[serde(default)]
    pub microsecond: u32,
}

/// A log entry exactly as the logging service sent it.
///
/// The object is kept whole and serialized back untouched; the accessors below are read-only
/// typed views over it. The only shape enforced on decode is an object with a string `id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct LogEntry {
    raw: Map<String, Value>,
}

impl<'de> Deserialize<'de> for LogEntry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Map::<String, Value>::deserialize(deserializer)?;
        if !raw.get("id").is_some_and(Value::is_string) {
            return Err(de::Error::missing_field("id"));
        }
        Ok(LogEntry { raw })
    }
}

impl LogEntry {
    pub fn id(&self) -> &str {
        self.raw.get("id").and_then(Value::as_str).unwrap_or_default()
    }

    /// Owning identity, set by the service from the identity header.
    pub fn agent_id(&self) -> Option<&str> {
        self.raw.get("agentId").and_then(Value::as_str)
    }

    pub fn assigned_log_ids(&self) -> Vec<&str> {
        self.raw
            .get("assignedLogIds")
            .and_then(Value::as_array)
            .map(|ids| ids.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// `None` when absent or not shaped like a display text.
    pub fn text(&self) -> Option<DisplayText> {
        self.typed_field("text")
    }

    /// `None` when absent or not a broken-down timestamp.
    pub fn timestamp(&self) -> Option<EntryTimestamp> {
        self.typed_field("timestamp")
    }

    /// Decodes the caller's payload, JSON encoded into `text.text`. `None` when the entry
    /// carries no text blob.
    pub fn payload(&self) -> Option<serde_json::Result<Value>> {
        self.text().map(|text| serde_json::from_str(&text.text))
    }

    pub fn as_object(&self) -> &Map<String, Value> {
        &self.raw
    }

    fn typed_field<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.raw
            .get(key)
            .and_then(|value| T::deserialize(value).ok())
    }
}

/// Body of a create-log call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLog {
    pub name: String,
    pub description: String,
    pub genus_type_id: String,
}

impl NewLog {
    pub fn default_log() -> Self {
        NewLog {
            name: DEFAULT_LOG_NAME.to_string(),
            description: DEFAULT_LOG_DESCRIPTION.to_string(),
            genus_type_id: DEFAULT_LOG_GENUS_TYPE.to_string(),
        }
    }
}

/// Body of a create-entry call: `{"data": <payload>}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewLogEntry {
    pub data: Map<String, Value>,
}

/// Body returned in place of an entry when the logging service could not be reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureReport {
    pub msg: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_entry() -> Value {
        json!({
            "id": "logging.LogEntry%3A57bfcc5ced849b11f52fc82a%40ODL.MIT.EDU",
            "displayName": {"text": "", "languageTypeId": "639-2%3AENG%40ISO"},
            "recordTypeIds": ["logging.LogEntry%3Atext-blob%40ODL.MIT.EDU"],
            "text": {
                "text": "{\"action\": \"pause audio\", \"mediaTime\": 9.142857}",
                "languageTypeId": "639-2%3AENG%40ISO",
                "formatTypeId": "TextFormats%3APLAIN%40okapia.net",
                "scriptTypeId": "15924%3ALATN%40ISO"
            },
            "priorityId": "NoneType%3ANONE%40dlkit.mit.edu",
            "genusTypeId": "GenusType%3ADEFAULT%40DLKIT.MIT.EDU",
            "timestamp": {
                "hour": 4, "month": 8, "second": 4, "microsecond": 157476,
                "year": 2016, "tzinfo": null, "day": 26, "minute": 58
            },
            "assignedLogIds": ["logging.Log%3A57b9547bed849b7a4208596b%40ODL.MIT.EDU"],
            "agentId": "osid.agent.Agent%3Aexternal_identifier%40MIT-ODL"
        })
    }

    #[test]
    fn test_entry_survives_echo_unchanged() {
        let entry: LogEntry = serde_json::from_value(sample_entry()).unwrap();
        assert_eq!(
            entry.agent_id(),
            Some("osid.agent.Agent%3Aexternal_identifier%40MIT-ODL")
        );
        assert_eq!(
            entry.assigned_log_ids(),
            vec!["logging.Log%3A57b9547bed849b7a4208596b%40ODL.MIT.EDU"]
        );
        let timestamp = entry.timestamp().unwrap();
        assert_eq!((timestamp.year, timestamp.month, timestamp.day), (2016, 8, 26));
        assert_eq!(timestamp.microsecond, 157476);
        assert_eq!(serde_json::to_value(&entry).unwrap(), sample_entry());
    }

    #[test]
    fn test_entry_keeps_nulls_and_missing_fields() {
        let remote = json!({
            "id": "e1",
            "agentId": null,
            "timestamp": {
                "year": 2016, "month": 8, "day": 26, "hour": 4, "minute": 58, "second": 4
            }
        });
        let entry: LogEntry = serde_json::from_value(remote.clone()).unwrap();
        assert_eq!(entry.agent_id(), None);
        assert_eq!(entry.timestamp().unwrap().microsecond, 0);
        assert_eq!(serde_json::to_value(&entry).unwrap(), remote);
    }

    #[test]
    fn test_entry_with_unexpected_field_shapes() {
        let remote = json!({
            "id": "e2",
            "timestamp": "2016-08-26T04:58:04Z",
            "text": "plain",
            "assignedLogIds": "foo"
        });
        let entry: LogEntry = serde_json::from_value(remote.clone()).unwrap();
        assert!(entry.timestamp().is_none());
        assert!(entry.text().is_none());
        assert!(entry.payload().is_none());
        assert!(entry.assigned_log_ids().is_empty());
        assert_eq!(serde_json::to_value(&entry).unwrap(), remote);
    }

    #[test]
    fn test_entry_requires_string_id() {
        assert!(serde_json::from_value::<LogEntry>(json!({"agentId": "a"})).is_err());
        assert!(serde_json::from_value::<LogEntry>(json!({"id": 7})).is_err());
        assert!(serde_json::from_value::<LogEntry>(json!(["id"])).is_err());
    }

    #[test]
    fn test_entry_payload_decodes_blob() {
        let entry: LogEntry = serde_json::from_value(sample_entry()).unwrap();
        let payload = entry.payload().unwrap().unwrap();
        assert_eq!(payload, json!({"action": "pause audio", "mediaTime": 9.142857}));
    }

    #[test]
    fn test_entry_with_only_an_id() {
        let entry: LogEntry = serde_json::from_value(json!({"id": "foo"})).unwrap();
        assert_eq!(entry.id(), "foo");
        assert!(entry.payload().is_none());
        assert_eq!(serde_json::to_value(&entry).unwrap(), json!({"id": "foo"}));
    }

    #[test]
    fn test_default_log_detection() {
        let log: Log = serde_json::from_value(json!({
            "id": "foo",
            "genusTypeId": DEFAULT_LOG_GENUS_TYPE
        }))
        .unwrap();
        assert!(log.is_default());

        let other: Log = serde_json::from_value(json!({
            "id": "bar",
            "genusTypeId": "log-genus-type%3Aother%40ODL.MIT.EDU"
        }))
        .unwrap();
        assert!(!other.is_default());

        let untagged: Log = serde_json::from_value(json!({"id": "baz"})).unwrap();
        assert!(!untagged.is_default());
    }

    #[test]
    fn test_new_log_wire_format() {
        assert_eq!(
            serde_json::to_value(NewLog::default_log()).unwrap(),
            json!({
                "name": "Default CLIx log",
                "description": "For logging info from unplatform and tools, which do not know about catalog IDs",
                "genusTypeId": "log-genus-type%3Adefault-clix%40ODL.MIT.EDU"
            })
        );
    }
}

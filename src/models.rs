//! Records shared by the model, the JSON data file and the HTTP API
//!
//! All records serialize with camelCase field names. Timestamps are Unix
//! milliseconds so data files written by older clients load unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named node in the folder tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: String,
    pub name: String,
    /// Parent folder; `None` means root-level
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Rank among siblings sharing the same parent
    #[serde(default)]
    pub order: u32,
    /// Display flag only, not part of the tree structure
    #[serde(default = "default_expanded")]
    pub expanded: bool,
}

fn default_expanded() -> bool {
    true
}

/// An immutable snapshot of a prompt's content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptVersion {
    pub version: u32,
    pub name: String,
    pub text: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

/// A named, versioned text snippet with a usage counter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prompt {
    pub id: String,
    pub name: String,
    pub text: String,
    #[serde(default)]
    pub folder_id: Option<String>,
    #[serde(default)]
    pub usage_count: u64,
    /// Append-only history, version numbers strictly increasing from 1
    pub versions: Vec<PromptVersion>,
    pub current_version: u32,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub last_used_at: Option<DateTime<Utc>>,
}

impl Prompt {
    /// The version entry `current_version` points at
    pub fn current(&self) -> Option<&PromptVersion> {
        self.version(self.current_version)
    }

    pub fn version(&self, number: u32) -> Option<&PromptVersion> {
        self.versions.iter().find(|v| v.version == number)
    }

    /// Highest version number in the history
    pub fn latest_version(&self) -> u32 {
        self.versions.iter().map(|v| v.version).max().unwrap_or(0)
    }

    /// Text shortened to `max_chars` characters, with `...` when cut
    pub fn preview(&self, max_chars: usize) -> String {
        let mut chars = self.text.chars();
        let head: String = chars.by_ref().take(max_chars).collect();
        if chars.next().is_some() {
            format!("{}...", head)
        } else {
            head
        }
    }
}

/// The full record set: the "get snapshot" payload and the stored document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub folders: Vec<Folder>,
    #[serde(default)]
    pub prompts: Vec<Prompt>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_prompt(text: &str) -> Prompt {
        let timestamp = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        Prompt {
            id: "p1".to_string(),
            name: "Greeting".to_string(),
            text: text.to_string(),
            folder_id: None,
            usage_count: 0,
            versions: vec![PromptVersion {
                version: 1,
                name: "Greeting".to_string(),
                text: text.to_string(),
                timestamp,
            }],
            current_version: 1,
            last_used_at: None,
        }
    }

    #[test]
    fn test_prompt_serializes_camel_case() {
        let prompt = sample_prompt("hello");
        let value = serde_json::to_value(&prompt).unwrap();

        assert_eq!(value["folderId"], serde_json::Value::Null);
        assert_eq!(value["usageCount"], 0);
        assert_eq!(value["currentVersion"], 1);
        assert_eq!(value["versions"][0]["timestamp"], 1_700_000_000_000i64);
        assert!(value.get("lastUsedAt").is_none());
        assert!(value.get("folder_id").is_none());
    }

    #[test]
    fn test_folder_defaults_when_fields_missing() {
        let folder: Folder = serde_json::from_str(r#"{"id":"f1","name":"Work"}"#).unwrap();
        assert_eq!(folder.parent_id, None);
        assert_eq!(folder.order, 0);
        assert!(folder.expanded);
    }

    #[test]
    fn test_preview_is_char_safe() {
        let prompt = sample_prompt("héllo wörld");
        assert_eq!(prompt.preview(5), "héllo...");
        assert_eq!(prompt.preview(50), "héllo wörld");
    }

    #[test]
    fn test_current_version_lookup() {
        let prompt = sample_prompt("hello");
        assert_eq!(prompt.current().map(|v| v.version), Some(1));
        assert!(prompt.version(2).is_none());
        assert_eq!(prompt.latest_version(), 1);
    }
}

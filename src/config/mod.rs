//! Configuration management.
//!
//! One [`StoreConfig`] exists per repository, stored as `config.json` in the
//! data directory. Every section is deserialized with `#[serde(default)]`, so
//! an older or hand-edited file is merged field-by-field with the defaults.

mod store;

pub use store::ConfigurationStore;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Current configuration format version.
pub const CONFIG_VERSION: u32 = 1;

/// Tool names that are enabled by default.
pub const DEFAULT_TOOLS: &[&str] = &[
    "save_note",
    "get_notes",
    "delete_note",
    "mark_reviewed",
    "tags",
    "coverage",
    "configuration",
];

/// Per-repository configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoreConfig {
    /// Format version.
    pub version: u32,
    /// Size limits applied by validation.
    pub limits: Limits,
    /// Storage behaviour.
    pub storage: StorageSettings,
    /// Tag vocabulary enforcement.
    pub tags: TagSettings,
    /// Guidance token gate.
    pub guidance: GuidanceSettings,
    /// Tool enablement by name. Unknown names are kept as written.
    pub tools: BTreeMap<String, bool>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            limits: Limits::default(),
            storage: StorageSettings::default(),
            tags: TagSettings::default(),
            guidance: GuidanceSettings::default(),
            tools: DEFAULT_TOOLS
                .iter()
                .map(|name| ((*name).to_string(), true))
                .collect(),
        }
    }
}

impl StoreConfig {
    /// Returns whether a tool is enabled. Unlisted tools are enabled.
    #[must_use]
    pub fn is_tool_enabled(&self, name: &str) -> bool {
        self.tools.get(name).copied().unwrap_or(true)
    }

    /// Adds default tool entries missing from the map.
    pub(crate) fn fill_missing_tools(&mut self) {
        for name in DEFAULT_TOOLS {
            self.tools.entry((*name).to_string()).or_insert(true);
        }
    }

    /// Merges a partial update into this configuration.
    pub fn apply(&mut self, update: ConfigUpdate) {
        if let Some(limits) = update.limits {
            set(&mut self.limits.max_content_length, limits.max_content_length);
            set(&mut self.limits.max_tags, limits.max_tags);
            set(&mut self.limits.max_anchors, limits.max_anchors);
            set(
                &mut self.limits.max_tag_description_length,
                limits.max_tag_description_length,
            );
        }
        if let Some(storage) = update.storage {
            set(&mut self.storage.pretty_json, storage.pretty_json);
            set(&mut self.storage.max_note_file_bytes, storage.max_note_file_bytes);
        }
        if let Some(tags) = update.tags {
            set(&mut self.tags.enforce, tags.enforce);
        }
        if let Some(guidance) = update.guidance {
            set(&mut self.guidance.require_token, guidance.require_token);
        }
        self.tools.extend(update.tools);
    }
}

fn set<T>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}

/// Size limits for notes and tag descriptions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Limits {
    /// Maximum note content length, in characters.
    pub max_content_length: usize,
    /// Maximum tags per note.
    pub max_tags: usize,
    /// Maximum anchors per note.
    pub max_anchors: usize,
    /// Maximum tag description length, in characters.
    pub max_tag_description_length: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_content_length: 10_000,
            max_tags: 10,
            max_anchors: 20,
            max_tag_description_length: 500,
        }
    }
}

/// Storage behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StorageSettings {
    /// Pretty-print JSON files.
    pub pretty_json: bool,
    /// Largest note file written; larger files are skipped when reading.
    pub max_note_file_bytes: u64,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            pretty_json: true,
            max_note_file_bytes: 1024 * 1024,
        }
    }
}

/// Tag vocabulary enforcement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TagSettings {
    /// Reject undescribed tags once at least one tag is described.
    pub enforce: bool,
}

/// Guidance token gate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GuidanceSettings {
    /// Require a valid guidance token before saving a note.
    pub require_token: bool,
}

/// Partial configuration update. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfigUpdate {
    /// Limit changes.
    pub limits: Option<LimitsUpdate>,
    /// Storage changes.
    pub storage: Option<StorageUpdate>,
    /// Tag enforcement changes.
    pub tags: Option<TagSettingsUpdate>,
    /// Guidance gate changes.
    pub guidance: Option<GuidanceUpdate>,
    /// Tool enablement changes, merged key by key.
    pub tools: BTreeMap<String, bool>,
}

/// Partial [`Limits`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LimitsUpdate {
    /// See [`Limits::max_content_length`].
    pub max_content_length: Option<usize>,
    /// See [`Limits::max_tags`].
    pub max_tags: Option<usize>,
    /// See [`Limits::max_anchors`].
    pub max_anchors: Option<usize>,
    /// See [`Limits::max_tag_description_length`].
    pub max_tag_description_length: Option<usize>,
}

/// Partial [`StorageSettings`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StorageUpdate {
    /// See [`StorageSettings::pretty_json`].
    pub pretty_json: Option<bool>,
    /// See [`StorageSettings::max_note_file_bytes`].
    pub max_note_file_bytes: Option<u64>,
}

/// Partial [`TagSettings`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TagSettingsUpdate {
    /// See [`TagSettings::enforce`].
    pub enforce: Option<bool>,
}

/// Partial [`GuidanceSettings`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GuidanceUpdate {
    /// See [`GuidanceSettings::require_token`].
    pub require_token: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let json = r#"{ "limits": { "maxTags": 3 }, "tags": { "enforce": true } }"#;
        let config: StoreConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.version, CONFIG_VERSION);
        assert_eq!(config.limits.max_tags, 3);
        assert_eq!(config.limits.max_content_length, 10_000);
        assert!(config.tags.enforce);
        assert!(config.storage.pretty_json);
    }

    #[test]
    fn test_apply_merges_sections_independently() {
        let mut config = StoreConfig::default();
        let update: ConfigUpdate = serde_json::from_str(
            r#"{ "limits": { "maxAnchors": 2 }, "tools": { "coverage": false } }"#,
        )
        .unwrap();

        config.apply(update);

        assert_eq!(config.limits.max_anchors, 2);
        assert_eq!(config.limits.max_tags, 10);
        assert!(!config.is_tool_enabled("coverage"));
        assert!(config.is_tool_enabled("save_note"));
        assert!(config.is_tool_enabled("not_a_known_tool"));
    }

    #[test]
    fn test_fill_missing_tools() {
        let mut config: StoreConfig =
            serde_json::from_str(r#"{ "tools": { "coverage": false } }"#).unwrap();
        config.fill_missing_tools();

        assert_eq!(config.tools.len(), DEFAULT_TOOLS.len());
        assert_eq!(config.tools.get("coverage"), Some(&false));
        assert_eq!(config.tools.get("tags"), Some(&true));
    }
}

//! Filter configuration and wire types
//!
//! The block list and status-filter flags are owned by the settings surface
//! and persisted in the extension's synced key-value store. The engine only
//! ever reads them: once at startup from the store, then from every
//! `UPDATE_FILTER_SETTINGS` push.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

// =============================================================================
// Constants
// =============================================================================

/// Store key holding the block list (sequence of strings).
pub const STORAGE_KEY_BLOCKED_COMPANIES: &str = "blockedCompanies";
/// Store key holding [`FilterSettings`].
pub const STORAGE_KEY_FILTER_SETTINGS: &str = "filterSettings";
/// Both keys, in the order the runtime requests them.
pub const STORAGE_KEYS: [&str; 2] = [STORAGE_KEY_BLOCKED_COMPANIES, STORAGE_KEY_FILTER_SETTINGS];

/// Delay after the last qualifying mutation before a pass runs.
pub const DEBOUNCE_MS: u64 = 100;
/// Safety-net pass interval.
pub const SAFETY_INTERVAL_MS: u64 = 2_000;
/// How long the reveal transition stays on a card before it is cleared.
pub const TRANSITION_CLEANUP_MS: u64 = 300;

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("malformed value for store key '{key}': {source}")]
    MalformedKey {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("unrecognized message: {0}")]
    Message(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlockListError {
    #[error("company name is empty")]
    Empty,
    #[error("company '{0}' is already in the block list")]
    Duplicate(String),
}

// =============================================================================
// Filter Settings
// =============================================================================

/// Status filters. All off by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(default, rename_all = "camelCase")]
#[ts(export)]
pub struct FilterSettings {
    pub hide_applied: bool,
    pub hide_promoted: bool,
    pub hide_reposted: bool,
}

impl FilterSettings {
    pub fn any_enabled(&self) -> bool {
        self.hide_applied || self.hide_promoted || self.hide_reposted
    }
}

// =============================================================================
// Block List
// =============================================================================

/// Ordered company patterns, deduplicated by exact string equality.
///
/// Matching is case-insensitive, but deduplication is not: "Acme" and "acme"
/// are two entries. Normalization happens when a matcher is compiled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BlockList(Vec<String>);

impl BlockList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a trimmed entry. Returns the stored form.
    pub fn add(&mut self, name: &str) -> Result<&str, BlockListError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(BlockListError::Empty);
        }
        if self.0.iter().any(|existing| existing == name) {
            return Err(BlockListError::Duplicate(name.to_string()));
        }
        self.0.push(name.to_string());
        Ok(self.0.last().map(String::as_str).unwrap_or_default())
    }

    /// Remove by exact string. Returns whether anything was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|existing| existing != name);
        self.0.len() != before
    }

    /// Returns false when the list was already empty.
    pub fn clear(&mut self) -> bool {
        let had_entries = !self.0.is_empty();
        self.0.clear();
        had_entries
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for BlockList {
    fn from(entries: Vec<String>) -> Self {
        let mut list = Vec::with_capacity(entries.len());
        for entry in entries {
            if !list.contains(&entry) {
                list.push(entry);
            }
        }
        Self(list)
    }
}

impl<'a> FromIterator<&'a str> for BlockList {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        iter.into_iter().map(str::to_string).collect::<Vec<_>>().into()
    }
}

// =============================================================================
// Filter Config
// =============================================================================

/// Everything a reconciliation pass reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterConfig {
    pub block_list: BlockList,
    pub settings: FilterSettings,
}

impl FilterConfig {
    pub fn new(block_list: BlockList, settings: FilterSettings) -> Self {
        Self { block_list, settings }
    }

    /// Build a config from the object the store returned for [`STORAGE_KEYS`].
    ///
    /// Missing keys take their defaults. A malformed key is logged and takes its
    /// default; the other key is still honored.
    pub fn from_storage(stored: &Value) -> Self {
        let block_list = read_key(stored, STORAGE_KEY_BLOCKED_COMPANIES).unwrap_or_else(|err| {
            log::warn!("{err}; using an empty block list");
            BlockList::default()
        });
        let settings = read_key(stored, STORAGE_KEY_FILTER_SETTINGS).unwrap_or_else(|err| {
            log::warn!("{err}; using default filter settings");
            FilterSettings::default()
        });

        log::info!(
            "Loaded {} blocked companies, filter settings {:?}",
            block_list.len(),
            settings
        );
        Self { block_list, settings }
    }
}

fn read_key<T>(stored: &Value, key: &'static str) -> Result<T, ConfigError>
where
    T: Default + for<'de> Deserialize<'de>,
{
    match stored.get(key) {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => T::deserialize(value).map_err(|source| ConfigError::MalformedKey { key, source }),
    }
}

// =============================================================================
// Inbound Messages
// =============================================================================

/// Messages the settings surface sends to the content script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type")]
#[ts(export)]
pub enum InboundMessage {
    /// Full push: block list plus status filters. Absent settings keep the
    /// current ones.
    #[serde(rename = "UPDATE_FILTER_SETTINGS")]
    UpdateFilterSettings {
        #[serde(default)]
        companies: BlockList,
        #[serde(default, rename = "filterSettings")]
        filter_settings: Option<FilterSettings>,
    },
    /// Older settings surfaces only push the block list.
    #[serde(rename = "UPDATE_BLOCKED_COMPANIES")]
    UpdateBlockedCompanies {
        #[serde(default)]
        companies: BlockList,
    },
}

impl InboundMessage {
    pub fn parse(value: &Value) -> Result<Self, ConfigError> {
        Ok(Self::deserialize(value)?)
    }

    /// The config that results from applying this message on top of `current`.
    pub fn apply_to(self, current: &FilterConfig) -> FilterConfig {
        match self {
            Self::UpdateFilterSettings { companies, filter_settings } => FilterConfig {
                block_list: companies,
                settings: filter_settings.unwrap_or(current.settings),
            },
            Self::UpdateBlockedCompanies { companies } => FilterConfig {
                block_list: companies,
                settings: current.settings,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_block_list_add_trims_and_dedups() {
        let mut list = BlockList::new();
        assert_eq!(list.add("  Acme Corp "), Ok("Acme Corp"));
        assert_eq!(list.add("Acme Corp"), Err(BlockListError::Duplicate("Acme Corp".to_string())));
        assert_eq!(list.add("   "), Err(BlockListError::Empty));
        // Case variants are distinct entries.
        assert!(list.add("acme corp").is_ok());
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_block_list_remove_and_clear() {
        let mut list: BlockList = ["Acme", "Initech"].into_iter().collect();
        assert!(list.remove("Acme"));
        assert!(!list.remove("Acme"));
        assert_eq!(list.as_slice(), &["Initech".to_string()]);
        assert!(list.clear());
        assert!(!list.clear());
    }

    #[test]
    fn test_block_list_from_vec_dedups_exact() {
        let list = BlockList::from(vec!["A".to_string(), "A".to_string(), "a".to_string()]);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_from_storage_defaults() {
        let config = FilterConfig::from_storage(&json!({}));
        assert_eq!(config, FilterConfig::default());
    }

    #[test]
    fn test_from_storage_reads_both_keys() {
        let config = FilterConfig::from_storage(&json!({
            "blockedCompanies": ["Acme", "Initech"],
            "filterSettings": { "hideApplied": true, "hidePromoted": false, "hideReposted": true }
        }));
        assert_eq!(config.block_list.len(), 2);
        assert!(config.settings.hide_applied);
        assert!(!config.settings.hide_promoted);
        assert!(config.settings.hide_reposted);
    }

    #[test]
    fn test_from_storage_malformed_key_falls_back_per_key() {
        let config = FilterConfig::from_storage(&json!({
            "blockedCompanies": "not a list",
            "filterSettings": { "hidePromoted": true }
        }));
        assert!(config.block_list.is_empty());
        assert!(config.settings.hide_promoted);
        assert!(!config.settings.hide_applied);
    }

    #[test]
    fn test_parse_update_filter_settings() {
        let msg = InboundMessage::parse(&json!({
            "type": "UPDATE_FILTER_SETTINGS",
            "companies": ["Acme"],
            "filterSettings": { "hideApplied": true }
        }))
        .unwrap();

        let current = FilterConfig::default();
        let next = msg.apply_to(&current);
        assert_eq!(next.block_list.as_slice(), &["Acme".to_string()]);
        assert!(next.settings.hide_applied);
    }

    #[test]
    fn test_missing_settings_keep_current() {
        let current = FilterConfig::new(
            BlockList::default(),
            FilterSettings { hide_promoted: true, ..FilterSettings::default() },
        );
        let msg = InboundMessage::parse(&json!({
            "type": "UPDATE_FILTER_SETTINGS",
            "companies": ["Acme"]
        }))
        .unwrap();
        assert!(msg.apply_to(&current).settings.hide_promoted);

        let legacy = InboundMessage::parse(&json!({
            "type": "UPDATE_BLOCKED_COMPANIES",
            "companies": []
        }))
        .unwrap();
        let next = legacy.apply_to(&current);
        assert!(next.block_list.is_empty());
        assert!(next.settings.hide_promoted);
    }

    #[test]
    fn test_unknown_message_is_an_error() {
        let err = InboundMessage::parse(&json!({ "type": "PING" })).unwrap_err();
        assert!(matches!(err, ConfigError::Message(_)));
    }
}

//! Named capture rules.
//!
//! Rules are grouped by environment, then by scene. Each scene carries one
//! pattern string that becomes the session filter when selected:
//!
//! ```json
//! { "dev": { "login": { "reg": "^https://dev\\.example\\.com/sso" } } }
//! ```
//!
//! Patterns are stored as plain text and only compiled when a session
//! starts or when [`validate_pattern`](super::validate_pattern) is called.

// ============================================================================
// Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::storage::{KeyValueStore, REQUEST_CONFIG_KEY};

// ============================================================================
// Types
// ============================================================================

/// One stored scene rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneRule {
    /// Pattern source.
    pub reg: String,
}

/// A flattened `(env, scene, reg)` row, as listed by [`CaptureRules::search`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleRow {
    /// Environment name.
    pub env: String,
    /// Scene name.
    pub scene: String,
    /// Pattern source.
    pub reg: String,
}

// ============================================================================
// CaptureRules
// ============================================================================

/// Environment → scene → rule table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaptureRules {
    envs: BTreeMap<String, BTreeMap<String, SceneRule>>,
}

impl CaptureRules {
    /// Creates an empty table.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the table from the `requestConfig` document.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails or the document does not
    /// have the env → scene → `{reg}` shape.
    pub fn load(storage: &dyn KeyValueStore) -> Result<Self> {
        match storage.get(REQUEST_CONFIG_KEY)? {
            Some(value) => {
                let rules: Self = serde_json::from_value(value)?;
                info!(envs = rules.envs.len(), "Capture rules loaded");
                Ok(rules)
            }
            None => Ok(Self::new()),
        }
    }

    /// Writes the table to the `requestConfig` document.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    pub fn save(&self, storage: &dyn KeyValueStore) -> Result<()> {
        storage.set(REQUEST_CONFIG_KEY, serde_json::to_value(self)?)
    }

    /// Returns `true` if no rule is stored.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.envs.is_empty()
    }

    /// Returns environment names in order.
    pub fn envs(&self) -> impl Iterator<Item = &str> {
        self.envs.keys().map(String::as_str)
    }

    /// Returns the scene names of `env` in order.
    pub fn scenes(&self, env: &str) -> impl Iterator<Item = &str> {
        self.envs
            .get(env)
            .into_iter()
            .flat_map(|scenes| scenes.keys().map(String::as_str))
    }

    /// Returns the first scene of `env`, the default selection.
    #[must_use]
    pub fn first_scene(&self, env: &str) -> Option<&str> {
        self.scenes(env).next()
    }

    /// Returns the pattern stored for `env` / `scene`.
    #[must_use]
    pub fn pattern(&self, env: &str, scene: &str) -> Option<&str> {
        self.envs
            .get(env)
            .and_then(|scenes| scenes.get(scene))
            .map(|rule| rule.reg.as_str())
    }

    /// Adds or overwrites a rule, creating the environment if needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if any of the three fields is blank.
    pub fn add(&mut self, env: &str, scene: &str, reg: &str) -> Result<()> {
        require_filled(env, scene, reg)?;

        self.envs
            .entry(env.to_string())
            .or_default()
            .insert(scene.to_string(), SceneRule { reg: reg.to_string() });

        debug!(env, scene, "Capture rule added");
        Ok(())
    }

    /// Replaces the pattern of an existing rule.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a field is blank or the rule does not
    /// exist.
    pub fn edit(&mut self, env: &str, scene: &str, reg: &str) -> Result<()> {
        require_filled(env, scene, reg)?;

        let rule = self
            .envs
            .get_mut(env)
            .and_then(|scenes| scenes.get_mut(scene))
            .ok_or_else(|| Error::config(format!("No capture rule {env}/{scene}")))?;
        rule.reg = reg.to_string();

        debug!(env, scene, "Capture rule edited");
        Ok(())
    }

    /// Deletes a rule. An environment left without scenes is removed too.
    ///
    /// Returns `false` if the rule did not exist.
    pub fn delete(&mut self, env: &str, scene: &str) -> bool {
        let Some(scenes) = self.envs.get_mut(env) else {
            return false;
        };
        if scenes.remove(scene).is_none() {
            return false;
        }
        if scenes.is_empty() {
            self.envs.remove(env);
        }

        debug!(env, scene, "Capture rule deleted");
        true
    }

    /// Lists rules whose env and scene contain the given filters.
    ///
    /// Matching is case-insensitive; an empty filter matches everything.
    #[must_use]
    pub fn search(&self, env_filter: &str, scene_filter: &str) -> Vec<RuleRow> {
        let env_filter = env_filter.to_lowercase();
        let scene_filter = scene_filter.to_lowercase();

        self.envs
            .iter()
            .filter(|(env, _)| env.to_lowercase().contains(&env_filter))
            .flat_map(|(env, scenes)| {
                scenes
                    .iter()
                    .filter(|(scene, _)| scene.to_lowercase().contains(&scene_filter))
                    .map(move |(scene, rule)| RuleRow {
                        env: env.clone(),
                        scene: scene.clone(),
                        reg: rule.reg.clone(),
                    })
            })
            .collect()
    }
}

fn require_filled(env: &str, scene: &str, reg: &str) -> Result<()> {
    if env.trim().is_empty() || scene.trim().is_empty() || reg.trim().is_empty() {
        return Err(Error::config("Environment, scene and pattern are all required"));
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::storage::MemoryStore;

    fn sample() -> CaptureRules {
        let mut rules = CaptureRules::new();
        rules.add("dev", "login", "^https://dev/sso").expect("add");
        rules.add("dev", "api", "^https://dev/api").expect("add");
        rules.add("Test", "login", "^https://test/sso").expect("add");
        rules
    }

    #[test]
    fn test_add_and_lookup() {
        let rules = sample();
        assert_eq!(rules.pattern("dev", "login"), Some("^https://dev/sso"));
        assert_eq!(rules.pattern("dev", "missing"), None);
        assert_eq!(rules.first_scene("dev"), Some("api"));
        assert_eq!(rules.envs().collect::<Vec<_>>(), vec!["Test", "dev"]);
    }

    #[test]
    fn test_add_requires_all_fields() {
        let mut rules = CaptureRules::new();
        assert!(rules.add("dev", "", "x").is_err());
        assert!(rules.add("dev", "login", "  ").is_err());
        assert!(rules.is_empty());
    }

    #[test]
    fn test_edit_existing_only() {
        let mut rules = sample();
        rules.edit("dev", "login", "^new").expect("edit");
        assert_eq!(rules.pattern("dev", "login"), Some("^new"));

        let err = rules.edit("prod", "login", "^x").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_delete_drops_empty_env() {
        let mut rules = sample();
        assert!(rules.delete("Test", "login"));
        assert!(!rules.envs().any(|env| env == "Test"));
        assert!(!rules.delete("Test", "login"));

        assert!(rules.delete("dev", "api"));
        assert_eq!(rules.first_scene("dev"), Some("login"));
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let rules = sample();

        let rows = rules.search("test", "");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].env, "Test");

        let rows = rules.search("", "LOG");
        assert_eq!(rows.len(), 2);
        assert_eq!(rules.search("", "").len(), 3);
    }

    #[test]
    fn test_persisted_shape() {
        let storage = MemoryStore::new();
        sample().save(&storage).expect("save");

        let stored = storage.get(REQUEST_CONFIG_KEY).expect("get").expect("present");
        assert_eq!(stored["dev"]["login"], json!({"reg": "^https://dev/sso"}));

        assert_eq!(CaptureRules::load(&storage).expect("load"), sample());
    }

    #[test]
    fn test_load_rejects_bad_shape() {
        let storage = MemoryStore::new();
        storage
            .set(REQUEST_CONFIG_KEY, json!({"dev": {"login": "not-an-object"}}))
            .expect("set");
        assert!(CaptureRules::load(&storage).is_err());
    }
}

//! Behavior catalog: the reference list of habits a plan can target.
//!
//! Entries are immutable once loaded. A host normally loads the catalog
//! from its plan service as a JSON array; a copy saved as
//! `<data_dir>/catalog.json` replaces [`Catalog::builtin`], the small
//! default set used offline.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, CoreError, ValidationError};
use crate::storage::data_dir;

const CATALOG_FILE: &str = "catalog.json";

/// One behavior a recovery plan can target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviorCatalogEntry {
    /// Unique identifier, e.g. "smoking"
    pub key: String,

    /// Display name
    pub name: String,

    /// Suggested plan length in days (>= 1)
    pub suggested_duration_days: u32,

    /// Health risks associated with the behavior
    #[serde(default)]
    pub risks: Vec<String>,

    /// Practical guidelines for cutting down
    #[serde(default)]
    pub guidelines: Vec<String>,
}

/// Immutable set of catalog entries keyed by `key`.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: BTreeMap<String, BehaviorCatalogEntry>,
}

impl Catalog {
    /// Build a catalog, rejecting duplicate keys and empty durations.
    pub fn new(entries: Vec<BehaviorCatalogEntry>) -> Result<Self, ValidationError> {
        let mut map = BTreeMap::new();
        for entry in entries {
            if entry.key.trim().is_empty() {
                return Err(ValidationError::invalid("key", "catalog key is empty"));
            }
            if entry.suggested_duration_days == 0 {
                return Err(ValidationError::invalid(
                    "suggested_duration_days",
                    format!("'{}' must suggest at least one day", entry.key),
                ));
            }
            if map.contains_key(&entry.key) {
                return Err(ValidationError::invalid(
                    "key",
                    format!("duplicate catalog key '{}'", entry.key),
                ));
            }
            map.insert(entry.key.clone(), entry);
        }
        Ok(Self { entries: map })
    }

    /// Parse the JSON array shape returned by the plan service.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let entries: Vec<BehaviorCatalogEntry> = serde_json::from_str(json)?;
        Ok(Self::new(entries)?)
    }

    /// Catalog from `<data_dir>/catalog.json`, or the built-in set.
    ///
    /// # Errors
    /// See [`Catalog::load_from`].
    pub fn load() -> Result<Self, CoreError> {
        let path = data_dir()
            .map(|dir| dir.join(CATALOG_FILE))
            .map_err(|e| ConfigError::LoadFailed {
                path: PathBuf::from(CATALOG_FILE),
                message: e.to_string(),
            })?;
        Self::load_from(&path)
    }

    /// Read a catalog file, falling back to [`Catalog::builtin`] when it
    /// does not exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or holds an
    /// invalid catalog.
    pub fn load_from(path: &Path) -> Result<Self, CoreError> {
        match std::fs::read_to_string(path) {
            Ok(json) => {
                let catalog = Self::from_json(&json)?;
                tracing::debug!(path = %path.display(), entries = catalog.len(), "catalog loaded");
                Ok(catalog)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::builtin()),
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
            .into()),
        }
    }

    pub fn get(&self, key: &str) -> Option<&BehaviorCatalogEntry> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Entries sorted by key.
    pub fn entries(&self) -> impl Iterator<Item = &BehaviorCatalogEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Default offline catalog.
    pub fn builtin() -> Self {
        let entries = vec![
            entry(
                "smoking",
                "Smoking",
                30,
                &["Lung and heart disease", "Reduced stamina", "Higher cancer risk"],
                &[
                    "Pick a quit date and remove cigarettes from home",
                    "Replace the first cigarette of the day with a short walk",
                    "Keep water or sugar-free gum at hand for cravings",
                ],
            ),
            entry(
                "alcohol",
                "Alcohol",
                30,
                &["Liver damage", "Poor sleep quality", "Raised blood pressure"],
                &[
                    "Plan alcohol-free days ahead of time",
                    "Choose a non-alcoholic drink for social events",
                    "Avoid keeping alcohol in the house",
                ],
            ),
            entry(
                "sugar",
                "Added sugar",
                21,
                &["Weight gain", "Blood sugar spikes", "Dental decay"],
                &[
                    "Read labels and skip drinks with added sugar",
                    "Swap desserts for fruit on weekdays",
                    "Eat regular meals with protein to curb cravings",
                ],
            ),
            entry(
                "social_media",
                "Social media",
                14,
                &["Disrupted sleep", "Reduced focus", "Low mood"],
                &[
                    "Turn off non-essential notifications",
                    "Keep the phone out of the bedroom",
                    "Set a fixed daily time window for feeds",
                ],
            ),
            entry(
                "caffeine",
                "Caffeine",
                14,
                &["Anxiety", "Insomnia", "Headaches on withdrawal"],
                &[
                    "Cut down gradually, half a cup at a time",
                    "No caffeine after early afternoon",
                    "Replace one cup a day with herbal tea",
                ],
            ),
        ];
        // Static entries are well-formed by construction.
        Self::new(entries).unwrap_or_default()
    }
}

fn entry(
    key: &str,
    name: &str,
    days: u32,
    risks: &[&str],
    guidelines: &[&str],
) -> BehaviorCatalogEntry {
    BehaviorCatalogEntry {
        key: key.to_string(),
        name: name.to_string(),
        suggested_duration_days: days,
        risks: risks.iter().map(|s| s.to_string()).collect(),
        guidelines: guidelines.iter().map(|s| s.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_is_populated() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.len(), 5);
        let smoking = catalog.get("smoking").unwrap();
        assert_eq!(smoking.suggested_duration_days, 30);
        assert!(!smoking.guidelines.is_empty());
        assert!(catalog.get("gambling").is_none());
    }

    #[test]
    fn entries_are_sorted_by_key() {
        let catalog = Catalog::builtin();
        let keys: Vec<_> = catalog.entries().map(|e| e.key.as_str()).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn rejects_duplicate_keys() {
        let a = entry("smoking", "Smoking", 30, &[], &[]);
        let b = entry("smoking", "Cigarettes", 10, &[], &[]);
        assert!(Catalog::new(vec![a, b]).is_err());
    }

    #[test]
    fn rejects_zero_duration() {
        let a = entry("sugar", "Sugar", 0, &[], &[]);
        assert!(Catalog::new(vec![a]).is_err());
    }

    #[test]
    fn loads_service_json() {
        let json = r#"[
            {"key": "vaping", "name": "Vaping", "suggested_duration_days": 21,
             "risks": ["Nicotine dependence"]}
        ]"#;
        let catalog = Catalog::from_json(json).unwrap();
        let vaping = catalog.get("vaping").unwrap();
        assert_eq!(vaping.name, "Vaping");
        assert!(vaping.guidelines.is_empty());
    }

    #[test]
    fn load_from_falls_back_to_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Catalog::load_from(&dir.path().join(CATALOG_FILE)).unwrap();
        assert_eq!(catalog.len(), Catalog::builtin().len());
    }

    #[test]
    fn load_from_reads_saved_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CATALOG_FILE);
        std::fs::write(
            &path,
            r#"[{"key": "gaming", "name": "Gaming", "suggested_duration_days": 10}]"#,
        )
        .unwrap();

        let catalog = Catalog::load_from(&path).unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(catalog.contains("gaming"));
        assert!(!catalog.contains("smoking"));

        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(Catalog::load_from(&path), Err(CoreError::Json(_))));
    }
}

//! # Style Map
//!
//! Named chord-progression templates: style name → mode tag (`maj`/`min`) →
//! ordered roman-numeral figures.
//!
//! ## Document Format
//! The same structure is accepted as JSON or YAML:
//!
//! ```yaml
//! pop:
//!   maj: [I, V, vi, IV]
//!   min: [i, VI, III, VII]
//! jazz:
//!   maj: [ii, V7, I]
//!   min: [iiø, V7, i]
//! ```
//!
//! ## Invariant
//! Every style has both a `maj` and a `min` template, and neither is empty.
//! The loaders enforce this with [`StyleMap::validate`]. A map is read-only
//! once built; the generator only borrows it.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ChordError;
use crate::key::Mode;

/// Templates for one style
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StyleEntry {
    #[serde(default)]
    pub maj: Vec<String>,
    #[serde(default)]
    pub min: Vec<String>,
}

impl StyleEntry {
    pub fn new(maj: &[&str], min: &[&str]) -> Self {
        Self {
            maj: maj.iter().map(|s| s.to_string()).collect(),
            min: min.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn template(&self, mode: Mode) -> &[String] {
        match mode {
            Mode::Major => &self.maj,
            Mode::Minor => &self.min,
        }
    }
}

/// Style name → templates
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleMap {
    styles: BTreeMap<String, StyleEntry>,
}

impl StyleMap {
    /// Built-in styles: pop, classic, jazz, soul and blues.
    pub fn fallback() -> Self {
        let mut styles = BTreeMap::new();
        styles.insert(
            "pop".to_string(),
            StyleEntry::new(&["I", "V", "vi", "IV"], &["i", "VI", "III", "VII"]),
        );
        styles.insert(
            "classic".to_string(),
            StyleEntry::new(&["I", "IV", "V", "I"], &["i", "iv", "V", "i"]),
        );
        styles.insert(
            "jazz".to_string(),
            StyleEntry::new(&["ii", "V7", "I"], &["iiø", "V7", "i"]),
        );
        styles.insert(
            "soul".to_string(),
            StyleEntry::new(
                &["I", "iii", "IV", "ii", "V", "I"],
                &["i", "bIII", "IV", "V"],
            ),
        );
        styles.insert(
            "blues".to_string(),
            StyleEntry::new(
                &["I", "IV", "I", "I", "IV", "IV", "I", "I", "V", "IV", "I", "V"],
                &["i", "iv", "i", "i", "iv", "iv", "i", "i", "V", "iv", "i", "V"],
            ),
        );
        Self { styles }
    }

    /// Build a map from already-constructed entries and validate it.
    pub fn from_entries<I>(entries: I) -> Result<Self, ChordError>
    where
        I: IntoIterator<Item = (String, StyleEntry)>,
    {
        let map = Self {
            styles: entries.into_iter().collect(),
        };
        map.validate()?;
        Ok(map)
    }

    pub fn from_json_str(content: &str) -> Result<Self, ChordError> {
        let map: StyleMap =
            serde_json::from_str(content).map_err(|e| ChordError::StyleMap(e.to_string()))?;
        map.validate()?;
        Ok(map)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ChordError> {
        let map: StyleMap =
            serde_yaml::from_str(content).map_err(|e| ChordError::StyleMap(e.to_string()))?;
        map.validate()?;
        Ok(map)
    }

    /// Load a style map file. `.yaml`/`.yml` files are read as YAML, anything
    /// else as JSON.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ChordError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ChordError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
            .unwrap_or(false);

        if is_yaml {
            Self::from_yaml_str(&content)
        } else {
            Self::from_json_str(&content)
        }
    }

    /// Check that every style has non-empty `maj` and `min` templates.
    pub fn validate(&self) -> Result<(), ChordError> {
        if self.styles.is_empty() {
            return Err(ChordError::StyleMap("no styles defined".to_string()));
        }
        for (name, entry) in &self.styles {
            for mode in [Mode::Major, Mode::Minor] {
                if entry.template(mode).is_empty() {
                    return Err(ChordError::StyleMap(format!(
                        "style '{}' has an empty '{}' template",
                        name,
                        mode.tag()
                    )));
                }
            }
        }
        Ok(())
    }

    /// Template for a style in a mode.
    ///
    /// A missing style and a style without a template for `mode` are both
    /// reported as [`ChordError::UnknownStyle`].
    pub fn template(&self, style: &str, mode: Mode) -> Result<&[String], ChordError> {
        self.styles
            .get(style)
            .map(|entry| entry.template(mode))
            .filter(|template| !template.is_empty())
            .ok_or_else(|| ChordError::UnknownStyle {
                style: style.to_string(),
                mode,
            })
    }

    pub fn contains(&self, style: &str) -> bool {
        self.styles.contains_key(style)
    }

    /// Style names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.styles.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}

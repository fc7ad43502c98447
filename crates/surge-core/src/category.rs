//! The category registry.
//!
//! Categories are opaque string keys as far as storage and detection are
//! concerned. The registry only exists so that the outer layers can reject
//! unknown keys and render human-readable names; it is injected through
//! configuration rather than compiled in.

use serde::{Deserialize, Serialize};

/// One known category: its storage key and the name shown to people.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEntry {
  pub key:          String,
  pub display_name: String,
}

impl CategoryEntry {
  pub fn new(key: impl Into<String>, display_name: impl Into<String>) -> Self {
    Self { key: key.into(), display_name: display_name.into() }
  }
}

/// An ordered, closed set of categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryRegistry {
  entries: Vec<CategoryEntry>,
}

impl CategoryRegistry {
  /// Build a registry from `entries`. Later duplicates of a key are dropped.
  pub fn new(entries: impl IntoIterator<Item = CategoryEntry>) -> Self {
    let mut deduped: Vec<CategoryEntry> = Vec::new();
    for entry in entries {
      if !deduped.iter().any(|e| e.key == entry.key) {
        deduped.push(entry);
      }
    }
    Self { entries: deduped }
  }

  pub fn contains(&self, key: &str) -> bool { self.get(key).is_some() }

  pub fn get(&self, key: &str) -> Option<&CategoryEntry> {
    self.entries.iter().find(|e| e.key == key)
  }

  /// The display name for `key`, falling back to the key itself.
  pub fn display_name<'a>(&'a self, key: &'a str) -> &'a str {
    self.get(key).map_or(key, |e| e.display_name.as_str())
  }

  pub fn entries(&self) -> &[CategoryEntry] { &self.entries }

  pub fn keys(&self) -> impl Iterator<Item = &str> {
    self.entries.iter().map(|e| e.key.as_str())
  }

  pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

impl Default for CategoryRegistry {
  fn default() -> Self {
    Self::new([
      CategoryEntry::new("fitness", "Fitness"),
      CategoryEntry::new("beauty", "Beauty"),
      CategoryEntry::new("comedy", "Comedy"),
      CategoryEntry::new("business", "Business"),
      CategoryEntry::new("tech", "Tech"),
      CategoryEntry::new("lifestyle", "Lifestyle"),
      CategoryEntry::new("gaming", "Gaming"),
    ])
  }
}

//! Category taxonomy and the ordered per-category map used by every aggregate.

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::UnknownCategory;

/// Closed spending taxonomy. Declaration order is the classification order.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Category {
    #[serde(rename = "food")]
    Food,
    #[serde(rename = "travel")]
    Travel,
    #[serde(rename = "shopping")]
    Shopping,
    #[serde(rename = "bills")]
    Bills,
    #[serde(rename = "entertainment")]
    Entertainment,
    #[serde(rename = "medical")]
    Medical,
    #[serde(rename = "education")]
    Education,
    /// Catch-all. Older records stored it as "others".
    #[default]
    #[serde(rename = "other", alias = "others")]
    Other,
}

impl Category {
    /// Every category, in taxonomy order.
    pub const ALL: [Category; 8] = [
        Category::Food,
        Category::Travel,
        Category::Shopping,
        Category::Bills,
        Category::Entertainment,
        Category::Medical,
        Category::Education,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "food",
            Category::Travel => "travel",
            Category::Shopping => "shopping",
            Category::Bills => "bills",
            Category::Entertainment => "entertainment",
            Category::Medical => "medical",
            Category::Education => "education",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strict parse: the label must name a taxonomy member exactly
/// (after trimming and lowercasing). The legacy "others" is accepted, as
/// serde does.
impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim().to_lowercase();
        if label == "others" {
            return Ok(Category::Other);
        }
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == label)
            .ok_or(UnknownCategory(label))
    }
}

/// Small map keyed by [`Category`] that keeps discovery order.
///
/// Serializes as a JSON object whose keys appear in the order they were
/// first inserted, so "first seen wins" tie-breaks survive a round trip
/// through the text-generation collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryMap<V> {
    entries: Vec<(Category, V)>,
}

impl<V> Default for CategoryMap<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V> CategoryMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, category: Category) -> Option<&V> {
        self.entries
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, v)| v)
    }

    /// Value for `category`, inserting `default()` at the end if absent.
    pub fn get_or_insert_with(&mut self, category: Category, default: impl FnOnce() -> V) -> &mut V {
        let idx = match self.entries.iter().position(|(c, _)| *c == category) {
            Some(i) => i,
            None => {
                self.entries.push((category, default()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[idx].1
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, &V)> {
        self.entries.iter().map(|(c, v)| (*c, v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Category, &mut V)> {
        self.entries.iter_mut().map(|(c, v)| (*c, v))
    }

    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.entries.iter().map(|(c, _)| *c)
    }

    /// Entry with the largest key. Ties go to the entry discovered first.
    pub fn first_max_by<K: PartialOrd>(&self, key: impl Fn(&V) -> K) -> Option<(Category, &V)> {
        let mut best: Option<(Category, &V, K)> = None;
        for (c, v) in &self.entries {
            let k = key(v);
            let better = match &best {
                Some((_, _, best_k)) => k > *best_k,
                None => true,
            };
            if better {
                best = Some((*c, v, k));
            }
        }
        best.map(|(c, v, _)| (c, v))
    }
}

impl<V: Serialize> Serialize for CategoryMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (c, v) in &self.entries {
            map.serialize_entry(c.as_str(), v)?;
        }
        map.end()
    }
}

//! Deterministic keyword rules mapping free-text expense descriptions to
//! the spending taxonomy.
//!
//! No LLM needed: substring matching is the default classifier and the
//! fallback whenever an external one is unavailable.

use serde::{Deserialize, Serialize};
use spendwise_core::Category;

/// One row of the keyword table, as written in config files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordRule {
    pub category: Category,
    pub words: Vec<String>,
}

/// Ordered category → keywords table.
///
/// Row order is the tie-break: the first row with a hit wins.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordTable {
    rules: Vec<(Category, Vec<String>)>,
}

impl Default for KeywordTable {
    fn default() -> Self {
        let rules: [(Category, &[&str]); 7] = [
            (Category::Food, &["food", "pizza", "restaurant", "burger", "meal"]),
            (Category::Travel, &["uber", "bus", "train", "flight", "taxi"]),
            (Category::Shopping, &["amazon", "flipkart", "clothes", "mall"]),
            (Category::Bills, &["wifi", "electricity", "water", "recharge"]),
            (Category::Entertainment, &["movie", "netflix", "spotify", "concert", "cinema"]),
            (Category::Medical, &["pharmacy", "hospital", "doctor", "medicine", "clinic"]),
            (Category::Education, &["tuition", "course", "school", "college", "udemy"]),
        ];
        Self::new(rules)
    }
}

impl KeywordTable {
    /// Build a table from rows in priority order.
    ///
    /// Keywords are lowercased; blank ones are dropped since they would
    /// match every description.
    pub fn new<I, W, S>(rules: I) -> Self
    where
        I: IntoIterator<Item = (Category, W)>,
        W: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rules = rules
            .into_iter()
            .map(|(category, words)| {
                let words = words
                    .into_iter()
                    .map(|w| w.as_ref().trim().to_lowercase())
                    .filter(|w| !w.is_empty())
                    .collect();
                (category, words)
            })
            .collect();
        Self { rules }
    }

    pub fn from_rules(rules: &[KeywordRule]) -> Self {
        Self::new(rules.iter().map(|r| (r.category, r.words.iter())))
    }

    pub fn to_rules(&self) -> Vec<KeywordRule> {
        self.rules
            .iter()
            .map(|(category, words)| KeywordRule {
                category: *category,
                words: words.clone(),
            })
            .collect()
    }

    /// Classify a description. Case-insensitive substring match, first
    /// matching row wins, `other` when nothing matches.
    pub fn classify(&self, description: &str) -> Category {
        let text = description.to_lowercase();
        for (category, words) in &self.rules {
            if words.iter().any(|w| text.contains(w.as_str())) {
                return *category;
            }
        }
        Category::Other
    }
}

/// Classify with the default table.
pub fn categorize(description: &str) -> Category {
    KeywordTable::default().classify(description)
}

//! Classification with an optional external classifier in front of the
//! keyword rules.
//!
//! Callers only ever see [`Classifier::classify`], which is total: an
//! unavailable, failing or off-taxonomy external classifier degrades to the
//! deterministic keyword table without surfacing an error.

use anyhow::Result;
use chrono::NaiveDateTime;
use spendwise_core::{Category, NewTransaction, Transaction, TransactionUpdate, ValidationError};

use crate::category_rules::KeywordTable;

/// Something that can suggest a category label for a description,
/// typically an LLM behind an HTTP API.
pub trait ExternalClassifier: Send + Sync {
    /// Return a raw label. It is validated against the taxonomy by the caller.
    fn suggest(&self, description: &str) -> Result<String>;
}

/// The single classification entry point.
#[derive(Clone, Copy)]
pub struct Classifier<'a> {
    table: &'a KeywordTable,
    external: Option<&'a dyn ExternalClassifier>,
}

impl<'a> Classifier<'a> {
    /// Keyword rules only.
    pub fn new(table: &'a KeywordTable) -> Self {
        Self {
            table,
            external: None,
        }
    }

    /// Prefer `external`, fall back to `table`.
    pub fn with_external(table: &'a KeywordTable, external: &'a dyn ExternalClassifier) -> Self {
        Self {
            table,
            external: Some(external),
        }
    }

    pub fn has_external(&self) -> bool {
        self.external.is_some()
    }

    pub fn classify(&self, description: &str) -> Category {
        let Some(external) = self.external else {
            return self.table.classify(description);
        };

        match external.suggest(description) {
            Ok(label) => match label.parse::<Category>() {
                Ok(category) => {
                    tracing::debug!(%category, "external classifier answered");
                    category
                }
                Err(e) => {
                    let fallback = self.table.classify(description);
                    tracing::warn!(error = %e, %fallback, "external classifier answered off-taxonomy, using keyword rules");
                    fallback
                }
            },
            Err(e) => {
                let fallback = self.table.classify(description);
                tracing::warn!(error = %e, %fallback, "external classifier failed, using keyword rules");
                fallback
            }
        }
    }

    /// Validate raw input and categorize it.
    pub fn record(
        &self,
        input: NewTransaction,
        now: NaiveDateTime,
    ) -> Result<Transaction, ValidationError> {
        input.validate(now, |d| self.classify(d))
    }

    /// Apply an edit; a new description is recategorized.
    pub fn update(
        &self,
        txn: &Transaction,
        edit: TransactionUpdate,
    ) -> Result<Transaction, ValidationError> {
        edit.apply(txn, |d| self.classify(d))
    }
}

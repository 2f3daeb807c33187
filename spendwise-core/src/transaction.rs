//! Transaction records: the unit every analysis reads.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::category::Category;
use crate::error::ValidationError;

/// Direction of money movement
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum TxnType {
    /// Outgoing spend
    #[serde(rename = "debit")]
    #[default]
    Debit,
    /// Incoming money, never counted as spend
    #[serde(rename = "credit")]
    Credit,
}

impl TxnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxnType::Debit => "debit",
            TxnType::Credit => "credit",
        }
    }
}

impl fmt::Display for TxnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TxnType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "debit" => Ok(TxnType::Debit),
            "credit" => Ok(TxnType::Credit),
            _ => Err(ValidationError::InvalidType(s.to_string())),
        }
    }
}

/// A categorized transaction. Immutable once handed to the analytics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    /// Non-negative magnitude; direction lives in `kind`
    pub amount: f64,
    /// Free text as entered
    pub description: String,
    /// Assigned once at creation or update time
    pub category: Category,
    #[serde(rename = "type", default)]
    pub kind: TxnType,
    /// Local wall-clock time of the transaction
    pub timestamp: NaiveDateTime,
}

impl Transaction {
    pub fn new(
        amount: f64,
        description: impl Into<String>,
        category: Category,
        kind: TxnType,
        timestamp: NaiveDateTime,
    ) -> Self {
        Self {
            amount,
            description: description.into(),
            category,
            kind,
            timestamp,
        }
    }

    pub fn debit(
        amount: f64,
        description: impl Into<String>,
        category: Category,
        timestamp: NaiveDateTime,
    ) -> Self {
        Self::new(amount, description, category, TxnType::Debit, timestamp)
    }

    pub fn credit(
        amount: f64,
        description: impl Into<String>,
        category: Category,
        timestamp: NaiveDateTime,
    ) -> Self {
        Self::new(amount, description, category, TxnType::Credit, timestamp)
    }

    pub fn is_debit(&self) -> bool {
        self.kind == TxnType::Debit
    }

    pub fn is_credit(&self) -> bool {
        self.kind == TxnType::Credit
    }
}

/// Raw transaction input as received from a form, API body or CSV row.
///
/// Every field is optional here; [`NewTransaction::validate`] enforces
/// which ones are required.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewTransaction {
    pub amount: Option<f64>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub timestamp: Option<NaiveDateTime>,
}

impl NewTransaction {
    pub fn new(amount: f64, description: impl Into<String>) -> Self {
        Self {
            amount: Some(amount),
            description: Some(description.into()),
            ..Default::default()
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn at(mut self, timestamp: NaiveDateTime) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Validate and build a [`Transaction`].
    ///
    /// `categorize` runs exactly once, on the trimmed description. A missing
    /// timestamp becomes `now`; a missing type becomes debit.
    pub fn validate(
        self,
        now: NaiveDateTime,
        categorize: impl FnOnce(&str) -> Category,
    ) -> Result<Transaction, ValidationError> {
        let amount = match self.amount {
            Some(a) if a != 0.0 => a,
            _ => return Err(ValidationError::MissingAmount),
        };
        if amount < 0.0 || !amount.is_finite() {
            return Err(ValidationError::NegativeAmount(amount));
        }

        let description = self
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .ok_or(ValidationError::MissingDescription)?
            .to_string();

        let kind = match self.kind.as_deref() {
            Some(k) => k.parse()?,
            None => TxnType::Debit,
        };

        let category = categorize(&description);
        Ok(Transaction::new(
            amount,
            description,
            category,
            kind,
            self.timestamp.unwrap_or(now),
        ))
    }
}

/// Partial edit of an existing transaction.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TransactionUpdate {
    pub amount: Option<f64>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub timestamp: Option<NaiveDateTime>,
}

impl TransactionUpdate {
    /// Apply the edit, returning the updated record.
    ///
    /// Only a new, non-blank description triggers recategorization.
    pub fn apply(
        self,
        txn: &Transaction,
        categorize: impl FnOnce(&str) -> Category,
    ) -> Result<Transaction, ValidationError> {
        let mut out = txn.clone();

        if let Some(amount) = self.amount {
            if amount < 0.0 || !amount.is_finite() {
                return Err(ValidationError::NegativeAmount(amount));
            }
            out.amount = amount;
        }

        if let Some(kind) = self.kind.as_deref() {
            out.kind = kind.parse()?;
        }

        if let Some(ts) = self.timestamp {
            out.timestamp = ts;
        }

        if let Some(desc) = self.description.as_deref().map(str::trim) {
            if !desc.is_empty() {
                out.description = desc.to_string();
                out.category = categorize(desc);
            }
        }

        Ok(out)
    }
}

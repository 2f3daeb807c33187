//! Parse transaction statements from CSV into categorized transactions.
//!
//! Expected header (case-insensitive, any column order):
//! date,description,amount,type[,category]
//!
//! `type` may be omitted and defaults to debit. A `category` cell that names
//! a taxonomy category is kept as-is; anything else is classified from the
//! description. Rows that fail validation are skipped with a warning.

use anyhow::{anyhow, Context, Result};
use spendwise_core::{time::parse_timestamp, Category, NewTransaction, Transaction};
use std::io::Read;
use std::path::Path;

use crate::classify::Classifier;

/// Column positions resolved from the header row.
#[derive(Debug, Clone, Copy)]
struct Columns {
    date: usize,
    description: usize,
    amount: usize,
    kind: Option<usize>,
    category: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let required = |name: &str| {
            find(name).ok_or_else(|| anyhow!("statement is missing a `{name}` column"))
        };
        Ok(Self {
            date: required("date")?,
            description: required("description")?,
            amount: required("amount")?,
            kind: find("type"),
            category: find("category"),
        })
    }
}

/// Parse a statement file.
pub fn parse_transactions_csv(path: impl AsRef<Path>, classifier: &Classifier) -> Result<Vec<Transaction>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    parse_transactions_reader(file, classifier)
        .with_context(|| format!("parsing {}", path.display()))
}

/// Parse a statement from any reader.
pub fn parse_transactions_reader<R: Read>(reader: R, classifier: &Classifier) -> Result<Vec<Transaction>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let cols = Columns::from_headers(rdr.headers()?)?;
    let mut txns = Vec::new();
    let mut skipped = 0usize;

    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        // header is line 1
        let line = i + 2;
        let cell = |idx: usize| record.get(idx).unwrap_or("");

        if record.iter().all(str::is_empty) {
            continue;
        }

        let Some(timestamp) = parse_timestamp(cell(cols.date)) else {
            tracing::warn!(line, date = cell(cols.date), "skipping row with unparseable date");
            skipped += 1;
            continue;
        };

        let amount = cell(cols.amount).replace(',', "").parse::<f64>().ok();

        let input = NewTransaction {
            amount,
            description: Some(cell(cols.description).to_string()),
            kind: cols.kind.map(cell).filter(|k| !k.is_empty()).map(str::to_string),
            timestamp: Some(timestamp),
        };

        let given: Option<Category> = cols.category.and_then(|idx| cell(idx).parse().ok());
        let built = match given {
            Some(category) => input.validate(timestamp, |_| category),
            None => classifier.record(input, timestamp),
        };

        match built {
            Ok(txn) => txns.push(txn),
            Err(e) => {
                tracing::warn!(line, error = %e, "skipping invalid row");
                skipped += 1;
            }
        }
    }

    tracing::info!(parsed = txns.len(), skipped, "read statement");
    Ok(txns)
}

//! spendwise-core: transaction vocabulary shared by the insight engine

pub mod category;
pub mod error;
pub mod profile;
pub mod time;
pub mod transaction;

pub use category::{Category, CategoryMap};
pub use error::{UnknownCategory, ValidationError};
pub use profile::{UserProfile, DEFAULT_MONTHLY_INCOME};
pub use time::{Period, is_late_night, is_weekend, month_name, week_bucket_key};
pub use transaction::{NewTransaction, Transaction, TransactionUpdate, TxnType};

/// Round to one fractional digit, the precision every reported ratio uses.
pub fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

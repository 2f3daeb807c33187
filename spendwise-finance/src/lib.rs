//! spendwise-finance: categorization, monthly insights, spending patterns,
//! statement parsing and narrative helpers

pub mod category_rules;
pub mod classify;
pub mod insights;
pub mod narrative;
pub mod patterns;
pub mod statement;

pub use category_rules::{categorize, KeywordRule, KeywordTable};
pub use classify::{Classifier, ExternalClassifier};
pub use insights::{build_insights, percent_change, InsightBuilder, MonthlyInsight, SpendBasis};
pub use narrative::{
    advisor_reply, daily_tip, savings_recommendations, spending_twin, GenerationRequest, SpendingTwin,
    TextGenerator,
};
pub use patterns::{analyze_pattern, SpendSpike, SpendingProfile};
pub use statement::{parse_transactions_csv, parse_transactions_reader};

//! Month-over-month insight builder: totals, per-category breakdown,
//! period-over-period change and a short ranked list of tips.

use chrono::NaiveDate;
use serde::Serialize;
use spendwise_core::{month_name, round1, Category, CategoryMap, Transaction};

/// Maximum number of tips returned.
pub const MAX_TIPS: usize = 5;

/// Which transactions count as spend when totalling a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpendBasis {
    /// Only debits are spend. Credits never enter totals or shares.
    #[default]
    DebitsOnly,
    /// Every transaction is summed as given, whatever its type.
    AllTransactions,
}

impl SpendBasis {
    fn counts(&self, txn: &Transaction) -> bool {
        match self {
            SpendBasis::DebitsOnly => txn.is_debit(),
            SpendBasis::AllTransactions => true,
        }
    }
}

/// One category's slice of a period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CategoryShare {
    pub amount: f64,
    /// Share of the period total, one decimal
    pub percentage: f64,
}

/// Per-category amounts and shares, in the order categories first appear.
pub type CategorySummary = CategoryMap<CategoryShare>;

/// Output of [`InsightBuilder::build`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyInsight {
    pub total_spent: f64,
    pub previous_period_total: f64,
    pub percent_change: f64,
    pub category_breakdown: CategorySummary,
    pub period_label: String,
    pub tips: Vec<String>,
}

/// Percent change from `previous` to `current`, one decimal.
///
/// Going from nothing to something is a 100% increase; nothing to nothing
/// is 0.
pub fn percent_change(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return if current > 0.0 { 100.0 } else { 0.0 };
    }
    round1((current - previous) / previous * 100.0)
}

/// Builds [`MonthlyInsight`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct InsightBuilder {
    basis: SpendBasis,
}

impl InsightBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_basis(basis: SpendBasis) -> Self {
        Self { basis }
    }

    pub fn basis(&self) -> SpendBasis {
        self.basis
    }

    /// Sum of the amounts that count as spend.
    pub fn total(&self, txns: &[Transaction]) -> f64 {
        txns.iter()
            .filter(|t| self.basis.counts(t))
            .map(|t| t.amount)
            .sum()
    }

    /// Amount and share per category. Every share is 0 when `total` is 0.
    pub fn summarize(&self, txns: &[Transaction], total: f64) -> CategorySummary {
        let mut summary = CategorySummary::new();
        for t in txns.iter().filter(|t| self.basis.counts(t)) {
            summary
                .get_or_insert_with(t.category, || CategoryShare {
                    amount: 0.0,
                    percentage: 0.0,
                })
                .amount += t.amount;
        }

        for (_, share) in summary.iter_mut() {
            share.percentage = if total > 0.0 {
                round1(share.amount / total * 100.0)
            } else {
                0.0
            };
        }
        summary
    }

    /// Compare the `current` period against `previous`.
    ///
    /// `reference` is any date in the current period; it only names the
    /// period. `income` drives the spending-limit tip.
    pub fn build(
        &self,
        current: &[Transaction],
        previous: &[Transaction],
        income: f64,
        reference: NaiveDate,
    ) -> MonthlyInsight {
        let total_spent = self.total(current);
        let previous_period_total = self.total(previous);

        let category_breakdown = self.summarize(current, total_spent);
        let previous_breakdown = self.summarize(previous, previous_period_total);

        let tips = generate_tips(total_spent, income, &category_breakdown, &previous_breakdown);

        tracing::debug!(
            total_spent,
            previous_period_total,
            categories = category_breakdown.len(),
            tips = tips.len(),
            "built monthly insight"
        );

        MonthlyInsight {
            total_spent,
            previous_period_total,
            percent_change: percent_change(total_spent, previous_period_total),
            category_breakdown,
            period_label: month_name(reference).to_string(),
            tips,
        }
    }
}

/// Build insights with the default (debits-only) spend basis.
pub fn build_insights(
    current: &[Transaction],
    previous: &[Transaction],
    income: f64,
    reference: NaiveDate,
) -> MonthlyInsight {
    InsightBuilder::default().build(current, previous, income, reference)
}

fn push_unique(tips: &mut Vec<String>, tip: String) {
    if !tips.contains(&tip) {
        tips.push(tip);
    }
}

fn amount_of(summary: &CategorySummary, category: Category) -> f64 {
    summary.get(category).map(|s| s.amount).unwrap_or(0.0)
}

/// Tips in rule order, exact duplicates dropped, at most [`MAX_TIPS`].
fn generate_tips(
    total_spent: f64,
    income: f64,
    current: &CategorySummary,
    previous: &CategorySummary,
) -> Vec<String> {
    let mut tips: Vec<String> = Vec::new();

    let food = amount_of(current, Category::Food);
    if total_spent > 0.0 && food > 0.25 * total_spent {
        push_unique(&mut tips, "Food expenses are high this month.".to_string());
    }

    let shopping_change = percent_change(
        amount_of(current, Category::Shopping),
        amount_of(previous, Category::Shopping),
    );
    if shopping_change > 15.0 {
        push_unique(&mut tips, "Shopping increased significantly.".to_string());
    }

    if total_spent > income * 0.7 {
        push_unique(&mut tips, "You are close to your spending limit.".to_string());
    }

    if let Some((top, share)) = current.first_max_by(|s| s.percentage) {
        let tip = format!("You are spending the most on {} ({}%).", top, share.percentage);
        push_unique(&mut tips, tip);
    }

    for category in Category::ALL {
        let change = percent_change(amount_of(current, category), amount_of(previous, category));
        if change > 20.0 {
            let tip = format!("{} expenses grew {}% compared to last month.", category, change);
            push_unique(&mut tips, tip);
        }
    }

    if tips.is_empty() && total_spent == 0.0 {
        push_unique(
            &mut tips,
            "No spending recorded yet. Add your first transaction!".to_string(),
        );
    }

    tips.truncate(MAX_TIPS);
    tips
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn feb(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 2, day)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn jan(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, day)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 15).unwrap()
    }

    #[test]
    fn test_empty_periods() {
        let insight = build_insights(&[], &[], 2000.0, reference());
        assert_eq!(insight.total_spent, 0.0);
        assert_eq!(insight.previous_period_total, 0.0);
        assert_eq!(insight.percent_change, 0.0);
        assert!(insight.category_breakdown.is_empty());
        assert_eq!(
            insight.tips,
            vec!["No spending recorded yet. Add your first transaction!".to_string()]
        );
        assert_eq!(insight.period_label, "February");
    }

    #[test]
    fn test_percent_change_zero_handling() {
        assert_eq!(percent_change(0.0, 0.0), 0.0);
        assert_eq!(percent_change(50.0, 0.0), 100.0);
        assert_eq!(percent_change(150.0, 100.0), 50.0);
        assert_eq!(percent_change(50.0, 150.0), -66.7);
        assert!(!percent_change(1.0, 3.0).is_nan());
    }

    #[test]
    fn test_breakdown_percentages_sum_to_100() {
        let current = vec![
            Transaction::debit(100.0, "pizza", Category::Food, feb(1)),
            Transaction::debit(100.0, "uber", Category::Travel, feb(2)),
            Transaction::debit(100.0, "mall", Category::Shopping, feb(3)),
        ];
        let insight = build_insights(&current, &[], 2000.0, reference());
        let sum: f64 = insight
            .category_breakdown
            .iter()
            .map(|(_, s)| s.percentage)
            .sum();
        let tolerance = 0.1 * insight.category_breakdown.len() as f64;
        assert!((sum - 100.0).abs() <= tolerance, "sum was {sum}");
        assert_eq!(
            insight.category_breakdown.get(Category::Food).unwrap().percentage,
            33.3
        );
    }

    #[test]
    fn test_zero_total_shares_are_zero() {
        let current = vec![Transaction::debit(0.0, "free sample", Category::Food, feb(1))];
        let insight = build_insights(&current, &[], 2000.0, reference());
        let share = insight.category_breakdown.get(Category::Food).unwrap();
        assert_eq!(share.percentage, 0.0);
        assert!(!share.percentage.is_nan());
    }

    #[test]
    fn test_credits_excluded_by_default() {
        let current = vec![
            Transaction::debit(400.0, "restaurant", Category::Food, feb(1)),
            Transaction::credit(5000.0, "salary", Category::Other, feb(1)),
        ];
        let insight = build_insights(&current, &[], 10_000.0, reference());
        assert_eq!(insight.total_spent, 400.0);
        assert!(insight.category_breakdown.get(Category::Other).is_none());
        assert_eq!(
            insight.category_breakdown.get(Category::Food).unwrap().percentage,
            100.0
        );
    }

    #[test]
    fn test_all_transactions_basis_sums_credits() {
        let current = vec![
            Transaction::debit(400.0, "restaurant", Category::Food, feb(1)),
            Transaction::credit(600.0, "salary", Category::Other, feb(1)),
        ];
        let builder = InsightBuilder::with_basis(SpendBasis::AllTransactions);
        let insight = builder.build(&current, &[], 10_000.0, reference());
        assert_eq!(insight.total_spent, 1000.0);
        assert_eq!(
            insight.category_breakdown.get(Category::Other).unwrap().percentage,
            60.0
        );
    }

    #[test]
    fn test_tip_rules_in_order_and_capped() {
        let current = vec![
            Transaction::debit(300.0, "pizza", Category::Food, feb(2)),
            Transaction::debit(200.0, "amazon", Category::Shopping, feb(3)),
            Transaction::debit(100.0, "uber", Category::Travel, feb(4)),
        ];
        let previous = vec![
            Transaction::debit(100.0, "pizza", Category::Food, jan(2)),
            Transaction::debit(100.0, "amazon", Category::Shopping, jan(3)),
        ];
        let insight = build_insights(&current, &previous, 500.0, reference());

        assert_eq!(insight.total_spent, 600.0);
        assert_eq!(insight.previous_period_total, 200.0);
        assert_eq!(insight.percent_change, 200.0);
        assert_eq!(
            insight.tips,
            vec![
                "Food expenses are high this month.".to_string(),
                "Shopping increased significantly.".to_string(),
                "You are close to your spending limit.".to_string(),
                "You are spending the most on food (50%).".to_string(),
                "food expenses grew 200% compared to last month.".to_string(),
            ]
        );
    }

    #[test]
    fn test_growth_tips_follow_taxonomy_order() {
        let current = vec![
            Transaction::debit(50.0, "doctor", Category::Medical, feb(2)),
            Transaction::debit(50.0, "bus", Category::Travel, feb(3)),
        ];
        let insight = build_insights(&current, &[], 100_000.0, reference());
        assert_eq!(
            insight.tips,
            vec![
                "You are spending the most on medical (50%).".to_string(),
                "travel expenses grew 100% compared to last month.".to_string(),
                "medical expenses grew 100% compared to last month.".to_string(),
            ]
        );
    }

    #[test]
    fn test_top_category_first_seen_wins() {
        let current = vec![
            Transaction::debit(100.0, "wifi", Category::Bills, feb(1)),
            Transaction::debit(100.0, "meal", Category::Food, feb(2)),
        ];
        let previous = vec![
            Transaction::debit(100.0, "wifi", Category::Bills, jan(1)),
            Transaction::debit(100.0, "meal", Category::Food, jan(2)),
        ];
        let insight = build_insights(&current, &previous, 100_000.0, reference());
        assert!(insight
            .tips
            .contains(&"You are spending the most on bills (50%).".to_string()));
    }

    fn has_tip(insight: &MonthlyInsight, prefix: &str) -> bool {
        insight.tips.iter().any(|t| t.starts_with(prefix))
    }

    #[test]
    fn test_food_share_of_exactly_a_quarter_is_not_high() {
        let current = vec![
            Transaction::debit(100.0, "meal", Category::Food, feb(1)),
            Transaction::debit(300.0, "flight", Category::Travel, feb(2)),
        ];
        let insight = build_insights(&current, &[], 100_000.0, reference());
        assert!(!has_tip(&insight, "Food expenses are high"));

        let current = vec![
            Transaction::debit(101.0, "meal", Category::Food, feb(1)),
            Transaction::debit(300.0, "flight", Category::Travel, feb(2)),
        ];
        let insight = build_insights(&current, &[], 100_000.0, reference());
        assert!(has_tip(&insight, "Food expenses are high"));
    }

    #[test]
    fn test_shopping_up_exactly_15_percent_is_not_flagged() {
        let current = vec![Transaction::debit(115.0, "mall", Category::Shopping, feb(1))];
        let previous = vec![Transaction::debit(100.0, "mall", Category::Shopping, jan(1))];
        let insight = build_insights(&current, &previous, 100_000.0, reference());
        assert!(!has_tip(&insight, "Shopping increased"));

        let current = vec![Transaction::debit(116.0, "mall", Category::Shopping, feb(1))];
        let insight = build_insights(&current, &previous, 100_000.0, reference());
        assert!(has_tip(&insight, "Shopping increased"));
    }

    #[test]
    fn test_growth_of_exactly_20_percent_is_not_reported() {
        let current = vec![Transaction::debit(120.0, "wifi", Category::Bills, feb(1))];
        let previous = vec![Transaction::debit(100.0, "wifi", Category::Bills, jan(1))];
        let insight = build_insights(&current, &previous, 100_000.0, reference());
        assert!(!has_tip(&insight, "bills expenses grew"));

        let current = vec![Transaction::debit(121.0, "wifi", Category::Bills, feb(1))];
        let insight = build_insights(&current, &previous, 100_000.0, reference());
        assert!(has_tip(&insight, "bills expenses grew 21%"));
    }

    #[test]
    fn test_spending_exactly_70_percent_of_income_is_not_a_warning() {
        let current = vec![Transaction::debit(1400.0, "rent", Category::Bills, feb(1))];
        let insight = build_insights(&current, &[], 2000.0, reference());
        assert!(!has_tip(&insight, "You are close to your spending limit"));

        let current = vec![Transaction::debit(1400.5, "rent", Category::Bills, feb(1))];
        let insight = build_insights(&current, &[], 2000.0, reference());
        assert!(has_tip(&insight, "You are close to your spending limit"));
    }

    #[test]
    fn test_tips_unique_and_bounded() {
        let current: Vec<_> = Category::ALL
            .into_iter()
            .enumerate()
            .map(|(i, c)| Transaction::debit(10.0 * (i + 1) as f64, "x", c, feb(1)))
            .collect();
        let insight = build_insights(&current, &[], 1.0, reference());
        assert!(insight.tips.len() <= MAX_TIPS);
        for (i, tip) in insight.tips.iter().enumerate() {
            assert!(!insight.tips[i + 1..].contains(tip), "duplicate tip {tip}");
        }
    }

    #[test]
    fn test_serializes_camel_case() {
        let current = vec![Transaction::debit(100.0, "pizza", Category::Food, feb(1))];
        let insight = build_insights(&current, &[], 2000.0, reference());
        let json = serde_json::to_value(&insight).unwrap();
        assert_eq!(json["totalSpent"], 100.0);
        assert_eq!(json["previousPeriodTotal"], 0.0);
        assert_eq!(json["percentChange"], 100.0);
        assert_eq!(json["periodLabel"], "February");
        assert_eq!(json["categoryBreakdown"]["food"]["percentage"], 100.0);
    }
}

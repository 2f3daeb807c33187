//! Prose built on top of the structured analyses: savings recommendations,
//! the "spending twin" personality profile and a daily tip.
//!
//! Generation itself sits behind [`TextGenerator`]. Every helper here takes
//! an optional generator and always returns something usable: a missing
//! generator, a failed call or an unparseable reply yields a fixed fallback.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use spendwise_core::{Category, CategoryMap, Transaction, UserProfile};
use std::sync::OnceLock;

use crate::patterns::SpendingProfile;

pub const MAX_RECOMMENDATIONS: usize = 5;

/// One completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Optional system instructions
    pub system: Option<String>,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, max_tokens: u32, temperature: f32) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            max_tokens,
            temperature,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// Anything that turns a prompt into text, typically a chat-completion API.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, request: &GenerationRequest) -> Result<String>;
}

/// Used when no generator is configured or the call fails.
pub const SAVINGS_FALLBACK: [&str; 3] = [
    "Track your daily expenses to identify unnecessary spending.",
    "Consider cooking at home more often to reduce food expenses.",
    "Review your subscriptions and cancel unused services.",
];

/// Used when the reply had no numbered lines.
pub const SAVINGS_UNPARSED_FALLBACK: [&str; 3] = [
    "Track your expenses daily to stay within budget.",
    "Set aside savings at the start of the month.",
    "Review and reduce unnecessary subscriptions.",
];

pub const DAILY_TIP_FALLBACK: &str = "Save money by tracking all daily expenses.";
pub const DAILY_TIP_OFFLINE: &str = "Always track your expenses to manage your budget better.";

pub const ADVISOR_SYSTEM: &str =
    "You are a friendly Indian financial advisor helping users save money. Give practical, actionable advice.";
pub const ADVISOR_OFFLINE: &str =
    "AI chat needs an LLM provider. Add an OpenAI or Anthropic API key to enable it.";
pub const ADVISOR_EMPTY: &str = "I apologize, but I could not generate a response.";
pub const ADVISOR_FAILED: &str =
    "I apologize, but I'm having trouble processing your request. Please try again later.";

fn numbered_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+\.\s*").expect("numbered line regex"))
}

fn json_object_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{[\s\S]*\}").expect("json object regex"))
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Pull `1. ...` style lines out of a reply, numbers stripped, at most
/// [`MAX_RECOMMENDATIONS`].
pub fn parse_recommendations(reply: &str) -> Vec<String> {
    let re = numbered_line_re();
    reply
        .lines()
        .map(str::trim)
        .filter(|line| re.is_match(line))
        .map(|line| re.replace(line, "").trim().to_string())
        .filter(|line| !line.is_empty())
        .take(MAX_RECOMMENDATIONS)
        .collect()
}

fn savings_prompt(transactions: &[Transaction], profile: &UserProfile) -> Result<GenerationRequest> {
    let mut totals: CategoryMap<f64> = CategoryMap::new();
    let mut total_spent = 0.0;
    for txn in transactions.iter().filter(|t| t.is_debit()) {
        total_spent += txn.amount;
        *totals.get_or_insert_with(txn.category, || 0.0) += txn.amount;
    }
    let breakdown = serde_json::to_string(&totals).context("serializing category totals")?;

    let prompt = format!(
        "Analyze this spending data and provide 3-5 specific, actionable recommendations \
         for saving money based on Indian spending habits.\n\n\
         Monthly Income: ₹{}\n\
         Savings Goal: ₹{}\n\
         Total Spent: ₹{}\n\
         Category Breakdown: {}\n\n\
         Provide recommendations in this format:\n\
         1. [Recommendation 1]\n\
         2. [Recommendation 2]\n\
         3. [Recommendation 3]\n\n\
         Focus on:\n\
         - Where to cut expenses\n\
         - Where overspending occurred\n\
         - How to reach the savings goal\n\
         - Indian context (local prices, habits, etc.)\n\n\
         Keep each recommendation concise (1-2 sentences).",
        profile.monthly_income, profile.savings_goal, total_spent, breakdown
    );

    Ok(GenerationRequest::new(prompt, 300, 0.7).with_system(
        "You are a personal financial advisor specializing in helping Indian users save money. \
         Provide practical, actionable advice based on spending patterns.",
    ))
}

/// Three to five concrete ways to save, given a window of transactions.
pub fn savings_recommendations(
    generator: Option<&dyn TextGenerator>,
    transactions: &[Transaction],
    profile: &UserProfile,
) -> Vec<String> {
    let Some(generator) = generator else {
        return to_strings(&SAVINGS_FALLBACK);
    };

    let reply = savings_prompt(transactions, profile).and_then(|req| generator.generate(&req));
    match reply {
        Ok(text) => {
            let recs = parse_recommendations(&text);
            if recs.is_empty() {
                tracing::warn!("no numbered recommendations in reply, using defaults");
                to_strings(&SAVINGS_UNPARSED_FALLBACK)
            } else {
                recs
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "savings recommendations unavailable, using defaults");
            to_strings(&SAVINGS_FALLBACK)
        }
    }
}

/// A personality profile of how someone spends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingTwin {
    pub personality_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub risk_score: String,
    #[serde(default)]
    pub habit_to_improve: String,
    #[serde(default)]
    pub predicted_savings: f64,
}

impl SpendingTwin {
    /// The profile used whenever generation fails.
    pub fn balanced(profile: &SpendingProfile) -> Self {
        Self {
            personality_name: "The Balanced Spender".to_string(),
            description: "You maintain a balanced approach to spending and saving.".to_string(),
            strengths: to_strings(&[
                "Regular expense tracking",
                "Consistent spending patterns",
                "Good category distribution",
            ]),
            weaknesses: to_strings(&[
                "Could save more",
                "Some impulse purchases",
                "Room for optimization",
            ]),
            risk_score: "Medium".to_string(),
            habit_to_improve: "Set a monthly budget and stick to it".to_string(),
            predicted_savings: (profile.monthly_income - profile.total_debit / 3.0).max(0.0),
        }
    }
}

/// Parse the first `{...}` span of a reply.
pub fn parse_twin(reply: &str) -> Result<SpendingTwin> {
    let json = json_object_re()
        .find(reply)
        .context("no JSON object in reply")?
        .as_str();
    serde_json::from_str(json).context("parsing spending twin JSON")
}

/// Render a profile as the plain-text summary the twin prompt embeds.
pub fn profile_summary(p: &SpendingProfile) -> Result<String> {
    let biggest = p.category_spend.get(p.biggest_spend_category).copied().unwrap_or(0.0);
    let breakdown = serde_json::to_string(&p.category_spend).context("serializing category spend")?;
    Ok(format!(
        "Total Credit: ₹{}\n\
         Total Debit: ₹{}\n\
         Most Frequent Category: {}\n\
         Total Transactions: {}\n\
         Weekend vs Weekday Ratio: {:.1}% weekend\n\
         Late Night Spends (8 PM - 2 AM): {} transactions\n\
         Biggest Spending Category: {} (₹{})\n\
         Average Spend per Week: ₹{:.2}\n\
         Spending Spikes: {} weeks with unusually high spending\n\
         Monthly Income: ₹{}\n\
         Savings Goal: ₹{}\n\
         Category Breakdown: {}\n",
        p.total_credit,
        p.total_debit,
        p.most_frequent_category,
        p.transaction_count,
        p.weekend_ratio,
        p.late_night_count,
        p.biggest_spend_category,
        biggest,
        p.average_weekly_spend,
        p.spending_spikes.len(),
        p.monthly_income,
        p.savings_goal,
        breakdown,
    ))
}

fn twin_prompt(p: &SpendingProfile) -> Result<GenerationRequest> {
    let summary = profile_summary(p)?;
    let prompt = format!(
        "You are an advanced financial behavior analyst. Analyze the user's spending patterns \
         and generate a detailed personality profile.\n\n\
         Based on the data below, respond ONLY in structured JSON:\n\n\
         {{\n  \"personalityName\": \"\",\n  \"description\": \"\",\n  \"strengths\": [],\n  \
         \"weaknesses\": [],\n  \"riskScore\": \"\",\n  \"habitToImprove\": \"\",\n  \
         \"predictedSavings\": 0\n}}\n\n\
         Data:\n{summary}"
    );
    Ok(GenerationRequest::new(prompt, 800, 0.7))
}

/// Describe a spending profile as a personality.
pub fn spending_twin(generator: Option<&dyn TextGenerator>, profile: &SpendingProfile) -> SpendingTwin {
    let Some(generator) = generator else {
        return SpendingTwin::balanced(profile);
    };

    let twin = twin_prompt(profile)
        .and_then(|req| generator.generate(&req))
        .and_then(|reply| parse_twin(&reply));
    match twin {
        Ok(twin) => twin,
        Err(e) => {
            let error = format!("{e:#}");
            tracing::warn!(%error, "spending twin unavailable, using fallback");
            SpendingTwin::balanced(profile)
        }
    }
}

/// One short money-saving tip for `date`.
pub fn daily_tip(generator: Option<&dyn TextGenerator>, date: NaiveDate) -> String {
    let Some(generator) = generator else {
        return DAILY_TIP_OFFLINE.to_string();
    };

    let req = GenerationRequest::new(
        format!(
            "Give one short, practical daily money-saving tip for Indian users for {}. \
             Make it unique and different. Keep it concise (1-2 sentences).",
            date.format("%Y-%m-%d")
        ),
        100,
        0.8,
    )
    .with_system("You are a financial advisor providing daily tips. Keep responses concise (1-2 sentences).");

    match generator.generate(&req) {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(_) => DAILY_TIP_FALLBACK.to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "daily tip unavailable, using fallback");
            DAILY_TIP_FALLBACK.to_string()
        }
    }
}

/// Free-form advice for one user message.
///
/// `context` replaces the default advisor instructions.
pub fn advisor_reply(generator: Option<&dyn TextGenerator>, message: &str, context: Option<&str>) -> String {
    let Some(generator) = generator else {
        return ADVISOR_OFFLINE.to_string();
    };

    let system = context
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(ADVISOR_SYSTEM);
    let req = GenerationRequest::new(message.trim(), 500, 0.7).with_system(system);

    match generator.generate(&req) {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(_) => ADVISOR_EMPTY.to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "advisor chat failed");
            ADVISOR_FAILED.to_string()
        }
    }
}

/// The prompt an LLM-backed classifier sends for one description.
pub fn classification_request(description: &str) -> GenerationRequest {
    let labels: Vec<&str> = Category::ALL.iter().map(Category::as_str).collect();
    GenerationRequest::new(
        format!("Categorize this expense: \"{description}\". Respond with ONLY the category name."),
        10,
        0.3,
    )
    .with_system(format!(
        "You are a helpful assistant that categorizes expenses. Always respond with only the \
         category name from the list: {}.",
        labels.join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::analyze_pattern;
    use std::sync::Mutex;

    struct Canned(&'static str);

    impl TextGenerator for Canned {
        fn generate(&self, _request: &GenerationRequest) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct Broken;

    impl TextGenerator for Broken {
        fn generate(&self, _request: &GenerationRequest) -> Result<String> {
            anyhow::bail!("connection refused")
        }
    }

    #[derive(Default)]
    struct Recording(Mutex<Vec<GenerationRequest>>);

    impl TextGenerator for Recording {
        fn generate(&self, request: &GenerationRequest) -> Result<String> {
            self.0.lock().unwrap().push(request.clone());
            Ok("1. Cook at home".to_string())
        }
    }

    fn txns() -> Vec<Transaction> {
        let ts = NaiveDate::from_ymd_opt(2026, 2, 10)
            .unwrap()
            .and_hms_opt(21, 0, 0)
            .unwrap();
        vec![
            Transaction::debit(600.0, "pizza", Category::Food, ts),
            Transaction::debit(300.0, "uber", Category::Travel, ts),
            Transaction::credit(50_000.0, "salary", Category::Other, ts),
        ]
    }

    #[test]
    fn test_parse_recommendations() {
        let reply = "Here are some ideas:\n\
                     1. Cook at home twice a week.\n\
                     2.   Use metro instead of cabs.\n\
                     3.\n\
                     Not numbered\n\
                     4. Cancel unused OTT subscriptions.\n\
                     5. Buy groceries in bulk.\n\
                     6. Set up a recurring deposit.\n\
                     7. Too many";
        let recs = parse_recommendations(reply);
        assert_eq!(recs.len(), 5);
        assert_eq!(recs[0], "Cook at home twice a week.");
        assert_eq!(recs[1], "Use metro instead of cabs.");
        assert_eq!(recs[4], "Set up a recurring deposit.");
    }

    #[test]
    fn test_savings_without_generator() {
        let recs = savings_recommendations(None, &txns(), &UserProfile::new(40_000.0, 5_000.0));
        assert_eq!(recs, to_strings(&SAVINGS_FALLBACK));
    }

    #[test]
    fn test_savings_generator_failure() {
        let recs = savings_recommendations(Some(&Broken), &txns(), &UserProfile::default());
        assert_eq!(recs, to_strings(&SAVINGS_FALLBACK));
    }

    #[test]
    fn test_savings_unparseable_reply() {
        let recs = savings_recommendations(Some(&Canned("Just save more.")), &txns(), &UserProfile::default());
        assert_eq!(recs, to_strings(&SAVINGS_UNPARSED_FALLBACK));
    }

    #[test]
    fn test_savings_prompt_uses_debits_only() {
        let rec = Recording::default();
        let recs = savings_recommendations(Some(&rec), &txns(), &UserProfile::new(40_000.0, 5_000.0));
        assert_eq!(recs, vec!["Cook at home".to_string()]);

        let reqs = rec.0.lock().unwrap();
        assert_eq!(reqs.len(), 1);
        assert!(reqs[0].prompt.contains("Total Spent: ₹900"));
        assert!(reqs[0].prompt.contains(r#"{"food":600.0,"travel":300.0}"#));
        assert!(reqs[0].prompt.contains("Monthly Income: ₹40000"));
        assert_eq!(reqs[0].max_tokens, 300);
    }

    #[test]
    fn test_twin_parsed_from_chatty_reply() {
        let reply = r#"Sure! Here is the profile:
{
  "personalityName": "The Night Owl",
  "description": "Most of your spending happens after dark.",
  "strengths": ["Low bills"],
  "weaknesses": ["Late-night food orders"],
  "riskScore": "High",
  "habitToImprove": "Stop ordering after 10 PM",
  "predictedSavings": 4200
}
Hope this helps."#;
        let profile = analyze_pattern(&txns(), 40_000.0, 5_000.0);
        let twin = spending_twin(Some(&Canned(reply)), &profile);
        assert_eq!(twin.personality_name, "The Night Owl");
        assert_eq!(twin.risk_score, "High");
        assert_eq!(twin.predicted_savings, 4200.0);
    }

    #[test]
    fn test_twin_fallback_on_garbage() {
        let profile = analyze_pattern(&txns(), 1_000.0, 0.0);
        let twin = spending_twin(Some(&Canned("I cannot help with that.")), &profile);
        assert_eq!(twin.personality_name, "The Balanced Spender");
        assert_eq!(twin.risk_score, "Medium");
        // 1000 - 900 / 3
        assert_eq!(twin.predicted_savings, 700.0);
    }

    #[test]
    fn test_twin_fallback_never_negative() {
        let profile = analyze_pattern(&txns(), 0.0, 0.0);
        let twin = spending_twin(None, &profile);
        assert_eq!(twin.predicted_savings, 0.0);
        assert_eq!(twin.strengths.len(), 3);
    }

    #[test]
    fn test_profile_summary_lines() {
        let profile = analyze_pattern(&txns(), 40_000.0, 5_000.0);
        let summary = profile_summary(&profile).unwrap();
        assert!(summary.contains("Total Debit: ₹900\n"));
        assert!(summary.contains("Most Frequent Category: food\n"));
        assert!(summary.contains("Late Night Spends (8 PM - 2 AM): 3 transactions\n"));
        assert!(summary.contains("Biggest Spending Category: food (₹600)\n"));
        assert!(summary.contains("Weekend vs Weekday Ratio: 0.0% weekend\n"));
    }

    #[test]
    fn test_daily_tip() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 18).unwrap();
        assert_eq!(daily_tip(None, date), DAILY_TIP_OFFLINE);
        assert_eq!(daily_tip(Some(&Broken), date), DAILY_TIP_FALLBACK);
        assert_eq!(daily_tip(Some(&Canned("   ")), date), DAILY_TIP_FALLBACK);
        assert_eq!(
            daily_tip(Some(&Canned(" Carry a water bottle.\n")), date),
            "Carry a water bottle."
        );
    }

    #[test]
    fn test_advisor_reply_fallbacks() {
        assert_eq!(advisor_reply(None, "How do I save?", None), ADVISOR_OFFLINE);
        assert_eq!(advisor_reply(Some(&Broken), "How do I save?", None), ADVISOR_FAILED);
        assert_eq!(advisor_reply(Some(&Canned("\n")), "How do I save?", None), ADVISOR_EMPTY);
    }

    #[test]
    fn test_advisor_reply_context_replaces_system() {
        let rec = Recording::default();
        let reply = advisor_reply(Some(&rec), "  Is a SIP worth it?\n", None);
        assert_eq!(reply, "1. Cook at home");
        advisor_reply(Some(&rec), "Budget for Goa?", Some("You plan student trips."));
        advisor_reply(Some(&rec), "Budget for Goa?", Some("  "));

        let reqs = rec.0.lock().unwrap();
        assert_eq!(reqs[0].prompt, "Is a SIP worth it?");
        assert_eq!(reqs[0].system.as_deref(), Some(ADVISOR_SYSTEM));
        assert_eq!(reqs[0].max_tokens, 500);
        assert_eq!(reqs[1].system.as_deref(), Some("You plan student trips."));
        assert_eq!(reqs[2].system.as_deref(), Some(ADVISOR_SYSTEM));
    }

    #[test]
    fn test_classification_request_lists_taxonomy() {
        let req = classification_request("Apollo Pharmacy");
        assert!(req.prompt.contains("\"Apollo Pharmacy\""));
        assert_eq!(req.max_tokens, 10);
        let system = req.system.unwrap();
        assert!(system.ends_with("food, travel, shopping, bills, entertainment, medical, education, other."));
    }
}

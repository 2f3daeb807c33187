use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use spendwise_core::{time::to_local, Period, Transaction};
use spendwise_finance::{
    advisor_reply, analyze_pattern, daily_tip, parse_transactions_csv, savings_recommendations,
    spending_twin, Classifier, InsightBuilder, KeywordTable, SpendBasis, TextGenerator,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod auth;
mod config;
mod llm;
mod state;

use config::Config;
use llm::LlmClient;

#[derive(Parser, Debug)]
#[command(name = "spendwise", version, about = "Categorize spending and explain where the money goes")]
struct Cli {
    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Never call an LLM, even when a key is configured
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Categorize a single expense description
    Categorize {
        #[arg(required = true)]
        description: Vec<String>,
    },

    /// Month-over-month insight for a statement (JSON)
    Insights {
        #[arg(long)]
        csv: PathBuf,

        /// Month to report, YYYY-MM (default: current month)
        #[arg(long)]
        month: Option<String>,

        /// Monthly income for the spending-limit tip (default: from config)
        #[arg(long)]
        income: Option<f64>,

        /// Count credits as spend too
        #[arg(long)]
        all_types: bool,
    },

    /// Behavioral spending pattern over a trailing window (JSON)
    Pattern {
        #[arg(long)]
        csv: PathBuf,

        #[arg(long, default_value_t = 90)]
        days: u32,
    },

    /// Spending personality profile (JSON)
    Twin {
        #[arg(long)]
        csv: PathBuf,

        #[arg(long, default_value_t = 90)]
        days: u32,
    },

    /// Savings recommendations from recent spending
    Savings {
        #[arg(long)]
        csv: PathBuf,

        #[arg(long, default_value_t = 30)]
        days: u32,
    },

    /// Today's money-saving tip
    Tip,

    /// Ask the financial advisor a question
    Chat {
        /// Replaces the default advisor instructions
        #[arg(long)]
        context: Option<String>,

        #[arg(required = true)]
        message: Vec<String>,
    },

    /// Manage ~/.spendwise/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Store API keys in ~/.spendwise/auth.json
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config if none exists
    Init,
    /// Print the effective config
    Show,
}

#[derive(Subcommand, Debug)]
enum AuthCommand {
    PasteOpenaiApiKey,
    PasteAnthropicToken,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    // stdout carries command output
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact().with_writer(std::io::stderr))
        .init();

    let offline = cli.offline;
    match cli.command {
        Command::Categorize { description } => {
            let cfg = config::load_config()?;
            let llm = llm_client(&cfg, offline)?;
            let table = cfg.keyword_table();
            let classifier = match &llm {
                Some(client) => Classifier::with_external(&table, client),
                None => Classifier::new(&table),
            };
            println!("{}", classifier.classify(&description.join(" ")));
        }

        Command::Insights {
            csv,
            month,
            income,
            all_types,
        } => {
            let cfg = config::load_config()?;
            let txns = load_statement(&csv, &cfg.keyword_table())?;
            let reference = match month {
                Some(m) => parse_month(&m)?,
                None => local_now(&cfg)?.date(),
            };
            let current = Period::month_of(reference).select(&txns);
            let previous = Period::previous_month_of(reference).select(&txns);
            let income = income.unwrap_or_else(|| cfg.user_profile().insight_income());

            let basis = if all_types {
                SpendBasis::AllTransactions
            } else {
                SpendBasis::DebitsOnly
            };
            let insight = InsightBuilder::with_basis(basis).build(&current, &previous, income, reference);
            print_json(&insight)?;
        }

        Command::Pattern { csv, days } => {
            let cfg = config::load_config()?;
            let window = trailing(&cfg, &csv, days)?;
            let profile = cfg.user_profile();
            print_json(&analyze_pattern(&window, profile.monthly_income, profile.savings_goal))?;
        }

        Command::Twin { csv, days } => {
            let cfg = config::load_config()?;
            let llm = llm_client(&cfg, offline)?;
            let window = trailing(&cfg, &csv, days)?;
            let profile = cfg.user_profile();
            let pattern = analyze_pattern(&window, profile.monthly_income, profile.savings_goal);
            print_json(&spending_twin(as_generator(&llm), &pattern))?;
        }

        Command::Savings { csv, days } => {
            let cfg = config::load_config()?;
            let llm = llm_client(&cfg, offline)?;
            let window = trailing(&cfg, &csv, days)?;
            let recs = savings_recommendations(as_generator(&llm), &window, &cfg.user_profile());
            for (i, r) in recs.iter().enumerate() {
                println!("{}. {}", i + 1, r);
            }
        }

        Command::Tip => {
            let cfg = config::load_config()?;
            let llm = llm_client(&cfg, offline)?;
            println!("{}", daily_tip(as_generator(&llm), local_now(&cfg)?.date()));
        }

        Command::Chat { context, message } => {
            let cfg = config::load_config()?;
            let llm = llm_client(&cfg, offline)?;
            println!(
                "{}",
                advisor_reply(as_generator(&llm), &message.join(" "), context.as_deref())
            );
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => {
                let cfg = config::load_config()?;
                print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
            }
        },

        Command::Auth { command } => match command {
            AuthCommand::PasteOpenaiApiKey => auth::openai_paste_api_key()?,
            AuthCommand::PasteAnthropicToken => auth::anthropic_paste_token()?,
        },
    }

    Ok(())
}

fn llm_client(cfg: &Config, offline: bool) -> Result<Option<LlmClient>> {
    if offline {
        return Ok(None);
    }
    let client = LlmClient::from_env(&cfg.llm)?;
    match &client {
        Some(c) => tracing::debug!(provider = ?c.config().provider, model = %c.config().model, "LLM enabled"),
        None => tracing::debug!("LLM disabled, using offline fallbacks"),
    }
    Ok(client)
}

fn as_generator(llm: &Option<LlmClient>) -> Option<&dyn TextGenerator> {
    llm.as_ref().map(|c| c as &dyn TextGenerator)
}

/// Wall-clock now in the profile's timezone.
fn local_now(cfg: &Config) -> Result<NaiveDateTime> {
    to_local(Utc::now(), &cfg.profile.timezone)
}

/// Statement rows are classified by keyword rules only; one LLM call per
/// row is not worth it for bulk imports.
fn load_statement(path: &Path, table: &KeywordTable) -> Result<Vec<Transaction>> {
    if !path.exists() {
        bail!("CSV not found: {} (pass --csv <path>)", path.display());
    }
    parse_transactions_csv(path, &Classifier::new(table))
}

fn trailing(cfg: &Config, path: &Path, days: u32) -> Result<Vec<Transaction>> {
    let txns = load_statement(path, &cfg.keyword_table())?;
    let window = Period::trailing_days(local_now(cfg)?, days).select(&txns);
    tracing::info!(days, selected = window.len(), total = txns.len(), "trailing window");
    Ok(window)
}

fn parse_month(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", s.trim()), "%Y-%m-%d")
        .with_context(|| format!("invalid --month `{s}` (expected YYYY-MM)"))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

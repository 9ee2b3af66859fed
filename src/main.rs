//! Split-Ladder Strategy Admin
//!
//! Computational engine behind the admin console for a tiered split-buy
//! equities strategy: capital-allocation figures per account/stock pair, and
//! the save/apply/batch-switch protocol for reusable configuration templates.

mod api;
mod engine;
mod error;
mod models;
#[cfg(test)]
mod test_support;

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::api::{AdminApi, AllocationFilter, HttpAdminClient, TemplateFilter};
use crate::engine::{calculator, ApplyOutcome, LevelSwitchEngine, SwitchTarget, TemplateApplier, TemplateStore};
use crate::models::{
    AccountStockAllocation, BuyRatioConfig, ConfigTemplate, ConfigType, TemplateLevel,
    TimeSegmentConfig,
};

/// Split-ladder strategy admin CLI.
#[derive(Parser)]
#[command(name = "splitladder-admin")]
#[command(about = "Capital allocation figures and config templates for the split-ladder strategy", long_about = None)]
struct Cli {
    /// Base URL of the strategy admin API
    #[arg(long, env = "SPLITLADDER_API_URL", default_value = "http://localhost:8080")]
    api_url: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute allocation figures for an account/stock pair
    Compute {
        /// Account id
        #[arg(long)]
        account: String,

        /// Stock code
        #[arg(long)]
        stock: String,

        /// Strategy id
        #[arg(long)]
        strategy: String,

        /// Capital ceiling; omit to fetch the stored allocation instead
        #[arg(long)]
        max_amount: Option<Decimal>,

        /// Account total for percentage figures
        #[arg(long)]
        account_total: Option<Decimal>,

        /// File holding the stored buy-ratio JSON; omitted means defaults
        #[arg(long)]
        buy_ratio_file: Option<PathBuf>,
    },

    /// Validate and canonicalize a time-segment config file
    ValidateSegments {
        /// JSON file with a time-segment config
        file: PathBuf,
    },

    /// List templates, optionally narrowed to selected stocks
    ListTemplates {
        /// Template scope: strategy-config or time-segment
        #[arg(long, default_value = "strategy-config")]
        config_type: String,

        /// Filter by source stock code
        #[arg(long)]
        stock: Option<String>,

        /// Filter by strategy id
        #[arg(long)]
        strategy: Option<String>,

        /// Stock codes of pre-selected target rows (narrows the listing)
        #[arg(long)]
        selected: Vec<String>,
    },

    /// Save a config as a reusable template
    SaveTemplate {
        /// Template name (unique within its config type)
        #[arg(long)]
        name: String,

        /// Template scope: strategy-config or time-segment
        #[arg(long, default_value = "strategy-config")]
        config_type: String,

        /// Source stock code; omit for a wildcard template
        #[arg(long)]
        stock: Option<String>,

        /// Strategy id
        #[arg(long)]
        strategy: Option<String>,

        /// JSON file with the template payload
        #[arg(long)]
        payload_file: PathBuf,

        /// Overwrite an existing template without prompting
        #[arg(long)]
        yes: bool,
    },

    /// Delete a template by id
    DeleteTemplate {
        /// Template id
        id: String,
    },

    /// Apply a template onto target allocations
    ApplyTemplate {
        /// Template id
        #[arg(long)]
        template: String,

        /// Target allocation ids
        #[arg(long, required = true)]
        target: Vec<String>,

        /// Overwrite conflicting targets without prompting
        #[arg(long)]
        yes: bool,
    },

    /// Switch a batch of rows to a template level
    SwitchLevel {
        /// Template level (S, A, B, C, D)
        #[arg(long)]
        level: String,

        /// JSON file with the selected target rows
        #[arg(long)]
        targets_file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let client = HttpAdminClient::new(&cli.api_url)?;

    match cli.command {
        Commands::Compute {
            account,
            stock,
            strategy,
            max_amount,
            account_total,
            buy_ratio_file,
        } => {
            let allocation = match max_amount {
                Some(max) => AccountStockAllocation::with_max_amount(account, stock, strategy, max),
                None => fetch_allocation(&client, &account, &stock, &strategy).await?,
            };
            allocation.validate()?;

            let raw = match &buy_ratio_file {
                Some(path) => Some(
                    std::fs::read_to_string(path)
                        .with_context(|| format!("failed to read {}", path.display()))?,
                ),
                None => None,
            };
            let config = BuyRatioConfig::parse(raw.as_deref());

            let figures = calculator::compute(&allocation, &config);
            print_figure("Single amount", figures.single_amount, account_total);
            print_figure("Daily max holding", figures.daily_max_holding, account_total);
            print_figure("Max holding", figures.max_holding, account_total);

            // Fund-percent pairs have no absolute ceiling of their own; show
            // the derived one when the account total is known.
            if allocation.max_amount.is_none() {
                match account_total.and_then(|total| allocation.effective_ceiling(total)) {
                    Some(ceiling) => print_figure("Effective ceiling", ceiling, account_total),
                    None => println!(
                        "Fund-percent mode: supply --account-total to see the effective ceiling."
                    ),
                }
            }
        }

        Commands::ValidateSegments { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let config: TimeSegmentConfig =
                serde_json::from_str(&raw).context("failed to parse time-segment config")?;

            let canonical = config.into_canonical()?;
            println!("{} segments, canonical order:", canonical.entries.len());
            for entry in &canonical.entries {
                println!(
                    "  {}  below {}%  above {}%  profit {}%",
                    entry.time_segment,
                    entry.ma_below_percent.round_dp(2),
                    entry.ma_above_percent.round_dp(2),
                    entry.profit_percent.round_dp(2),
                );
            }
        }

        Commands::ListTemplates {
            config_type,
            stock,
            strategy,
            selected,
        } => {
            let config_type = parse_config_type(&config_type)?;
            let store = TemplateStore::new(&client);
            let filter = TemplateFilter {
                source_stock_code: stock,
                strategy_id: strategy,
            };

            let templates = store.list(config_type, &filter, &selected).await?;
            if templates.is_empty() {
                println!("No templates found.");
                return Ok(());
            }

            println!("\n{:<10} {:<28} {:<10} {:<12}", "ID", "NAME", "SOURCE", "MARKET CAP");
            println!("{}", "-".repeat(64));
            for template in templates {
                println!(
                    "{:<10} {:<28} {:<10} {:<12}",
                    template.id.as_deref().unwrap_or("-"),
                    template.template_name,
                    template.source_stock_code.as_deref().unwrap_or("*"),
                    market_cap_band(&template),
                );
            }
        }

        Commands::SaveTemplate {
            name,
            config_type,
            stock,
            strategy,
            payload_file,
            yes,
        } => {
            let payload: serde_json::Value = serde_json::from_str(
                &std::fs::read_to_string(&payload_file)
                    .with_context(|| format!("failed to read {}", payload_file.display()))?,
            )
            .context("failed to parse template payload")?;

            let template = ConfigTemplate {
                id: None,
                template_name: name.clone(),
                config_type: parse_config_type(&config_type)?,
                source_stock_code: stock,
                strategy_id: strategy,
                min_market_cap: None,
                max_market_cap: None,
                payload,
                created_at: None,
            };

            let applier = TemplateApplier::new(&client);
            let outcome = applier
                .save_as_template(&template, |message| confirm_overwrite(message, yes))
                .await;
            finish_apply(outcome, &format!("Template \"{name}\" saved."))?;
        }

        Commands::DeleteTemplate { id } => {
            let store = TemplateStore::new(&client);
            store.delete(&id).await?;
            println!("Template {id} deleted.");
        }

        Commands::ApplyTemplate {
            template,
            target,
            yes,
        } => {
            info!(template = %template, targets = target.len(), "applying template");

            let applier = TemplateApplier::new(&client);
            let outcome = applier
                .apply_to_targets(&template, &target, |message| confirm_overwrite(message, yes))
                .await;
            finish_apply(
                outcome,
                &format!("Template applied to {} target(s).", target.len()),
            )?;
        }

        Commands::SwitchLevel {
            level,
            targets_file,
        } => {
            let level: TemplateLevel = level.parse().map_err(|err: String| anyhow::anyhow!(err))?;
            let targets: Vec<SwitchTarget> = serde_json::from_str(
                &std::fs::read_to_string(&targets_file)
                    .with_context(|| format!("failed to read {}", targets_file.display()))?,
            )
            .context("failed to parse switch targets")?;

            let engine = LevelSwitchEngine::new(&client);
            let report = engine.switch_level(&targets, level).await;

            println!("\nStatus: {:?}", report.status);
            println!(
                "Processed {} | succeeded {} | no config {} | failed {}",
                report.total_process_count,
                report.total_success_count,
                report.total_no_config_count,
                report.total_failure_count,
            );
            for category in &report.categories {
                println!(
                    "  {:?}: {} processed, {} succeeded, {} no config, {} failed",
                    category.kind,
                    category.process_count,
                    category.success_count,
                    category.no_config_count,
                    category.failure_count,
                );
            }
            if !report.no_config_list.is_empty() {
                println!("\nNo template registered for:");
                for entry in &report.no_config_list {
                    match &entry.account_id {
                        Some(account) => println!("  {} ({})", entry.stock_code, account),
                        None => println!("  {}", entry.stock_code),
                    }
                }
            }
        }
    }

    Ok(())
}

async fn fetch_allocation(
    client: &HttpAdminClient,
    account: &str,
    stock: &str,
    strategy: &str,
) -> Result<AccountStockAllocation> {
    let filter = AllocationFilter {
        account_id: Some(account.to_string()),
        stock_code: Some(stock.to_string()),
        strategy_id: Some(strategy.to_string()),
    };
    let mut allocations = client.list_allocations(&filter).await?;
    if allocations.is_empty() {
        bail!("no allocation found for {account}/{stock}/{strategy}");
    }
    Ok(allocations.remove(0))
}

fn parse_config_type(value: &str) -> Result<ConfigType> {
    match value.to_lowercase().as_str() {
        "strategy-config" | "strategy" => Ok(ConfigType::StrategyConfig),
        "time-segment" | "segment" => Ok(ConfigType::TimeSegment),
        other => bail!("unknown config type \"{other}\" (expected strategy-config or time-segment)"),
    }
}

/// Money is kept at full precision internally; 2dp rounding happens here.
fn print_figure(label: &str, amount: Decimal, account_total: Option<Decimal>) {
    let ratio = account_total.and_then(|total| calculator::account_ratio(amount, total));
    match ratio {
        Some(ratio) => println!(
            "{:<18} {:>14}  ({}% of account)",
            label,
            amount.round_dp(2),
            ratio.round_dp(2)
        ),
        None => println!("{:<18} {:>14}", label, amount.round_dp(2)),
    }
}

fn market_cap_band(template: &ConfigTemplate) -> String {
    match (template.min_market_cap, template.max_market_cap) {
        (None, None) => "-".to_string(),
        (min, max) => format!(
            "{}..{}",
            min.map(|v| v.to_string()).unwrap_or_default(),
            max.map(|v| v.to_string()).unwrap_or_default()
        ),
    }
}

fn confirm_overwrite(message: &str, assume_yes: bool) -> bool {
    if assume_yes {
        return true;
    }
    print!("{message}. Overwrite? [y/N] ");
    let _ = std::io::stdout().flush();

    let mut answer = String::new();
    if std::io::stdin().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim(), "y" | "Y" | "yes")
}

fn finish_apply(outcome: ApplyOutcome, success_message: &str) -> Result<()> {
    match outcome {
        ApplyOutcome::Applied => {
            println!("{success_message}");
            Ok(())
        }
        ApplyOutcome::Aborted => {
            println!("Aborted; nothing changed.");
            Ok(())
        }
        ApplyOutcome::Failed(message) => bail!(message),
    }
}

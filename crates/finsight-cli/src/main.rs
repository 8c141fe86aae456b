//! Finsight CLI - Personal finance dashboard
//!
//! Usage:
//!   finsight add "Coffee" -4.50 -c "Food & Dining"   Record a transaction
//!   finsight import export.json                     Import transactions
//!   finsight metrics --period month                 Dashboard metrics
//!   finsight serve --port 3000                      Start web server

mod cli;
mod commands;


use anyhow::{Context, Result};
use clap::Parser;
use finsight_core::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load config")?;
    if let Some(dir) = &cli.data_dir {
        config.storage.data_dir = dir.display().to_string();
    }
    let today = chrono::Local::now().date_naive();

    // Opens the store and resolves the display currency
    let open = || -> Result<(finsight_core::Store, String)> {
        let store = commands::open_store(&config)?;
        let currency = commands::display_currency(&store, &config);
        Ok((store, currency))
    };

    match cli.command {
        Commands::Serve {
            port,
            host,
            no_auth,
        } => {
            let mut config = config.clone();
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(host) = host {
                config.server.host = host;
            }
            commands::cmd_serve(&config, no_auth).await
        }
        Commands::Config => commands::cmd_config(&config),
        Commands::Categorize { description } => {
            commands::cmd_categorize(&config, &description).await.map(drop)
        }
        Commands::Add {
            name,
            amount,
            category,
            date,
            merchant,
            notes,
            tags,
        } => {
            let (store, currency) = open()?;
            let input = commands::new_transaction(
                name,
                &amount,
                category,
                date.unwrap_or_else(|| today.to_string()),
                merchant,
                notes,
                tags,
            );
            commands::cmd_add(&store, &input, today, &currency).map(drop)
        }
        Commands::List {
            limit,
            search,
            category,
            transaction_type,
            from,
            to,
            sort,
            order,
        } => {
            let (store, currency) = open()?;
            let options = commands::ListOptions {
                limit,
                search: search.as_deref(),
                category: category.as_deref(),
                transaction_type: transaction_type.as_deref(),
                from: from.as_deref(),
                to: to.as_deref(),
                sort: &sort,
                order: &order,
            };
            commands::cmd_list(&store, &options, &currency)
        }
        Commands::Edit {
            id,
            name,
            amount,
            category,
            date,
            merchant,
            notes,
        } => {
            let (store, currency) = open()?;
            let edit = commands::TransactionEdit {
                name,
                amount,
                category,
                date,
                merchant,
                notes,
            };
            commands::cmd_edit(&store, &id, edit, today, &currency).map(drop)
        }
        Commands::Delete { id } => {
            let (store, _) = open()?;
            commands::cmd_delete(&store, &id)
        }
        Commands::Import { file } => {
            let (store, _) = open()?;
            commands::cmd_import(&store, &file, today)
        }
        Commands::Metrics { period } => {
            let (store, currency) = open()?;
            commands::cmd_metrics(&store, &period, today, &currency).map(drop)
        }
        Commands::Patterns => {
            let (store, currency) = open()?;
            commands::cmd_patterns(&store, &currency)
        }
        Commands::Forecast => {
            let (store, currency) = open()?;
            commands::cmd_forecast(&store, &currency)
        }
        Commands::Report { period, json } => {
            let (store, currency) = open()?;
            commands::cmd_report(&store, &period, json, today, &currency).map(drop)
        }
        Commands::Goals { action } => {
            let (store, currency) = open()?;
            match action {
                None | Some(GoalsAction::List) => commands::cmd_goals_list(&store, today, &currency),
                Some(GoalsAction::Add {
                    name,
                    target,
                    deadline,
                    category,
                }) => commands::cmd_goals_add(
                    &store,
                    &name,
                    target,
                    deadline.as_deref(),
                    category,
                    &currency,
                )
                .map(drop),
                Some(GoalsAction::Contribute { id, amount }) => {
                    commands::cmd_goals_contribute(&store, &id, amount, &currency).map(drop)
                }
                Some(GoalsAction::Delete { id }) => commands::cmd_goals_delete(&store, &id),
            }
        }
        Commands::Budgets { action } => {
            let (store, currency) = open()?;
            match action {
                None | Some(BudgetsAction::List) => {
                    commands::cmd_budgets_list(&store, today, &currency)
                }
                Some(BudgetsAction::Add {
                    category,
                    allocated,
                    period,
                }) => commands::cmd_budgets_add(&store, &category, allocated, &period, &currency)
                    .map(drop),
                Some(BudgetsAction::Delete { id }) => commands::cmd_budgets_delete(&store, &id),
            }
        }
        Commands::Insights { action } => {
            let (store, currency) = open()?;
            match action {
                None => commands::cmd_insights_list(&store, false, &currency),
                Some(InsightsAction::List { all }) => {
                    commands::cmd_insights_list(&store, all, &currency)
                }
                Some(InsightsAction::Generate { income, goal }) => {
                    commands::cmd_insights_generate(&store, &config, income, goal, &currency)
                        .await
                        .map(drop)
                }
                Some(InsightsAction::Dismiss { id }) => commands::cmd_insights_dismiss(&store, &id),
            }
        }
    }
}

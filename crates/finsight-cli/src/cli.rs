//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Finsight - Track income, spending and goals
#[derive(Parser)]
#[command(name = "finsight")]
#[command(about = "Self-hosted personal finance dashboard", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to ~/.local/share/finsight/config.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Data directory (overrides the config file and FINSIGHT_DATA_DIR)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server
    Serve {
        /// Port to listen on (defaults to the configured port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (defaults to the configured host)
        #[arg(long)]
        host: Option<String>,

        /// Disable API-key authentication (for local development only)
        ///
        /// WARNING: Do not use this flag when exposing the server to a network.
        #[arg(long)]
        no_auth: bool,
    },

    /// Record a transaction
    Add {
        /// Description, e.g. "Coffee"
        name: String,

        /// Signed amount: negative for expenses, positive for income
        #[arg(allow_hyphen_values = true)]
        amount: String,

        /// Category
        #[arg(short, long, default_value = "Other")]
        category: String,

        /// Date (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<String>,

        /// Merchant name
        #[arg(short, long)]
        merchant: Option<String>,

        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,

        /// Comma-separated tags
        #[arg(short, long, value_delimiter = ',')]
        tags: Vec<String>,
    },

    /// List transactions
    List {
        /// Maximum number of transactions to show
        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// Search name, merchant, category, notes and tags
        #[arg(short, long)]
        search: Option<String>,

        /// Only this category
        #[arg(short, long)]
        category: Option<String>,

        /// income or expense
        #[arg(long = "type")]
        transaction_type: Option<String>,

        /// Earliest date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Latest date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,

        /// Sort field: date, amount, name, category
        #[arg(long, default_value = "date")]
        sort: String,

        /// Sort order: asc or desc
        #[arg(long, default_value = "desc")]
        order: String,
    },

    /// Edit a transaction (unset fields keep their value)
    Edit {
        /// Transaction ID
        id: String,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long, allow_hyphen_values = true)]
        amount: Option<String>,

        #[arg(short, long)]
        category: Option<String>,

        #[arg(short, long)]
        date: Option<String>,

        #[arg(short, long)]
        merchant: Option<String>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Delete a transaction
    Delete {
        /// Transaction ID
        id: String,
    },

    /// Import transactions from a JSON export
    Import {
        /// JSON file: a list of transactions or {"transactions": [...]}
        file: PathBuf,
    },

    /// Show dashboard metrics
    Metrics {
        /// Period: week, month, year
        #[arg(short, long, default_value = "month")]
        period: String,
    },

    /// Show spending patterns per category
    Patterns,

    /// Forecast next month's expenses
    Forecast,

    /// Generate a financial report
    Report {
        /// Period: week, month, quarter, year
        #[arg(short, long, default_value = "month")]
        period: String,

        /// Output raw JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage savings goals
    Goals {
        #[command(subcommand)]
        action: Option<GoalsAction>,
    },

    /// Manage category budgets
    Budgets {
        #[command(subcommand)]
        action: Option<BudgetsAction>,
    },

    /// Manage AI insights
    Insights {
        #[command(subcommand)]
        action: Option<InsightsAction>,
    },

    /// Suggest a category for a transaction description
    Categorize {
        /// Transaction description
        description: String,
    },

    /// Show the effective configuration
    Config,
}

#[derive(Subcommand)]
pub enum GoalsAction {
    /// List goals with progress
    List,

    /// Add a goal
    Add {
        /// Goal name
        name: String,

        /// Target amount
        target: f64,

        /// Deadline (YYYY-MM-DD)
        #[arg(short, long)]
        deadline: Option<String>,

        /// Category
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Add money to a goal
    Contribute {
        /// Goal ID
        id: String,

        /// Amount to add
        amount: f64,
    },

    /// Delete a goal
    Delete {
        /// Goal ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum BudgetsAction {
    /// List budgets with current spending
    List,

    /// Add a budget
    Add {
        /// Category to budget
        category: String,

        /// Allocated amount per period
        allocated: f64,

        /// Period: weekly, monthly, yearly
        #[arg(short, long, default_value = "monthly")]
        period: String,
    },

    /// Delete a budget
    Delete {
        /// Budget ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum InsightsAction {
    /// List stored insights
    List {
        /// Include dismissed insights
        #[arg(long)]
        all: bool,
    },

    /// Generate new insights from your transactions
    Generate {
        /// Monthly income
        #[arg(short, long)]
        income: f64,

        /// Goals to consider (defaults to your saved goals)
        #[arg(short, long)]
        goal: Vec<String>,
    },

    /// Dismiss an insight
    Dismiss {
        /// Insight ID
        id: String,
    },
}

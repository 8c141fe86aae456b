//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `transactions` - Transaction commands (add, list, edit, delete, import)
//! - `dashboard` - Metrics, patterns, forecast and report commands
//! - `goals` - Goal and budget management commands
//! - `insights` - AI insight and categorization commands
//! - `serve` - Web server command
//! - `config` - Effective configuration display

pub mod config;
pub mod dashboard;
pub mod goals;
pub mod insights;
pub mod serve;
pub mod transactions;

// Re-export command functions for main.rs
pub use config::*;
pub use dashboard::*;
pub use goals::*;
pub use insights::*;
pub use serve::*;
pub use transactions::*;

use anyhow::{Context, Result};
use finsight_core::format::format_currency;
use finsight_core::{Config, Settings, Store};

/// Open the file-backed store in the configured data directory
pub fn open_store(config: &Config) -> Result<Store> {
    let dir = config.data_dir();
    Store::open(&dir).with_context(|| format!("Failed to open data directory {}", dir.display()))
}

/// Currency for display: the saved preference unless it is the default,
/// then the configured one
pub fn display_currency(store: &Store, config: &Config) -> String {
    match store.get_settings() {
        Ok(settings) if settings.currency != Settings::default().currency => settings.currency,
        _ => config.display.currency.clone(),
    }
}

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Red for expenses, green with a plus sign for income
pub fn colored_amount(amount: f64, currency: &str) -> String {
    if amount < 0.0 {
        format!("\x1b[31m{}\x1b[0m", format_currency(amount, currency))
    } else {
        format!("\x1b[32m+{}\x1b[0m", format_currency(amount, currency))
    }
}

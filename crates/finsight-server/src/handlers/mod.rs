//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod ai;
pub mod budgets;
pub mod goals;
pub mod insights;
pub mod metrics;
pub mod settings;
pub mod transactions;

// Re-export all handlers for use in router
pub use ai::*;
pub use budgets::*;
pub use goals::*;
pub use insights::*;
pub use metrics::*;
pub use settings::*;
pub use transactions::*;

//! The budget summary: an owner's aggregated income, expense and balance.

mod core;
mod endpoints;
mod strategy;

pub use core::{
    BudgetSummary, create_summary_table, fold_ledger, get_or_create_summary, save_summary,
};
pub use endpoints::{get_summary_endpoint, reconcile_summary_endpoint, set_shared_expense_endpoint};
pub use strategy::SummaryStrategy;

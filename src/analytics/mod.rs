//! Summaries of a user's finances for a dashboard.

mod core;
mod handlers;

pub use core::{CategorySpending, Summary, get_spending_by_category, get_summary};
pub use handlers::{
    get_budget_progress_endpoint, get_recent_transactions_endpoint,
    get_spending_by_category_endpoint, get_summary_endpoint,
};

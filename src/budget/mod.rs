//! Spending limits per category over a range of dates.

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod list_endpoint;

pub use core::{
    BudgetDetails, NewBudget, create_budget, create_budget_table, delete_budget,
    get_budget, get_budgets, get_budgets_overlapping, update_budget,
};
pub use create_endpoint::create_budget_endpoint;
pub use delete_endpoint::delete_budget_endpoint;
pub use edit_endpoint::edit_budget_endpoint;
pub use list_endpoint::{get_budget_endpoint, get_budgets_endpoint};

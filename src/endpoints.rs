//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/accounts/{account_id}', use [format_endpoint].

/// The route for registering a new user.
pub const REGISTER: &str = "/api/auth/register";
/// The route for logging in a user.
pub const LOG_IN: &str = "/api/auth/log_in";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/auth/log_out";
/// The route for viewing and editing the current user's profile.
pub const ME: &str = "/api/auth/me";
/// The route for changing the current user's password.
pub const CHANGE_PASSWORD: &str = "/api/auth/change-password";

/// The route to list and create accounts.
pub const ACCOUNTS: &str = "/api/accounts";
/// The route to access a single account.
pub const ACCOUNT: &str = "/api/accounts/{account_id}";

/// The route to list and create categories.
pub const CATEGORIES: &str = "/api/categories";
/// The route to list only the categories owned by the current user.
pub const MY_CATEGORIES: &str = "/api/categories/mine";
/// The route to access a single category.
pub const CATEGORY: &str = "/api/categories/{category_id}";

/// The route to list and create transactions.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route to access a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route to upload a CSV file of transactions.
pub const IMPORT_TRANSACTIONS: &str = "/api/transactions/import";
/// The route to download all transactions as a CSV file.
pub const EXPORT_TRANSACTIONS: &str = "/api/transactions/export";

/// The route to list and create budgets.
pub const BUDGETS: &str = "/api/budgets";
/// The route to access a single budget.
pub const BUDGET: &str = "/api/budgets/{budget_id}";

/// The route to list and create recurring transactions.
pub const RECURRING_TRANSACTIONS: &str = "/api/recurring-transactions";
/// The route to access a single recurring transaction.
pub const RECURRING_TRANSACTION: &str = "/api/recurring-transactions/{recurring_id}";
/// The route to materialize the current user's due recurring transactions.
pub const PROCESS_RECURRING_TRANSACTIONS: &str = "/api/recurring-transactions/process";

/// The route for the balance, income and expense summary of a month.
pub const ANALYTICS_SUMMARY: &str = "/api/analytics/summary";
/// The route for a month's expenses grouped by category.
pub const ANALYTICS_SPENDING_BY_CATEGORY: &str = "/api/analytics/spending-by-category";
/// The route for the progress of budgets active in a month.
pub const ANALYTICS_BUDGET_PROGRESS: &str = "/api/analytics/budget-progress";
/// The route for the most recent transactions.
pub const ANALYTICS_RECENT_TRANSACTIONS: &str = "/api/analytics/recent-transactions";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is the first substring wrapped in braces, for example
/// '{account_id}' in '/api/accounts/{account_id}'.
///
/// If no parameter is found in `endpoint_path`, the original path is returned.
#[cfg(test)]
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some((prefix, rest)) = endpoint_path.split_once('{') else {
        return endpoint_path.to_owned();
    };

    let suffix = rest.split_once('}').map_or("", |(_, suffix)| suffix);

    format!("{prefix}{id}{suffix}")
}

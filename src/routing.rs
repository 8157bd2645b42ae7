//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::{
    AppState, Error,
    account::{
        create_account_endpoint, delete_account_endpoint, edit_account_endpoint,
        get_account_endpoint, get_accounts_endpoint,
    },
    analytics::{
        get_budget_progress_endpoint, get_recent_transactions_endpoint,
        get_spending_by_category_endpoint, get_summary_endpoint,
    },
    auth::{
        auth_guard, change_password_endpoint, get_profile, post_log_in, post_log_out,
        register_user, update_profile_endpoint,
    },
    budget::{
        create_budget_endpoint, delete_budget_endpoint, edit_budget_endpoint,
        get_budget_endpoint, get_budgets_endpoint,
    },
    category::{
        create_category_endpoint, delete_category_endpoint, edit_category_endpoint,
        get_categories_endpoint, get_category_endpoint, get_own_categories_endpoint,
    },
    csv_export::export_transactions_endpoint,
    csv_import::import_transactions_endpoint,
    endpoints,
    logging::logging_middleware,
    recurring::{
        create_recurring_transaction_endpoint, delete_recurring_transaction_endpoint,
        edit_recurring_transaction_endpoint, get_recurring_transaction_endpoint,
        get_recurring_transactions_endpoint, process_recurring_transactions_endpoint,
    },
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, edit_transaction_endpoint,
        get_transaction_endpoint, get_transactions_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::REGISTER, post(register_user))
        .route(endpoints::LOG_IN, post(post_log_in))
        .route(endpoints::LOG_OUT, post(post_log_out));

    let protected_routes = Router::new()
        .route(
            endpoints::ME,
            get(get_profile).patch(update_profile_endpoint),
        )
        .route(endpoints::CHANGE_PASSWORD, post(change_password_endpoint))
        .route(
            endpoints::ACCOUNTS,
            get(get_accounts_endpoint).post(create_account_endpoint),
        )
        .route(
            endpoints::ACCOUNT,
            get(get_account_endpoint)
                .patch(edit_account_endpoint)
                .delete(delete_account_endpoint),
        )
        .route(
            endpoints::CATEGORIES,
            get(get_categories_endpoint).post(create_category_endpoint),
        )
        .route(endpoints::MY_CATEGORIES, get(get_own_categories_endpoint))
        .route(
            endpoints::CATEGORY,
            get(get_category_endpoint)
                .put(edit_category_endpoint)
                .delete(delete_category_endpoint),
        )
        .route(
            endpoints::TRANSACTIONS,
            get(get_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(
            endpoints::IMPORT_TRANSACTIONS,
            post(import_transactions_endpoint),
        )
        .route(
            endpoints::EXPORT_TRANSACTIONS,
            get(export_transactions_endpoint),
        )
        .route(
            endpoints::TRANSACTION,
            get(get_transaction_endpoint)
                .patch(edit_transaction_endpoint)
                .delete(delete_transaction_endpoint),
        )
        .route(
            endpoints::BUDGETS,
            get(get_budgets_endpoint).post(create_budget_endpoint),
        )
        .route(
            endpoints::BUDGET,
            get(get_budget_endpoint)
                .put(edit_budget_endpoint)
                .delete(delete_budget_endpoint),
        )
        .route(
            endpoints::RECURRING_TRANSACTIONS,
            get(get_recurring_transactions_endpoint).post(create_recurring_transaction_endpoint),
        )
        .route(
            endpoints::PROCESS_RECURRING_TRANSACTIONS,
            post(process_recurring_transactions_endpoint),
        )
        .route(
            endpoints::RECURRING_TRANSACTION,
            get(get_recurring_transaction_endpoint)
                .patch(edit_recurring_transaction_endpoint)
                .delete(delete_recurring_transaction_endpoint),
        )
        .route(endpoints::ANALYTICS_SUMMARY, get(get_summary_endpoint))
        .route(
            endpoints::ANALYTICS_SPENDING_BY_CATEGORY,
            get(get_spending_by_category_endpoint),
        )
        .route(
            endpoints::ANALYTICS_BUDGET_PROGRESS,
            get(get_budget_progress_endpoint),
        )
        .route(
            endpoints::ANALYTICS_RECENT_TRANSACTIONS,
            get(get_recent_transactions_endpoint),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state)
}

async fn get_404_not_found() -> Error {
    Error::NotFound
}

//! Accounts hold money and keep a running balance of their transactions.

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod list_endpoint;

pub use core::{
    Account, AccountUpdate, NewAccount, create_account, create_account_table,
    delete_account, get_account, get_accounts, get_or_create_account_by_name,
    get_total_account_balance, update_account,
};
pub use create_endpoint::create_account_endpoint;
pub use delete_endpoint::delete_account_endpoint;
pub use edit_endpoint::edit_account_endpoint;
pub use list_endpoint::{get_account_endpoint, get_accounts_endpoint};

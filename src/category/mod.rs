//! Income and expense categories, either owned by a user or shared by everyone.

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod list_endpoint;

pub use core::{
    Category, CategoryType, NewCategory, create_category, create_category_table,
    delete_category, find_category_by_name, get_categories, get_category, get_own_categories,
    update_category,
};
pub use create_endpoint::create_category_endpoint;
pub use delete_endpoint::delete_category_endpoint;
pub use edit_endpoint::edit_category_endpoint;
pub use list_endpoint::{
    get_categories_endpoint, get_category_endpoint, get_own_categories_endpoint,
};

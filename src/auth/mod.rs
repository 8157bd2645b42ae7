//! User accounts and cookie based authentication.

mod cookie;
mod log_in;
mod log_out;
mod middleware;
mod password;
mod profile;
mod register;
mod token;
mod user;

pub use cookie::{
    DEFAULT_COOKIE_DURATION, REMEMBER_ME_COOKIE_DURATION, invalidate_auth_cookie,
    set_auth_cookie,
};
pub use log_in::post_log_in;
pub use log_out::post_log_out;
pub use middleware::auth_guard;
pub use password::{PasswordHash, ValidatedPassword};
pub use profile::{change_password_endpoint, get_profile, update_profile_endpoint};
pub use register::register_user;
pub(crate) use token::Token;
pub use user::{
    User, UserID, create_user, create_user_table, get_user_by_id,
    get_user_by_username, update_password,
};

pub(crate) use cookie::COOKIE_TOKEN;

#[cfg(test)]
pub use middleware::AuthState;

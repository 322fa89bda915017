//! Email and password accounts for the live collection.

mod cookie;
mod log_in;
mod log_out;
mod middleware;
mod password;
mod redirect;
mod register_user;
mod token;
mod user;

pub use cookie::{DEFAULT_COOKIE_DURATION, invalidate_auth_cookie, set_auth_cookie};
pub use log_in::{AccountState, get_log_in_page, post_log_in};
pub use log_out::get_log_out;
pub use middleware::{AuthState, Identity, auth_guard, auth_guard_hx};
pub use password::{PasswordHash, ValidatedPassword};
pub use redirect::{build_log_in_redirect_url, normalize_redirect_url};
pub use register_user::{get_register_page, register_user};
pub(super) use token::Token;
pub use user::{
    EmailAddress, User, UserID, count_users, create_user, create_user_table, get_user_by_email,
};

#[cfg(test)]
pub(crate) use cookie::COOKIE_TOKEN;

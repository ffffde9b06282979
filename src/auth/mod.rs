//! Session cookie authentication: logging in and out, registration, password
//! changes and the middleware that guards the protected routes.

mod change_password;
mod cookie;
mod current_user;
mod log_in;
mod log_out;
mod middleware;
mod register_user;
mod token;

pub use change_password::change_password;
pub use cookie::DEFAULT_COOKIE_DURATION;
pub use current_user::get_current_user;
pub use log_in::post_log_in;
pub use log_out::post_log_out;
pub use middleware::auth_guard;
pub use register_user::register_user;
pub(crate) use token::Token;

#[cfg(test)]
pub use cookie::{COOKIE_TOKEN, set_auth_cookie};

mod helpers;
mod middleware;
mod password;
pub mod policy;
mod session;

pub use helpers::resolve_session;
pub use middleware::{AuthError, CurrentUser, RequireAdmin, RequireAuth};
pub use password::Passwords;
pub use session::{IssuedSession, SESSION_COOKIE, hash_token, issue_session};

pub mod guards;
pub mod session_auth;

pub use guards::RequireAdmin;
pub use session_auth::SessionAuth;

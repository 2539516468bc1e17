pub mod claims;
pub mod permission;

pub use claims::{AuthContext, UserClaims};
pub use permission::PermissionLevel;

pub mod client;
pub mod extract;

pub use client::{DescopeClient, SessionValidation, SessionValidator};
pub use extract::extract_claims;

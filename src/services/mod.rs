pub mod authz;
pub mod descope;
pub mod proxy;

pub mod settings;

pub use settings::{DescopeConfig, ServerConfig, Settings, UpstreamConfig};

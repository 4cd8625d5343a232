pub mod cli;
pub mod config;
pub mod service_handle;

pub use cli::run_cli;
pub use config::{DaemonConfig, GatewaySettings};
pub use service_handle::ServiceHandle;

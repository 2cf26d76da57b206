pub mod config;
pub mod errors;
pub mod github;
pub mod rpc;
pub mod transport;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions};
pub use errors::TransportError;
pub use github::GitHubClient;
pub use rpc::RpcClient;
pub use transport::{HttpTransport, OutboundRequest, OutboundResponse, ReqwestTransport};

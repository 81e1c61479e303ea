//! Gateway domain: configuration, errors and request ids.

pub mod config;
pub mod correlation;
pub mod error;

pub use config::{
    ConfigError, CorsConfig, GatewayConfig, GoogleConfig, HttpConfig, LimitsConfig,
    TimeoutConfig, WebSocketConfig,
};
pub use correlation::RequestId;
pub use error::{ApiError, ErrorFormat, GatewayError};

//! # Ports
//!
//! - `inbound` - Service APIs the gateway drives
//! - `outbound` - Key-value backend and clock the services depend on

pub mod inbound;
pub mod outbound;

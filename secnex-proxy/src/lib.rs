pub mod core;

pub use core::{InboundRequest, ProxiedResponse, ProxyCore};

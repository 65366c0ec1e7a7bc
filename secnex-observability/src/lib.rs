pub mod access_log;
pub mod logger;

pub use access_log::{log_refresh_cycle, log_request};

pub mod handlers;
pub mod middleware;
pub mod refresher;
pub mod server;

pub use refresher::Refresher;
pub use server::{AppState, GatewayServer, build_router};

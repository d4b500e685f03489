//! # NSE Dashboard
//!
//! Browser dashboard over [`nse_forecast`]: a user uploads an NSE
//! historical export, sees the raw open/close chart and picks one of two
//! pages, a 1-31 day forecast or a 1-10 year forecast with MACD and RSI.
//!
//! The server keeps one [`session::SessionStore`] entry per browser tab
//! holding the last successfully loaded table. Views run on the blocking
//! thread pool and never mutate session state.

pub mod api;
pub mod config;
pub mod logging;
pub mod offline;
pub mod session;

pub use crate::config::ServerConfig;
pub use crate::session::{SessionError, SessionId, SessionStore};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

pub mod classify;
pub mod config;
pub mod limit;
pub mod replay;
pub mod usage;
pub mod watch;

pub mod cli;
pub mod client;
pub mod config;
pub mod constants;
pub mod daemon;
pub mod logging;
pub mod storage;

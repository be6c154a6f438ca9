pub mod config;
pub mod logging;
pub mod plugins;
pub mod resolve;
pub mod version;

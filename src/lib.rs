pub mod access;
pub mod api;
pub mod commands;
pub mod config;
pub mod credentials;
pub mod fetch;
pub mod logging;
pub mod output;
pub mod scoring;
pub mod session;

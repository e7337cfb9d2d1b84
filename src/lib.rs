pub mod client;
pub mod config;
pub mod models;
pub mod repositories;
pub mod transport;

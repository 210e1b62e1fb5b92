pub mod api;
pub mod client;
pub mod config;
pub mod data;
pub mod server;
pub mod store;
pub mod trips;
pub mod users;

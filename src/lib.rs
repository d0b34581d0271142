pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod interfaces;
pub mod observability;
pub mod types;
pub mod upstream;
pub mod utils;

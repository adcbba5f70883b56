pub mod client;

pub use client::{YahooClient, DEFAULT_BASE_URL};

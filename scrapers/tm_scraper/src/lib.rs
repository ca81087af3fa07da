pub mod competition;
pub mod config;
pub mod document;
pub mod error;
pub mod fetcher;
pub mod orchestrator;
pub mod players;
pub mod season;
pub mod session_cache;
pub mod sink;
pub mod teams;
pub mod types;
pub mod utils;
pub mod webdriver;

pub use error::{Result, ScrapeError};

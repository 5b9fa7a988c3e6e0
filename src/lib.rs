// src/lib.rs
pub mod cache;
pub mod config;
pub mod errors;
pub mod matching;
pub mod models;
pub mod pipeline;
pub mod ranking;
pub mod scoring;
pub mod store;
pub mod utils;

pub use errors::{RankingError, ScoringError};

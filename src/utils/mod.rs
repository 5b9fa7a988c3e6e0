pub mod constants;
pub mod env;
pub mod hashing;
pub mod progress_bars;

pub mod domains;

pub use domains::{DomainConfig, DomainRegistry};

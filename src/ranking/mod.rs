pub mod assembler;

pub use assembler::{annotate_trends, assemble, validate_dense_ranks};

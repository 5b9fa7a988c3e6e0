pub mod fuzzy;
pub mod normalize;
pub mod trend;

pub use fuzzy::{FuzzyMatcher, MatcherConfig, PreviousIndex};
pub use normalize::{normalize, BrandCatalog, Normalizer};
pub use trend::trend;

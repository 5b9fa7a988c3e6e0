pub mod composite;
pub mod imputation;
pub mod transforms;
pub mod weights;

pub use crate::errors::ScoringError;
pub use composite::{composite_score, CompositeScoreEngine, ScoreBreakdown};
pub use transforms::{demand_status, SignalTransform};
pub use weights::{BonusRule, SourceSpec, WeightTable};

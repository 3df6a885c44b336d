pub mod aggregator;
pub mod funding;

pub use aggregator::{general_bias_category, overall_outlook, volume_category};
pub use funding::{
    squeeze_candidates, trap_candidates, FundingBreakdown, FundingObservation, Quadrant,
};

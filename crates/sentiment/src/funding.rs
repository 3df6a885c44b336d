use serde::{Deserialize, Serialize};

use common::SentimentCategory;

/// Ratio above which the imbalance reads as a strong setup.
const STRONG_RATIO: f64 = 0.6;
/// Ratio above which the imbalance reads as a mild lean.
const MILD_RATIO: f64 = 0.45;

/// Joint price/funding reading for one instrument within a scan cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundingObservation {
    pub symbol: String,
    /// Price change over the lookback window, in percent.
    pub price_change_pct: f64,
    /// Latest funding rate as a fraction.
    pub funding_rate: f64,
    /// Advisory: the funding sample was older than the staleness window.
    pub stale: bool,
}

/// Quadrant by the joint sign of price change and funding rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quadrant {
    /// Price up while shorts pay: forced short covering setup.
    ShortSqueeze,
    /// Price down while longs pay: trapped long positions.
    LongTrap,
    /// Price up with longs paying: crowded but paid-for longs.
    LongPaid,
    /// Price down with shorts paying: paid-for shorts in control.
    ShortPaid,
}

impl Quadrant {
    /// Classify by sign. An exact zero on either axis gives no quadrant and
    /// the instrument is excluded from the cycle's counts.
    pub fn classify(price_change_pct: f64, funding_rate: f64) -> Option<Quadrant> {
        match (
            price_change_pct.partial_cmp(&0.0)?,
            funding_rate.partial_cmp(&0.0)?,
        ) {
            (std::cmp::Ordering::Greater, std::cmp::Ordering::Less) => {
                Some(Quadrant::ShortSqueeze)
            }
            (std::cmp::Ordering::Less, std::cmp::Ordering::Greater) => Some(Quadrant::LongTrap),
            (std::cmp::Ordering::Greater, std::cmp::Ordering::Greater) => {
                Some(Quadrant::LongPaid)
            }
            (std::cmp::Ordering::Less, std::cmp::Ordering::Less) => Some(Quadrant::ShortPaid),
            _ => None,
        }
    }
}

/// Per-quadrant counts across the instrument universe for one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingBreakdown {
    pub short_squeeze: usize,
    pub long_trap: usize,
    pub long_paid: usize,
    pub short_paid: usize,
}

impl FundingBreakdown {
    pub fn from_observations(observations: &[FundingObservation]) -> Self {
        let mut counts = FundingBreakdown::default();
        for obs in observations {
            match Quadrant::classify(obs.price_change_pct, obs.funding_rate) {
                Some(Quadrant::ShortSqueeze) => counts.short_squeeze += 1,
                Some(Quadrant::LongTrap) => counts.long_trap += 1,
                Some(Quadrant::LongPaid) => counts.long_paid += 1,
                Some(Quadrant::ShortPaid) => counts.short_paid += 1,
                None => {}
            }
        }
        counts
    }

    /// Squeeze count over squeeze + trap. `None` when neither side has data.
    pub fn short_squeeze_ratio(&self) -> Option<f64> {
        let denom = self.short_squeeze + self.long_trap;
        if denom == 0 {
            None
        } else {
            Some(self.short_squeeze as f64 / denom as f64)
        }
    }

    /// Symmetric trap ratio.
    pub fn long_trap_ratio(&self) -> Option<f64> {
        let denom = self.short_squeeze + self.long_trap;
        if denom == 0 {
            None
        } else {
            Some(self.long_trap as f64 / denom as f64)
        }
    }

    /// Squeeze-side sentiment. Cut points: > 0.6 strong (score 8),
    /// > 0.45 mild (score 6.5), else neutral (score 5). `None` without data.
    pub fn squeeze_category(&self) -> Option<SentimentCategory> {
        let ratio = self.short_squeeze_ratio()?;
        let (rating, interpretation, score) = if ratio > STRONG_RATIO {
            (
                "Strong Short Squeeze",
                "Shorts are paying into rising prices across most of the imbalance; \
                 forced covering can accelerate upside.",
                8.0,
            )
        } else if ratio > MILD_RATIO {
            (
                "Mild Short Squeeze",
                "A slight majority of the imbalance has shorts paying into strength.",
                6.5,
            )
        } else {
            (
                "Balanced Funding",
                "No meaningful squeeze pressure in the funding imbalance.",
                5.0,
            )
        };
        Some(SentimentCategory {
            rating: rating.to_string(),
            interpretation: interpretation.to_string(),
            score,
        })
    }

    /// Trap-side sentiment, mirrored: > 0.6 strong (score 2),
    /// > 0.45 mild (score 3.5), else neutral (score 5).
    pub fn trap_category(&self) -> Option<SentimentCategory> {
        let ratio = self.long_trap_ratio()?;
        let (rating, interpretation, score) = if ratio > STRONG_RATIO {
            (
                "Strong Long Trap",
                "Longs are paying into falling prices across most of the imbalance; \
                 capitulation risk is elevated.",
                2.0,
            )
        } else if ratio > MILD_RATIO {
            (
                "Mild Long Trap",
                "A slight majority of the imbalance has longs paying into weakness.",
                3.5,
            )
        } else {
            (
                "Balanced Funding",
                "No meaningful trap pressure in the funding imbalance.",
                5.0,
            )
        };
        Some(SentimentCategory {
            rating: rating.to_string(),
            interpretation: interpretation.to_string(),
            score,
        })
    }
}

/// Top-N short-squeeze candidates: price up with funding negative, most
/// negative funding first, ties broken by symbol ascending.
pub fn squeeze_candidates(
    observations: &[FundingObservation],
    n: usize,
) -> Vec<FundingObservation> {
    let mut candidates: Vec<FundingObservation> = observations
        .iter()
        .filter(|o| o.price_change_pct > 0.0 && o.funding_rate < 0.0)
        .cloned()
        .collect();
    candidates.sort_by(|a, b| {
        a.funding_rate
            .partial_cmp(&b.funding_rate)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
    candidates.truncate(n);
    candidates
}

/// Top-N long-trap candidates: price down with funding positive, most
/// positive funding first, ties broken by symbol ascending.
pub fn trap_candidates(observations: &[FundingObservation], n: usize) -> Vec<FundingObservation> {
    let mut candidates: Vec<FundingObservation> = observations
        .iter()
        .filter(|o| o.price_change_pct < 0.0 && o.funding_rate > 0.0)
        .cloned()
        .collect();
    candidates.sort_by(|a, b| {
        b.funding_rate
            .partial_cmp(&a.funding_rate)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
    candidates.truncate(n);
    candidates
}

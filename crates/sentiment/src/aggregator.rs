use common::{OverallOutlook, SentimentCategory};

/// Combine all present category scores into one outlook.
///
/// The score is the arithmetic mean of the categories that exist this cycle;
/// absent categories are omitted, never averaged as zero. An empty set gives
/// `None`. Tone and strategy text are a fixed function of the score band, so
/// the outlook is fully deterministic.
pub fn overall_outlook(categories: &[SentimentCategory]) -> Option<OverallOutlook> {
    if categories.is_empty() {
        return None;
    }
    let score = categories.iter().map(|c| c.score).sum::<f64>() / categories.len() as f64;
    let (tone, strategy_suggestion) = band(score);
    Some(OverallOutlook {
        score,
        tone: tone.to_string(),
        strategy_suggestion: strategy_suggestion.to_string(),
    })
}

/// Score bands: >= 7.5 strongly bullish, >= 6 mildly bullish, >= 4 neutral,
/// >= 3 bearish, else strongly bearish.
fn band(score: f64) -> (&'static str, &'static str) {
    if score >= 7.5 {
        (
            "Strongly Bullish",
            "Favor aggressive long entries on pullbacks; breakouts are likely to follow through.",
        )
    } else if score >= 6.0 {
        (
            "Mildly Bullish",
            "Lean long with reduced size; demand confirmation before adding.",
        )
    } else if score >= 4.0 {
        (
            "Neutral",
            "Range conditions; fade extremes and keep exposure light.",
        )
    } else if score >= 3.0 {
        (
            "Bearish",
            "Lean short into strength; avoid chasing longs.",
        )
    } else {
        (
            "Strongly Bearish",
            "Favor aggressive short entries on bounces; expect breakdowns to extend.",
        )
    }
}

/// Market-wide price-direction bias from the count of gainers vs losers.
/// `None` when the universe is empty.
pub fn general_bias_category(gainers: usize, losers: usize) -> Option<SentimentCategory> {
    let total = gainers + losers;
    if total == 0 {
        return None;
    }
    let ratio = gainers as f64 / total as f64;
    let score = ratio * 10.0;
    let rating = if ratio > 0.65 {
        "Broad Advance"
    } else if ratio < 0.35 {
        "Broad Decline"
    } else {
        "Mixed Tape"
    };
    Some(SentimentCategory {
        rating: rating.to_string(),
        interpretation: format!("{gainers} of {total} instruments are up over the lookback."),
        score,
    })
}

/// Volume participation: share of instruments whose latest volume is above
/// their trailing average. `None` when no instrument reported volume.
pub fn volume_category(elevated: usize, total: usize) -> Option<SentimentCategory> {
    if total == 0 {
        return None;
    }
    let ratio = elevated as f64 / total as f64;
    // Participation supports whichever direction the tape leads: treat high
    // participation as mildly constructive, thin tape as caution.
    let score = 4.0 + ratio * 3.0;
    let rating = if ratio > 0.6 {
        "High Participation"
    } else if ratio < 0.25 {
        "Thin Tape"
    } else {
        "Average Participation"
    };
    Some(SentimentCategory {
        rating: rating.to_string(),
        interpretation: format!(
            "{elevated} of {total} instruments trade above their average volume."
        ),
        score,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cat(score: f64) -> SentimentCategory {
        SentimentCategory {
            rating: "x".into(),
            interpretation: "x".into(),
            score,
        }
    }

    #[test]
    fn empty_category_set_is_no_outlook() {
        assert!(overall_outlook(&[]).is_none());
    }

    #[test]
    fn mean_omits_absent_categories() {
        // Two categories only; the mean is over two, not some fixed universe.
        let outlook = overall_outlook(&[cat(8.0), cat(6.0)]).unwrap();
        assert!((outlook.score - 7.0).abs() < 1e-12);
    }

    #[test]
    fn tone_bands() {
        assert_eq!(overall_outlook(&[cat(8.0)]).unwrap().tone, "Strongly Bullish");
        assert_eq!(overall_outlook(&[cat(6.5)]).unwrap().tone, "Mildly Bullish");
        assert_eq!(overall_outlook(&[cat(5.0)]).unwrap().tone, "Neutral");
        assert_eq!(overall_outlook(&[cat(3.2)]).unwrap().tone, "Bearish");
        assert_eq!(overall_outlook(&[cat(1.0)]).unwrap().tone, "Strongly Bearish");
    }

    #[test]
    fn band_edges_are_inclusive_lower_bounds() {
        assert_eq!(overall_outlook(&[cat(7.5)]).unwrap().tone, "Strongly Bullish");
        assert_eq!(overall_outlook(&[cat(6.0)]).unwrap().tone, "Mildly Bullish");
        assert_eq!(overall_outlook(&[cat(4.0)]).unwrap().tone, "Neutral");
        assert_eq!(overall_outlook(&[cat(3.0)]).unwrap().tone, "Bearish");
    }

    #[test]
    fn outlook_is_deterministic() {
        let cats = vec![cat(7.0), cat(4.5), cat(6.2)];
        assert_eq!(overall_outlook(&cats), overall_outlook(&cats));
    }

    #[test]
    fn general_bias_scales_with_gainers() {
        let up = general_bias_category(8, 2).unwrap();
        assert!((up.score - 8.0).abs() < 1e-12);
        assert_eq!(up.rating, "Broad Advance");

        let down = general_bias_category(2, 8).unwrap();
        assert_eq!(down.rating, "Broad Decline");

        assert!(general_bias_category(0, 0).is_none());
    }

    #[test]
    fn volume_category_bounds() {
        let all = volume_category(10, 10).unwrap();
        assert!((all.score - 7.0).abs() < 1e-12);
        let none = volume_category(0, 10).unwrap();
        assert!((none.score - 4.0).abs() < 1e-12);
        assert!(volume_category(0, 0).is_none());
    }
}

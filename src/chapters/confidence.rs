/// Confidence scores derived from match costs
use super::AlignedChapter;
use serde::{Deserialize, Serialize};

/// Confidence of a matched pair
pub fn pair_confidence(cost: f64) -> f64 {
    (1.0 - cost).clamp(0.0, 1.0)
}

/// Unweighted mean confidence over matched chapters; 0 when nothing matched
pub fn overall_confidence(aligned: &[AlignedChapter]) -> f64 {
    let (sum, count) = aligned
        .iter()
        .filter(|chapter| chapter.is_matched())
        .fold((0.0f64, 0usize), |(sum, count), chapter| (sum + chapter.confidence, count + 1));

    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Coarse bucket used when presenting confidences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceBand {
    High,
    Medium,
    Low,
    None,
}

impl ConfidenceBand {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= 0.8 {
            ConfidenceBand::High
        } else if confidence >= 0.5 {
            ConfidenceBand::Medium
        } else if confidence > 0.0 {
            ConfidenceBand::Low
        } else {
            ConfidenceBand::None
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConfidenceBand::High => "high",
            ConfidenceBand::Medium => "medium",
            ConfidenceBand::Low => "low",
            ConfidenceBand::None => "none",
        }
    }
}

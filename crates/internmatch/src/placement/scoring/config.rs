use serde::{Deserialize, Serialize};

/// Threshold configuration for the fitness rubric. Sub-score caps are fixed
/// by the rubric itself; these knobs tune where full credit kicks in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Grade average (10-point scale) earning full academic credit.
    pub grade_high_water: f64,
    /// Percentage-point band treated as a consistent academic trend.
    pub consistency_band: f64,
    /// Preference credit fraction lost per rank step below the first choice.
    pub rank_decay: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            grade_high_water: 8.0,
            consistency_band: 5.0,
            rank_decay: 0.2,
        }
    }
}

use std::fmt;

use serde::Serialize;

/// Qualitative tier for an entity's submission timeliness, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceTier {
    Excellent,
    Good,
    NeedsImprovement,
    Problematic,
}

impl PerformanceTier {
    /// Rates are percentages. Tiers are checked top-down, first match wins.
    pub fn classify(same_day_rate: f64, within_week_rate: f64) -> Self {
        if same_day_rate >= 80.0 || within_week_rate >= 95.0 {
            PerformanceTier::Excellent
        } else if same_day_rate >= 60.0 || within_week_rate >= 85.0 {
            PerformanceTier::Good
        } else if same_day_rate >= 40.0 || within_week_rate >= 70.0 {
            PerformanceTier::NeedsImprovement
        } else {
            PerformanceTier::Problematic
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PerformanceTier::Excellent => "excellent",
            PerformanceTier::Good => "good",
            PerformanceTier::NeedsImprovement => "needs_improvement",
            PerformanceTier::Problematic => "problematic",
        }
    }
}

impl fmt::Display for PerformanceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_day_rate_wins_first() {
        assert_eq!(PerformanceTier::classify(85.0, 90.0), PerformanceTier::Excellent);
    }

    #[test]
    fn within_week_rate_can_lift_a_tier() {
        assert_eq!(PerformanceTier::classify(10.0, 96.0), PerformanceTier::Excellent);
        assert_eq!(PerformanceTier::classify(10.0, 85.0), PerformanceTier::Good);
        assert_eq!(PerformanceTier::classify(10.0, 70.0), PerformanceTier::NeedsImprovement);
    }

    #[test]
    fn thresholds_are_inclusive() {
        assert_eq!(PerformanceTier::classify(80.0, 0.0), PerformanceTier::Excellent);
        assert_eq!(PerformanceTier::classify(60.0, 0.0), PerformanceTier::Good);
        assert_eq!(PerformanceTier::classify(40.0, 0.0), PerformanceTier::NeedsImprovement);
        assert_eq!(PerformanceTier::classify(39.9, 69.9), PerformanceTier::Problematic);
    }

    #[test]
    fn empty_rates_are_problematic() {
        assert_eq!(PerformanceTier::classify(0.0, 0.0), PerformanceTier::Problematic);
        assert!(PerformanceTier::Excellent < PerformanceTier::Problematic);
    }
}

//! Current-state metrics — purely numeric, no LLM calls.

use crate::summary::InterviewSummary;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Emotional-journey intensities below this midpoint count as negative.
const INTENSITY_MIDPOINT: f64 = 5.0;

/// Estimated NPS, or an explicit insufficient-data marker when no interview
/// produced a non-zero sentiment. A tagged variant rather than a mixed
/// number/string field so downstream comparisons stay total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nps {
    Estimated(i64),
    InsufficientData,
}

impl Serialize for Nps {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Nps::Estimated(v) => serializer.serialize_i64(*v),
            Nps::InsufficientData => serializer.serialize_str("insufficient data"),
        }
    }
}

impl<'de> Deserialize<'de> for Nps {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(value
            .as_i64()
            .map(Nps::Estimated)
            .unwrap_or(Nps::InsufficientData))
    }
}

/// Coarse categorical churn-risk estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChurnRisk {
    Low,
    Medium,
    High,
    Critical,
}

/// Numeric health snapshot computed from the full summary list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentMetrics {
    pub estimated_nps: Nps,
    pub churn_risk: ChurnRisk,
    pub avg_pains_per_user: f64,
    pub avg_needs_per_user: f64,
    /// Percent of emotional-journey entries with below-midpoint intensity.
    pub negative_emotion_ratio: u32,
    pub total_emotions_analyzed: usize,
    pub sample_size: usize,
}

impl CurrentMetrics {
    /// Compute metrics by straight averaging/counting over all summaries.
    pub fn compute(summaries: &[InterviewSummary]) -> Self {
        let sample_size = summaries.len();
        if sample_size == 0 {
            return Self {
                estimated_nps: Nps::InsufficientData,
                churn_risk: ChurnRisk::Low,
                avg_pains_per_user: 0.0,
                avg_needs_per_user: 0.0,
                negative_emotion_ratio: 0,
                total_emotions_analyzed: 0,
                sample_size: 0,
            };
        }

        let total_pains: usize = summaries.iter().map(|s| s.pain_points.len()).sum();
        let total_needs: usize = summaries.iter().map(|s| s.needs.len()).sum();
        let total_emotions: usize = summaries.iter().map(|s| s.emotional_journey.len()).sum();
        let negative_emotions = summaries
            .iter()
            .flat_map(|s| &s.emotional_journey)
            .filter(|e| {
                e.intensity
                    .as_f64()
                    .is_some_and(|i| i < INTENSITY_MIDPOINT)
            })
            .count();

        let sentiments: Vec<f64> = summaries
            .iter()
            .map(|s| s.sentiment_score)
            .filter(|s| *s != 0.0)
            .collect();
        let estimated_nps = if sentiments.is_empty() {
            Nps::InsufficientData
        } else {
            let avg = sentiments.iter().sum::<f64>() / sentiments.len() as f64;
            Nps::Estimated((avg * 10.0) as i64)
        };

        let avg_pains = total_pains as f64 / sample_size as f64;
        let avg_needs = total_needs as f64 / sample_size as f64;
        let negative_ratio = if total_emotions > 0 {
            (negative_emotions as f64 / total_emotions as f64 * 100.0).round() as u32
        } else {
            0
        };

        Self {
            estimated_nps,
            churn_risk: churn_risk(estimated_nps, avg_pains),
            avg_pains_per_user: round1(avg_pains),
            avg_needs_per_user: round1(avg_needs),
            negative_emotion_ratio: negative_ratio,
            total_emotions_analyzed: total_emotions,
            sample_size,
        }
    }
}

/// Fixed threshold ladder on (estimated NPS, average pains per user).
pub fn churn_risk(nps: Nps, avg_pains: f64) -> ChurnRisk {
    match nps {
        Nps::Estimated(nps) => {
            if nps < -30 || avg_pains > 7.0 {
                ChurnRisk::Critical
            } else if nps < 0 || avg_pains > 5.0 {
                ChurnRisk::High
            } else if nps < 30 || avg_pains > 3.0 {
                ChurnRisk::Medium
            } else {
                ChurnRisk::Low
            }
        }
        Nps::InsufficientData => {
            if avg_pains > 4.0 {
                ChurnRisk::Medium
            } else {
                ChurnRisk::Low
            }
        }
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::{EmotionalMoment, Need, PainPoint, Score};

    fn summary_with(id: u32, sentiment: f64, pains: usize, needs: usize) -> InterviewSummary {
        InterviewSummary {
            interview_id: id,
            sentiment_score: sentiment,
            pain_points: (0..pains)
                .map(|i| PainPoint {
                    pain: format!("pain {i}"),
                    severity: Score::Value(5.0),
                    ..Default::default()
                })
                .collect(),
            needs: (0..needs)
                .map(|i| Need {
                    need: format!("need {i}"),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_nps_from_nonzero_sentiments() {
        let summaries = vec![
            summary_with(1, 4.0, 1, 1),
            summary_with(2, -2.0, 1, 1),
            summary_with(3, 0.0, 1, 1), // zero sentiment excluded
        ];
        let metrics = CurrentMetrics::compute(&summaries);
        // avg of [4, -2] = 1.0 -> NPS 10
        assert_eq!(metrics.estimated_nps, Nps::Estimated(10));
    }

    #[test]
    fn test_nps_insufficient_data() {
        let summaries = vec![summary_with(1, 0.0, 2, 0), summary_with(2, 0.0, 2, 0)];
        let metrics = CurrentMetrics::compute(&summaries);
        assert_eq!(metrics.estimated_nps, Nps::InsufficientData);
    }

    #[test]
    fn test_averages_rounded() {
        let summaries = vec![summary_with(1, 1.0, 3, 2), summary_with(2, 1.0, 4, 1)];
        let metrics = CurrentMetrics::compute(&summaries);
        assert_eq!(metrics.avg_pains_per_user, 3.5);
        assert_eq!(metrics.avg_needs_per_user, 1.5);
        assert_eq!(metrics.sample_size, 2);
    }

    #[test]
    fn test_negative_emotion_ratio() {
        let mut summary = summary_with(1, 1.0, 0, 0);
        summary.emotional_journey = vec![
            EmotionalMoment {
                intensity: Score::Value(2.0),
                ..Default::default()
            },
            EmotionalMoment {
                intensity: Score::Value(8.0),
                ..Default::default()
            },
            EmotionalMoment {
                intensity: Score::Value(3.0),
                ..Default::default()
            },
            EmotionalMoment {
                intensity: Score::Unknown, // never counts as negative
                ..Default::default()
            },
        ];
        let metrics = CurrentMetrics::compute(&[summary]);
        assert_eq!(metrics.total_emotions_analyzed, 4);
        assert_eq!(metrics.negative_emotion_ratio, 50);
    }

    #[test]
    fn test_churn_ladder() {
        assert_eq!(churn_risk(Nps::Estimated(-40), 1.0), ChurnRisk::Critical);
        assert_eq!(churn_risk(Nps::Estimated(10), 8.0), ChurnRisk::Critical);
        assert_eq!(churn_risk(Nps::Estimated(-10), 1.0), ChurnRisk::High);
        assert_eq!(churn_risk(Nps::Estimated(50), 6.0), ChurnRisk::High);
        assert_eq!(churn_risk(Nps::Estimated(10), 1.0), ChurnRisk::Medium);
        assert_eq!(churn_risk(Nps::Estimated(50), 3.5), ChurnRisk::Medium);
        assert_eq!(churn_risk(Nps::Estimated(50), 1.0), ChurnRisk::Low);
    }

    #[test]
    fn test_churn_sentinel_fallback() {
        assert_eq!(
            churn_risk(Nps::InsufficientData, 4.5),
            ChurnRisk::Medium
        );
        assert_eq!(churn_risk(Nps::InsufficientData, 2.0), ChurnRisk::Low);
    }

    #[test]
    fn test_empty_summaries() {
        let metrics = CurrentMetrics::compute(&[]);
        assert_eq!(metrics.estimated_nps, Nps::InsufficientData);
        assert_eq!(metrics.sample_size, 0);
        assert_eq!(metrics.churn_risk, ChurnRisk::Low);
    }

    #[test]
    fn test_nps_serde_shapes() {
        assert_eq!(
            serde_json::to_value(Nps::Estimated(-12)).unwrap(),
            serde_json::json!(-12)
        );
        assert_eq!(
            serde_json::to_value(Nps::InsufficientData).unwrap(),
            serde_json::json!("insufficient data")
        );
    }

    proptest::proptest! {
        /// For fixed avg_pains, decreasing NPS never decreases risk.
        #[test]
        fn prop_churn_monotone_in_nps(avg_pains in 0.0f64..10.0, a in -100i64..100, b in -100i64..100) {
            let (hi, lo) = if a >= b { (a, b) } else { (b, a) };
            let risk_hi = churn_risk(Nps::Estimated(hi), avg_pains);
            let risk_lo = churn_risk(Nps::Estimated(lo), avg_pains);
            proptest::prop_assert!(risk_lo >= risk_hi);
        }
    }
}

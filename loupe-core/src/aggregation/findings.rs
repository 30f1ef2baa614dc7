//! Final findings assembly — key insights, opportunities, and the
//! executive summary. Deterministic; no LLM calls.

use crate::aggregation::grouping::{BehavioralPattern, PainRecord};
use crate::aggregation::metrics::CurrentMetrics;
use crate::aggregation::segments::{Persona, Segment};
use crate::summary::InterviewSummary;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A cross-interview insight derived from one pain point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyInsight {
    pub title: String,
    pub description: String,
    /// Coerced severity; unknown severities default to 5 (mid-scale).
    pub severity: i64,
    pub quotes: Vec<String>,
    /// Percent of interviews mentioning this pain, rounded.
    pub affected_percentage: u32,
}

/// The aggregated research output handed to the renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchFindings {
    pub executive_summary: String,
    pub key_insights: Vec<KeyInsight>,
    pub behavioral_patterns: Vec<BehavioralPattern>,
    pub user_segments: Vec<Segment>,
    pub pain_points_map: BTreeMap<String, Vec<PainRecord>>,
    pub opportunities: Vec<String>,
    pub personas: Vec<Persona>,
    pub current_metrics: CurrentMetrics,
    #[serde(default)]
    pub brief_answers: Vec<crate::aggregation::recommend::BriefAnswer>,
    #[serde(default)]
    pub goal_achievement: Vec<crate::aggregation::recommend::GoalAssessment>,
}

/// Build key insights from the flattened pain points.
///
/// `affected_percentage` for a pain mentioned in k of N interviews is
/// `round(100*k/N)`.
pub fn key_insights(summaries: &[InterviewSummary]) -> Vec<KeyInsight> {
    let total = summaries.len();
    if total == 0 {
        return Vec::new();
    }

    summaries
        .iter()
        .flat_map(|s| &s.pain_points)
        .map(|pain| {
            let mentioning = summaries
                .iter()
                .filter(|s| s.pain_points.iter().any(|p| p.pain == pain.pain))
                .count();
            KeyInsight {
                title: pain.pain.clone(),
                description: pain.impact.clone(),
                severity: pain.severity.value_or(5.0) as i64,
                quotes: pain.quotes.clone(),
                affected_percentage: (mentioning as f64 / total as f64 * 100.0).round() as u32,
            }
        })
        .collect()
}

/// Flatten all per-interview opportunities, in submission order.
pub fn collect_opportunities(summaries: &[InterviewSummary]) -> Vec<String> {
    summaries
        .iter()
        .flat_map(|s| s.opportunities.iter().cloned())
        .collect()
}

/// Compose the executive summary from the actual top findings rather than
/// a fixed template.
pub fn executive_summary(
    insights: &[KeyInsight],
    metrics: &CurrentMetrics,
    total_interviews: usize,
) -> String {
    if insights.is_empty() {
        return format!(
            "Analysis of {total_interviews} user interview(s) produced no extractable pain \
             points; see the per-interview summaries for raw material."
        );
    }

    let mut ranked: Vec<&KeyInsight> = insights.iter().collect();
    ranked.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then(b.affected_percentage.cmp(&a.affected_percentage))
    });
    let top: Vec<String> = ranked
        .iter()
        .take(3)
        .map(|i| format!("\"{}\" (severity {}, {}% affected)", i.title, i.severity, i.affected_percentage))
        .collect();

    format!(
        "Analysis of {total_interviews} user interview(s) surfaced {count} pain point(s). \
         Most pressing: {top}. Average of {avg_pains} pains per user; churn risk assessed \
         as {churn:?}.",
        count = insights.len(),
        top = top.join("; "),
        avg_pains = metrics.avg_pains_per_user,
        churn = metrics.churn_risk,
    )
}

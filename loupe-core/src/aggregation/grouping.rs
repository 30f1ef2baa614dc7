//! Pain-point grouping and behavioral patterns.
//!
//! Grouping is a single-pass partition, not clustering: each pain is
//! bucketed by the first keyword its lowercased description contains,
//! checked in fixed priority order. The classifier sits behind a trait so
//! the keyword list can later be swapped for embedding-based clustering
//! without touching the aggregation logic.

use crate::summary::{InterviewSummary, Score};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Bucket key for unmatched pains.
pub const OTHER_GROUP: &str = "other";

/// Maps a pain description to a group key.
pub trait PainClassifier: Send + Sync {
    fn classify(&self, pain_text: &str) -> String;
}

/// Fixed-priority keyword matcher, bilingual (English/Russian) because the
/// transcripts and model output arrive in either language. First match wins.
pub struct KeywordClassifier {
    groups: Vec<(&'static str, Vec<&'static str>)>,
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self {
            groups: vec![
                ("interface", vec!["interface", "интерфейс"]),
                ("navigation", vec!["navigation", "навигация", "навигаци"]),
                ("speed", vec!["speed", "slow", "скорость", "медлен"]),
                ("error", vec!["error", "ошибка", "ошибк"]),
                ("complex", vec!["complex", "complicated", "сложно", "сложн"]),
                ("unclear", vec!["unclear", "confusing", "непонятно", "непонятн"]),
            ],
        }
    }
}

impl PainClassifier for KeywordClassifier {
    fn classify(&self, pain_text: &str) -> String {
        let lower = pain_text.to_lowercase();
        for (group, terms) in &self.groups {
            if terms.iter().any(|term| lower.contains(term)) {
                return (*group).to_string();
            }
        }
        OTHER_GROUP.to_string()
    }
}

/// One pain-point occurrence, flattened across all interviews.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PainRecord {
    pub pain: String,
    pub severity: Score,
    pub interview_id: u32,
    pub quotes: Vec<String>,
    pub impact: String,
}

/// Flatten every pain point across the summary list, tagging each with its
/// source interview.
pub fn collect_pains(summaries: &[InterviewSummary]) -> Vec<PainRecord> {
    summaries
        .iter()
        .flat_map(|summary| {
            summary.pain_points.iter().map(|pain| PainRecord {
                pain: pain.pain.clone(),
                severity: pain.severity,
                interview_id: summary.interview_id,
                quotes: pain.quotes.clone(),
                impact: pain.impact.clone(),
            })
        })
        .collect()
}

/// Partition pains into groups; every record lands in exactly one bucket.
pub fn group_pains(
    pains: &[PainRecord],
    classifier: &dyn PainClassifier,
) -> BTreeMap<String, Vec<PainRecord>> {
    let mut groups: BTreeMap<String, Vec<PainRecord>> = BTreeMap::new();
    for pain in pains {
        groups
            .entry(classifier.classify(&pain.pain))
            .or_default()
            .push(pain.clone());
    }
    groups
}

/// A recurring-problem pattern derived from a multi-member pain group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehavioralPattern {
    pub pattern: String,
    pub frequency: usize,
    /// Highest severity in the group; unknown severities count as 0.
    pub severity: i64,
    pub description: String,
}

/// Emit a pattern for every pain group with more than one member.
pub fn behavioral_patterns(groups: &BTreeMap<String, Vec<PainRecord>>) -> Vec<BehavioralPattern> {
    groups
        .iter()
        .filter(|(_, pains)| pains.len() > 1)
        .map(|(name, pains)| {
            let severity = pains
                .iter()
                .map(|p| p.severity.value_or(0.0) as i64)
                .max()
                .unwrap_or(0);
            BehavioralPattern {
                pattern: format!("Recurring problem: {name}"),
                frequency: pains.len(),
                severity,
                description: format!(
                    "The '{name}' problem appears in {} interviews",
                    pains.len()
                ),
            }
        })
        .collect()
}

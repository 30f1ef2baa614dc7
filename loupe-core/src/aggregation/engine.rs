//! Cross-interview aggregation engine.
//!
//! Phase one is deterministic: metrics, pain grouping, audience segments,
//! personas, and key insights are computed directly from the summaries.
//! Phase two runs the LLM-backed steps (recommendations, brief answers,
//! goal assessment) concurrently; each degrades independently, so a bundle
//! with its full key set comes out of every run that had transcripts.

use crate::aggregation::findings::{
    collect_opportunities, executive_summary, key_insights, ResearchFindings,
};
use crate::aggregation::grouping::{
    behavioral_patterns, collect_pains, group_pains, KeywordClassifier, PainClassifier,
};
use crate::aggregation::metrics::CurrentMetrics;
use crate::aggregation::recommend::{
    answer_brief_questions, assess_goal_achievement, generate_recommendations, BriefAnswer,
    GoalAssessment, Recommendations,
};
use crate::aggregation::segments::{segment_audience, synthesize_personas, Persona, Segment};
use crate::brief::ResearchBrief;
use crate::client::{CallStats, LlmClient};
use crate::summary::{InterviewSummary, UserProblem};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Deterministic slice of the results, kept under one key so renderers can
/// address the evidence layer separately from the recommendations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BaseAnalysis {
    pub segments: Vec<Segment>,
    pub problems: Vec<UserProblem>,
    pub insights: Vec<String>,
    /// Reserved for journey mapping; always present, currently unpopulated.
    pub user_journey_issues: Vec<Value>,
}

/// Everything a renderer needs. Every field is populated on every
/// successful run; LLM-step failures leave their fields empty rather than
/// absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisBundle {
    pub base_analysis: BaseAnalysis,
    pub recommendations: Recommendations,
    pub interview_summaries: Vec<InterviewSummary>,
    pub findings: ResearchFindings,
    pub total_interviews: usize,
    pub current_metrics: CurrentMetrics,
    pub personas: Vec<Persona>,
    pub brief_data: Option<ResearchBrief>,
    pub brief_answers: Vec<BriefAnswer>,
    pub goal_achievement: Vec<GoalAssessment>,
    pub call_stats: CallStats,
}

pub struct AggregationEngine {
    client: Arc<LlmClient>,
    brief: ResearchBrief,
    max_tokens: u32,
    classifier: Box<dyn PainClassifier>,
}

impl AggregationEngine {
    pub fn new(client: Arc<LlmClient>, brief: ResearchBrief, max_tokens: u32) -> Self {
        Self {
            client,
            brief,
            max_tokens,
            classifier: Box::new(KeywordClassifier::default()),
        }
    }

    /// Swap in a different pain classifier.
    pub fn with_classifier(mut self, classifier: Box<dyn PainClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Aggregate the per-interview summaries into the final bundle.
    pub async fn aggregate(&self, summaries: Vec<InterviewSummary>) -> AnalysisBundle {
        let total_interviews = summaries.len();
        debug!(total_interviews, "starting aggregation");

        // Phase one: everything we can compute without the model.
        let metrics = CurrentMetrics::compute(&summaries);
        let pains = collect_pains(&summaries);
        let groups = group_pains(&pains, self.classifier.as_ref());
        let patterns = behavioral_patterns(&groups);
        let segments = segment_audience(&summaries);
        let personas = synthesize_personas(&summaries);
        let insights = key_insights(&summaries);
        let opportunities = collect_opportunities(&summaries);

        // Phase two: independent LLM steps, run concurrently.
        let (recommendations, brief_answers, goal_achievement) = tokio::join!(
            generate_recommendations(&self.client, &insights, self.max_tokens),
            answer_brief_questions(
                &self.client,
                &self.brief,
                &summaries,
                &insights,
                self.max_tokens,
            ),
            assess_goal_achievement(&self.client, &self.brief, &insights, self.max_tokens),
        );

        let findings = ResearchFindings {
            executive_summary: executive_summary(&insights, &metrics, total_interviews),
            key_insights: insights,
            behavioral_patterns: patterns,
            user_segments: segments.clone(),
            pain_points_map: groups,
            opportunities,
            personas: personas.clone(),
            current_metrics: metrics.clone(),
            brief_answers: brief_answers.clone(),
            goal_achievement: goal_achievement.clone(),
        };

        let base_analysis = BaseAnalysis {
            segments,
            problems: summaries
                .iter()
                .flat_map(|s| s.user_problems.iter().cloned())
                .collect(),
            insights: summaries
                .iter()
                .flat_map(|s| s.insights.iter().cloned())
                .collect(),
            user_journey_issues: Vec::new(),
        };

        let call_stats = self.client.stats();
        info!(
            total_interviews,
            key_insights = findings.key_insights.len(),
            requests = call_stats.requests,
            failures = call_stats.failures,
            cache_hits = call_stats.cache_hits,
            "aggregation complete"
        );

        AnalysisBundle {
            base_analysis,
            recommendations,
            interview_summaries: summaries,
            findings,
            total_interviews,
            current_metrics: metrics,
            personas,
            brief_data: self.brief.present.then(|| self.brief.clone()),
            brief_answers,
            goal_achievement,
            call_stats,
        }
    }
}

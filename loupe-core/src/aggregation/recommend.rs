//! LLM-backed aggregation steps — recommendations, answers to the brief's
//! research questions, and goal-achievement assessment.
//!
//! Every step degrades to an empty (or fixed) result on LLM failure so the
//! final bundle always carries the full key set.

use crate::aggregation::findings::KeyInsight;
use crate::brief::ResearchBrief;
use crate::client::{CompletionRequest, LlmClient};
use crate::extract::extract_json;
use crate::summary::{lenient_vec, InterviewSummary, Score};
use serde::{Deserialize, Serialize};
use tracing::warn;

const TOP_INSIGHTS_FOR_RECOMMENDATIONS: usize = 5;
const MAX_QUOTES_FOR_ANSWERS: usize = 10;

// ---- types ----

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuickWin {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub implementation_steps: Vec<String>,
    #[serde(default)]
    pub expected_impact: String,
    #[serde(default)]
    pub timeline: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrategicInitiative {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub expected_roi: String,
    #[serde(default)]
    pub implementation_phases: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Recommendations {
    #[serde(default)]
    pub quick_wins: Vec<QuickWin>,
    #[serde(default)]
    pub strategic_initiatives: Vec<StrategicInitiative>,
}

/// An answer to one research question from the brief.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BriefAnswer {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub supporting_quotes: Vec<String>,
    #[serde(default)]
    pub confidence: Score,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalAssessment {
    #[serde(default)]
    pub goal: String,
    #[serde(default = "default_achieved")]
    pub achieved: String,
    #[serde(default)]
    pub evidence: Vec<String>,
    #[serde(default)]
    pub next_steps: Vec<String>,
}

fn default_achieved() -> String {
    "partial".to_string()
}

impl GoalAssessment {
    /// The fixed assessment used when the LLM step fails.
    pub fn fallback(goal: &str) -> Self {
        Self {
            goal: goal.to_string(),
            achieved: default_achieved(),
            evidence: Vec::new(),
            next_steps: vec!["Review the interview summaries manually.".to_string()],
        }
    }
}

// ---- recommendations ----

/// Ask the model for quick wins and strategic initiatives based on the
/// highest-severity insights. Empty recommendations on failure.
pub async fn generate_recommendations(
    client: &LlmClient,
    insights: &[KeyInsight],
    max_tokens: u32,
) -> Recommendations {
    if insights.is_empty() {
        return Recommendations::default();
    }

    let mut ranked: Vec<&KeyInsight> = insights.iter().collect();
    ranked.sort_by(|a, b| b.severity.cmp(&a.severity));
    let top: Vec<String> = ranked
        .iter()
        .take(TOP_INSIGHTS_FOR_RECOMMENDATIONS)
        .map(|i| format!("- {} (severity {}): {}", i.title, i.severity, i.description))
        .collect();

    let prompt = format!(
        "Based on these top user research findings:\n{findings}\n\n\
         Propose product recommendations. Respond with ONLY a JSON object:\n\
         {{\n\
           \"quick_wins\": [\n\
             {{\"title\": \"...\", \"description\": \"...\", \
              \"implementation_steps\": [\"...\"], \"expected_impact\": \"...\", \
              \"timeline\": \"...\"}}\n\
           ],\n\
           \"strategic_initiatives\": [\n\
             {{\"title\": \"...\", \"description\": \"...\", \
              \"expected_roi\": \"...\", \"implementation_phases\": [\"...\"]}}\n\
           ]\n\
         }}",
        findings = top.join("\n"),
    );

    match client.complete(CompletionRequest::new(prompt, max_tokens)).await {
        Ok(text) => {
            let value = extract_json(&text);
            Recommendations {
                quick_wins: lenient_vec(value.get("quick_wins")),
                strategic_initiatives: lenient_vec(value.get("strategic_initiatives")),
            }
        }
        Err(error) => {
            warn!(%error, "recommendation generation failed, continuing without");
            Recommendations::default()
        }
    }
}

// ---- brief answers ----

fn notable_quotes(summaries: &[InterviewSummary]) -> Vec<String> {
    summaries
        .iter()
        .flat_map(|s| s.quotes.iter())
        .map(|q| q.text.clone())
        .filter(|t| !t.is_empty())
        .take(MAX_QUOTES_FOR_ANSWERS)
        .collect()
}

/// Answer each research question from the brief using the collected
/// evidence. Skipped entirely when the brief has no questions.
pub async fn answer_brief_questions(
    client: &LlmClient,
    brief: &ResearchBrief,
    summaries: &[InterviewSummary],
    insights: &[KeyInsight],
    max_tokens: u32,
) -> Vec<BriefAnswer> {
    if !brief.present || brief.questions.is_empty() {
        return Vec::new();
    }

    let questions: Vec<String> = brief
        .questions
        .iter()
        .enumerate()
        .map(|(i, q)| format!("{}. {q}", i + 1))
        .collect();
    let evidence: Vec<String> = insights
        .iter()
        .map(|i| format!("- {} ({}% affected)", i.title, i.affected_percentage))
        .collect();
    let quotes = notable_quotes(summaries);

    let prompt = format!(
        "Research questions:\n{questions}\n\nFindings:\n{evidence}\n\n\
         Participant quotes:\n{quotes}\n\n\
         Answer each research question based strictly on this evidence. \
         Respond with ONLY a JSON object:\n\
         {{\"answers\": [{{\"question\": \"...\", \"answer\": \"...\", \
          \"supporting_quotes\": [\"...\"], \"confidence\": 1-10}}]}}",
        questions = questions.join("\n"),
        evidence = evidence.join("\n"),
        quotes = quotes
            .iter()
            .map(|q| format!("- \"{q}\""))
            .collect::<Vec<_>>()
            .join("\n"),
    );

    match client.complete(CompletionRequest::new(prompt, max_tokens)).await {
        Ok(text) => {
            let value = extract_json(&text);
            lenient_vec(value.get("answers"))
        }
        Err(error) => {
            warn!(%error, "brief question answering failed, continuing without");
            Vec::new()
        }
    }
}

// ---- goal achievement ----

/// Assess how well each brief goal was met. On failure every goal gets the
/// fixed "partial" assessment rather than disappearing from the report.
pub async fn assess_goal_achievement(
    client: &LlmClient,
    brief: &ResearchBrief,
    insights: &[KeyInsight],
    max_tokens: u32,
) -> Vec<GoalAssessment> {
    if !brief.present || brief.goals.is_empty() {
        return Vec::new();
    }

    let goals: Vec<String> = brief
        .goals
        .iter()
        .enumerate()
        .map(|(i, g)| format!("{}. {g}", i + 1))
        .collect();
    let evidence: Vec<String> = insights
        .iter()
        .map(|i| format!("- {}: {}", i.title, i.description))
        .collect();

    let prompt = format!(
        "Research goals:\n{goals}\n\nFindings:\n{evidence}\n\n\
         For each goal, judge whether the research achieved it. Respond with \
         ONLY a JSON object:\n\
         {{\"assessments\": [{{\"goal\": \"...\", \
          \"achieved\": \"yes|partial|no\", \"evidence\": [\"...\"], \
          \"next_steps\": [\"...\"]}}]}}",
        goals = goals.join("\n"),
        evidence = evidence.join("\n"),
    );

    match client.complete(CompletionRequest::new(prompt, max_tokens)).await {
        Ok(text) => {
            let value = extract_json(&text);
            let parsed: Vec<GoalAssessment> = lenient_vec(value.get("assessments"));
            if parsed.is_empty() {
                brief.goals.iter().map(|g| GoalAssessment::fallback(g)).collect()
            } else {
                parsed
            }
        }
        Err(error) => {
            warn!(%error, "goal assessment failed, using partial fallback");
            brief.goals.iter().map(|g| GoalAssessment::fallback(g)).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockLlmProvider;
    use crate::config::RetryConfig;
    use std::sync::Arc;

    fn client_with(response: &str) -> LlmClient {
        LlmClient::new(
            Arc::new(MockLlmProvider::with_response(response)),
            None,
            RetryConfig::default(),
        )
    }

    fn insight(title: &str, severity: i64) -> KeyInsight {
        KeyInsight {
            title: title.to_string(),
            description: format!("{title} hurts users"),
            severity,
            quotes: Vec::new(),
            affected_percentage: 50,
        }
    }

    fn brief_with(goals: &[&str], questions: &[&str]) -> ResearchBrief {
        let mut brief = ResearchBrief::default();
        brief.present = true;
        brief.goals = goals.iter().map(|s| s.to_string()).collect();
        brief.questions = questions.iter().map(|s| s.to_string()).collect();
        brief
    }

    #[tokio::test]
    async fn test_recommendations_parsed() {
        let client = client_with(
            r#"{"quick_wins": [{"title": "Fix login", "description": "d",
                "implementation_steps": ["step"], "expected_impact": "high",
                "timeline": "1 week"}],
                "strategic_initiatives": [{"title": "Redesign onboarding",
                "description": "d", "expected_roi": "2x",
                "implementation_phases": ["phase 1"]}]}"#,
        );
        let recs = generate_recommendations(&client, &[insight("login", 8)], 1000).await;
        assert_eq!(recs.quick_wins.len(), 1);
        assert_eq!(recs.quick_wins[0].title, "Fix login");
        assert_eq!(recs.strategic_initiatives[0].title, "Redesign onboarding");
    }

    #[tokio::test]
    async fn test_recommendations_empty_insights_skip_llm() {
        let provider = Arc::new(MockLlmProvider::new());
        let client = LlmClient::new(provider.clone(), None, RetryConfig::default());
        let recs = generate_recommendations(&client, &[], 1000).await;
        assert!(recs.quick_wins.is_empty());
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_recommendations_garbage_response_degrades_empty() {
        let client = client_with("I cannot produce JSON today.");
        let recs = generate_recommendations(&client, &[insight("p", 5)], 1000).await;
        assert!(recs.quick_wins.is_empty());
        assert!(recs.strategic_initiatives.is_empty());
    }

    #[tokio::test]
    async fn test_brief_answers_skipped_without_questions() {
        let provider = Arc::new(MockLlmProvider::new());
        let client = LlmClient::new(provider.clone(), None, RetryConfig::default());
        let brief = brief_with(&["goal"], &[]);
        let answers = answer_brief_questions(&client, &brief, &[], &[], 1000).await;
        assert!(answers.is_empty());
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_brief_answers_parsed_with_confidence() {
        let client = client_with(
            r#"{"answers": [{"question": "Why churn?", "answer": "Slow sync.",
                "supporting_quotes": ["it never syncs"], "confidence": 7}]}"#,
        );
        let brief = brief_with(&[], &["Why churn?"]);
        let answers = answer_brief_questions(&client, &brief, &[], &[], 1000).await;
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].confidence.value_or(0.0), 7.0);
    }

    #[tokio::test]
    async fn test_goal_assessment_fallback_on_unparseable() {
        let client = client_with("nope");
        let brief = brief_with(&["Understand onboarding drop-off"], &[]);
        let assessments =
            assess_goal_achievement(&client, &brief, &[insight("p", 5)], 1000).await;
        assert_eq!(assessments.len(), 1);
        assert_eq!(assessments[0].achieved, "partial");
        assert_eq!(assessments[0].goal, "Understand onboarding drop-off");
    }

    #[tokio::test]
    async fn test_goal_assessment_parsed() {
        let client = client_with(
            r#"{"assessments": [{"goal": "g", "achieved": "yes",
                "evidence": ["e"], "next_steps": []}]}"#,
        );
        let brief = brief_with(&["g"], &[]);
        let assessments = assess_goal_achievement(&client, &brief, &[], 1000).await;
        assert_eq!(assessments[0].achieved, "yes");
    }

    #[tokio::test]
    async fn test_goal_assessment_absent_brief() {
        let client = client_with("{}");
        let brief = ResearchBrief::default();
        let assessments = assess_goal_achievement(&client, &brief, &[], 1000).await;
        assert!(assessments.is_empty());
    }
}

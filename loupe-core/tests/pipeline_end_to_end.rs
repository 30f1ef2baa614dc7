//! Integration tests for the full analysis pipeline.
//!
//! These exercise the pipeline end-to-end with MockLlmProvider, verifying
//! that every transcript yields a summary, that failures degrade instead of
//! aborting, and that the bundle always carries its full key set.

use async_trait::async_trait;
use loupe_core::client::{CompletionRequest, LlmProvider};
use loupe_core::config::{AnalysisConfig, RetryConfig};
use loupe_core::error::{LlmError, LoupeError};
use loupe_core::{AnalysisPipeline, LlmClient, MockLlmProvider};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// A provider whose every call fails with an authentication error.
struct RejectingProvider;

#[async_trait]
impl LlmProvider for RejectingProvider {
    async fn complete(&self, _request: CompletionRequest) -> Result<String, LlmError> {
        Err(LlmError::AuthFailed {
            body: "invalid key".to_string(),
        })
    }

    fn model_name(&self) -> &str {
        "rejecting-model"
    }
}

fn pipeline_with(provider: Arc<dyn LlmProvider>) -> AnalysisPipeline {
    let client = Arc::new(LlmClient::new(provider, None, RetryConfig::default()));
    AnalysisPipeline::with_client(AnalysisConfig::default(), client)
}

fn transcripts(n: usize) -> Vec<String> {
    (1..=n)
        .map(|i| format!("Interviewer: tell me about the product.\nUser {i}: it is fine."))
        .collect()
}

#[tokio::test]
async fn every_transcript_yields_a_summary_even_when_all_calls_fail() {
    let pipeline = pipeline_with(Arc::new(RejectingProvider));
    let bundle = pipeline
        .run(&transcripts(3), None, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(bundle.total_interviews, 3);
    assert_eq!(bundle.interview_summaries.len(), 3);
    for (i, summary) in bundle.interview_summaries.iter().enumerate() {
        assert_eq!(summary.interview_id, (i + 1) as u32);
        assert!(summary.pain_points.is_empty());
        assert_eq!(summary.sentiment_score, 0.0);
    }

    // Downstream aggregation still produced a complete, if empty, bundle.
    assert!(bundle.findings.key_insights.is_empty());
    assert!(bundle.recommendations.quick_wins.is_empty());
    assert!(bundle.call_stats.failures >= 3);
}

#[tokio::test]
async fn sentiment_bands_drive_segments_and_personas() {
    let provider = MockLlmProvider::new();
    for sentiment in [-5.0, -4.0, 0.0, 2.0, 8.0] {
        provider.queue_response(&format!(
            r#"{{"sentiment_score": {sentiment},
                "respondent_profile": {{"profession": "designer"}},
                "pain_points": [{{"pain": "slow interface", "severity": 6}}]}}"#
        ));
    }
    // Later aggregation-step calls get "{}" from the drained queue.
    let pipeline = pipeline_with(Arc::new(provider));
    let bundle = pipeline
        .run(&transcripts(5), None, &CancellationToken::new())
        .await
        .unwrap();

    let sizes: Vec<usize> = bundle
        .base_analysis
        .segments
        .iter()
        .map(|s| s.size)
        .collect();
    assert_eq!(sizes, vec![2, 2, 1]);

    assert_eq!(bundle.personas.len(), 3);
    assert_eq!(bundle.personas[0].persona_id, "P001");
    assert_eq!(bundle.personas[2].persona_id, "P003");

    // "slow interface" appears in all 5 interviews.
    let insight = &bundle.findings.key_insights[0];
    assert_eq!(insight.affected_percentage, 100);
}

#[tokio::test]
async fn russian_brief_is_parsed_and_answered() {
    let provider = MockLlmProvider::new();
    provider.queue_response(
        r#"{"sentiment_score": -2,
            "pain_points": [{"pain": "сложная навигация", "severity": 7}],
            "quotes": [{"text": "я не нашла нужный раздел"}]}"#,
    );
    let pipeline = pipeline_with(Arc::new(provider));

    let brief = "Цели исследования:\n- понять причины оттока\n\n\
                 Вопросы:\n- почему пользователи уходят?\n\n\
                 Целевая аудитория:\nдизайнеры";
    let bundle = pipeline
        .run(&transcripts(1), Some(brief), &CancellationToken::new())
        .await
        .unwrap();

    let data = bundle.brief_data.expect("brief should be carried");
    assert_eq!(data.goals, vec!["понять причины оттока"]);
    assert_eq!(data.questions, vec!["почему пользователи уходят?"]);
    assert_eq!(data.target_audience, "дизайнеры");

    // Goal assessment fell back to the fixed result on the "{}" responses.
    assert_eq!(bundle.goal_achievement.len(), 1);
    assert_eq!(bundle.goal_achievement[0].achieved, "partial");

    // The pain landed in the navigation group.
    assert!(bundle.findings.pain_points_map.contains_key("navigation"));
}

#[tokio::test]
async fn empty_transcript_list_is_rejected() {
    let pipeline = pipeline_with(Arc::new(MockLlmProvider::new()));
    let result = pipeline.run(&[], None, &CancellationToken::new()).await;
    assert!(matches!(result, Err(LoupeError::NoTranscripts)));
}

#[tokio::test]
async fn bundle_serializes_with_full_key_set() {
    let pipeline = pipeline_with(Arc::new(MockLlmProvider::with_response("{}")));
    let bundle = pipeline
        .run(&transcripts(2), None, &CancellationToken::new())
        .await
        .unwrap();

    let json = serde_json::to_value(&bundle).unwrap();
    for key in [
        "base_analysis",
        "recommendations",
        "interview_summaries",
        "findings",
        "total_interviews",
        "current_metrics",
        "personas",
        "brief_data",
        "brief_answers",
        "goal_achievement",
        "call_stats",
    ] {
        assert!(json.get(key).is_some(), "bundle lost key {key}");
    }
    assert_eq!(json["current_metrics"]["estimated_nps"], "insufficient data");
}

#[tokio::test]
async fn cancellation_degrades_pending_interviews() {
    let cancel = CancellationToken::new();
    cancel.cancel();

    let provider = Arc::new(MockLlmProvider::with_response(
        r#"{"sentiment_score": 5}"#,
    ));
    let pipeline = pipeline_with(provider.clone());
    let bundle = pipeline.run(&transcripts(3), None, &cancel).await.unwrap();

    // Every slot is filled, but nothing reached the provider.
    assert_eq!(bundle.interview_summaries.len(), 3);
    assert!(
        bundle
            .interview_summaries
            .iter()
            .all(|s| s.sentiment_score == 0.0)
    );
}

//! End-to-end analysis pipeline: brief parsing, per-interview
//! summarization, cross-interview aggregation.
//!
//! Construction fails fast on a missing API key; `run` fails fast on an
//! empty transcript list. Everything downstream degrades per-step instead
//! of aborting the run.

use crate::aggregation::{AggregationEngine, AnalysisBundle};
use crate::analyzer::InterviewAnalyzer;
use crate::brief::ResearchBrief;
use crate::client::LlmClient;
use crate::config::AnalysisConfig;
use crate::error::{LoupeError, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub struct AnalysisPipeline {
    config: AnalysisConfig,
    client: Arc<LlmClient>,
}

impl AnalysisPipeline {
    /// Build the pipeline from configuration. Errors if no API key can be
    /// resolved.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        let client = Arc::new(LlmClient::from_config(&config)?);
        Ok(Self { config, client })
    }

    /// Build the pipeline with a caller-supplied client, for tests and
    /// alternative providers.
    pub fn with_client(config: AnalysisConfig, client: Arc<LlmClient>) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Run the full analysis. `brief_text` is the raw research brief, if
    /// one was supplied.
    pub async fn run(
        &self,
        transcripts: &[String],
        brief_text: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<AnalysisBundle> {
        if transcripts.is_empty() {
            return Err(LoupeError::NoTranscripts);
        }

        let brief = match brief_text {
            Some(text) => ResearchBrief::parse(text),
            None => ResearchBrief::default(),
        };
        info!(
            transcripts = transcripts.len(),
            brief_present = brief.present,
            model = self.client.model_name(),
            "starting analysis run"
        );

        let analyzer = Arc::new(InterviewAnalyzer::new(
            Arc::clone(&self.client),
            brief.prompt_context(),
            self.config.max_tokens_per_call,
            self.config.concurrency,
        ));
        let summaries = analyzer.analyze_all(transcripts, cancel).await?;

        let engine = AggregationEngine::new(
            Arc::clone(&self.client),
            brief,
            self.config.max_tokens_per_call,
        );
        let bundle = engine.aggregate(summaries).await;

        info!(
            total_interviews = bundle.total_interviews,
            requests = bundle.call_stats.requests,
            failures = bundle.call_stats.failures,
            "analysis run complete"
        );
        Ok(bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockLlmProvider;
    use crate::config::RetryConfig;

    fn mock_pipeline(provider: MockLlmProvider) -> AnalysisPipeline {
        let client = Arc::new(LlmClient::new(
            Arc::new(provider),
            None,
            RetryConfig::default(),
        ));
        AnalysisPipeline::with_client(AnalysisConfig::default(), client)
    }

    #[tokio::test]
    async fn test_no_transcripts_fails_fast() {
        let pipeline = mock_pipeline(MockLlmProvider::new());
        let result = pipeline.run(&[], None, &CancellationToken::new()).await;
        assert!(matches!(result, Err(LoupeError::NoTranscripts)));
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_at_construction() {
        let config = AnalysisConfig {
            api_key: None,
            api_key_env: "LOUPE_PIPELINE_TEST_NO_SUCH_KEY".into(),
            ..Default::default()
        };
        assert!(AnalysisPipeline::new(config).is_err());
    }

    #[tokio::test]
    async fn test_run_produces_one_summary_per_transcript() {
        let provider = MockLlmProvider::with_response(
            r#"{"sentiment_score": -4,
                "pain_points": [{"pain": "slow interface", "severity": 7}]}"#,
        );
        let pipeline = mock_pipeline(provider);
        let transcripts = vec![
            "Interviewer: how was it?\nUser: slow.".to_string(),
            "Interviewer: and you?\nUser: also slow.".to_string(),
        ];
        let bundle = pipeline
            .run(&transcripts, None, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(bundle.interview_summaries.len(), 2);
        assert_eq!(bundle.interview_summaries[0].interview_id, 1);
        assert_eq!(bundle.interview_summaries[1].interview_id, 2);
    }

    #[tokio::test]
    async fn test_brief_flows_into_bundle() {
        let provider = MockLlmProvider::with_response("{}");
        let pipeline = mock_pipeline(provider);
        let brief = "Goals:\n- understand churn\n\nQuestions:\n- why do users leave?";
        let bundle = pipeline
            .run(
                &["a transcript".to_string()],
                Some(brief),
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        let data = bundle.brief_data.expect("brief should be carried");
        assert_eq!(data.goals, vec!["understand churn"]);
    }
}

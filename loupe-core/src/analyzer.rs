//! Per-interview analysis — prompt construction and LLM-response decoding.
//!
//! One transcript in, one [`InterviewSummary`] out, always. Any failure in
//! the prompt/call/decode path is logged and degraded to an empty summary
//! so the aggregation stage is guaranteed exactly N summaries for N
//! transcripts no matter how many individual calls failed.

use crate::client::{CompletionRequest, LlmClient};
use crate::summary::InterviewSummary;
use crate::{error::Result, extract::extract_json};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Transcript prefix embedded in the prompt. Longer interviews are analyzed
/// only partially; this bounds cost and keeps well inside context windows.
const TRANSCRIPT_PREFIX_CHARS: usize = 8000;

/// Below this sample size aggregate statistics are unreliable.
const MIN_RECOMMENDED_INTERVIEWS: usize = 3;

/// Analyzes transcripts one at a time against the brief context.
pub struct InterviewAnalyzer {
    client: Arc<LlmClient>,
    brief_context: String,
    max_tokens: u32,
    concurrency: usize,
}

impl InterviewAnalyzer {
    pub fn new(
        client: Arc<LlmClient>,
        brief_context: String,
        max_tokens: u32,
        concurrency: usize,
    ) -> Self {
        Self {
            client,
            brief_context,
            max_tokens,
            concurrency: concurrency.max(1),
        }
    }

    /// Analyze one transcript. Never fails: the degrade path returns an
    /// empty summary carrying the right id.
    pub async fn analyze_one(&self, transcript: &str, interview_id: u32) -> InterviewSummary {
        let prompt = self.build_prompt(transcript, interview_id);
        let request = CompletionRequest::new(prompt, self.max_tokens);

        match self.client.complete(request).await {
            Ok(response) => {
                let data = extract_json(&response);
                debug!(interview_id, "Interview analysis decoded");
                InterviewSummary::from_value(interview_id, &data)
            }
            Err(e) => {
                warn!(interview_id, error = %e, "Interview analysis failed, using empty summary");
                InterviewSummary::empty(interview_id)
            }
        }
    }

    /// Analyze all transcripts with a bounded worker pool.
    ///
    /// IDs are assigned 1..N in submission order and the returned list is
    /// re-sorted into that order regardless of completion order. Exactly N
    /// summaries come back for N transcripts; cancellation degrades not-yet
    /// -started interviews to empty summaries rather than dropping them.
    pub async fn analyze_all(
        self: &Arc<Self>,
        transcripts: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<InterviewSummary>> {
        if transcripts.len() < MIN_RECOMMENDED_INTERVIEWS {
            warn!(
                count = transcripts.len(),
                minimum = MIN_RECOMMENDED_INTERVIEWS,
                "Fewer transcripts than recommended; aggregate statistics will be unreliable"
            );
        }

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks: JoinSet<(u32, InterviewSummary)> = JoinSet::new();

        for (index, transcript) in transcripts.iter().enumerate() {
            let interview_id = (index + 1) as u32;
            let analyzer = Arc::clone(self);
            let transcript = transcript.clone();
            let semaphore = Arc::clone(&semaphore);
            let cancel = cancel.clone();

            tasks.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    // Closed semaphore means the batch is being torn down.
                    Err(_) => return (interview_id, InterviewSummary::empty(interview_id)),
                };
                if cancel.is_cancelled() {
                    return (interview_id, InterviewSummary::empty(interview_id));
                }
                let summary = tokio::select! {
                    summary = analyzer.analyze_one(&transcript, interview_id) => summary,
                    _ = cancel.cancelled() => {
                        warn!(interview_id, "Interview analysis cancelled");
                        InterviewSummary::empty(interview_id)
                    }
                };
                (interview_id, summary)
            });
        }

        let mut summaries = Vec::with_capacity(transcripts.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, summary)) => summaries.push(summary),
                Err(e) => {
                    // A panicked task still owes the batch its summary slot;
                    // the id is recovered below by filling the gap.
                    warn!(error = %e, "Interview analysis task panicked");
                }
            }
        }

        // Fill any slots lost to panicked tasks, then restore submission order.
        for id in 1..=transcripts.len() as u32 {
            if !summaries.iter().any(|s| s.interview_id == id) {
                summaries.push(InterviewSummary::empty(id));
            }
        }
        summaries.sort_by_key(|s| s.interview_id);
        Ok(summaries)
    }

    /// Build the fixed JSON-schema extraction prompt for one transcript.
    fn build_prompt(&self, transcript: &str, interview_id: u32) -> String {
        let excerpt = truncate_chars(transcript, TRANSCRIPT_PREFIX_CHARS);
        format!(
            r#"{context}ANALYZE INTERVIEW #{interview_id} AND PRODUCE A DETAILED SUMMARY.

INTERVIEW TRANSCRIPT:
{excerpt}

RETURN THIS JSON STRUCTURE:
{{
    "respondent_profile": {{
        "age_range": "age group",
        "profession": "profession",
        "tech_literacy": "technical literacy level",
        "experience_level": "experience with the product",
        "main_goals": ["goal 1", "goal 2"],
        "pain_level": "frustration level (1-10)"
    }},
    "key_themes": [
        {{"theme": "theme name", "description": "description", "quotes": ["quote 1", "quote 2"], "importance": "importance (1-10)"}}
    ],
    "pain_points": [
        {{"pain": "problem description", "severity": "severity (1-10)", "frequency": "mention frequency", "quotes": ["quote 1", "quote 2"], "impact": "impact on the user"}}
    ],
    "needs": [
        {{"need": "need", "type": "explicit/latent", "priority": "priority (1-10)", "quotes": ["quote 1", "quote 2"]}}
    ],
    "insights": ["insight 1", "insight 2", "insight 3"],
    "emotional_journey": [
        {{"moment": "moment in the journey", "emotion": "emotion", "trigger": "trigger", "intensity": "intensity (1-10)", "quote": "quote"}}
    ],
    "contradictions": ["contradiction 1", "contradiction 2"],
    "quotes": [
        {{"text": "full quote (at least 50 words)", "context": "context", "importance": "importance (1-10)", "theme": "related theme"}}
    ],
    "business_pains": [
        {{"pain": "business problem", "impact": "impact on the business", "quotes": ["quote 1", "quote 2"]}}
    ],
    "user_problems": [
        {{"problem": "user problem", "severity": "severity (1-10)", "quotes": ["quote 1", "quote 2"]}}
    ],
    "opportunities": ["opportunity 1", "opportunity 2"],
    "sentiment_score": "overall sentiment (-10 to +10)",
    "brief_related_findings": {{
        "goals_mentioned": ["goal 1", "goal 2"],
        "questions_answered": ["question 1", "question 2"],
        "metrics_impact": ["metric 1", "metric 2"]
    }}
}}

CRITICAL:
- Use ONLY facts present in the interview
- Every quote must be VERBATIM (at least 50 words)
- Do NOT invent details - only what is in the data
- Tie conclusions to the brief goals and questions
- Analyze the respondent's emotional state"#,
            context = self.brief_context,
        )
    }
}

/// Char-boundary-safe prefix of at most `max` characters.
fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((byte_index, _)) => &s[..byte_index],
        None => s,
    }
}

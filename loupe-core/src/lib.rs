//! # Loupe Core
//!
//! Core library for the Loupe UX-interview analysis pipeline.
//! Provides brief parsing, the LLM client (provider, cache, retry),
//! per-interview summarization, cross-interview aggregation, and the
//! report-renderer interface.

pub mod aggregation;
pub mod analyzer;
pub mod brief;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod report;
pub mod summary;

// Re-export commonly used types at the crate root.
pub use aggregation::{
    AggregationEngine, AnalysisBundle, BaseAnalysis, ChurnRisk, CurrentMetrics, KeyInsight,
    Nps, Persona, Recommendations, ResearchFindings, Segment,
};
pub use analyzer::InterviewAnalyzer;
pub use brief::ResearchBrief;
pub use cache::ResponseCache;
pub use client::{
    CallStats, CompletionRequest, LlmClient, LlmProvider, MockLlmProvider, OpenRouterProvider,
};
pub use config::{AnalysisConfig, CacheConfig, RetryConfig, load_config};
pub use error::{LlmError, LoupeError, Result};
pub use extract::extract_json;
pub use pipeline::AnalysisPipeline;
pub use report::{ReportConfig, ReportRenderer};
pub use summary::InterviewSummary;

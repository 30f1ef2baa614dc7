//! Aggregation — turning N per-interview summaries into one research
//! findings bundle.

pub mod engine;
pub mod findings;
pub mod grouping;
pub mod metrics;
pub mod recommend;
pub mod segments;

pub use engine::{AggregationEngine, AnalysisBundle, BaseAnalysis};
pub use findings::{KeyInsight, ResearchFindings};
pub use grouping::{BehavioralPattern, KeywordClassifier, PainClassifier, PainRecord, OTHER_GROUP};
pub use metrics::{churn_risk, ChurnRisk, CurrentMetrics, Nps};
pub use recommend::{
    BriefAnswer, GoalAssessment, QuickWin, Recommendations, StrategicInitiative,
};
pub use segments::{FrustrationBand, Persona, PersonaDemographics, Segment};

//! Report rendering interface.
//!
//! The core crate produces an [`AnalysisBundle`]; how that becomes a
//! document is a renderer concern. Implementations live outside core (the
//! CLI ships an HTML renderer).

use crate::aggregation::AnalysisBundle;
use crate::error::Result;
use std::path::{Path, PathBuf};

/// Presentation metadata for a rendered report.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub company_name: String,
    pub report_title: String,
    pub author: String,
    /// Report date line, e.g. "2026-08-28".
    pub date: String,
}

impl ReportConfig {
    pub fn from_analysis(config: &crate::config::AnalysisConfig) -> Self {
        Self {
            company_name: config.company_name.clone(),
            report_title: config.report_title.clone(),
            author: config.author.clone(),
            date: chrono::Local::now().format("%Y-%m-%d").to_string(),
        }
    }
}

/// Renders an analysis bundle to a file and returns the path written.
pub trait ReportRenderer {
    fn render(
        &self,
        bundle: &AnalysisBundle,
        config: &ReportConfig,
        out_path: &Path,
    ) -> Result<PathBuf>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;

    #[test]
    fn test_report_config_from_analysis() {
        let analysis = AnalysisConfig {
            company_name: "Acme".into(),
            ..Default::default()
        };
        let report = ReportConfig::from_analysis(&analysis);
        assert_eq!(report.company_name, "Acme");
        assert_eq!(report.report_title, "UX Research Report");
        // Date is YYYY-MM-DD.
        assert_eq!(report.date.len(), 10);
    }
}

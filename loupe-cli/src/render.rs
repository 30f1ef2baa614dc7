//! HTML report renderer backed by handlebars.
//!
//! The template is compiled into the binary; the renderer flattens the
//! analysis bundle plus the presentation metadata into one context object.

use handlebars::Handlebars;
use loupe_core::error::LoupeError;
use loupe_core::report::{ReportConfig, ReportRenderer};
use loupe_core::{AnalysisBundle, Result};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing::info;

const REPORT_TEMPLATE: &str = include_str!("../templates/report.hbs");

pub struct HtmlRenderer {
    registry: Handlebars<'static>,
}

impl HtmlRenderer {
    pub fn new() -> Result<Self> {
        let mut registry = Handlebars::new();
        registry
            .register_template_string("report", REPORT_TEMPLATE)
            .map_err(|e| LoupeError::Render {
                message: e.to_string(),
            })?;
        Ok(Self { registry })
    }

    fn context(bundle: &AnalysisBundle, config: &ReportConfig) -> Result<Value> {
        let mut context = serde_json::to_value(bundle)?;
        let header = json!({
            "company_name": config.company_name,
            "report_title": config.report_title,
            "author": config.author,
            "date": config.date,
        });
        if let (Some(context), Some(header)) = (context.as_object_mut(), header.as_object()) {
            for (key, value) in header {
                context.insert(key.clone(), value.clone());
            }
        }
        Ok(context)
    }
}

impl ReportRenderer for HtmlRenderer {
    fn render(
        &self,
        bundle: &AnalysisBundle,
        config: &ReportConfig,
        out_path: &Path,
    ) -> Result<PathBuf> {
        let context = Self::context(bundle, config)?;
        let html = self
            .registry
            .render("report", &context)
            .map_err(|e| LoupeError::Render {
                message: e.to_string(),
            })?;

        if let Some(parent) = out_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(out_path, &html)?;
        info!(path = %out_path.display(), bytes = html.len(), "report written");
        Ok(out_path.to_path_buf())
    }
}

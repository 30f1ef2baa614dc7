//! Research brief parsing and prompt-context rendering.
//!
//! Briefs arrive as free text written by researchers, frequently bilingual
//! (Russian/English) and loosely formatted. The parser is a forgiving
//! line-oriented scan: section-marker keywords switch the active field,
//! everything else accumulates into it. A marker-less brief parses to an
//! empty-but-present brief rather than an error.

use serde::{Deserialize, Serialize};

/// Section-marker keywords, checked in order against each lowercased line.
/// First containing match wins and the line is consumed as a header.
const SECTION_MARKERS: &[(&str, Section)] = &[
    ("цели", Section::Goals),
    ("goals", Section::Goals),
    ("вопросы", Section::Questions),
    ("questions", Section::Questions),
    ("аудитория", Section::Audience),
    ("audience", Section::Audience),
    ("контекст", Section::Context),
    ("context", Section::Context),
    ("метрики", Section::Metrics),
    ("metrics", Section::Metrics),
    ("ограничения", Section::Constraints),
    ("constraints", Section::Constraints),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Goals,
    Questions,
    Audience,
    Context,
    Metrics,
    Constraints,
}

/// Structured research brief driving prompt construction and the
/// brief-answer / goal-achievement aggregation steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchBrief {
    pub goals: Vec<String>,
    pub questions: Vec<String>,
    pub target_audience: String,
    pub business_context: String,
    pub success_metrics: Vec<String>,
    pub constraints: Vec<String>,
    /// Whether any brief content was supplied for this run.
    pub present: bool,
}

impl ResearchBrief {
    /// Parse free-text brief content.
    ///
    /// Lines before the first recognized section marker are discarded.
    /// Scalar sections (audience, context) accumulate space-joined; list
    /// sections strip one leading bullet (`-`, `•`, `*`) per line.
    pub fn parse(raw: &str) -> Self {
        let mut brief = ResearchBrief {
            present: !raw.trim().is_empty(),
            ..Default::default()
        };

        let mut current: Option<Section> = None;
        for line in raw.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let lower = line.to_lowercase();
            if let Some((_, section)) = SECTION_MARKERS
                .iter()
                .find(|(marker, _)| lower.contains(marker))
            {
                current = Some(*section);
                continue; // header line, not content
            }

            let Some(section) = current else {
                continue;
            };
            match section {
                Section::Audience => append_scalar(&mut brief.target_audience, line),
                Section::Context => append_scalar(&mut brief.business_context, line),
                Section::Goals => push_item(&mut brief.goals, line),
                Section::Questions => push_item(&mut brief.questions, line),
                Section::Metrics => push_item(&mut brief.success_metrics, line),
                Section::Constraints => push_item(&mut brief.constraints, line),
            }
        }

        brief
    }

    /// Render the reusable context block injected into downstream prompts.
    /// Empty when no brief was supplied.
    pub fn prompt_context(&self) -> String {
        if !self.present {
            return String::new();
        }

        let mut context = String::from("<research_context>\n");
        context.push_str(
            "CRITICAL: every conclusion must serve the goals and answer the questions of this brief.\n\n",
        );

        if !self.goals.is_empty() {
            context.push_str("RESEARCH GOALS (each must be addressed):\n");
            for (i, goal) in self.goals.iter().enumerate() {
                context.push_str(&format!("{}. {goal}\n", i + 1));
            }
        }
        if !self.questions.is_empty() {
            context.push_str("\nRESEARCH QUESTIONS (each must be answered):\n");
            for (i, question) in self.questions.iter().enumerate() {
                context.push_str(&format!("{}. {question}\n", i + 1));
            }
        }
        if !self.target_audience.is_empty() {
            context.push_str(&format!("\nTARGET AUDIENCE:\n{}\n", self.target_audience));
        }
        if !self.business_context.is_empty() {
            context.push_str(&format!("\nBUSINESS CONTEXT:\n{}\n", self.business_context));
        }
        if !self.success_metrics.is_empty() {
            context.push_str("\nSUCCESS METRICS (assess impact on each):\n");
            for metric in &self.success_metrics {
                context.push_str(&format!("- {metric}\n"));
            }
        }

        context.push_str(
            "\nIMPORTANT: every conclusion must be backed by EXACT quotes from the interviews!\n",
        );
        context.push_str("</research_context>\n\n");
        context
    }
}

fn append_scalar(field: &mut String, line: &str) {
    if !field.is_empty() {
        field.push(' ');
    }
    field.push_str(line);
}

fn push_item(list: &mut Vec<String>, line: &str) {
    let item = line
        .strip_prefix('-')
        .or_else(|| line.strip_prefix('•'))
        .or_else(|| line.strip_prefix('*'))
        .unwrap_or(line)
        .trim();
    if !item.is_empty() {
        list.push(item.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_goals_with_bullets() {
        let brief = ResearchBrief::parse(
            "Goals:\n- Understand onboarding drop-off\n- Validate pricing page\n- Find navigation blockers\n",
        );
        assert_eq!(
            brief.goals,
            vec![
                "Understand onboarding drop-off",
                "Validate pricing page",
                "Find navigation blockers"
            ]
        );
        assert!(brief.present);
    }

    #[test]
    fn test_russian_markers() {
        let brief = ResearchBrief::parse("Цели:\n- Increase retention\n- Reduce churn");
        assert_eq!(brief.goals, vec!["Increase retention", "Reduce churn"]);
    }

    #[test]
    fn test_scalar_sections_space_joined() {
        let brief = ResearchBrief::parse(
            "Audience:\nSmall-business owners\naged 30-50\n\nBusiness context:\nB2B SaaS\nself-serve funnel",
        );
        assert_eq!(brief.target_audience, "Small-business owners aged 30-50");
        assert_eq!(brief.business_context, "B2B SaaS self-serve funnel");
    }

    #[test]
    fn test_marker_less_brief_is_empty_but_present() {
        let brief = ResearchBrief::parse("just some prose with no sections at all");
        assert!(brief.present);
        assert!(brief.goals.is_empty());
        assert!(brief.questions.is_empty());
        assert!(brief.target_audience.is_empty());
    }

    #[test]
    fn test_empty_input_not_present() {
        let brief = ResearchBrief::parse("   \n  \n");
        assert!(!brief.present);
        assert_eq!(brief.prompt_context(), "");
    }

    #[test]
    fn test_pre_marker_lines_discarded() {
        let brief = ResearchBrief::parse("intro paragraph\nmore intro\nGoals:\n- The only goal");
        assert_eq!(brief.goals, vec!["The only goal"]);
    }

    #[test]
    fn test_mixed_sections() {
        let brief = ResearchBrief::parse(
            "Goals\n- G1\nQuestions\n- Q1\n- Q2\nMetrics\n* NPS\nConstraints\n• Two week timeline",
        );
        assert_eq!(brief.goals, vec!["G1"]);
        assert_eq!(brief.questions, vec!["Q1", "Q2"]);
        assert_eq!(brief.success_metrics, vec!["NPS"]);
        assert_eq!(brief.constraints, vec!["Two week timeline"]);
    }

    #[test]
    fn test_prompt_context_ordering() {
        let brief = ResearchBrief::parse(
            "Goals:\n- G1\n- G2\nQuestions:\n- Q1\nAudience:\nDesigners\nMetrics:\n- Retention",
        );
        let context = brief.prompt_context();
        assert!(context.starts_with("<research_context>"));
        assert!(context.contains("1. G1"));
        assert!(context.contains("2. G2"));
        let goals_at = context.find("RESEARCH GOALS").unwrap();
        let questions_at = context.find("RESEARCH QUESTIONS").unwrap();
        let audience_at = context.find("TARGET AUDIENCE").unwrap();
        let metrics_at = context.find("SUCCESS METRICS").unwrap();
        assert!(goals_at < questions_at && questions_at < audience_at && audience_at < metrics_at);
        assert!(context.contains("EXACT quotes"));
    }

    #[test]
    fn test_bullet_only_line_ignored() {
        let brief = ResearchBrief::parse("Goals:\n-\n- Real goal");
        assert_eq!(brief.goals, vec!["Real goal"]);
    }
}

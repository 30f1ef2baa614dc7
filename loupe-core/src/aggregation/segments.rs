//! Audience segmentation and persona synthesis.
//!
//! Summaries are partitioned into exactly three frustration bands by
//! sentiment score; the bands are disjoint and cover every summary. Each
//! non-empty band yields one segment record and one persona built from the
//! band's first member.

use crate::summary::InterviewSummary;
use serde::{Deserialize, Serialize};

/// Frustration band boundaries on `sentiment_score`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrustrationBand {
    High,
    Medium,
    Low,
}

impl FrustrationBand {
    /// Band emission order, which also fixes persona numbering.
    pub const ALL: [FrustrationBand; 3] = [
        FrustrationBand::High,
        FrustrationBand::Medium,
        FrustrationBand::Low,
    ];

    pub fn of(sentiment: f64) -> FrustrationBand {
        if sentiment < -3.0 {
            FrustrationBand::High
        } else if sentiment > 3.0 {
            FrustrationBand::Low
        } else {
            FrustrationBand::Medium
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FrustrationBand::High => "High frustration",
            FrustrationBand::Medium => "Medium frustration",
            FrustrationBand::Low => "Low frustration",
        }
    }

    fn characteristics(&self) -> &'static str {
        match self {
            FrustrationBand::High => "Users with a high level of dissatisfaction",
            FrustrationBand::Medium => "Users with a moderate level of satisfaction",
            FrustrationBand::Low => "Satisfied users",
        }
    }

    fn needs(&self) -> &'static str {
        match self {
            FrustrationBand::High => "Urgent interface improvements",
            FrustrationBand::Medium => "Incremental improvements",
            FrustrationBand::Low => "Maintaining quality",
        }
    }
}

/// One audience segment (non-empty frustration band).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub name: String,
    pub band: FrustrationBand,
    pub size: usize,
    pub characteristics: String,
    pub needs: String,
}

/// Members of a band, in submission order.
pub fn band_members<'a>(
    summaries: &'a [InterviewSummary],
    band: FrustrationBand,
) -> Vec<&'a InterviewSummary> {
    summaries
        .iter()
        .filter(|s| FrustrationBand::of(s.sentiment_score) == band)
        .collect()
}

/// Emit a segment record for every non-empty band.
pub fn segment_audience(summaries: &[InterviewSummary]) -> Vec<Segment> {
    FrustrationBand::ALL
        .into_iter()
        .filter_map(|band| {
            let members = band_members(summaries, band);
            if members.is_empty() {
                return None;
            }
            Some(Segment {
                name: band.label().to_string(),
                band,
                size: members.len(),
                characteristics: band.characteristics().to_string(),
                needs: band.needs().to_string(),
            })
        })
        .collect()
}

/// A synthesized representative-user profile for one segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Persona {
    pub persona_id: String,
    pub name: String,
    /// References (not copies) of up to 3 source interviews.
    pub based_on_interviews: Vec<u32>,
    pub tagline: String,
    pub description: String,
    pub demographics: PersonaDemographics,
    pub goals: Vec<String>,
    pub frustrations: Vec<String>,
    pub needs: Vec<String>,
    pub real_quotes: Vec<String>,
    pub typical_scenario: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersonaDemographics {
    pub age_range: String,
    pub profession: String,
    pub tech_literacy: String,
}

const UNSPECIFIED: &str = "Not specified";

/// Build one persona per non-empty segment, using the segment's first
/// member as the representative interview. IDs run P001, P002, ... in
/// band emission order.
pub fn synthesize_personas(summaries: &[InterviewSummary]) -> Vec<Persona> {
    let mut personas = Vec::new();
    for band in FrustrationBand::ALL {
        let members = band_members(summaries, band);
        let Some(representative) = members.first() else {
            continue;
        };

        let number = personas.len() + 1;
        let profile = &representative.respondent_profile;
        personas.push(Persona {
            persona_id: format!("P{number:03}"),
            name: format!("User {number}"),
            based_on_interviews: members.iter().take(3).map(|s| s.interview_id).collect(),
            tagline: format!("Representative of the '{}' segment", band.label()),
            description: format!(
                "User from the '{}' segment: {}",
                band.label(),
                band.characteristics()
            ),
            demographics: PersonaDemographics {
                age_range: or_unspecified(&profile.age_range),
                profession: or_unspecified(&profile.profession),
                tech_literacy: or_unspecified(&profile.tech_literacy),
            },
            goals: profile.main_goals.clone(),
            frustrations: representative
                .pain_points
                .iter()
                .take(3)
                .map(|p| p.pain.clone())
                .collect(),
            needs: representative
                .needs
                .iter()
                .take(3)
                .map(|n| n.need.clone())
                .collect(),
            real_quotes: representative
                .quotes
                .iter()
                .filter(|q| !q.text.is_empty())
                .take(3)
                .map(|q| q.text.clone())
                .collect(),
            typical_scenario: format!("Typical scenario for {}", band.label()),
        });
    }
    personas
}

fn or_unspecified(value: &str) -> String {
    if value.is_empty() {
        UNSPECIFIED.to_string()
    } else {
        value.to_string()
    }
}

use serde::{Deserialize, Serialize};

/// Upper bound of the ATS score scale.
pub const MAX_ATS_SCORE: u8 = 100;

/// Technical skills grouped into the four fixed categories the model is asked for.
///
/// All four keys must be present in model output (an empty list is fine);
/// unknown categories are rejected so the shape stays canonical.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TechnicalSkills {
    #[serde(rename = "Languages")]
    pub languages: Vec<String>,
    #[serde(rename = "Frameworks_and_Libraries")]
    pub frameworks_and_libraries: Vec<String>,
    #[serde(rename = "Tools_and_Platforms")]
    pub tools_and_platforms: Vec<String>,
    #[serde(rename = "Databases_and_Cloud")]
    pub databases_and_cloud: Vec<String>,
}

impl TechnicalSkills {
    /// Category name / skill list pairs in the canonical order.
    pub fn categories(&self) -> [(&'static str, &[String]); 4] {
        [
            ("Languages", self.languages.as_slice()),
            ("Frameworks_and_Libraries", self.frameworks_and_libraries.as_slice()),
            ("Tools_and_Platforms", self.tools_and_platforms.as_slice()),
            ("Databases_and_Cloud", self.databases_and_cloud.as_slice()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRole {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingSkill {
    pub skill: String,
    pub recommendation: String,
}

/// Canonical analysis of a single resume.
///
/// Every field is required. A payload missing any of them, or carrying extra
/// top-level keys, fails deserialization instead of being defaulted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisResult {
    pub technical_skills: TechnicalSkills,
    pub soft_skills: Vec<String>,
    pub job_roles: Vec<JobRole>,
    /// 0 – 100, checked after deserialization.
    pub ats_score: u8,
    pub ats_tips: Vec<String>,
    pub missing_skills: Vec<MissingSkill>,
}

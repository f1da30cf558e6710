// Resume analysis prompt templates.
// All prompts for the analysis module are defined here.

use crate::llm_client::prompts::{JSON_ONLY_INSTRUCTION, RESUME_EXPERT_ROLE};

/// Resume text beyond this many characters is cut off before prompting.
pub const MAX_RESUME_CHARS: usize = 4000;

pub const ANALYSIS_PROMPT_TEMPLATE: &str = r#"{role} Analyze the resume text below.

Resume Text:
{resume_text}

Tasks:
1. Extract specific Technical Skills (programming, tools, hard skills).
2. Extract specific Soft Skills (communication, leadership, etc.).
3. Suggest 3 suitable job roles containing a title and description.
4. Calculate an estimated ATS Score (0-100).
5. Provide 3 specific tips to improve the resume.
6. Identify 3 critical MISSING skills for the suggested roles and provide a brief recommendation on how to verify/learn them.

OUTPUT SCHEMA (return exactly this structure, every key present, lists may be empty):
{
  "technical_skills": {
    "Languages": [],
    "Frameworks_and_Libraries": [],
    "Tools_and_Platforms": [],
    "Databases_and_Cloud": []
  },
  "soft_skills": [],
  "job_roles": [{"title": "", "description": ""}],
  "ats_score": 0,
  "ats_tips": [],
  "missing_skills": [{"skill": "", "recommendation": ""}]
}

RULES:
1. "ats_score" is a whole number between 0 and 100.
2. Do not add keys that are not in the schema.
3. {json_only}"#;

pub const SUMMARY_PROMPT_TEMPLATE: &str = "Write a concise, professional resume summary \
(3-4 sentences) for a {target_role} with skills: {skills}.";

/// Returns at most the first `max` characters of `text`, on a char boundary.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Renders the analysis prompt for a resume. Pure and deterministic.
pub fn build_analysis_prompt(resume_text: &str) -> String {
    // Resume text goes in last so placeholders inside it are never expanded.
    ANALYSIS_PROMPT_TEMPLATE
        .replace("{role}", RESUME_EXPERT_ROLE)
        .replace("{json_only}", JSON_ONLY_INSTRUCTION)
        .replace(
            "{resume_text}",
            truncate_chars(resume_text, MAX_RESUME_CHARS),
        )
}

/// Renders the professional-summary prompt for a target role and skill list.
pub fn build_summary_prompt(target_role: &str, skills: &[String]) -> String {
    let skills = if skills.is_empty() {
        "general professional skills".to_string()
    } else {
        skills.join(", ")
    };
    render(
        SUMMARY_PROMPT_TEMPLATE,
        &[("target_role", target_role), ("skills", skills.as_str())],
    )
}

/// Fills `{name}` placeholders in a single left-to-right pass, so text that
/// was substituted in is never scanned again. Unknown braces are kept.
fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let hit = vars.iter().find_map(|(name, value)| {
            let after = tail.strip_prefix('{')?.strip_prefix(*name)?.strip_prefix('}')?;
            Some((*value, after))
        });
        match hit {
            Some((value, after)) => {
                out.push_str(value);
                rest = after;
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

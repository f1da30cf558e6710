// Shared prompt fragments. Each service that calls the generation endpoint
// keeps its own prompts.rs alongside it; cross-cutting pieces live here.

/// Appended to every prompt whose answer is parsed as JSON.
pub const JSON_ONLY_INSTRUCTION: &str = "\
Return ONLY the JSON object. \
Do NOT include any text outside the JSON object. \
Do NOT include explanations or apologies.";

/// Role preamble for everything that reads or writes resumes.
pub const RESUME_EXPERT_ROLE: &str =
    "You are an expert ATS (Applicant Tracking System) scanner and career coach.";

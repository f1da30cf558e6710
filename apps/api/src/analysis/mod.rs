// Resume analysis: prompt building, response normalization, the
// orchestrating pipeline and its HTTP handlers.
// All generation calls go through llm_client.

pub mod error;
pub mod handlers;
pub mod normalizer;
pub mod pipeline;
pub mod prompts;

//! AI provider abstraction, the OpenAI implementation, and the fixed
//! prompts the service sends.

mod openai;
mod prompts;
mod provider;

pub use openai::OpenAiProvider;
pub use prompts::{
    insight_messages, parse_insight, parse_recommendations, recommendation_messages,
    AiRecommendation, KeywordInsight,
};
pub use provider::{AiProvider, AiResponse, ChatMessage, ChatRole, GenerateOptions};

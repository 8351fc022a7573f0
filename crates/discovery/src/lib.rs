//! Book discovery built on an AI candidate generator and the library catalog.
//!
//! The centerpiece is [`pipeline::SearchPipeline`], which turns a free-text
//! keyword (plus optional GPS coordinates) into a ranked list of books that
//! verifiably exist in the library system:
//!
//! 1. an AI provider proposes candidate titles,
//! 2. each candidate is resolved against the catalog,
//! 3. usage-based and static recommendation lists expand the set,
//! 4. nearby library holdings rank the result.
//!
//! Every stage degrades gracefully; the result envelope's `mode` field tells
//! the caller which confidence tier survived.

pub mod ai;
pub mod cache;
pub mod envelope;
pub mod error;
pub mod matching;
pub mod pipeline;

pub use ai::{
    AiProvider, AiRecommendation, AiResponse, ChatMessage, GenerateOptions, KeywordInsight,
    OpenAiProvider,
};
pub use cache::{ai_search_key, region_bucket, MemoryCache, ResponseCache};
pub use envelope::{RankedBook, SearchEnvelope, SeedSummary};
pub use error::{AiError, SearchError};
pub use pipeline::{PipelineConfig, SearchOutcome, SearchPipeline, SearchRequest};

//! ibadah-ai: language-model text completion and the prompt composers
//! built on it.
//!
//! The completion capability sits behind `TextCompleter` so composers can
//! be tested with fakes; the production impl calls the Anthropic Messages
//! API. Every composer degrades to a static fallback string on failure —
//! AI trouble never propagates to callers.

pub mod client;
pub mod compose;

pub use client::AnthropicClient;
pub use compose::{
    discussion_response, dhuha_motivation, dzikir_motivation, jumat_motivation,
    motivational_message,
};

use async_trait::async_trait;

use ibadah_types::{ChatTurn, HadithRef, VerseRef};

/// A single-shot or multi-turn text completion capability.
#[async_trait]
pub trait TextCompleter: Send + Sync {
    /// Complete the given turns, producing at most `max_tokens` of output.
    async fn complete(&self, turns: &[ChatTurn], max_tokens: u32) -> anyhow::Result<String>;
}

/// Scripture lookup capability used to ground prompts in dalil.
#[async_trait]
pub trait ScriptureSource: Send + Sync {
    /// A random matching translated verse, or None.
    async fn quran(&self, keyword: &str) -> Option<VerseRef>;
    /// A random matching translated hadith, or None.
    async fn hadith(&self, keyword: &str) -> Option<HadithRef>;
}

#[async_trait]
impl ScriptureSource for ibadah_api::MyQuranApi {
    async fn quran(&self, keyword: &str) -> Option<VerseRef> {
        match self.search_quran(keyword).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("quran search failed: {e:#}");
                None
            }
        }
    }

    async fn hadith(&self, keyword: &str) -> Option<HadithRef> {
        match self.search_hadith(keyword).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("hadith search failed: {e:#}");
                None
            }
        }
    }
}

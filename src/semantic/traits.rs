// Embedding provider trait: the optional side channel for semantic drift.
//
// The keyword pipeline never depends on this. When no provider is
// configured, or a call fails, semantic outputs are simply absent.

use anyhow::Result;
use async_trait::async_trait;

/// Turns text into dense vectors suitable for cosine comparison.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed each text, returning vectors in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f64>>>;
}

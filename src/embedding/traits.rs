// Token embedder trait: the swap-ready abstraction over the pretrained model.
//
// The pipeline only needs "give me a vector for each of these strings".
// How the model is loaded, what its vocabulary is, and how wide its vectors
// are stay behind this trait.

use anyhow::Result;

/// Trait for turning tokens into fixed-length embedding vectors.
pub trait TokenEmbedder {
    /// Human-readable model name, used in rendered titles.
    fn name(&self) -> &str;

    /// Length of every vector this embedder returns.
    fn dimension(&self) -> usize;

    /// Embed each token, returning one vector per token in the same order.
    ///
    /// Unknown tokens must not fail: they degrade to a model-defined default
    /// (the table backend uses the zero vector).
    fn embed(&self, tokens: &[String]) -> Result<Vec<Vec<f64>>>;
}

impl<T: TokenEmbedder + ?Sized> TokenEmbedder for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn embed(&self, tokens: &[String]) -> Result<Vec<Vec<f64>>> {
        (**self).embed(tokens)
    }
}

// Number embeddings from a local all-MiniLM-L6-v2 sentence transformer.
//
// Each decimal string is tokenized, run through the BERT encoder, and
// mean-pooled over its attention mask into a single 384-dimensional vector.
// Sub-word tokenization means every string gets a vector; there is no
// out-of-vocabulary case for this backend.

use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;
use tracing::debug;

use super::traits::TokenEmbedder;

/// Embedding dimension for all-MiniLM-L6-v2.
pub const EMBEDDING_DIM: usize = 384;

/// Tokens per inference call. Bounds the padded input tensors for large ranges.
const BATCH_SIZE: usize = 64;

/// Sentence embedder using a local ONNX model.
///
/// `Session::run` needs `&mut self`, so the session sits behind a Mutex to
/// keep `TokenEmbedder::embed` on `&self`.
pub struct OnnxEmbedder {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
}

impl OnnxEmbedder {
    /// Load the sentence embedding model and tokenizer from the given directory.
    ///
    /// Expects `model.onnx` and `tokenizer.json` in the directory.
    /// Run `numsim download-model` first if they don't exist.
    pub fn load(model_dir: &Path) -> Result<Self> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");

        if !model_path.exists() {
            anyhow::bail!(
                "Embedding model not found: {}\nRun `numsim download-model` to download it.",
                model_path.display()
            );
        }
        if !tokenizer_path.exists() {
            anyhow::bail!(
                "Embedding tokenizer not found: {}\nRun `numsim download-model` to download it.",
                tokenizer_path.display()
            );
        }

        let session = Session::builder()
            .context("Failed to create ONNX session builder")?
            .commit_from_file(&model_path)
            .with_context(|| {
                format!(
                    "Failed to load embedding model from {}",
                    model_path.display()
                )
            })?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load embedding tokenizer: {}", e))?;

        debug!("Loaded ONNX embedding model from {}", model_dir.display());

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
        })
    }

    fn embed_batch(&self, tokens: &[String]) -> Result<Vec<Vec<f64>>> {
        let encodings: Vec<_> = tokens
            .iter()
            .map(|t| {
                self.tokenizer
                    .encode(t.as_str(), true)
                    .map_err(|e| anyhow::anyhow!("Tokenization of {t:?} failed: {}", e))
            })
            .collect::<Result<Vec<_>>>()?;

        let batch_size = encodings.len();
        let max_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0);

        if max_len == 0 {
            return Ok(vec![vec![0.0; EMBEDDING_DIM]; batch_size]);
        }

        // BERT inputs, padded to max_len with token id 0 and mask 0.
        let mut input_ids: Vec<i64> = Vec::with_capacity(batch_size * max_len);
        let mut attention_mask: Vec<i64> = Vec::with_capacity(batch_size * max_len);
        let mut token_type_ids: Vec<i64> = Vec::with_capacity(batch_size * max_len);

        for enc in &encodings {
            let ids = enc.get_ids();
            let pad_len = max_len - ids.len();

            input_ids.extend(ids.iter().map(|&id| id as i64));
            input_ids.extend(std::iter::repeat_n(0i64, pad_len));
            attention_mask.extend(enc.get_attention_mask().iter().map(|&m| m as i64));
            attention_mask.extend(std::iter::repeat_n(0i64, pad_len));
            token_type_ids.extend(std::iter::repeat_n(0i64, max_len));
        }

        let shape = [batch_size as i64, max_len as i64];
        let input_ids_tensor =
            Tensor::from_array((shape, input_ids)).context("Failed to create input_ids tensor")?;
        let attention_mask_tensor = Tensor::from_array((shape, attention_mask.clone()))
            .context("Failed to create attention_mask tensor")?;
        let token_type_ids_tensor = Tensor::from_array((shape, token_type_ids))
            .context("Failed to create token_type_ids tensor")?;

        // last_hidden_state: [batch, seq_len, 384]
        let hidden_states = {
            let mut session = self
                .session
                .lock()
                .map_err(|e| anyhow::anyhow!("Session lock poisoned: {}", e))?;

            let outputs = session
                .run(ort::inputs! {
                    "input_ids" => input_ids_tensor,
                    "attention_mask" => attention_mask_tensor,
                    "token_type_ids" => token_type_ids_tensor
                })
                .context("Embedding ONNX inference failed")?;

            let (_shape, data) = outputs[0]
                .try_extract_tensor::<f32>()
                .context("Failed to extract embedding output tensor")?;

            data.to_vec()
        };

        Ok(mean_pool(&hidden_states, &attention_mask, batch_size, max_len))
    }
}

impl TokenEmbedder for OnnxEmbedder {
    fn name(&self) -> &str {
        "all-MiniLM-L6-v2"
    }

    fn dimension(&self) -> usize {
        EMBEDDING_DIM
    }

    fn embed(&self, tokens: &[String]) -> Result<Vec<Vec<f64>>> {
        let mut vectors = Vec::with_capacity(tokens.len());
        for chunk in tokens.chunks(BATCH_SIZE) {
            vectors.extend(self.embed_batch(chunk)?);
        }
        debug!(
            tokens = tokens.len(),
            dim = EMBEDDING_DIM,
            "Computed ONNX token embeddings"
        );
        Ok(vectors)
    }
}

/// Average token embeddings weighted by the attention mask.
///
/// `hidden` is `[batch, seq_len, EMBEDDING_DIM]` flattened row-major and
/// `mask` is `[batch, seq_len]`. A row with an all-zero mask stays zero.
fn mean_pool(hidden: &[f32], mask: &[i64], batch_size: usize, seq_len: usize) -> Vec<Vec<f64>> {
    let mut pooled = Vec::with_capacity(batch_size);

    for i in 0..batch_size {
        let mut sum = vec![0.0_f64; EMBEDDING_DIM];
        let mut mask_sum = 0.0_f64;

        for j in 0..seq_len {
            let m = mask[i * seq_len + j] as f64;
            if m > 0.0 {
                mask_sum += m;
                let offset = (i * seq_len + j) * EMBEDDING_DIM;
                for (k, acc) in sum.iter_mut().enumerate() {
                    *acc += hidden[offset + k] as f64 * m;
                }
            }
        }

        if mask_sum > 0.0 {
            for val in &mut sum {
                *val /= mask_sum;
            }
        }

        pooled.push(sum);
    }

    pooled
}

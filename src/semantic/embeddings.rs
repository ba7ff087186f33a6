// Local sentence embedder (all-MiniLM-L6-v2 via ONNX Runtime).
//
// Produces 384-dimensional mean-pooled vectors for document text. Loaded only
// when the model files exist under the configured model directory; otherwise
// semantic drift is reported as unavailable.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::{Encoding, Tokenizer};
use tracing::debug;

use super::traits::EmbeddingProvider;

/// Embedding dimension for all-MiniLM-L6-v2.
pub const EMBEDDING_DIM: usize = 384;

const MODEL_SUBDIR: &str = "all-MiniLM-L6-v2";
const MODEL_FILE: &str = "model.onnx";
const TOKENIZER_FILE: &str = "tokenizer.json";

/// Default model location: `<data dir>/driftwatch/models`.
pub fn default_model_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("driftwatch")
        .join("models")
}

/// Directory holding the embedding model inside a model root.
pub fn embedding_model_dir(base: &Path) -> PathBuf {
    base.join(MODEL_SUBDIR)
}

/// Whether both the model and tokenizer are present under `base`.
pub fn embedding_files_present(base: &Path) -> bool {
    let dir = embedding_model_dir(base);
    dir.join(MODEL_FILE).exists() && dir.join(TOKENIZER_FILE).exists()
}

/// Sentence embedder backed by a local ONNX session.
///
/// The session sits behind `Arc<Mutex<_>>` so inference can move into
/// `spawn_blocking` while the embedder stays shareable.
pub struct SentenceEmbedder {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
}

impl SentenceEmbedder {
    /// Load the model and tokenizer from `dir` (the model subdirectory itself).
    pub fn load(dir: &Path) -> Result<Self> {
        let model_path = dir.join(MODEL_FILE);
        let tokenizer_path = dir.join(TOKENIZER_FILE);

        if !model_path.exists() {
            anyhow::bail!("Embedding model not found: {}", model_path.display());
        }
        if !tokenizer_path.exists() {
            anyhow::bail!("Embedding tokenizer not found: {}", tokenizer_path.display());
        }

        let session = Session::builder()
            .context("Failed to create ONNX session builder")?
            .commit_from_file(&model_path)
            .with_context(|| format!("Failed to load embedding model from {}", model_path.display()))?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load embedding tokenizer: {}", e))?;

        debug!(dir = %dir.display(), "Loaded sentence embedding model");

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
        })
    }

    /// Load from a model root if the files are there; `None` otherwise.
    pub fn load_if_present(model_root: &Path) -> Result<Option<Self>> {
        if !embedding_files_present(model_root) {
            return Ok(None);
        }
        Self::load(&embedding_model_dir(model_root)).map(Some)
    }
}

#[async_trait]
impl EmbeddingProvider for SentenceEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f64>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let session = Arc::clone(&self.session);
        let tokenizer = Arc::clone(&self.tokenizer);
        let texts = texts.to_vec();

        tokio::task::spawn_blocking(move || embed_sync(&session, &tokenizer, &texts))
            .await
            .context("spawn_blocking panicked")?
    }
}

/// Padded BERT inputs for a batch, flattened row-major as `[batch, max_len]`.
struct BatchInputs {
    input_ids: Vec<i64>,
    attention_mask: Vec<i64>,
    token_type_ids: Vec<i64>,
    max_len: usize,
}

fn build_inputs(encodings: &[Encoding]) -> BatchInputs {
    let max_len = encodings.iter().map(|e| e.get_ids().len()).max().unwrap_or(0);
    let cap = encodings.len() * max_len;
    let mut inputs = BatchInputs {
        input_ids: Vec::with_capacity(cap),
        attention_mask: Vec::with_capacity(cap),
        token_type_ids: vec![0; cap],
        max_len,
    };

    for enc in encodings {
        let pad = max_len - enc.get_ids().len();
        inputs.input_ids.extend(enc.get_ids().iter().map(|&id| id as i64));
        inputs.input_ids.extend(std::iter::repeat_n(0i64, pad));
        inputs.attention_mask.extend(enc.get_attention_mask().iter().map(|&m| m as i64));
        inputs.attention_mask.extend(std::iter::repeat_n(0i64, pad));
    }

    inputs
}

/// Average token vectors of row `row`, weighted by its attention mask.
fn mean_pool(hidden: &[f32], mask: &[i64], row: usize, max_len: usize) -> Vec<f64> {
    let mut pooled = vec![0.0_f64; EMBEDDING_DIM];
    let mut weight = 0.0_f64;

    for tok in 0..max_len {
        let m = mask[row * max_len + tok] as f64;
        if m <= 0.0 {
            continue;
        }
        weight += m;
        let offset = (row * max_len + tok) * EMBEDDING_DIM;
        for (acc, &h) in pooled.iter_mut().zip(&hidden[offset..offset + EMBEDDING_DIM]) {
            *acc += h as f64 * m;
        }
    }

    if weight > 0.0 {
        pooled.iter_mut().for_each(|v| *v /= weight);
    }
    pooled
}

fn embed_sync(
    session: &Arc<Mutex<Session>>,
    tokenizer: &Arc<Tokenizer>,
    texts: &[String],
) -> Result<Vec<Vec<f64>>> {
    let encodings: Vec<Encoding> = texts
        .iter()
        .map(|t| {
            tokenizer
                .encode(t.as_str(), true)
                .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))
        })
        .collect::<Result<_>>()?;

    let batch = encodings.len();
    let inputs = build_inputs(&encodings);
    if inputs.max_len == 0 {
        return Ok(vec![vec![0.0; EMBEDDING_DIM]; batch]);
    }

    let shape = [batch as i64, inputs.max_len as i64];
    let ids = Tensor::from_array((shape, inputs.input_ids)).context("Failed to create input_ids tensor")?;
    let mask = Tensor::from_array((shape, inputs.attention_mask.clone()))
        .context("Failed to create attention_mask tensor")?;
    let types = Tensor::from_array((shape, inputs.token_type_ids))
        .context("Failed to create token_type_ids tensor")?;

    // last_hidden_state: [batch, seq_len, 384]
    let hidden = {
        let mut session = session
            .lock()
            .map_err(|e| anyhow::anyhow!("Session lock poisoned: {}", e))?;
        let outputs = session
            .run(ort::inputs! {
                "input_ids" => ids,
                "attention_mask" => mask,
                "token_type_ids" => types
            })
            .context("Embedding ONNX inference failed")?;
        let (_shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .context("Failed to extract embedding output tensor")?;
        data.to_vec()
    };

    let vectors = (0..batch)
        .map(|row| mean_pool(&hidden, &inputs.attention_mask, row, inputs.max_len))
        .collect();

    debug!(batch, dim = EMBEDDING_DIM, "Computed sentence embeddings");
    Ok(vectors)
}

//! ONNX Runtime pipeline shared by the text-classification backends.
//!
//! The model directory must contain `model.onnx` and `tokenizer.json`. The
//! graph takes `input_ids` and `attention_mask` (plus `token_type_ids` when the
//! graph declares it) and returns logits `[batch, classes]`.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Tensor;
use tokenizers::{EncodeInput, Tokenizer};
use tracing::info;

use crate::ModelError;

/// Tokenizer plus ONNX session producing class probabilities.
///
/// `Session::run` needs exclusive access, so the session sits behind a mutex
/// and concurrent requests take turns. Tokenization runs outside the lock.
pub(crate) struct TextClassifier {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    uses_type_ids: bool,
    min_classes: usize,
    model_path: PathBuf,
}

impl TextClassifier {
    /// Load a classifier whose graph emits at least `min_classes` logits.
    pub(crate) fn load(
        model_dir: &Path,
        max_length: usize,
        min_classes: usize,
    ) -> Result<Self, ModelError> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");

        if !model_path.exists() {
            return Err(ModelError::ArtifactMissing(model_path));
        }
        if !tokenizer_path.exists() {
            return Err(ModelError::ArtifactMissing(tokenizer_path));
        }

        let session = Session::builder()
            .map_err(|e| ModelError::invalid(&model_path, e))?
            .commit_from_file(&model_path)
            .map_err(|e| ModelError::invalid(&model_path, e))?;

        // Dynamic class dimensions are accepted; the output is checked per batch.
        if let Some(classes) = session.outputs().first().and_then(|o| last_dim(o.dtype()))
            && classes < min_classes
        {
            return Err(ModelError::shape(
                format!("at least {min_classes} output classes"),
                format!("{classes} in {}", model_path.display()),
            ));
        }

        let uses_type_ids = session
            .inputs()
            .iter()
            .any(|input| input.name() == "token_type_ids");

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| ModelError::invalid(&tokenizer_path, e))?;

        tokenizer
            .with_truncation(Some(tokenizers::TruncationParams {
                max_length,
                ..Default::default()
            }))
            .map_err(|e| ModelError::invalid(&tokenizer_path, e))?;

        // Keep the tokenizer's own pad token when it ships one.
        if tokenizer.get_padding().is_none() {
            tokenizer.with_padding(Some(tokenizers::PaddingParams {
                ..Default::default()
            }));
        }

        info!(
            min_classes,
            max_length,
            uses_type_ids,
            model = %model_path.display(),
            "loaded text classifier"
        );
        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            uses_type_ids,
            min_classes,
            model_path,
        })
    }

    /// Softmax class probabilities for a batch of single or paired inputs.
    ///
    /// Rows hold every class the graph emits, which may exceed `min_classes`.
    pub(crate) fn probabilities<'s, E>(&self, inputs: Vec<E>) -> Result<Vec<Vec<f32>>, ModelError>
    where
        E: Into<EncodeInput<'s>> + Send,
    {
        if inputs.is_empty() {
            return Ok(vec![]);
        }

        let batch_size = inputs.len();

        let encodings = self
            .tokenizer
            .encode_batch(inputs, true)
            .map_err(|e| ModelError::Tokenize(e.to_string()))?;

        let seq_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0);
        if seq_len == 0 {
            return Err(ModelError::Tokenize("every input encoded to zero tokens".into()));
        }

        // Flat input tensors: [batch_size, seq_len].
        let mut input_ids = vec![0i64; batch_size * seq_len];
        let mut attention_mask = vec![0i64; batch_size * seq_len];
        let mut token_type_ids = vec![0i64; batch_size * seq_len];

        for (i, encoding) in encodings.iter().enumerate() {
            let offset = i * seq_len;
            for (j, &id) in encoding.get_ids().iter().enumerate() {
                input_ids[offset + j] = id as i64;
            }
            for (j, &mask) in encoding.get_attention_mask().iter().enumerate() {
                attention_mask[offset + j] = mask as i64;
            }
            for (j, &tid) in encoding.get_type_ids().iter().enumerate() {
                token_type_ids[offset + j] = tid as i64;
            }
        }

        let shape = [batch_size as i64, seq_len as i64];

        let ids_tensor = Tensor::from_array((shape, input_ids.into_boxed_slice()))
            .map_err(ModelError::inference)?;
        let mask_tensor = Tensor::from_array((shape, attention_mask.into_boxed_slice()))
            .map_err(ModelError::inference)?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| ModelError::inference(format!("session mutex poisoned: {e}")))?;

        let run = if self.uses_type_ids {
            let type_tensor = Tensor::from_array((shape, token_type_ids.into_boxed_slice()))
                .map_err(ModelError::inference)?;
            session.run(ort::inputs![
                "input_ids" => ids_tensor,
                "attention_mask" => mask_tensor,
                "token_type_ids" => type_tensor,
            ])
        } else {
            session.run(ort::inputs![
                "input_ids" => ids_tensor,
                "attention_mask" => mask_tensor,
            ])
        };
        let outputs = run.map_err(ModelError::inference)?;

        // Logits: [batch_size, num_classes].
        let (output_shape, logits) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(ModelError::inference)?;
        let dims: &[i64] = output_shape;
        if dims.len() != 2 || dims[0] as usize != batch_size || (dims[1] as usize) < self.min_classes
        {
            return Err(ModelError::shape(
                format!("[{batch_size}, >={}]", self.min_classes),
                format!("{dims:?} from {}", self.model_path.display()),
            ));
        }

        Ok(logits.chunks(dims[1] as usize).map(softmax).collect())
    }
}

/// Numerically stable softmax over one row of logits.
pub(crate) fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Last dimension of a tensor type, when static.
pub(crate) fn last_dim(value_type: &ort::value::ValueType) -> Option<usize> {
    match value_type {
        ort::value::ValueType::Tensor { shape, .. } => shape
            .last()
            .and_then(|&d| if d > 0 { Some(d as usize) } else { None }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn softmax_sums_to_one() {
        let probs = softmax(&[2.0, 1.0, 0.1]);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(probs[0] > probs[1] && probs[1] > probs[2]);
    }

    #[test]
    fn softmax_handles_large_logits() {
        let probs = softmax(&[1000.0, 1000.0]);
        assert!((probs[0] - 0.5).abs() < 1e-6);
        assert!(probs.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn load_missing_dir_is_artifact_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = TextClassifier::load(dir.path(), 128, 3).err().unwrap();
        assert!(matches!(err, ModelError::ArtifactMissing(p) if p.ends_with("model.onnx")));
    }
}

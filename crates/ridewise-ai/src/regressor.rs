//! Learned reputation fusion: an ONNX regressor over driver features.
//!
//! The graph takes one float input `[batch, 2]` and returns one prediction per
//! row, shaped `[batch]` or `[batch, 1]`.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Tensor;
use ridewise_core::FEATURE_COUNT;
use tracing::info;

use crate::ModelError;
use crate::predictor::ReputationPredictor;
use crate::session::last_dim;

/// Serialized regressor loaded into ONNX Runtime.
pub struct OnnxRegressor {
    session: Mutex<Session>,
    input_name: String,
    model_path: PathBuf,
}

impl OnnxRegressor {
    /// Load the regressor and check that it accepts two features per row.
    pub fn load(model_path: &Path) -> Result<Self, ModelError> {
        if !model_path.exists() {
            return Err(ModelError::ArtifactMissing(model_path.to_path_buf()));
        }

        let session = Session::builder()
            .map_err(|e| ModelError::invalid(model_path, e))?
            .commit_from_file(model_path)
            .map_err(|e| ModelError::invalid(model_path, e))?;

        let input = session
            .inputs()
            .first()
            .ok_or_else(|| ModelError::invalid(model_path, "graph declares no inputs"))?;
        let input_name = input.name().to_string();

        if let Some(arity) = last_dim(input.dtype())
            && arity != FEATURE_COUNT
        {
            return Err(ModelError::shape(
                format!("{FEATURE_COUNT} input features"),
                format!("{arity} in {}", model_path.display()),
            ));
        }

        info!(model = %model_path.display(), input = %input_name, "loaded reputation regressor");
        Ok(Self {
            session: Mutex::new(session),
            input_name,
            model_path: model_path.to_path_buf(),
        })
    }
}

impl ReputationPredictor for OnnxRegressor {
    fn name(&self) -> &str {
        "learned"
    }

    fn predict_batch(&self, features: &[[f32; FEATURE_COUNT]]) -> Result<Vec<f32>, ModelError> {
        if features.is_empty() {
            return Ok(vec![]);
        }

        let rows = features.len();
        let flat: Vec<f32> = features.iter().flatten().copied().collect();
        let shape = [rows as i64, FEATURE_COUNT as i64];
        let tensor =
            Tensor::from_array((shape, flat.into_boxed_slice())).map_err(ModelError::inference)?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| ModelError::inference(format!("session mutex poisoned: {e}")))?;
        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => tensor])
            .map_err(ModelError::inference)?;

        let (output_shape, values) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(ModelError::inference)?;
        let dims: &[i64] = output_shape;
        let per_row = matches!(dims, [n] if *n as usize == rows)
            || matches!(dims, [n, 1] if *n as usize == rows);
        if !per_row || values.len() != rows {
            return Err(ModelError::shape(
                format!("[{rows}] or [{rows}, 1]"),
                format!("{dims:?} from {}", self.model_path.display()),
            ));
        }

        Ok(values.to_vec())
    }
}

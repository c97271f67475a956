//! Load a model from a JSON layer manifest plus a safetensors weights file.
//!
//! The manifest lists layers in model order. Each entry names the framework
//! class and the tensors (by safetensors key) that make up its weights:
//!
//! ```json
//! {
//!   "name": "lenet",
//!   "layers": [
//!     { "name": "conv1", "class_name": "Conv2D", "weights": ["conv1/kernel", "conv1/bias"] },
//!     { "name": "relu1", "class_name": "Activation" },
//!     { "name": "fc1", "class_name": "Dense", "weights": ["fc1/kernel", "fc1/bias"] }
//!   ]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use smaug_core::{Result, SmaugError, Tensor};

use crate::layer::Layer;
use crate::sequential::Sequential;

/// Layer list of a model, in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelManifest {
    #[serde(default)]
    pub name: Option<String>,
    pub layers: Vec<LayerEntry>,
}

/// One layer of a [`ModelManifest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerEntry {
    pub name: String,
    #[serde(alias = "type", alias = "class")]
    pub class_name: String,
    #[serde(default)]
    pub weights: Vec<String>,
}

impl ModelManifest {
    /// Parse a manifest from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| SmaugError::Manifest(e.to_string()))
    }

    /// Read and parse a manifest file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| SmaugError::file(path, e))?;
        Self::from_json(&text)
    }
}

/// A layer backed by tensors loaded from a safetensors file.
pub struct ManifestLayer {
    name: String,
    class_name: String,
    weights: Vec<Tensor>,
}

impl ManifestLayer {
    pub fn new(name: impl Into<String>, class_name: impl Into<String>, weights: Vec<Tensor>) -> Self {
        Self {
            name: name.into(),
            class_name: class_name.into(),
            weights,
        }
    }
}

impl Layer for ManifestLayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn class_name(&self) -> &str {
        &self.class_name
    }

    fn weights(&self) -> Vec<Tensor> {
        self.weights.clone()
    }
}

/// Build a [`Sequential`] from a manifest and the safetensors file holding
/// its weights.
pub fn load_model(manifest_path: &Path, weights_path: &Path) -> Result<Sequential> {
    let manifest = ModelManifest::from_file(manifest_path)?;
    let bytes = std::fs::read(weights_path).map_err(|e| SmaugError::file(weights_path, e))?;
    let model = model_from_bytes(&manifest, &bytes)?;
    tracing::info!(
        "Loaded {} layers from {} ({} weight bytes)",
        model.len(),
        manifest_path.display(),
        bytes.len()
    );
    Ok(model)
}

/// Build a [`Sequential`] from a parsed manifest and raw safetensors bytes.
pub fn model_from_bytes(manifest: &ModelManifest, safetensors_bytes: &[u8]) -> Result<Sequential> {
    let tensors = safetensors::SafeTensors::deserialize(safetensors_bytes)
        .map_err(|e| SmaugError::Manifest(format!("safetensors parse error: {e}")))?;

    let mut model = Sequential::empty();
    if let Some(name) = &manifest.name {
        model = model.with_name(name.clone());
    }

    for entry in &manifest.layers {
        let weights = entry
            .weights
            .iter()
            .map(|key| {
                let view = tensors
                    .tensor(key)
                    .map_err(|_| SmaugError::MissingTensor(key.clone()))?;
                let tensor = view_to_tensor(&view)?;
                tracing::debug!("{}: loaded '{}' with shape {}", entry.name, key, tensor.shape());
                Ok(tensor)
            })
            .collect::<Result<Vec<_>>>()?;
        model.push(Box::new(ManifestLayer::new(
            entry.name.clone(),
            entry.class_name.clone(),
            weights,
        )));
    }

    Ok(model)
}

/// Load a single named tensor from a safetensors file (e.g. sample inputs).
pub fn load_tensor(path: &Path, name: &str) -> Result<Tensor> {
    let bytes = std::fs::read(path).map_err(|e| SmaugError::file(path, e))?;
    let tensors = safetensors::SafeTensors::deserialize(&bytes)
        .map_err(|e| SmaugError::Manifest(format!("safetensors parse error: {e}")))?;
    let view = tensors
        .tensor(name)
        .map_err(|_| SmaugError::MissingTensor(name.to_string()))?;
    view_to_tensor(&view)
}

/// Convert a safetensors view to an f32 tensor.
fn view_to_tensor(view: &safetensors::tensor::TensorView<'_>) -> Result<Tensor> {
    let shape: Vec<usize> = view.shape().to_vec();
    let data = view.data();

    let values: Vec<f32> = match view.dtype() {
        safetensors::Dtype::F32 => data
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect(),
        safetensors::Dtype::F64 => data
            .chunks_exact(8)
            .map(|b| f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]) as f32)
            .collect(),
        safetensors::Dtype::F16 => data
            .chunks_exact(2)
            .map(|b| half::f16::from_bits(u16::from_le_bytes([b[0], b[1]])).to_f32())
            .collect(),
        safetensors::Dtype::BF16 => data
            .chunks_exact(2)
            .map(|b| half::bf16::from_bits(u16::from_le_bytes([b[0], b[1]])).to_f32())
            .collect(),
        other => return Err(SmaugError::UnsupportedDType(format!("{other:?}"))),
    };

    Tensor::new(values, &shape)
}

//! Model checkpoints as versioned JSON.
//!
//! The file layout is its own set of types rather than a derive on `Mlp`, so
//! the in-memory representation can change without breaking saved models.
//! Loading re-validates every layer through [`Layer::from_parts`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Activation, Error, Layer, Mlp, Result};

pub const MODEL_FORMAT_VERSION: u32 = 1;

/// Top-level checkpoint document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelFile {
    pub format_version: u32,
    pub layers: Vec<LayerRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerRecord {
    pub in_dim: usize,
    pub out_dim: usize,
    pub activation: ActivationKind,
    /// Row-major `(out_dim, in_dim)`.
    pub weights: Vec<f32>,
    pub biases: Vec<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActivationKind {
    Relu,
    Identity,
}

impl From<Activation> for ActivationKind {
    fn from(value: Activation) -> Self {
        match value {
            Activation::ReLU => ActivationKind::Relu,
            Activation::Identity => ActivationKind::Identity,
        }
    }
}

impl From<ActivationKind> for Activation {
    fn from(value: ActivationKind) -> Self {
        match value {
            ActivationKind::Relu => Activation::ReLU,
            ActivationKind::Identity => Activation::Identity,
        }
    }
}

impl ModelFile {
    /// Version and layer-chain checks; per-layer shapes are checked on conversion.
    pub fn validate(&self) -> Result<()> {
        if self.format_version != MODEL_FORMAT_VERSION {
            return Err(Error::InvalidData(format!(
                "model format_version {} is not supported (expected {MODEL_FORMAT_VERSION})",
                self.format_version
            )));
        }
        if self.layers.is_empty() {
            return Err(Error::InvalidData("model file has no layers".to_owned()));
        }
        if let Some(i) = self
            .layers
            .windows(2)
            .position(|pair| pair[1].in_dim != pair[0].out_dim)
        {
            return Err(Error::InvalidData(format!(
                "layer {} expects {} inputs but layer {i} emits {}",
                i + 1,
                self.layers[i + 1].in_dim,
                self.layers[i].out_dim
            )));
        }
        Ok(())
    }
}

impl From<&Mlp> for ModelFile {
    fn from(model: &Mlp) -> Self {
        Self {
            format_version: MODEL_FORMAT_VERSION,
            layers: (0..model.num_layers())
                .filter_map(|i| model.layer(i))
                .map(|layer| LayerRecord {
                    in_dim: layer.in_dim(),
                    out_dim: layer.out_dim(),
                    activation: layer.activation().into(),
                    weights: layer.weights().to_vec(),
                    biases: layer.biases().to_vec(),
                })
                .collect(),
        }
    }
}

impl TryFrom<ModelFile> for Mlp {
    type Error = Error;

    fn try_from(file: ModelFile) -> Result<Self> {
        file.validate()?;
        let layers = file
            .layers
            .into_iter()
            .enumerate()
            .map(|(i, rec)| {
                Layer::from_parts(
                    rec.in_dim,
                    rec.out_dim,
                    rec.activation.into(),
                    rec.weights,
                    rec.biases,
                )
                .map_err(|e| Error::InvalidData(format!("layer {i}: {e}")))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Mlp::from_layers(layers))
    }
}

impl Mlp {
    pub fn to_json_string_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(&ModelFile::from(self))
            .map_err(|e| Error::InvalidData(format!("cannot encode model: {e}")))
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let file: ModelFile = serde_json::from_str(s)
            .map_err(|e| Error::InvalidData(format!("cannot decode model: {e}")))?;
        file.try_into()
    }

    /// Write the model as pretty JSON, creating missing parent directories.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = self.to_json_string_pretty()?;
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
        }
        std::fs::write(path, json).map_err(|e| Error::io(path, e))
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_json_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_layer() -> Mlp {
        let hidden = Layer::from_parts(
            2,
            3,
            Activation::ReLU,
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            vec![0.1, 0.2, 0.3],
        )
        .unwrap();
        let out = Layer::from_parts(3, 1, Activation::ReLU, vec![7.0, 8.0, 9.0], vec![0.4]).unwrap();
        Mlp::from_layers(vec![hidden, out])
    }

    #[test]
    fn json_keeps_parameters_and_activation_tag() {
        let json = two_layer().to_json_string_pretty().unwrap();
        assert!(json.contains("\"kind\": \"relu\""));

        let loaded = Mlp::from_json_str(&json).unwrap();
        assert_eq!(loaded.layer(1).unwrap().weights(), &[7.0, 8.0, 9.0]);
        assert_eq!(loaded.layer(0).unwrap().biases(), &[0.1, 0.2, 0.3]);
    }

    #[test]
    fn rejects_unknown_version() {
        let err = Mlp::from_json_str(r#"{"format_version":999,"layers":[]}"#).unwrap_err();
        assert!(err.to_string().contains("format_version 999"));
    }

    #[test]
    fn rejects_broken_layer_chain() {
        let mut file = ModelFile::from(&two_layer());
        file.layers[1].in_dim = 2;
        file.layers[1].weights = vec![1.0, 1.0];
        let err = Mlp::try_from(file).unwrap_err();
        assert!(err.to_string().contains("layer 1 expects 2 inputs"));
    }

    #[test]
    fn rejects_non_finite_weights() {
        let mut file = ModelFile::from(&two_layer());
        file.layers[0].weights[0] = f32::INFINITY;
        assert!(matches!(Mlp::try_from(file), Err(Error::InvalidData(_))));
    }

    #[test]
    fn save_creates_directories_and_load_reproduces_outputs() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("model.json");
        let mlp = two_layer();
        mlp.save_json(&path).unwrap();

        let loaded = Mlp::load_json(&path).unwrap();
        let x = [0.5_f32, -0.25];
        let a = mlp.forward(&x, &mut mlp.scratch()).to_vec();
        let b = loaded.forward(&x, &mut loaded.scratch()).to_vec();
        assert_eq!(a, b);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Mlp::load_json("no/such/model.json").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}

use std::env;
use std::path::PathBuf;

use anyhow::Result;

/// Which embedding model supplies the number vectors.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelBackend {
    /// Local ONNX sentence transformer (default), fetched with `numsim download-model`
    Onnx,
    /// Pretrained word-vector table read from a GloVe/word2vec text file
    Table,
}

impl ModelBackend {
    fn from_env_value(value: Option<&str>) -> Result<Self> {
        match value {
            None | Some("") | Some("onnx") => Ok(ModelBackend::Onnx),
            Some("table") | Some("glove") => Ok(ModelBackend::Table),
            Some(other) => anyhow::bail!(
                "Unknown NUMSIM_MODEL value {other:?} (expected \"onnx\" or \"table\")"
            ),
        }
    }
}

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded at startup via dotenvy, so any of these can
/// live there instead of in the shell.
#[derive(Debug, Clone)]
pub struct Config {
    /// Which embedding backend to use (default: Onnx)
    pub model_backend: ModelBackend,
    /// Directory containing the ONNX model files
    pub model_dir: PathBuf,
    /// Word-vector text file for the table backend
    pub vectors_path: Option<PathBuf>,
    /// Directory that receives every output file
    pub output_dir: PathBuf,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        let model_backend = ModelBackend::from_env_value(env::var("NUMSIM_MODEL").ok().as_deref())?;

        let model_dir = env::var("NUMSIM_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| crate::embedding::download::default_model_dir());

        Ok(Self {
            model_backend,
            model_dir,
            vectors_path: env::var("NUMSIM_VECTORS").ok().map(PathBuf::from),
            output_dir: env::var("NUMSIM_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".")),
        })
    }

    /// Validate that the chosen backend has what it needs.
    /// For ONNX: model files must exist (or user should run download-model).
    /// For Table: a vectors file must be configured.
    pub fn require_model(&self) -> Result<()> {
        match self.model_backend {
            ModelBackend::Onnx => {
                if !crate::embedding::download::embedding_files_present(&self.model_dir) {
                    anyhow::bail!(
                        "ONNX embedding model not found in {}\n\
                         Run `numsim download-model` to download it.\n\
                         Or set NUMSIM_MODEL=table and NUMSIM_VECTORS=<file> to use word vectors.",
                        self.model_dir.display()
                    );
                }
                Ok(())
            }
            ModelBackend::Table => {
                if self.vectors_path.is_none() {
                    anyhow::bail!(
                        "NUMSIM_VECTORS not set. The table backend needs a GloVe/word2vec text file.\n\
                         Add it to your .env file."
                    );
                }
                Ok(())
            }
        }
    }
}

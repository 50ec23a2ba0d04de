use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use super::{builtin, Signature, SignatureSet};

#[derive(Error, Debug)]
pub enum SignatureLoaderError {
    #[error("Failed to load builtin signatures")]
    BuiltinLoadError,

    #[error("Failed to read signature file {0}")]
    ReadError(PathBuf),

    #[error("Failed to parse signature file {0}")]
    ParseError(PathBuf),
}

/// On-disk layout of a signature file.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SignatureFile {
    #[serde(default)]
    pub path_signatures: Vec<Signature>,
    #[serde(default)]
    pub content_signatures: Vec<Signature>,
}

impl From<&SignatureSet> for SignatureFile {
    fn from(set: &SignatureSet) -> Self {
        Self {
            path_signatures: set.path_signatures().to_vec(),
            content_signatures: set.content_signatures().to_vec(),
        }
    }
}

/// Builds the [`SignatureSet`] for a run: either the built-in table or the contents of a
/// user-supplied signature file, which replaces it entirely.
#[derive(Debug, Default)]
pub struct SignatureLoader {
    signature_file: Option<PathBuf>,
}

impl SignatureLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signature_file<P: AsRef<Path>>(mut self, path: Option<P>) -> Self {
        self.signature_file = path.map(|p| p.as_ref().to_owned());
        self
    }

    pub fn load(&self) -> Result<SignatureSet> {
        let set = match &self.signature_file {
            None => builtin::signature_set().context(SignatureLoaderError::BuiltinLoadError)?,
            Some(path) => load_file(path)?,
        };
        info!(
            "Loaded {} path signatures and {} content signatures",
            set.path_signatures().len(),
            set.content_signatures().len()
        );
        Ok(set)
    }
}

fn load_file(path: &Path) -> Result<SignatureSet> {
    debug!("Loading signatures from {}", path.display());
    let data =
        fs::read_to_string(path).context(SignatureLoaderError::ReadError(path.to_owned()))?;
    let file: SignatureFile =
        serde_json::from_str(&data).context(SignatureLoaderError::ParseError(path.to_owned()))?;
    let set = SignatureSet::new(file.path_signatures, file.content_signatures)
        .context(SignatureLoaderError::ParseError(path.to_owned()))?;
    Ok(set)
}

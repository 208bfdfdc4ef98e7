//! Package format (stable v1)
//!
//! A package is a JSON document holding a header and a body. The body
//! carries the object metadata and the scripts the model was built from,
//! so a package can be reloaded either metadata-only or script-backed.
//! The header records a SHA-256 checksum of the serialized body.

use rulecheck_core::{ModelObject, ModelOptions, SchemaModel, ScriptUnit, TargetVersion};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Format marker written into every package header
pub const PACKAGE_FORMAT: &str = "rulecheck-package";

/// Current package format version
pub const PACKAGE_FORMAT_VERSION: u32 = 1;

/// Package header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageHeader {
    pub format: String,
    pub format_version: u32,
    pub target_version: TargetVersion,
    pub options: ModelOptions,

    /// Creation timestamp (RFC 3339); not covered by the checksum
    pub created_at: String,

    /// Hex-encoded SHA-256 of the serialized body
    pub checksum: String,
}

/// Package body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageBody {
    /// Scripts in application order
    pub scripts: Vec<ScriptUnit>,

    /// Object metadata, without fragments
    pub objects: Vec<ModelObject>,
}

/// A complete package
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub header: PackageHeader,
    pub body: PackageBody,
}

/// Package error types
#[derive(Debug, thiserror::Error)]
pub enum PackageError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed package: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not a rulecheck package (format '{0}')")]
    FormatMismatch(String),

    #[error("Unsupported package format version {0}")]
    UnsupportedVersion(u32),

    #[error("Package checksum mismatch: expected {expected}, found {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("Cannot package a model with errors: {0}")]
    InvalidModel(String),
}

impl From<PackageError> for rulecheck_core::EngineError {
    fn from(err: PackageError) -> Self {
        rulecheck_core::EngineError::Package(err.to_string())
    }
}

fn body_checksum(body: &PackageBody) -> Result<String, PackageError> {
    let bytes = serde_json::to_vec(body)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

impl Package {
    /// Snapshot a model into a package
    ///
    /// Models with Error-severity validation messages are refused.
    pub fn from_model(model: &dyn SchemaModel) -> Result<Self, PackageError> {
        let errors: Vec<String> = model
            .validate()
            .into_iter()
            .filter(|m| m.is_error())
            .map(|m| m.to_string())
            .collect();
        if !errors.is_empty() {
            return Err(PackageError::InvalidModel(errors.join("; ")));
        }

        let body = PackageBody {
            scripts: model.scripts(),
            objects: model
                .objects()
                .into_iter()
                .map(|object| ModelObject { fragment: None, ..object })
                .collect(),
        };

        Ok(Self {
            header: PackageHeader {
                format: PACKAGE_FORMAT.to_string(),
                format_version: PACKAGE_FORMAT_VERSION,
                target_version: model.target_version(),
                options: model.options().clone(),
                created_at: chrono::Utc::now().to_rfc3339(),
                checksum: body_checksum(&body)?,
            },
            body,
        })
    }

    /// Write to a file
    pub fn save_to_file(&self, path: &Path) -> Result<(), PackageError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| PackageError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    /// Read and verify a package file
    pub fn from_file(path: &Path) -> Result<Self, PackageError> {
        let json = std::fs::read_to_string(path).map_err(|source| PackageError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Parse and verify a package document
    pub fn from_json(json: &str) -> Result<Self, PackageError> {
        let package: Package = serde_json::from_str(json)?;

        if package.header.format != PACKAGE_FORMAT {
            return Err(PackageError::FormatMismatch(package.header.format));
        }
        if package.header.format_version != PACKAGE_FORMAT_VERSION {
            return Err(PackageError::UnsupportedVersion(package.header.format_version));
        }

        let actual = body_checksum(&package.body)?;
        if actual != package.header.checksum {
            return Err(PackageError::ChecksumMismatch {
                expected: package.header.checksum,
                actual,
            });
        }

        Ok(package)
    }
}

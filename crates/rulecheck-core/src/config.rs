//! Configuration schema (rulecheck.toml)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::problem::AnalysisPhase;
use crate::script::{AnalysisTarget, ModelOptions, TargetVersion};

/// Which analysis phases produce fatal error records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorSurfacing {
    /// Phases whose error records fail the run
    #[serde(default = "default_phases")]
    pub phases: Vec<AnalysisPhase>,
}

fn default_phases() -> Vec<AnalysisPhase> {
    AnalysisPhase::ALL.to_vec()
}

impl Default for ErrorSurfacing {
    fn default() -> Self {
        Self {
            phases: default_phases(),
        }
    }
}

impl ErrorSurfacing {
    /// Only analysis-phase errors are fatal
    pub fn analysis_only() -> Self {
        Self {
            phases: vec![AnalysisPhase::Analysis],
        }
    }

    pub fn surfaces(&self, phase: AnalysisPhase) -> bool {
        self.phases.contains(&phase)
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Platform version of built models
    #[serde(default)]
    pub target_version: TargetVersion,

    /// Model the analysis runs against
    #[serde(default)]
    pub analysis_target: AnalysisTarget,

    /// Package destination (required for the package target)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_path: Option<PathBuf>,

    /// Directory of custom rule definitions (*.toml)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules_dir: Option<PathBuf>,

    /// Model construction options
    #[serde(default)]
    pub model: ModelOptions,

    /// Error surfacing policy
    #[serde(default)]
    pub errors: ErrorSurfacing,

    /// Directory containing the config file (for resolving relative paths)
    #[serde(skip)]
    pub project_root: PathBuf,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            target_version: TargetVersion::default(),
            analysis_target: AnalysisTarget::default(),
            package_path: None,
            rules_dir: None,
            model: ModelOptions::default(),
            errors: ErrorSurfacing::default(),
            project_root: std::env::current_dir().unwrap_or_default(),
        }
    }
}

impl HarnessConfig {
    /// Load config from TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        let mut config = Self::from_toml(&contents)?;

        if let Some(parent) = path.parent() {
            config.project_root = parent.to_path_buf();
        }

        Ok(config)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let config: HarnessConfig = toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        Ok(HarnessConfig {
            project_root: std::env::current_dir().unwrap_or_default(),
            ..config
        })
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Resolve a possibly relative path against the project root
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_config() {
        let config = HarnessConfig::default();
        assert_eq!(config.target_version, TargetVersion::Sql2022);
        assert_eq!(config.analysis_target, AnalysisTarget::Public);
        assert!(config.package_path.is_none());
        assert_eq!(config.errors.phases.len(), 3);
    }

    #[test]
    fn parse_full_config() {
        let config = HarnessConfig::from_toml(
            r#"
            target_version = "sql2019"
            analysis_target = "package"
            package_path = "target/model.rcpkg"

            [model]
            default_schema = "sales"
            dialect = "generic"

            [errors]
            phases = ["analysis"]
            "#,
        )
        .unwrap();

        assert_eq!(config.target_version, TargetVersion::Sql2019);
        assert_eq!(config.analysis_target, AnalysisTarget::Package);
        assert_eq!(config.package_path, Some(PathBuf::from("target/model.rcpkg")));
        assert_eq!(config.model.default_schema, "sales");
        // Unset model fields keep their defaults
        assert_eq!(config.model.collation, "SQL_Latin1_General_CP1_CI_AS");
        assert!(config.errors.surfaces(AnalysisPhase::Analysis));
        assert!(!config.errors.surfaces(AnalysisPhase::Suppression));
    }

    #[test]
    fn empty_errors_table_surfaces_all_phases() {
        let config = HarnessConfig::from_toml("[errors]\n").unwrap();
        assert_eq!(config.errors, ErrorSurfacing::default());
    }

    #[test]
    fn invalid_config_is_parse_error() {
        let err = HarnessConfig::from_toml("target_version = \"sql1999\"").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn config_file_roundtrip() {
        let dir = std::env::temp_dir().join(format!("rulecheck-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("rulecheck.toml");

        let mut config = HarnessConfig::default();
        config.package_path = Some(PathBuf::from("out/model.rcpkg"));
        config.errors = ErrorSurfacing::analysis_only();
        config.save_to_file(&path).unwrap();

        let loaded = HarnessConfig::from_file(&path).unwrap();
        assert_eq!(loaded.package_path, config.package_path);
        assert_eq!(loaded.errors, config.errors);
        assert_eq!(loaded.project_root, dir);
        assert_eq!(loaded.resolve_path(Path::new("a.sql")), dir.join("a.sql"));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}

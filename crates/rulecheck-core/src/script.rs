//! Model construction inputs: scripts, options, platform version

use serde::{Deserialize, Serialize};

/// One source script applied to a model
///
/// Ordering within a script list is significant: later scripts
/// add-or-update objects defined by earlier ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScriptUnit {
    /// Script text
    pub content: String,

    /// Logical source name (usually a relative file path)
    pub source_name: String,
}

impl ScriptUnit {
    pub fn new(content: impl Into<String>, source_name: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source_name: source_name.into(),
        }
    }
}

/// SQL dialect used by the model engine to read scripts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptDialect {
    /// T-SQL (default)
    MsSql,

    /// PostgreSQL
    Postgres,

    /// Generic ANSI SQL
    Generic,
}

impl Default for ScriptDialect {
    fn default() -> Self {
        Self::MsSql
    }
}

/// Model construction options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelOptions {
    /// Database collation
    pub collation: String,

    /// Schema assigned to unqualified object names
    pub default_schema: String,

    /// ANSI_NULLS setting
    pub ansi_nulls: bool,

    /// QUOTED_IDENTIFIER setting
    pub quoted_identifier: bool,

    /// Dialect used to read scripts
    pub dialect: ScriptDialect,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            collation: "SQL_Latin1_General_CP1_CI_AS".to_string(),
            default_schema: "dbo".to_string(),
            ansi_nulls: true,
            quoted_identifier: true,
            dialect: ScriptDialect::default(),
        }
    }
}

/// Target platform version
///
/// Gates which rules are eligible to run against a model. Variants are
/// ordered oldest first; `AzureSql` tracks the newest on-premises release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetVersion {
    Sql2014,
    Sql2016,
    Sql2017,
    Sql2019,
    Sql2022,
    AzureSql,
}

impl TargetVersion {
    pub const ALL: [TargetVersion; 6] = [
        Self::Sql2014,
        Self::Sql2016,
        Self::Sql2017,
        Self::Sql2019,
        Self::Sql2022,
        Self::AzureSql,
    ];

    /// Stable identifier (matches the config file spelling)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sql2014 => "sql2014",
            Self::Sql2016 => "sql2016",
            Self::Sql2017 => "sql2017",
            Self::Sql2019 => "sql2019",
            Self::Sql2022 => "sql2022",
            Self::AzureSql => "azuresql",
        }
    }
}

impl Default for TargetVersion {
    fn default() -> Self {
        Self::Sql2022
    }
}

impl std::fmt::Display for TargetVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TargetVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.as_str() == lowered)
            .ok_or_else(|| format!("Unknown target version '{}'", s))
    }
}

/// Which model the analysis runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisTarget {
    /// The in-memory scripted model
    Public,

    /// A model reloaded from a package artifact
    Package,
}

impl Default for AnalysisTarget {
    fn default() -> Self {
        Self::Public
    }
}

impl std::fmt::Display for AnalysisTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Public => write!(f, "public"),
            Self::Package => write!(f, "package"),
        }
    }
}

impl std::str::FromStr for AnalysisTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(Self::Public),
            "package" => Ok(Self::Package),
            other => Err(format!("Unknown analysis target '{}'", other)),
        }
    }
}

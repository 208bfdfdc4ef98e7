//! Pattern rules defined in TOML files
//!
//! ```toml
//! [[rule]]
//! id = "Custom.Naming.ViewPrefix"
//! description = "Views start with vw_"
//! kind = "view"
//! pattern = "^vw_"
//! mode = "require"
//! message = "View {name} does not start with vw_"
//! ```
//!
//! With `mode = "forbid"` (the default) a name matching `pattern` is a
//! violation; with `mode = "require"` a name that does not match is.
//! Definitions that fail to load are reported as error records rather than
//! aborting the whole catalog.

use regex::Regex;
use rulecheck_core::{
    AnalysisErrorRecord, AnalysisPhase, ModelObject, ObjectKind, RuleDescriptor, Severity,
    TargetVersion,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use walkdir::WalkDir;

use crate::rule::{Rule, RuleContext, RuleError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternMode {
    #[default]
    Forbid,
    Require,
}

fn default_severity() -> Severity {
    Severity::Warning
}

/// One `[[rule]]` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub id: String,

    #[serde(default)]
    pub description: String,

    #[serde(default = "default_severity")]
    pub severity: Severity,

    /// Object kind the pattern is applied to
    pub kind: ObjectKind,

    /// Regular expression matched against the object name
    pub pattern: String,

    #[serde(default)]
    pub mode: PatternMode,

    /// Problem text; `{name}` expands to the object's display name
    #[serde(default)]
    pub message: Option<String>,

    /// Oldest platform version the rule is loaded for
    #[serde(default)]
    pub min_version: Option<TargetVersion>,
}

/// A rule definition file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDefinitionFile {
    #[serde(default, rename = "rule")]
    pub rules: Vec<RuleDefinition>,
}

/// Rule compiled from a [`RuleDefinition`]
pub struct PatternRule {
    descriptor: RuleDescriptor,
    kind: ObjectKind,
    regex: Regex,
    mode: PatternMode,
    message: Option<String>,
    min_version: Option<TargetVersion>,
}

impl PatternRule {
    /// Compile a definition
    pub fn from_definition(definition: RuleDefinition) -> Result<Self, String> {
        let id = definition.id.trim();
        if id.is_empty() {
            return Err("Rule definition has an empty id".to_string());
        }

        let regex = Regex::new(&definition.pattern)
            .map_err(|e| format!("Rule {} has an invalid pattern: {}", id, e))?;

        let short_description = if definition.description.is_empty() {
            format!("{} names matching '{}'", definition.kind, definition.pattern)
        } else {
            definition.description.clone()
        };

        Ok(Self {
            descriptor: RuleDescriptor {
                id: id.to_string(),
                short_description,
                severity: definition.severity,
                requires_script: false,
            },
            kind: definition.kind,
            regex,
            mode: definition.mode,
            message: definition.message,
            min_version: definition.min_version,
        })
    }
}

impl Rule for PatternRule {
    fn descriptor(&self) -> &RuleDescriptor {
        &self.descriptor
    }

    fn supports(&self, version: TargetVersion) -> bool {
        self.min_version.map_or(true, |min| version >= min)
    }

    fn applies_to(&self, object: &ModelObject) -> bool {
        object.element.kind == self.kind
    }

    fn check(&self, ctx: &RuleContext<'_>, object: &ModelObject) -> Result<Option<String>, RuleError> {
        let matched = self.regex.is_match(object.element.name());
        let violated = match self.mode {
            PatternMode::Forbid => matched,
            PatternMode::Require => !matched,
        };
        if !violated {
            return Ok(None);
        }

        let name = ctx.display_name(object);
        let text = match &self.message {
            Some(template) => template.replace("{name}", &name),
            None => format!("{} {}: {}.", self.kind, name, self.descriptor.short_description),
        };
        Ok(Some(text))
    }
}

fn load_error(document: &str, message: impl Into<String>) -> AnalysisErrorRecord {
    AnalysisErrorRecord {
        document: Some(document.to_string()),
        ..AnalysisErrorRecord::new(AnalysisPhase::Initialization, message)
    }
}

/// Parse one definition file's text
///
/// Returns the rules that compiled and an error record for everything that
/// did not.
pub fn parse_definitions(text: &str, document: &str) -> (Vec<PatternRule>, Vec<AnalysisErrorRecord>) {
    let file: RuleDefinitionFile = match toml::from_str(text) {
        Ok(file) => file,
        Err(err) => {
            let mut record = load_error(document, format!("Invalid rule definition file: {}", err.message()));
            if let Some(span) = err.span() {
                let before = &text[..span.start.min(text.len())];
                record.line = Some(before.matches('\n').count() as u32 + 1);
                record.column = Some(before.rsplit('\n').next().unwrap_or("").chars().count() as u32 + 1);
            }
            return (Vec::new(), vec![record]);
        }
    };

    let mut rules = Vec::new();
    let mut errors = Vec::new();
    for definition in file.rules {
        match PatternRule::from_definition(definition) {
            Ok(rule) => rules.push(rule),
            Err(message) => errors.push(load_error(document, message)),
        }
    }
    (rules, errors)
}

/// Load every `*.toml` file under `dir`, in path order
pub fn load_definitions_dir(dir: &Path) -> (Vec<PatternRule>, Vec<AnalysisErrorRecord>) {
    let document = dir.display().to_string();
    if !dir.is_dir() {
        return (
            Vec::new(),
            vec![load_error(&document, "Rule definition directory not found")],
        );
    }

    let mut rules = Vec::new();
    let mut errors = Vec::new();

    let entries = WalkDir::new(dir).sort_by_file_name().into_iter();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                errors.push(load_error(&document, err.to_string()));
                continue;
            }
        };

        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().map_or(true, |ext| ext != "toml") {
            continue;
        }

        let path_name = path.display().to_string();
        match std::fs::read_to_string(path) {
            Ok(text) => {
                let (loaded, failed) = parse_definitions(&text, &path_name);
                tracing::debug!(file = %path_name, rules = loaded.len(), errors = failed.len(), "Loaded rule definitions");
                rules.extend(loaded);
                errors.extend(failed);
            }
            Err(err) => errors.push(load_error(&path_name, format!("Failed to read: {}", err))),
        }
    }

    (rules, errors)
}

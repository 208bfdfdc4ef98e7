//! Built-in rules
//!
//! Rule ids are STABLE - they appear in baselines and suppression
//! directives. Never rename them.

use rulecheck_core::{ModelObject, ObjectKind, RuleDescriptor, Severity, TargetVersion};
use rulecheck_model::ScriptParser;
use sqlparser::ast::{SelectItem, SetExpr, Statement};
use std::sync::Arc;

use crate::rule::{Rule, RuleContext, RuleError};

/// Every built-in rule, in catalog order
pub fn builtin_rules() -> Vec<Arc<dyn Rule>> {
    vec![
        Arc::new(TablePrefixRule::new()),
        Arc::new(MissingPrimaryKeyRule::new()),
        Arc::new(SelectStarRule::new()),
        Arc::new(DeprecatedTypeRule::new()),
    ]
}

fn descriptor(id: &str, short_description: &str, severity: Severity, requires_script: bool) -> RuleDescriptor {
    RuleDescriptor {
        id: id.to_string(),
        short_description: short_description.to_string(),
        severity,
        requires_script,
    }
}

/// Tables named with a `tbl` prefix
pub struct TablePrefixRule {
    descriptor: RuleDescriptor,
}

impl TablePrefixRule {
    pub const ID: &'static str = "RC.Naming.TablePrefix";

    pub fn new() -> Self {
        Self {
            descriptor: descriptor(
                Self::ID,
                "Avoid the 'tbl' prefix in table names",
                Severity::Warning,
                false,
            ),
        }
    }
}

impl Default for TablePrefixRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for TablePrefixRule {
    fn descriptor(&self) -> &RuleDescriptor {
        &self.descriptor
    }

    fn applies_to(&self, object: &ModelObject) -> bool {
        object.element.kind == ObjectKind::Table
    }

    fn check(&self, ctx: &RuleContext<'_>, object: &ModelObject) -> Result<Option<String>, RuleError> {
        let name = object.element.name();
        if name.len() > 3 && name.to_ascii_lowercase().starts_with("tbl") {
            return Ok(Some(format!(
                "Table {} uses the 'tbl' prefix.",
                ctx.display_name(object)
            )));
        }
        Ok(None)
    }
}

/// Tables without a primary key
pub struct MissingPrimaryKeyRule {
    descriptor: RuleDescriptor,
}

impl MissingPrimaryKeyRule {
    pub const ID: &'static str = "RC.Design.MissingPrimaryKey";

    pub fn new() -> Self {
        Self {
            descriptor: descriptor(
                Self::ID,
                "Tables should declare a primary key",
                Severity::Warning,
                false,
            ),
        }
    }
}

impl Default for MissingPrimaryKeyRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for MissingPrimaryKeyRule {
    fn descriptor(&self) -> &RuleDescriptor {
        &self.descriptor
    }

    fn applies_to(&self, object: &ModelObject) -> bool {
        object.element.kind == ObjectKind::Table
    }

    fn check(&self, ctx: &RuleContext<'_>, object: &ModelObject) -> Result<Option<String>, RuleError> {
        if object.has_primary_key {
            return Ok(None);
        }
        Ok(Some(format!(
            "Table {} does not have a primary key.",
            ctx.display_name(object)
        )))
    }
}

/// Views projecting `*`
///
/// Reads the view's source fragment, so it needs a script-backed model.
pub struct SelectStarRule {
    descriptor: RuleDescriptor,
}

impl SelectStarRule {
    pub const ID: &'static str = "RC.Design.SelectStar";

    pub fn new() -> Self {
        Self {
            descriptor: descriptor(
                Self::ID,
                "Views should list their columns instead of using SELECT *",
                Severity::Warning,
                true,
            ),
        }
    }
}

impl Default for SelectStarRule {
    fn default() -> Self {
        Self::new()
    }
}

fn projects_wildcard(expr: &SetExpr) -> bool {
    match expr {
        SetExpr::Select(select) => select
            .projection
            .iter()
            .any(|item| matches!(item, SelectItem::Wildcard(_) | SelectItem::QualifiedWildcard(..))),
        SetExpr::Query(query) => projects_wildcard(&query.body),
        SetExpr::SetOperation { left, right, .. } => projects_wildcard(left) || projects_wildcard(right),
        _ => false,
    }
}

impl Rule for SelectStarRule {
    fn descriptor(&self) -> &RuleDescriptor {
        &self.descriptor
    }

    fn applies_to(&self, object: &ModelObject) -> bool {
        object.element.kind == ObjectKind::View
    }

    fn check(&self, ctx: &RuleContext<'_>, object: &ModelObject) -> Result<Option<String>, RuleError> {
        let Some(fragment) = object.fragment.as_deref() else {
            return Ok(None);
        };

        let options = ctx.model.options();
        let parser = ScriptParser::new(options.dialect, options.default_schema.clone());
        let statements = parser
            .parse_statements(fragment)
            .map_err(|e| RuleError(format!("Unable to parse view definition: {}", e)))?;

        let wildcard = statements.iter().any(|statement| match statement {
            Statement::CreateView { query, .. } => projects_wildcard(&query.body),
            _ => false,
        });

        if wildcard {
            return Ok(Some(format!(
                "View {} uses SELECT *; list the columns explicitly.",
                ctx.display_name(object)
            )));
        }
        Ok(None)
    }
}

/// Columns using TEXT, NTEXT or IMAGE
pub struct DeprecatedTypeRule {
    descriptor: RuleDescriptor,
}

impl DeprecatedTypeRule {
    pub const ID: &'static str = "RC.Compat.DeprecatedType";

    const DEPRECATED: [&'static str; 3] = ["TEXT", "NTEXT", "IMAGE"];

    pub fn new() -> Self {
        Self {
            descriptor: descriptor(
                Self::ID,
                "Avoid deprecated large-object data types",
                Severity::Warning,
                false,
            ),
        }
    }
}

impl Default for DeprecatedTypeRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for DeprecatedTypeRule {
    fn descriptor(&self) -> &RuleDescriptor {
        &self.descriptor
    }

    fn supports(&self, version: TargetVersion) -> bool {
        version >= TargetVersion::Sql2016
    }

    fn applies_to(&self, object: &ModelObject) -> bool {
        object.element.kind == ObjectKind::Column && object.data_type.is_some()
    }

    fn check(&self, ctx: &RuleContext<'_>, object: &ModelObject) -> Result<Option<String>, RuleError> {
        let data_type = object.data_type.as_deref().unwrap_or("");
        let base = data_type
            .split(|c: char| c == '(' || c.is_whitespace())
            .next()
            .unwrap_or("")
            .to_ascii_uppercase();

        if Self::DEPRECATED.contains(&base.as_str()) {
            return Ok(Some(format!(
                "Column {} uses the deprecated data type {}.",
                ctx.display_name(object),
                base
            )));
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rulecheck_core::{ModelOptions, SchemaModel};
    use rulecheck_model::ScriptModel;

    fn objects_of(sql: &str) -> (ScriptModel, Vec<ModelObject>) {
        let model = ScriptModel::new(TargetVersion::Sql2022, ModelOptions::default());
        model.add_or_update_objects(sql, "test.sql").unwrap();
        let objects = model.objects();
        (model, objects)
    }

    fn run(rule: &dyn Rule, sql: &str) -> Vec<String> {
        let (model, objects) = objects_of(sql);
        let ctx = RuleContext::new(&model, &objects);
        objects
            .iter()
            .filter(|o| rule.applies_to(o))
            .filter_map(|o| rule.check(&ctx, o).unwrap())
            .collect()
    }

    #[test]
    fn table_prefix() {
        let found = run(&TablePrefixRule::new(), "CREATE TABLE tblUsers (Id INT); CREATE TABLE Orders (Id INT);");
        assert_eq!(found, vec!["Table [dbo].[tblUsers] uses the 'tbl' prefix."]);
        assert!(run(&TablePrefixRule::new(), "CREATE TABLE tbl (Id INT);").is_empty());
    }

    #[test]
    fn missing_primary_key() {
        let found = run(
            &MissingPrimaryKeyRule::new(),
            "CREATE TABLE a (Id INT PRIMARY KEY); CREATE TABLE b (Id INT);",
        );
        assert_eq!(found, vec!["Table [dbo].[b] does not have a primary key."]);
    }

    #[test]
    fn select_star() {
        let found = run(
            &SelectStarRule::new(),
            "CREATE VIEW v1 AS SELECT * FROM t; CREATE VIEW v2 AS SELECT a FROM t;",
        );
        assert_eq!(found, vec!["View [dbo].[v1] uses SELECT *; list the columns explicitly."]);
    }

    #[test]
    fn select_star_without_fragment_finds_nothing() {
        let (model, objects) = objects_of("CREATE VIEW v1 AS SELECT * FROM t;");
        let stripped: Vec<ModelObject> = objects
            .into_iter()
            .map(|o| ModelObject { fragment: None, ..o })
            .collect();
        let ctx = RuleContext::new(&model, &stripped);
        let rule = SelectStarRule::new();
        assert_eq!(rule.check(&ctx, &stripped[0]).unwrap(), None);
        assert!(rule.descriptor().requires_script);
    }

    #[test]
    fn select_star_reports_unparsable_fragment() {
        let (model, objects) = objects_of("CREATE VIEW v1 AS SELECT * FROM t;");
        let broken = ModelObject {
            fragment: Some("CREATE VIEW v1 AS SELECT FROM (".to_string()),
            ..objects[0].clone()
        };
        let ctx = RuleContext::new(&model, &objects);
        let err = SelectStarRule::new().check(&ctx, &broken).unwrap_err();
        assert!(err.0.starts_with("Unable to parse view definition"));
    }

    #[test]
    fn deprecated_types() {
        let found = run(
            &DeprecatedTypeRule::new(),
            "CREATE TABLE docs (Id INT, Body NTEXT, Raw IMAGE, Title NVARCHAR(100));",
        );
        assert_eq!(found.len(), 2);
        assert!(found[0].contains("[dbo].[docs].[Body]") || found[1].contains("[dbo].[docs].[Body]"));

        let rule = DeprecatedTypeRule::new();
        assert!(!rule.supports(TargetVersion::Sql2014));
        assert!(rule.supports(TargetVersion::AzureSql));
    }

    #[test]
    fn builtin_ids_are_unique() {
        let rules = builtin_rules();
        let mut ids: Vec<&str> = rules.iter().map(|r| r.descriptor().id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), rules.len());
    }
}

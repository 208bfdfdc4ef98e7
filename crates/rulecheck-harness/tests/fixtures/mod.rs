//! Shared fixtures: script sets and mock engines with failure injection

#![allow(dead_code)]

use rulecheck_core::{
    AnalysisErrorRecord, AnalysisResult, AnalysisService, DisplayNameResolver, ElementRef,
    EngineError, LoadMode, ModelEngine, ModelId, ModelObject, ModelOptions, ObjectKind,
    RuleDescriptor, RuleEngine, RuleExecutionConfig, SchemaModel, ScriptUnit, Severity,
    TargetVersion, ValidationMessage,
};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Three scripts; the table in the second one violates the `tbl` prefix rule
pub fn sales_scripts() -> Vec<ScriptUnit> {
    vec![
        ScriptUnit::new("CREATE SCHEMA sales;\n", "schemas/sales.sql"),
        ScriptUnit::new(
            "CREATE TABLE sales.tblCustomers (\n    CustomerId INT PRIMARY KEY,\n    Name NVARCHAR(100)\n);\n",
            "tables/customers.sql",
        ),
        ScriptUnit::new(
            "CREATE VIEW sales.CustomerNames AS\nSELECT CustomerId, Name FROM sales.tblCustomers;\n",
            "views/customer_names.sql",
        ),
    ]
}

/// Violations for both the prefix and the primary-key rule, across files
pub fn mixed_scripts() -> Vec<ScriptUnit> {
    vec![
        ScriptUnit::new(
            "CREATE TABLE tblOrders (OrderId INT);\n\nCREATE TABLE Shipments (ShipmentId INT);\n",
            "b/orders.sql",
        ),
        ScriptUnit::new(
            "CREATE TABLE tblAudit (\n    Id INT PRIMARY KEY\n);\n",
            "a/audit.sql",
        ),
        ScriptUnit::new("CREATE TABLE tblNotes (Id INT);\n", "c/notes.sql"),
    ]
}

pub fn descriptor(id: &str) -> RuleDescriptor {
    RuleDescriptor {
        id: id.to_string(),
        short_description: format!("{} description", id),
        severity: Severity::Warning,
        requires_script: false,
    }
}

/// Model that records objects verbatim and counts releases
pub struct MockModel {
    id: ModelId,
    version: TargetVersion,
    options: ModelOptions,
    script_backed: bool,
    validation: Vec<ValidationMessage>,
    fail_on_source: Option<String>,
    objects: Mutex<Vec<ModelObject>>,
    released: AtomicBool,
    release_calls: AtomicUsize,
}

impl MockModel {
    pub fn release_calls(&self) -> usize {
        self.release_calls.load(Ordering::SeqCst)
    }
}

impl DisplayNameResolver for MockModel {
    fn display_name(&self, element: &ElementRef) -> String {
        element.parts.join(".")
    }
}

impl SchemaModel for MockModel {
    fn id(&self) -> ModelId {
        self.id
    }

    fn target_version(&self) -> TargetVersion {
        self.version
    }

    fn options(&self) -> &ModelOptions {
        &self.options
    }

    fn add_or_update_objects(&self, script: &str, source_name: &str) -> Result<(), EngineError> {
        if self.fail_on_source.as_deref() == Some(source_name) {
            return Err(EngineError::Build(format!("cannot compile {}", source_name)));
        }
        let mut objects = self.objects.lock().unwrap();
        objects.push(ModelObject {
            element: ElementRef::new(ObjectKind::Table, vec!["dbo".into(), script.trim().into()]),
            source_name: Some(source_name.to_string()),
            start_line: 1,
            start_column: 1,
            fragment: self.script_backed.then(|| script.to_string()),
            data_type: None,
            has_primary_key: false,
        });
        Ok(())
    }

    fn validate(&self) -> Vec<ValidationMessage> {
        self.validation.clone()
    }

    fn objects(&self) -> Vec<ModelObject> {
        self.objects.lock().unwrap().clone()
    }

    fn scripts(&self) -> Vec<ScriptUnit> {
        Vec::new()
    }

    fn is_script_backed(&self) -> bool {
        self.script_backed
    }

    fn release(&self) {
        self.release_calls.fetch_add(1, Ordering::SeqCst);
        self.released.store(true, Ordering::SeqCst);
    }

    fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

/// Model engine handing out [`MockModel`]s and remembering every one
#[derive(Default)]
pub struct MockModelEngine {
    pub validation: Vec<ValidationMessage>,
    pub fail_on_source: Option<String>,
    pub fail_load: bool,
    pub created: Mutex<Vec<Arc<MockModel>>>,
    pub load_modes: Mutex<Vec<LoadMode>>,
}

impl MockModelEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_validation(mut self, messages: Vec<ValidationMessage>) -> Self {
        self.validation = messages;
        self
    }

    pub fn failing_on(mut self, source_name: &str) -> Self {
        self.fail_on_source = Some(source_name.to_string());
        self
    }

    pub fn failing_load(mut self) -> Self {
        self.fail_load = true;
        self
    }

    pub fn created(&self) -> Vec<Arc<MockModel>> {
        self.created.lock().unwrap().clone()
    }

    /// Every created model has been released exactly once
    pub fn all_released_once(&self) -> bool {
        self.created().iter().all(|m| m.release_calls() == 1)
    }

    fn make(&self, version: TargetVersion, options: &ModelOptions, script_backed: bool) -> Arc<MockModel> {
        let model = Arc::new(MockModel {
            id: ModelId::next(),
            version,
            options: options.clone(),
            script_backed,
            validation: self.validation.clone(),
            fail_on_source: self.fail_on_source.clone(),
            objects: Mutex::new(Vec::new()),
            released: AtomicBool::new(false),
            release_calls: AtomicUsize::new(0),
        });
        self.created.lock().unwrap().push(Arc::clone(&model));
        model
    }
}

impl ModelEngine for MockModelEngine {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn create_model(
        &self,
        version: TargetVersion,
        options: &ModelOptions,
    ) -> Result<Arc<dyn SchemaModel>, EngineError> {
        Ok(self.make(version, options, true))
    }

    fn save_package(&self, model: &dyn SchemaModel, path: &Path) -> Result<(), EngineError> {
        std::fs::write(path, format!("mock package of {}", model.id()))?;
        Ok(())
    }

    fn load_package(&self, path: &Path, mode: LoadMode) -> Result<Arc<dyn SchemaModel>, EngineError> {
        self.load_modes.lock().unwrap().push(mode);
        if self.fail_load {
            return Err(EngineError::Package(format!("cannot read {}", path.display())));
        }
        Ok(self.make(TargetVersion::default(), &ModelOptions::default(), mode == LoadMode::ScriptBacked))
    }
}

/// Rule engine returning a canned result and counting analyze calls
#[derive(Default)]
pub struct MockRuleEngine {
    pub rules: Vec<RuleDescriptor>,
    pub load_errors: Vec<AnalysisErrorRecord>,
    pub result: AnalysisResult,
    pub analyze_calls: Arc<AtomicUsize>,
    pub configs: Mutex<Vec<RuleExecutionConfig>>,
}

impl MockRuleEngine {
    pub fn with_rules(ids: &[&str]) -> Self {
        Self {
            rules: ids.iter().map(|id| descriptor(id)).collect(),
            ..Default::default()
        }
    }

    pub fn returning(mut self, result: AnalysisResult) -> Self {
        self.result = result;
        self
    }

    pub fn with_load_errors(mut self, errors: Vec<AnalysisErrorRecord>) -> Self {
        self.load_errors = errors;
        self
    }

    pub fn analyze_calls(&self) -> usize {
        self.analyze_calls.load(Ordering::SeqCst)
    }
}

impl RuleEngine for MockRuleEngine {
    fn create_service(
        &self,
        _version: TargetVersion,
        config: &RuleExecutionConfig,
    ) -> Result<Box<dyn AnalysisService>, EngineError> {
        self.configs.lock().unwrap().push(config.clone());
        Ok(Box::new(MockService {
            rules: self.rules.clone(),
            load_errors: self.load_errors.clone(),
            result: self.result.clone(),
            analyze_calls: Arc::clone(&self.analyze_calls),
        }))
    }
}

struct MockService {
    rules: Vec<RuleDescriptor>,
    load_errors: Vec<AnalysisErrorRecord>,
    result: AnalysisResult,
    analyze_calls: Arc<AtomicUsize>,
}

impl AnalysisService for MockService {
    fn loaded_rules(&self) -> Vec<RuleDescriptor> {
        self.rules.clone()
    }

    fn load_errors(&self) -> Vec<AnalysisErrorRecord> {
        self.load_errors.clone()
    }

    fn analyze(&self, _model: &dyn SchemaModel) -> Result<AnalysisResult, EngineError> {
        self.analyze_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.result.clone())
    }
}

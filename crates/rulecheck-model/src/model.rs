//! In-memory schema model compiled from scripts

use rulecheck_core::{
    DisplayNameResolver, ElementRef, EngineError, ModelId, ModelObject, ModelOptions, ObjectKind,
    SchemaModel, ScriptUnit, SourceLocation, TargetVersion, ValidationMessage,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::parser::ScriptParser;

/// Schema model built by [`crate::ScriptModelEngine`]
///
/// Objects are keyed by their case-insensitive identity, so a later
/// definition of the same object replaces the earlier one.
pub struct ScriptModel {
    id: ModelId,
    version: TargetVersion,
    options: ModelOptions,
    script_backed: bool,
    state: RwLock<ModelState>,
    released: AtomicBool,
}

#[derive(Default)]
struct ModelState {
    objects: BTreeMap<String, ModelObject>,
    scripts: Vec<ScriptUnit>,

    /// Messages tied to a script (parse failures, redefinitions)
    script_messages: Vec<ValidationMessage>,

    /// Messages tied to an object; dropped when the object is redefined
    element_messages: BTreeMap<String, Vec<ValidationMessage>>,
}

impl ModelState {
    /// Forget the columns and messages of a table about to be redefined
    fn reset_table(&mut self, table: &ElementRef) {
        self.objects.retain(|_, object| !is_column_of(object, table));
        self.element_messages.remove(&table.identity_key());
    }
}

/// `object` is a column whose parent parts are exactly `table`'s
fn is_column_of(object: &ModelObject, table: &ElementRef) -> bool {
    let parts = &object.element.parts;
    object.element.kind == ObjectKind::Column
        && parts.len() == table.parts.len() + 1
        && parts
            .iter()
            .zip(&table.parts)
            .all(|(a, b)| a.to_lowercase() == b.to_lowercase())
}

/// `[schema].[object].[column]` style name
fn bracketed(element: &ElementRef) -> String {
    element
        .parts
        .iter()
        .map(|p| format!("[{}]", p))
        .collect::<Vec<_>>()
        .join(".")
}

impl ScriptModel {
    /// Create an empty script-backed model
    pub fn new(version: TargetVersion, options: ModelOptions) -> Self {
        Self {
            id: ModelId::next(),
            version,
            options,
            script_backed: true,
            state: RwLock::new(ModelState::default()),
            released: AtomicBool::new(false),
        }
    }

    /// Create a model from object metadata alone; fragments are discarded
    pub fn metadata_only(version: TargetVersion, options: ModelOptions, objects: Vec<ModelObject>) -> Self {
        let objects = objects
            .into_iter()
            .map(|object| {
                let key = object.element.identity_key();
                (key, ModelObject { fragment: None, ..object })
            })
            .collect();

        Self {
            id: ModelId::next(),
            version,
            options,
            script_backed: false,
            state: RwLock::new(ModelState {
                objects,
                ..Default::default()
            }),
            released: AtomicBool::new(false),
        }
    }

    pub fn object_count(&self) -> usize {
        self.read().objects.len()
    }

    fn read(&self) -> RwLockReadGuard<'_, ModelState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ModelState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DisplayNameResolver for ScriptModel {
    fn display_name(&self, element: &ElementRef) -> String {
        bracketed(element)
    }
}

impl SchemaModel for ScriptModel {
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
        if self.is_released() {
            return Err(EngineError::Released(self.id));
        }

        let parser = ScriptParser::new(self.options.dialect, self.options.default_schema.clone());
        let parsed = parser.parse(script);

        let mut guard = self.write();
        let state = &mut *guard;
        state.scripts.push(ScriptUnit::new(script, source_name));

        let definitions = match parsed {
            Ok(definitions) => definitions,
            Err(err) => {
                tracing::debug!(source = source_name, error = %err, "Script failed to parse");
                state.script_messages.push(
                    ValidationMessage::error(format!("Failed to parse script: {}", err.message))
                        .with_location(SourceLocation::new(source_name, err.line, err.column)),
                );
                return Ok(());
            }
        };

        tracing::debug!(source = source_name, definitions = definitions.len(), "Applying script");

        let mut current_table: Option<String> = None;
        let mut current_columns = BTreeSet::new();

        for def in definitions {
            let key = def.element.identity_key();

            match def.element.kind {
                ObjectKind::Table => {
                    state.reset_table(&def.element);
                    current_table = Some(key.clone());
                    current_columns.clear();
                }
                ObjectKind::Column => {
                    if !current_columns.insert(key.clone()) {
                        let message = ValidationMessage::error(format!(
                            "Column {} is defined more than once",
                            bracketed(&def.element)
                        ))
                        .with_location(SourceLocation::new(source_name, def.line, def.column));
                        state
                            .element_messages
                            .entry(current_table.clone().unwrap_or_default())
                            .or_default()
                            .push(message);
                        continue;
                    }
                }
                _ => {}
            }

            if def.element.kind != ObjectKind::Column {
                if let Some(previous) = state.objects.get(&key) {
                    let message = ValidationMessage::info(format!(
                        "{} {} from '{}' was redefined by '{}'",
                        def.element.kind,
                        bracketed(&def.element),
                        previous.source_name.as_deref().unwrap_or(""),
                        source_name
                    ));
                    state.script_messages.push(message);
                }
            }

            state.objects.insert(
                key,
                ModelObject {
                    element: def.element,
                    source_name: Some(source_name.to_string()),
                    start_line: def.line,
                    start_column: def.column,
                    fragment: Some(def.fragment),
                    data_type: def.data_type,
                    has_primary_key: def.has_primary_key,
                },
            );
        }

        Ok(())
    }

    fn validate(&self) -> Vec<ValidationMessage> {
        let state = self.read();
        let mut messages = state.script_messages.clone();
        for element_messages in state.element_messages.values() {
            messages.extend(element_messages.iter().cloned());
        }

        let mut schemas: BTreeSet<String> = state
            .objects
            .values()
            .filter(|o| o.element.kind == ObjectKind::Schema)
            .map(|o| o.element.name().to_lowercase())
            .collect();
        schemas.insert(self.options.default_schema.to_lowercase());

        let location = |object: &ModelObject| {
            object
                .source_name
                .as_ref()
                .map(|s| SourceLocation::new(s.clone(), object.start_line, object.start_column))
        };

        for object in state.objects.values() {
            let element = &object.element;
            let mut found = Vec::new();

            match element.kind {
                ObjectKind::Table => {
                    if !state.objects.values().any(|o| is_column_of(o, element)) {
                        found.push(ValidationMessage::warning(format!(
                            "Table {} has no columns",
                            bracketed(element)
                        )));
                    }
                }
                ObjectKind::Index => {
                    let table = ElementRef::new(ObjectKind::Table, element.parts[..2].to_vec());
                    if !state.objects.contains_key(&table.identity_key()) {
                        found.push(ValidationMessage::error(format!(
                            "Index {} references unknown table {}",
                            bracketed(element),
                            bracketed(&table)
                        )));
                    }
                }
                _ => {}
            }

            if matches!(element.kind, ObjectKind::Table | ObjectKind::View | ObjectKind::Index) {
                let schema = element.parts.first().map(|s| s.to_lowercase()).unwrap_or_default();
                if !schemas.contains(&schema) {
                    found.push(ValidationMessage::warning(format!(
                        "Schema [{}] used by {} is not defined in the model",
                        element.parts[0],
                        bracketed(element)
                    )));
                }
            }

            for message in found {
                messages.push(match location(object) {
                    Some(loc) => message.with_location(loc),
                    None => message,
                });
            }
        }

        messages
    }

    fn objects(&self) -> Vec<ModelObject> {
        if self.is_released() {
            return Vec::new();
        }
        self.read().objects.values().cloned().collect()
    }

    fn scripts(&self) -> Vec<ScriptUnit> {
        self.read().scripts.clone()
    }

    fn is_script_backed(&self) -> bool {
        self.script_backed
    }

    fn release(&self) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }
        *self.write() = ModelState::default();
        tracing::debug!(model = %self.id, "Released model");
    }

    fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

//! Integration tests for the script model engine

use rulecheck_core::{LoadMode, ModelEngine, ModelOptions, ObjectKind, SchemaModel, Severity, TargetVersion};
use rulecheck_model::{Package, ScriptModelEngine};

const SCHEMA_SQL: &str = "CREATE SCHEMA sales;\nGO\n";

const ORDERS_SQL: &str = "\
CREATE TABLE sales.Orders (
    OrderId INT NOT NULL,
    CustomerId INT NOT NULL,
    Notes TEXT,
    CONSTRAINT PK_Orders PRIMARY KEY (OrderId)
);
GO
CREATE INDEX IX_Orders_Customer ON sales.Orders (CustomerId);
";

const SUMMARY_SQL: &str = "\
-- summary view
CREATE VIEW sales.OrderSummary AS
SELECT CustomerId, COUNT(*) AS OrderCount
FROM sales.Orders
GROUP BY CustomerId;
";

fn build() -> std::sync::Arc<dyn SchemaModel> {
    let engine = ScriptModelEngine::new();
    let model = engine
        .create_model(TargetVersion::Sql2019, &ModelOptions::default())
        .unwrap();
    for (sql, name) in [
        (SCHEMA_SQL, "schemas/sales.sql"),
        (ORDERS_SQL, "tables/orders.sql"),
        (SUMMARY_SQL, "views/summary.sql"),
    ] {
        model.add_or_update_objects(sql, name).unwrap();
    }
    model
}

#[test]
fn builds_multi_script_project() {
    let model = build();
    assert!(model.validate().iter().all(|m| m.severity != Severity::Error));

    let objects = model.objects();
    let count = |kind| objects.iter().filter(|o| o.element.kind == kind).count();
    assert_eq!(count(ObjectKind::Schema), 1);
    assert_eq!(count(ObjectKind::Table), 1);
    assert_eq!(count(ObjectKind::Column), 3);
    assert_eq!(count(ObjectKind::Index), 1);
    assert_eq!(count(ObjectKind::View), 1);

    let view = objects.iter().find(|o| o.element.kind == ObjectKind::View).unwrap();
    assert_eq!(view.source_name.as_deref(), Some("views/summary.sql"));
    assert_eq!((view.start_line, view.start_column), (2, 1));
    assert_eq!(model.display_name(&view.element), "[sales].[OrderSummary]");

    let notes = objects
        .iter()
        .find(|o| o.element.kind == ObjectKind::Column && o.element.name() == "Notes")
        .unwrap();
    assert_eq!(notes.data_type.as_deref(), Some("TEXT"));
    assert_eq!((notes.start_line, notes.start_column), (4, 5));

    let index = objects.iter().find(|o| o.element.kind == ObjectKind::Index).unwrap();
    assert_eq!(index.start_line, 8);
}

#[test]
fn package_roundtrip_preserves_objects() {
    let engine = ScriptModelEngine::new();
    let model = build();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sales.rcpkg");

    engine.save_package(&*model, &path).unwrap();
    let package = Package::from_file(&path).unwrap();
    assert_eq!(package.body.scripts.len(), 3);

    let reloaded = engine.load_package(&path, LoadMode::ScriptBacked).unwrap();
    assert_eq!(reloaded.objects(), model.objects());
    assert_eq!(reloaded.validate(), model.validate());
}

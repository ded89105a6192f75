//! End-to-end runs of the migration pipeline against a temporary project directory

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use pretty_assertions::assert_eq;
use rstest::*;
use tempfile::TempDir;

use schema_shift::models::{Edge, Entity, Field, FieldType, ReferentialAction};
use schema_shift::{Config, Error, MigrationEngine, MigrationOutcome, OperationKind, SnapshotStore};

fn test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.migrations.directory = dir.join("migrations").to_string_lossy().into_owned();
    config
}

fn at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap()
}

fn user(email: Option<Field>) -> Entity {
    let mut user = Entity::new("User")
        .with_field(Field::primary("id", FieldType::Uuid))
        .with_edge(Edge::to_many("pets", "Pet"));
    if let Some(field) = email {
        user = user.with_field(field);
    }
    user
}

fn pet() -> Entity {
    Entity::new("Pet").with_field(Field::primary("id", FieldType::Uuid))
}

fn sql_of(outcome: &MigrationOutcome) -> Vec<&str> {
    outcome.operations().iter().map(|op| op.sql.as_str()).collect()
}

fn migration_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir.join("migrations"))
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.extension().map_or(false, |ext| ext == "sql"))
                .collect()
        })
        .unwrap_or_default();
    files.sort();
    files
}

#[fixture]
fn project() -> TempDir {
    TempDir::new().unwrap()
}

#[rstest]
fn test_to_many_edge_derives_foreign_key(project: TempDir) {
    let mut engine = MigrationEngine::new(test_config(project.path()));
    let mut entities = vec![user(None), pet()];

    let outcome = engine.run_at(&mut entities, true, at(0)).unwrap();

    assert_eq!(
        sql_of(&outcome),
        vec![
            "CREATE TABLE IF NOT EXISTS users (\n  id uuid NOT NULL,\n  PRIMARY KEY (id)\n);",
            "CREATE TABLE IF NOT EXISTS pets (\n  id uuid NOT NULL,\n  user_id uuid NOT NULL,\n  PRIMARY KEY (id)\n);",
            "ALTER TABLE pets ADD CONSTRAINT fk_pets_user_id FOREIGN KEY (user_id) REFERENCES users (id);",
        ]
    );

    // The finalized entities carry the synthesized pieces for downstream emitters.
    let pet = entities.iter().find(|e| e.name == "Pet").unwrap();
    assert!(pet.field_by_column("user_id").is_some());
    assert!(pet.edges.iter().any(|e| e.generated && e.target == "User"));

    let MigrationOutcome::Generated { path, .. } = outcome else {
        panic!("expected a generated migration");
    };
    assert_eq!(engine.context().written_files(), &[path.clone()]);
    assert!(fs::read_to_string(path).unwrap().ends_with(";\n"));
}

#[rstest]
fn test_column_lifecycle(project: TempDir) {
    let config = test_config(project.path());

    let mut engine = MigrationEngine::new(config.clone());
    engine.run_at(&mut vec![user(None), pet()], true, at(0)).unwrap();

    let nullable_email = Field::new("email", FieldType::Text).nullable();
    let outcome = engine
        .run_at(&mut vec![user(Some(nullable_email)), pet()], true, at(1))
        .unwrap();
    assert_eq!(sql_of(&outcome), vec!["ALTER TABLE users ADD COLUMN email text;"]);

    let strict_email = Field::new("email", FieldType::Varchar(Some(128)));
    let outcome = engine
        .run_at(&mut vec![user(Some(strict_email)), pet()], true, at(2))
        .unwrap();
    assert_eq!(
        sql_of(&outcome),
        vec![
            "ALTER TABLE users ALTER COLUMN email TYPE varchar(128);",
            "ALTER TABLE users ALTER COLUMN email SET NOT NULL;",
        ]
    );

    // A fresh engine reads the persisted snapshot, like a new process would.
    let mut engine = MigrationEngine::new(config);
    let outcome = engine.run_at(&mut vec![user(None), pet()], true, at(3)).unwrap();
    assert_eq!(
        sql_of(&outcome),
        vec!["ALTER TABLE users DROP COLUMN IF EXISTS email CASCADE;"]
    );

    assert_eq!(migration_files(project.path()).len(), 4);
}

#[rstest]
fn test_many_to_many_join_table(project: TempDir) {
    let mut engine = MigrationEngine::new(test_config(project.path()));
    let mut entities = vec![
        Entity::new("User")
            .with_field(Field::primary("id", FieldType::Uuid))
            .with_edge(Edge::many_to_many("groups", "Group").on_delete(ReferentialAction::Cascade)),
        Entity::new("Group").with_field(Field::primary("id", FieldType::Uuid)),
    ];

    let outcome = engine.run_at(&mut entities, true, at(0)).unwrap();
    let sql = sql_of(&outcome);

    assert!(sql.contains(
        &"CREATE TABLE IF NOT EXISTS groups_users (\n  group_id uuid NOT NULL,\n  user_id uuid NOT NULL,\n  PRIMARY KEY (group_id, user_id)\n);"
    ));
    assert!(sql.contains(
        &"ALTER TABLE groups_users ADD CONSTRAINT fk_groups_users_group_id FOREIGN KEY (group_id) REFERENCES groups (id) ON DELETE CASCADE;"
    ));
    assert!(sql.contains(
        &"ALTER TABLE groups_users ADD CONSTRAINT fk_groups_users_user_id FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE;"
    ));

    // Join table is created after both participants.
    let creates: Vec<&str> = outcome
        .operations()
        .iter()
        .filter(|op| op.kind == OperationKind::CreateTable)
        .map(|op| op.target.as_str())
        .collect();
    assert_eq!(creates, vec!["groups", "users", "groups_users"]);
}

#[rstest]
fn test_plain_to_computed_is_drop_then_add(project: TempDir) {
    let order = |total: Field| {
        vec![Entity::new("Order")
            .with_field(Field::primary("id", FieldType::BigInt))
            .with_field(Field::new("price", FieldType::Integer))
            .with_field(Field::new("qty", FieldType::Integer))
            .with_field(total)]
    };

    let mut engine = MigrationEngine::new(test_config(project.path()));
    engine
        .run_at(&mut order(Field::new("total", FieldType::Integer)), true, at(0))
        .unwrap();

    let outcome = engine
        .run_at(
            &mut order(Field::new("total", FieldType::Integer).generated_as("price * qty")),
            true,
            at(1),
        )
        .unwrap();

    assert_eq!(
        sql_of(&outcome),
        vec![
            "ALTER TABLE orders DROP COLUMN IF EXISTS total CASCADE;",
            "ALTER TABLE orders ADD COLUMN total integer GENERATED ALWAYS AS (price * qty) STORED;",
        ]
    );
    assert!(outcome.operations().iter().all(|op| op.kind != OperationKind::AlterColumn));
}

#[rstest]
fn test_unchanged_schema_is_up_to_date(project: TempDir) {
    let config = test_config(project.path());
    let store = SnapshotStore::new(config.migrations.snapshot_path());
    let mut engine = MigrationEngine::new(config);

    engine.run_at(&mut vec![user(None), pet()], true, at(0)).unwrap();
    let saved = fs::read_to_string(store.path()).unwrap();

    let outcome = engine.run_at(&mut vec![user(None), pet()], true, at(1)).unwrap();
    assert_eq!(outcome, MigrationOutcome::UpToDate);
    assert_eq!(fs::read_to_string(store.path()).unwrap(), saved);
    assert_eq!(migration_files(project.path()).len(), 1);

    let outcome = engine.run_at(&mut vec![user(None), pet()], false, at(2)).unwrap();
    assert_eq!(outcome, MigrationOutcome::Skipped);
}

#[rstest]
fn test_loader_order_yields_identical_sql() {
    let render = |entities: Vec<Entity>| {
        let dir = TempDir::new().unwrap();
        let mut engine = MigrationEngine::new(test_config(dir.path()));
        let mut entities = entities;
        match engine.run_at(&mut entities, true, at(0)).unwrap() {
            MigrationOutcome::Generated { path, .. } => fs::read_to_string(path).unwrap(),
            other => panic!("unexpected outcome: {other:?}"),
        }
    };

    let tag = Entity::new("Tag")
        .with_field(Field::primary("id", FieldType::BigSerial))
        .with_edge(Edge::many_to_many("pets", "Pet"));

    let forward = render(vec![user(None), pet(), tag.clone()]);
    let backward = render(vec![tag, pet(), user(None)]);
    assert_eq!(forward, backward);
}

#[rstest]
fn test_validation_failure_writes_nothing(project: TempDir) {
    let config = test_config(project.path());
    let store = SnapshotStore::new(config.migrations.snapshot_path());
    let mut engine = MigrationEngine::new(config);

    engine.run_at(&mut vec![user(None), pet()], true, at(0)).unwrap();
    let saved = fs::read_to_string(store.path()).unwrap();

    let mut broken = vec![
        user(None).with_edge(Edge::to_one("favorite", "Pett").with_column("favorite_id")),
        pet(),
    ];
    let err = engine.run_at(&mut broken, true, at(1)).unwrap_err();

    assert!(err.is_validation());
    let message = err.to_string();
    assert!(message.contains("unknown target entity 'Pett'"), "{}", message);
    assert!(message.contains("did you mean 'Pet'?"), "{}", message);
    assert!(message.contains("'favorite_id' is not a declared field"), "{}", message);

    assert_eq!(fs::read_to_string(store.path()).unwrap(), saved);
    assert_eq!(migration_files(project.path()).len(), 1);
}

#[rstest]
fn test_enum_conflict_is_distinct_from_validation(project: TempDir) {
    let mut engine = MigrationEngine::new(test_config(project.path()));
    let mut entities = vec![
        Entity::new("User")
            .with_field(Field::primary("id", FieldType::Uuid))
            .with_field(Field::new("status", FieldType::Enum).with_enum("status", &["active", "banned"])),
        Entity::new("Device")
            .with_field(Field::primary("id", FieldType::Uuid))
            .with_field(Field::new("status", FieldType::Enum).with_enum("status", &["on", "off"])),
    ];

    let err = engine.run_at(&mut entities, true, at(0)).unwrap_err();
    assert!(matches!(err, Error::EnumConflict { ref name, .. } if name == "status"));
    assert!(!err.is_validation());
    assert!(migration_files(project.path()).is_empty());
}

#[rstest]
fn test_enum_values_can_change_between_runs(project: TempDir) {
    let device = |values: &[&str]| {
        vec![Entity::new("Device")
            .with_field(Field::primary("id", FieldType::Uuid))
            .with_field(Field::new("status", FieldType::Enum).with_enum("status", values))]
    };

    let mut engine = MigrationEngine::new(test_config(project.path()));
    engine.run_at(&mut device(&["on", "off"]), true, at(0)).unwrap();

    // Enum values render as text, so widening the set changes no column.
    let outcome = engine.run_at(&mut device(&["on", "off", "standby"]), true, at(1)).unwrap();
    assert_eq!(outcome, MigrationOutcome::UpToDate);
    assert_eq!(
        engine.context().enums.get("status").unwrap(),
        ["on".to_string(), "off".to_string(), "standby".to_string()]
    );
}

#[rstest]
fn test_unpaired_second_edge_aborts(project: TempDir) {
    let mut engine = MigrationEngine::new(test_config(project.path()));
    let mut entities = vec![
        user(None).with_edge(Edge::to_many("adopted_pets", "Pet")),
        pet(),
    ];

    let err = engine.run_at(&mut entities, true, at(0)).unwrap_err();

    assert!(err.is_validation());
    let message = err.to_string();
    assert!(message.contains("User.adopted_pets -> Pet"), "{}", message);
    assert!(message.contains("'Pet.user' is already taken by the inverse of 'User.pets'"), "{}", message);
    assert!(migration_files(project.path()).is_empty());
}

#[rstest]
fn test_dry_run_writes_nothing(project: TempDir) {
    let mut config = test_config(project.path());
    config.migrations.dry_run = true;
    let store = SnapshotStore::new(config.migrations.snapshot_path());
    let mut engine = MigrationEngine::new(config);

    let outcome = engine.run_at(&mut vec![user(None), pet()], true, at(0)).unwrap();
    let MigrationOutcome::DryRun { sql, operations } = outcome else {
        panic!("expected a dry run");
    };

    assert_eq!(operations.len(), 3);
    assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS users"));
    assert!(!store.path().exists());
    assert!(migration_files(project.path()).is_empty());
}

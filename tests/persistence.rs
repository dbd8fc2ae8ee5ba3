mod common;

use common::{ready_project, temp_dir, PRICE};
use project_finance::config::{ConfigManager, EngineConfig};
use project_finance::storage::{
    load_project_from_path, save_project_to_path, JsonProjectStorage, ProjectFile,
    StorageBackend,
};
use project_finance::tax::{CarrybackOrder, TaxCredit, TaxKind, TaxManager, Tax};
use project_finance::FinanceError;

#[test]
fn load_save_load_reproduces_the_project() {
    let dir = temp_dir();
    let original = ready_project();
    let first_path = dir.join("plant.json");
    save_project_to_path(&ProjectFile::from_project(&original), &first_path).unwrap();

    let first = load_project_from_path(&first_path).unwrap();
    let second_path = dir.join("copy.json");
    save_project_to_path(&first, &second_path).unwrap();
    let second = load_project_from_path(&second_path).unwrap();

    assert_eq!(first, second);
    let rebuilt = first.to_project().unwrap();
    assert_eq!(rebuilt, second.to_project().unwrap());
    assert_eq!(rebuilt, original);
    assert!(rebuilt.is_ready());
}

#[test]
fn reloaded_project_assembles_identically() {
    let dir = temp_dir();
    let mut original = ready_project();
    let mut manager = TaxManager::new();
    manager
        .add_credit(TaxCredit::per_unit("Output credit", "Production", 0.01, false))
        .unwrap();
    manager
        .add_tax(
            Tax::new("Income_tax_2", TaxKind::Fractional { rate: 0.25 })
                .on(&["Revenue"], &["Cost_of_sales", "Interest", "Depreciation"])
                .with_credit("Output credit"),
        )
        .unwrap();
    original.set_tax_manager(Some(manager));
    let path = dir.join("with_taxes.json");
    save_project_to_path(&ProjectFile::from_project(&original), &path).unwrap();

    let mut reloaded = load_project_from_path(&path).unwrap().to_project().unwrap();
    let expected = original.assemble_financials(PRICE).unwrap().clone();
    let actual = reloaded.assemble_financials(PRICE).unwrap().clone();
    assert_eq!(expected, actual);
}

#[test]
fn newer_schema_versions_are_rejected() {
    let mut file = ProjectFile::from_project(&ready_project());
    file.schema_version += 1;
    assert!(matches!(file.to_project(), Err(FinanceError::Storage(_))));
}

#[test]
fn managed_storage_keeps_identity_across_updates() {
    let storage = JsonProjectStorage::new(Some(temp_dir()), Some(2)).unwrap();
    let project = ready_project();
    let mut file = ProjectFile::from_project(&project);
    storage.save(&file, &project.name).unwrap();

    let created = file.created_at;
    let id = file.id;
    file.update_from(&project);
    storage.save(&file, &project.name).unwrap();

    let loaded = storage.load(&project.name).unwrap();
    assert_eq!(loaded.id, id);
    assert_eq!(loaded.created_at, created);
    assert!(loaded.updated_at >= created);
    assert_eq!(storage.list_backups(&project.name).unwrap().len(), 1);
    assert!(storage.load("missing").is_err());
}

#[test]
fn engine_configuration_persists_beside_projects() {
    let manager = ConfigManager::with_path(temp_dir().join("config.json"));
    let config = EngineConfig {
        carryback_order: CarrybackOrder::OldestFirst,
        carryback_years: 3,
        log_filter: Some("project_finance=debug".into()),
        ..EngineConfig::default()
    };
    manager.save(&config).unwrap();
    assert_eq!(manager.load().unwrap(), config);
}

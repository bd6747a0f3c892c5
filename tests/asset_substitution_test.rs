//! Integration tests for dummy asset substitution

mod common;

use anonymizer::adapters::resources::filesystem::sha256_hex;
use anonymizer::anonymization::AnonymizationConfig;
use anonymizer::core::run::{RunOptions, RunOutcome};
use anonymizer::domain::ids::RecordFamily;
use anonymizer::domain::{AnonymizerError, Asset, EntityRecord, FieldValue, ResourceRef};
use common::{at, Harness, MemoryRecords};
use std::collections::BTreeMap;
use std::io::Write;
use tempfile::NamedTempFile;

fn portrait(media_type: &str) -> Asset {
    Asset {
        identifier: "asset-1".to_string(),
        media_type: media_type.to_string(),
        resource: ResourceRef {
            sha256: "0".repeat(64),
            filename: "portrait.jpg".to_string(),
            collection: "persistent".to_string(),
        },
    }
}

fn harness(asset: Asset) -> Harness {
    Harness::new(MemoryRecords::new(RecordFamily::DomainModel).with_type(
        "customers",
        vec![EntityRecord::new("customers", "c-1").with_field("avatar", FieldValue::Asset(asset))],
    ))
}

fn config(dummy: Option<&NamedTempFile>) -> AnonymizationConfig {
    let mut config: AnonymizationConfig = toml::from_str(
        r#"
[domain_models.customers.properties]
avatar = { anonymize = true }
"#,
    )
    .unwrap();
    if let Some(dummy) = dummy {
        config.dummy_assets = BTreeMap::from([("image/jpeg".to_string(), dummy.path().to_path_buf())]);
    }
    config
}

fn dummy_file(content: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content).unwrap();
    file.flush().unwrap();
    file
}

fn options(test: bool) -> RunOptions {
    RunOptions {
        test,
        force: !test,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_substitution_keeps_filename_and_collection() {
    let dummy = dummy_file(b"dummy-jpeg");
    let harness = harness(portrait("image/jpeg"));

    let outcome = harness
        .coordinator(&config(Some(&dummy)), at(2024, 1, 1, 0, 0, 0))
        .run(&options(false))
        .await
        .unwrap();
    assert!(matches!(outcome, RunOutcome::Completed(_)));

    let imports = harness.resources.imports.lock().unwrap().clone();
    assert_eq!(
        imports,
        vec![(
            b"dummy-jpeg".to_vec(),
            "portrait.jpg".to_string(),
            "persistent".to_string()
        )]
    );

    let updated = harness.assets.updates.lock().unwrap().clone();
    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0].identifier, "asset-1");
    assert_eq!(updated[0].media_type, "image/jpeg");
    assert_eq!(updated[0].resource.sha256, sha256_hex(b"dummy-jpeg"));
    assert_eq!(updated[0].resource.filename, "portrait.jpg");

    let stored = harness.records.stored("customers", "c-1");
    assert_eq!(stored.fields.get("avatar"), Some(&FieldValue::Asset(updated[0].clone())));
}

#[tokio::test]
async fn test_missing_dummy_deletes_the_asset() {
    let harness = harness(portrait("application/pdf"));
    let options = RunOptions {
        verbose: true,
        force: true,
        ..Default::default()
    };

    harness
        .coordinator(&config(None), at(2024, 1, 1, 0, 0, 0))
        .run(&options)
        .await
        .unwrap();

    assert!(harness.resources.imports.lock().unwrap().is_empty());
    assert!(harness.assets.updates.lock().unwrap().is_empty());
    assert_eq!(
        harness.records.stored("customers", "c-1").fields.get("avatar"),
        Some(&FieldValue::Null)
    );
    assert!(harness
        .reporter
        .contains("- Anonymizing property \"avatar\" by deleting \"Asset\""));
}

#[tokio::test]
async fn test_dry_run_leaves_assets_alone() {
    let dummy = dummy_file(b"dummy-jpeg");
    let harness = harness(portrait("image/jpeg"));

    harness
        .coordinator(&config(Some(&dummy)), at(2024, 1, 1, 0, 0, 0))
        .run(&options(true))
        .await
        .unwrap();

    assert!(harness.resources.imports.lock().unwrap().is_empty());
    assert!(harness.assets.updates.lock().unwrap().is_empty());
    assert!(harness
        .reporter
        .contains("- Anonymizing property \"avatar\" from \"Asset\" to \"DummyAsset\""));
}

#[tokio::test]
async fn test_unreadable_dummy_aborts() {
    let dummy = dummy_file(b"x");
    let mut config = config(Some(&dummy));
    config.dummy_assets.insert(
        "image/jpeg".to_string(),
        dummy.path().with_extension("missing"),
    );
    let harness = harness(portrait("image/jpeg"));

    let result = harness
        .coordinator(&config, at(2024, 1, 1, 0, 0, 0))
        .run(&options(false))
        .await;

    assert!(matches!(result, Err(AnonymizerError::Resource(_))));
    assert!(harness.checkpoints.all().is_empty());
}

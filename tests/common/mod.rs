//! In-memory storage doubles shared by the integration tests

#![allow(dead_code)]

use anonymizer::adapters::database::traits::{
    AssetRepository, CheckpointStorage, RecordRepository, ResourceStore,
};
use anonymizer::adapters::resources::filesystem::sha256_hex;
use anonymizer::anonymization::{AnonymizationConfig, BufferedReporter, FieldMasker};
use anonymizer::core::clock::FixedClock;
use anonymizer::core::run::{AnonymizationCoordinator, Collaborators};
use anonymizer::core::selection::Selection;
use anonymizer::core::state::{Checkpoint, CheckpointManager};
use anonymizer::domain::ids::{CheckpointName, RecordFamily};
use anonymizer::domain::{
    AnonymizerError, Asset, EntityRecord, FieldValue, Record, ResourceRef, Result,
};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

pub fn at(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, mi, s)
        .unwrap()
}

/// Records of any family kept in memory, keyed by type name
#[derive(Default)]
pub struct MemoryRecords {
    pub family: Option<RecordFamily>,
    pub valid_types: BTreeSet<String>,
    pub records: Mutex<BTreeMap<String, Vec<EntityRecord>>>,
    pub selections: Mutex<Vec<Selection>>,
    pub updates: Mutex<Vec<EntityRecord>>,
    /// Number of updates that succeed before every further update fails
    pub fail_after: Option<usize>,
}

impl MemoryRecords {
    pub fn new(family: RecordFamily) -> Self {
        Self {
            family: Some(family),
            ..Default::default()
        }
    }

    pub fn with_type(mut self, type_name: &str, records: Vec<EntityRecord>) -> Self {
        self.valid_types.insert(type_name.to_string());
        self.records
            .get_mut()
            .unwrap()
            .insert(type_name.to_string(), records);
        self
    }

    pub fn failing_after(mut self, successful_updates: usize) -> Self {
        self.fail_after = Some(successful_updates);
        self
    }

    pub fn stored(&self, type_name: &str, identifier: &str) -> EntityRecord {
        self.records.lock().unwrap()[type_name]
            .iter()
            .find(|record| record.identifier == identifier)
            .cloned()
            .unwrap()
    }

    pub fn update_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }

    pub fn selections(&self) -> Vec<Selection> {
        self.selections.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordRepository for MemoryRecords {
    async fn resolve_type(&self, type_name: &str) -> Result<bool> {
        Ok(self.valid_types.contains(type_name))
    }

    async fn find_records(&self, selection: &Selection) -> Result<Vec<Box<dyn Record>>> {
        self.selections.lock().unwrap().push(selection.clone());

        let records = self.records.lock().unwrap();
        let Some(records) = records.get(&selection.type_name) else {
            return Ok(Vec::new());
        };

        Ok(records
            .iter()
            .filter(|record| match &selection.window {
                None => true,
                Some(window) => match record.field(&window.field) {
                    Some(FieldValue::Timestamp(ts)) => window.contains(ts),
                    _ => false,
                },
            })
            .map(|record| Box::new(record.clone()) as Box<dyn Record>)
            .collect())
    }

    async fn update_record(&self, record: &dyn Record) -> Result<()> {
        let entity = record
            .as_any()
            .downcast_ref::<EntityRecord>()
            .ok_or_else(|| AnonymizerError::Database("unexpected record type".to_string()))?;

        let mut updates = self.updates.lock().unwrap();
        if self.fail_after.is_some_and(|limit| updates.len() >= limit) {
            return Err(AnonymizerError::Database(format!(
                "write of {} rejected",
                entity.identifier
            )));
        }

        let mut records = self.records.lock().unwrap();
        if let Some(stored) = records
            .get_mut(&entity.table)
            .and_then(|rows| rows.iter_mut().find(|row| row.identifier == entity.identifier))
        {
            *stored = entity.clone();
        }
        updates.push(entity.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryCheckpoints {
    pub rows: Mutex<Vec<Checkpoint>>,
}

impl MemoryCheckpoints {
    pub fn all(&self) -> Vec<Checkpoint> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl CheckpointStorage for MemoryCheckpoints {
    async fn find_latest(&self, name: &CheckpointName) -> Result<Option<Checkpoint>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|c| &c.name == name)
            .max_by_key(|c| c.to_time)
            .cloned())
    }

    async fn append(&self, checkpoint: &Checkpoint) -> Result<()> {
        self.rows.lock().unwrap().push(checkpoint.clone());
        Ok(())
    }

    async fn latest_per_name(&self) -> Result<Vec<Checkpoint>> {
        let mut latest: BTreeMap<String, Checkpoint> = BTreeMap::new();
        for checkpoint in self.rows.lock().unwrap().iter() {
            let entry = latest
                .entry(checkpoint.name.to_string())
                .or_insert_with(|| checkpoint.clone());
            if checkpoint.to_time > entry.to_time {
                *entry = checkpoint.clone();
            }
        }
        Ok(latest.into_values().collect())
    }

    async fn history(&self, name: &CheckpointName) -> Result<Vec<Checkpoint>> {
        let mut rows: Vec<_> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|c| &c.name == name)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.to_time.cmp(&a.to_time));
        Ok(rows)
    }
}

/// Imported resources: content, filename, collection
#[derive(Default)]
pub struct MemoryResources {
    pub imports: Mutex<Vec<(Vec<u8>, String, String)>>,
}

#[async_trait]
impl ResourceStore for MemoryResources {
    async fn import_resource(
        &self,
        content: Vec<u8>,
        filename: &str,
        collection: &str,
    ) -> Result<ResourceRef> {
        let sha256 = sha256_hex(&content);
        self.imports
            .lock()
            .unwrap()
            .push((content, filename.to_string(), collection.to_string()));
        Ok(ResourceRef {
            sha256,
            filename: filename.to_string(),
            collection: collection.to_string(),
        })
    }
}

#[derive(Default)]
pub struct MemoryAssets {
    pub updates: Mutex<Vec<Asset>>,
}

#[async_trait]
impl AssetRepository for MemoryAssets {
    async fn update_asset(&self, asset: &Asset) -> Result<()> {
        self.updates.lock().unwrap().push(asset.clone());
        Ok(())
    }
}

/// Doubles wired into a coordinator
pub struct Harness {
    pub family: RecordFamily,
    pub records: Arc<MemoryRecords>,
    pub checkpoints: Arc<MemoryCheckpoints>,
    pub resources: Arc<MemoryResources>,
    pub assets: Arc<MemoryAssets>,
    pub reporter: Arc<BufferedReporter>,
}

impl Harness {
    pub fn new(records: MemoryRecords) -> Self {
        Self {
            family: records.family.unwrap_or(RecordFamily::DomainModel),
            records: Arc::new(records),
            checkpoints: Arc::new(MemoryCheckpoints::default()),
            resources: Arc::new(MemoryResources::default()),
            assets: Arc::new(MemoryAssets::default()),
            reporter: Arc::new(BufferedReporter::new()),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            records: self.records.clone(),
            checkpoints: Arc::new(CheckpointManager::new_with_storage(self.checkpoints.clone())),
            resources: self.resources.clone(),
            assets: self.assets.clone(),
        }
    }

    /// Coordinator with a fixed clock and a seeded masker
    pub fn coordinator(&self, config: &AnonymizationConfig, now: NaiveDateTime) -> AnonymizationCoordinator {
        AnonymizationCoordinator::new(self.family, config, self.collaborators(), self.reporter.clone())
            .with_clock(Arc::new(FixedClock(now)))
            .with_masker(FieldMasker::with_rng(
                config.dummy_assets.clone(),
                Box::new(StdRng::seed_from_u64(7)),
            ))
    }

    pub fn lines(&self) -> Vec<String> {
        self.reporter.lines()
    }
}

pub fn text(value: &str) -> FieldValue {
    FieldValue::Text(value.to_string())
}

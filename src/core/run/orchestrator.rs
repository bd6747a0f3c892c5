//! Anonymization coordinator - main orchestrator for a run
//!
//! One coordinator handles one record family. For every configured type it
//! plans the selection window, masks the configured fields of each candidate,
//! persists changed records one by one and appends a checkpoint.
//!
//! Runs are strictly sequential. Concurrent invocations against the same type
//! are not coordinated and can overlap windows; callers must serialize them.

use crate::adapters::database::traits::{AssetRepository, RecordRepository, ResourceStore};
use crate::anonymization::config::{AnonymizationConfig, TypeConfig};
use crate::anonymization::masker::{FieldMasker, MaskedValue};
use crate::anonymization::report::Reporter;
use crate::core::clock::{Clock, SystemClock};
use crate::core::run::summary::{RunSummary, TypeOutcome};
use crate::core::selection::{plan, SelectionPlan};
use crate::core::state::{CheckpointBuilder, CheckpointManager};
use crate::domain::ids::{CheckpointName, RecordFamily};
use crate::domain::value::DISPLAY_FORMAT;
use crate::domain::{AnonymizerError, Asset, FieldValue, Record, Result};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Storage collaborators of a run
#[derive(Clone)]
pub struct Collaborators {
    pub records: Arc<dyn RecordRepository + Send + Sync>,
    pub checkpoints: Arc<CheckpointManager>,
    pub resources: Arc<dyn ResourceStore + Send + Sync>,
    pub assets: Arc<dyn AssetRepository + Send + Sync>,
}

/// Command-line switches of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Type names to restrict the run to; empty processes all
    pub only: Vec<String>,

    /// Dry run: nothing is persisted, output is verbose
    pub test: bool,

    pub verbose: bool,

    /// Confirms that changes are persisted
    pub force: bool,
}

impl RunOptions {
    /// Splits a comma separated `--only` value, trimming every entry
    pub fn parse_only(raw: Option<&str>) -> Vec<String> {
        raw.map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
    }

    pub fn is_verbose(&self) -> bool {
        self.test || self.verbose
    }

    /// Whether `type_name` passes the `--only` filter
    pub fn includes(&self, type_name: &str) -> bool {
        self.only.is_empty() || self.only.iter().any(|name| name == type_name)
    }
}

/// How a run ended
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// The family has no configuration section
    NotConfigured,
    /// Neither `--test` nor `--force` was given; nothing was touched
    ConfirmationRequired,
    Completed(RunSummary),
}

/// Checks that must pass before any storage is touched
///
/// Reports and returns the early outcome if the family is not configured or
/// the run is neither confirmed nor a dry run.
pub fn preflight(
    family: RecordFamily,
    configured: bool,
    options: &RunOptions,
    reporter: &dyn Reporter,
) -> Option<RunOutcome> {
    if !configured {
        reporter.line(&format!("No {} configured", family.plural_label()));
        return Some(RunOutcome::NotConfigured);
    }

    if !options.test && !options.force {
        reporter.line(&format!(
            "Are you sure you want to anonymize or shuffle the configured {} and immediately persist the changes in the current database?!",
            family.plural_label()
        ));
        reporter.line("Then use the --force option.");
        return Some(RunOutcome::ConfirmationRequired);
    }

    None
}

/// Anonymization coordinator
pub struct AnonymizationCoordinator {
    family: RecordFamily,
    types: Option<Arc<BTreeMap<String, TypeConfig>>>,
    masker: FieldMasker,
    collaborators: Collaborators,
    reporter: Arc<dyn Reporter>,
    clock: Arc<dyn Clock>,
}

impl AnonymizationCoordinator {
    /// Create a coordinator for `family` using the matching configuration section
    pub fn new(
        family: RecordFamily,
        config: &AnonymizationConfig,
        collaborators: Collaborators,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            family,
            types: config.types(family).cloned().map(Arc::new),
            masker: FieldMasker::new(config.dummy_assets.clone()),
            collaborators,
            reporter,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the masker, e.g. with one drawing from a seeded RNG
    pub fn with_masker(mut self, masker: FieldMasker) -> Self {
        self.masker = masker;
        self
    }

    /// Execute a run
    ///
    /// Returns early without touching storage when the family is not
    /// configured or the run is neither confirmed nor a dry run.
    ///
    /// # Errors
    ///
    /// Returns an error if a query, a record update, an asset substitution or a
    /// checkpoint append fails. Records persisted before the failure stay
    /// persisted.
    pub async fn run(&mut self, options: &RunOptions) -> Result<RunOutcome> {
        let start_time = Instant::now();

        if let Some(outcome) = preflight(
            self.family,
            self.types.is_some(),
            options,
            self.reporter.as_ref(),
        ) {
            return Ok(outcome);
        }
        let Some(types) = self.types.clone() else {
            return Ok(RunOutcome::NotConfigured);
        };

        let mut summary = RunSummary::new(self.family, options.test);

        for name in options.only.iter().filter(|name| !types.contains_key(*name)) {
            self.reporter.line(&format!(
                "{name} is not a configured {}, skipping.",
                self.family.label()
            ));
            summary.unknown_filters.push(name.clone());
        }

        tracing::info!(
            family = %self.family,
            dry_run = options.test,
            configured_types = types.len(),
            "Starting anonymization run"
        );

        for (type_name, type_config) in types.iter() {
            if !options.includes(type_name) {
                continue;
            }

            let outcome = self.process_type(type_name, type_config, options).await?;
            summary.add(type_name.clone(), outcome);
        }

        let summary = summary.with_duration(start_time.elapsed());
        summary.log_summary();

        Ok(RunOutcome::Completed(summary))
    }

    /// Process one configured type
    async fn process_type(
        &mut self,
        type_name: &str,
        type_config: &TypeConfig,
        options: &RunOptions,
    ) -> Result<TypeOutcome> {
        let label = self.family.label();

        if !self.collaborators.records.resolve_type(type_name).await? {
            tracing::warn!(family = %self.family, type_name = %type_name, "Unknown type, skipping");
            self.reporter
                .line(&format!("{type_name} is not a valid {label}."));
            return Ok(TypeOutcome::Invalid);
        }

        let checkpoint_name = CheckpointName::for_type(self.family, type_name)
            .map_err(AnonymizerError::Configuration)?;

        self.reporter.line("");
        self.reporter.line(&format!("Process {type_name} {label}:"));

        let last = self
            .collaborators
            .checkpoints
            .find_latest(&checkpoint_name)
            .await?;
        let now = self.clock.now();
        let plan = plan(
            type_name,
            type_config.date_time_filter.as_ref(),
            last.as_ref(),
            now,
        )?;
        self.report_filter(&plan);

        let records = self
            .collaborators
            .records
            .find_records(&plan.selection)
            .await?;
        let candidates = records.len() as u64;
        self.reporter
            .line(&format!("- {candidates} entries to anonymize.."));

        tracing::info!(
            type_name = %type_name,
            candidates,
            lower_bound = ?plan.lower_bound(),
            upper_bound = ?plan.upper_bound,
            "Selected records"
        );

        let mut records_updated = 0u64;
        let mut fields_masked = 0u64;

        for mut record in records {
            if options.is_verbose() {
                self.reporter.line(&self.record_heading(record.identifier()));
            }

            for (field, policy) in &type_config.properties {
                let Some(old) = record.field(field).cloned() else {
                    self.reporter.line(&format!(
                        "- Property {field} not found in {label} {type_name}."
                    ));
                    continue;
                };

                let Some(masked) = self.masker.mask(field, policy, &old) else {
                    continue;
                };

                if options.is_verbose() {
                    self.reporter.line(&masked.describe(field, &old));
                }
                fields_masked += 1;

                if !options.test {
                    self.apply(record.as_mut(), field, masked).await?;
                }
            }

            if !options.test && record.is_changed() {
                self.collaborators
                    .records
                    .update_record(record.as_ref())
                    .await?;
                records_updated += 1;
            }
        }

        self.reporter.line("Done.");
        self.reporter.line("");

        let checkpoint = if options.test {
            None
        } else {
            let checkpoint = CheckpointBuilder::new(checkpoint_name, plan.upper_bound.unwrap_or(now))
                .from_time(last.map(|last| last.to_time))
                .executed_at(self.clock.now())
                .records_processed(candidates)
                .build();
            self.collaborators.checkpoints.append(&checkpoint).await?;
            Some(checkpoint)
        };

        Ok(TypeOutcome::Processed {
            candidates,
            records_updated,
            fields_masked,
            checkpoint,
        })
    }

    /// Store a masked value on the record
    async fn apply(&self, record: &mut dyn Record, field: &str, masked: MaskedValue) -> Result<()> {
        let value = match masked {
            MaskedValue::Shuffled(value) | MaskedValue::Anonymized(value) => value,
            MaskedValue::DeleteAsset => FieldValue::Null,
            MaskedValue::SubstituteAsset { asset, source } => {
                FieldValue::Asset(self.substitute_asset(asset, &source).await?)
            }
        };

        record.set_field(field, value);
        Ok(())
    }

    /// Swap the asset's resource for the dummy file, keeping filename and collection
    async fn substitute_asset(&self, asset: Asset, source: &Path) -> Result<Asset> {
        let content = tokio::fs::read(source).await.map_err(|e| {
            AnonymizerError::Resource(format!(
                "Failed to read dummy asset {} for {}: {e}",
                source.display(),
                asset.media_type
            ))
        })?;

        let resource = self
            .collaborators
            .resources
            .import_resource(content, &asset.resource.filename, &asset.resource.collection)
            .await?;

        tracing::debug!(
            asset = %asset.identifier,
            sha256 = %resource.sha256,
            "Substituted asset resource"
        );

        let asset = asset.with_resource(resource);
        self.collaborators.assets.update_asset(&asset).await?;
        Ok(asset)
    }

    fn report_filter(&self, plan: &SelectionPlan) {
        let Some(window) = plan.selection.window.as_ref() else {
            return;
        };

        let newer_than = window
            .from
            .map(|from| format!(" but newer than \"{}\"", from.format(DISPLAY_FORMAT)))
            .unwrap_or_default();

        let terminator = match self.family {
            RecordFamily::NodeType => ".",
            RecordFamily::DomainModel => "..",
        };

        self.reporter.line(&format!(
            "- Filter by DateTime Property \"{}\" older than \"{}\"{newer_than}{terminator}",
            window.field,
            window.until.format(DISPLAY_FORMAT)
        ));
    }

    fn record_heading(&self, identifier: &str) -> String {
        match self.family {
            RecordFamily::NodeType => format!("{identifier}:"),
            RecordFamily::DomainModel => format!("- {identifier}:"),
        }
    }
}

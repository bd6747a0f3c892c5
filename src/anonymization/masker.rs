//! Field masking
//!
//! [`FieldMasker`] decides how a single field value changes under its policy.
//! It performs no I/O: asset substitution is returned as a plan that the run
//! orchestrator carries out.

use super::anonymizer::{Anonymizer, RandomizeStrategy, ShuffleStrategy};
use super::config::FieldPolicy;
use crate::domain::{Asset, FieldValue};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Outcome of masking one field
#[derive(Debug, Clone, PartialEq)]
pub enum MaskedValue {
    /// Characters or digits permuted
    Shuffled(FieldValue),
    /// Content replaced with random characters
    Anonymized(FieldValue),
    /// Asset resource to be replaced by the dummy file at `source`
    SubstituteAsset { asset: Asset, source: PathBuf },
    /// Asset with no dummy for its media type; the field is cleared
    DeleteAsset,
}

impl MaskedValue {
    /// Report line describing the change of `field` from `old`
    pub fn describe(&self, field: &str, old: &FieldValue) -> String {
        match self {
            // Timestamps are reported as shuffled under either strategy
            Self::Shuffled(new) | Self::Anonymized(new @ FieldValue::Timestamp(_)) => {
                format!("- Shuffling property \"{field}\" from \"{old}\" to \"{new}\"")
            }
            Self::Anonymized(new) => {
                format!("- Anonymizing property \"{field}\" from \"{old}\" to \"{new}\"")
            }
            Self::SubstituteAsset { .. } => {
                format!("- Anonymizing property \"{field}\" from \"Asset\" to \"DummyAsset\"")
            }
            Self::DeleteAsset => {
                format!("- Anonymizing property \"{field}\" by deleting \"Asset\"")
            }
        }
    }
}

/// Applies field policies with an injected random source
pub struct FieldMasker {
    dummy_assets: BTreeMap<String, PathBuf>,
    rng: Box<dyn RngCore + Send>,
}

impl FieldMasker {
    /// Creates a masker seeded from OS entropy
    pub fn new(dummy_assets: BTreeMap<String, PathBuf>) -> Self {
        Self::with_rng(dummy_assets, Box::new(StdRng::from_entropy()))
    }

    /// Creates a masker drawing from the given RNG
    pub fn with_rng(
        dummy_assets: BTreeMap<String, PathBuf>,
        rng: Box<dyn RngCore + Send>,
    ) -> Self {
        Self { dummy_assets, rng }
    }

    /// Masks `old` according to `policy`
    ///
    /// Returns `None` when the policy does not apply to the value's type.
    pub fn mask(&mut self, field: &str, policy: &FieldPolicy, old: &FieldValue) -> Option<MaskedValue> {
        if let FieldValue::Asset(asset) = old {
            return Some(match self.dummy_assets.get(&asset.media_type) {
                Some(source) => MaskedValue::SubstituteAsset {
                    asset: asset.clone(),
                    source: source.clone(),
                },
                None => MaskedValue::DeleteAsset,
            });
        }

        let strategy: &dyn Anonymizer = if policy.shuffle {
            &ShuffleStrategy
        } else if policy.anonymize {
            &RandomizeStrategy
        } else {
            return None;
        };

        let masked = match old {
            FieldValue::Text(text) => FieldValue::Text(strategy.mask_text(text, self.rng.as_mut())),
            FieldValue::Timestamp(ts) => match strategy.mask_timestamp(ts, self.rng.as_mut()) {
                Some(masked) => FieldValue::Timestamp(masked),
                None => {
                    tracing::warn!(
                        field = %field,
                        strategy = strategy.name(),
                        "Masked timestamp is out of range, keeping original value"
                    );
                    return None;
                }
            },
            _ => return None,
        };

        Some(if policy.shuffle {
            MaskedValue::Shuffled(masked)
        } else {
            MaskedValue::Anonymized(masked)
        })
    }
}

impl std::fmt::Debug for FieldMasker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldMasker")
            .field("dummy_assets", &self.dummy_assets)
            .finish_non_exhaustive()
    }
}

//! Masking strategy module
//!
//! Provides the two strategies a field policy can select.

pub mod randomize;
pub mod shuffle;

pub use randomize::RandomizeStrategy;
pub use shuffle::ShuffleStrategy;

use chrono::NaiveDateTime;
use rand::RngCore;

/// Trait for masking strategy implementations
///
/// Strategies are stateless; all randomness comes from the caller's RNG so a
/// seeded generator makes runs reproducible.
pub trait Anonymizer: Send + Sync {
    /// Strategy name used in log fields
    fn name(&self) -> &'static str;

    /// Mask a string value
    fn mask_text(&self, value: &str, rng: &mut dyn RngCore) -> String;

    /// Mask a timestamp value
    ///
    /// Returns `None` if no valid timestamp can be produced.
    fn mask_timestamp(&self, value: &NaiveDateTime, rng: &mut dyn RngCore)
        -> Option<NaiveDateTime>;
}

//! Randomize strategy
//!
//! Replaces content with random characters. Only the length of a string
//! survives; a timestamp's original value is not consulted at all.

use super::Anonymizer;
use crate::anonymization::timestamp;
use chrono::NaiveDateTime;
use rand::{Rng, RngCore};

/// Replaces every code point with a random lowercase letter and timestamps with
/// random digits
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomizeStrategy;

impl Anonymizer for RandomizeStrategy {
    fn name(&self) -> &'static str {
        "anonymize"
    }

    fn mask_text(&self, value: &str, rng: &mut dyn RngCore) -> String {
        value
            .chars()
            .map(|_| char::from(rng.gen_range(b'a'..=b'z')))
            .collect()
    }

    fn mask_timestamp(
        &self,
        _value: &NaiveDateTime,
        rng: &mut dyn RngCore,
    ) -> Option<NaiveDateTime> {
        let digits: String = timestamp::ANONYMIZE_TEMPLATE
            .chars()
            .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
            .collect();
        timestamp::from_digits(&digits)
    }
}

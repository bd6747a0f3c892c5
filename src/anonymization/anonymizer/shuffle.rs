//! Shuffle strategy
//!
//! Keeps the multiset of characters (or timestamp digits) and only changes
//! their order.

use super::Anonymizer;
use crate::anonymization::timestamp;
use chrono::NaiveDateTime;
use rand::seq::SliceRandom;
use rand::RngCore;

/// Uniformly permutes code points or timestamp digits
#[derive(Debug, Clone, Copy, Default)]
pub struct ShuffleStrategy;

impl Anonymizer for ShuffleStrategy {
    fn name(&self) -> &'static str {
        "shuffle"
    }

    fn mask_text(&self, value: &str, rng: &mut dyn RngCore) -> String {
        let mut chars: Vec<char> = value.chars().collect();
        chars.shuffle(rng);
        chars.into_iter().collect()
    }

    fn mask_timestamp(
        &self,
        value: &NaiveDateTime,
        rng: &mut dyn RngCore,
    ) -> Option<NaiveDateTime> {
        let mut digits: Vec<char> = timestamp::to_digits(value).chars().collect();
        digits.shuffle(rng);
        timestamp::from_digits(&digits.into_iter().collect::<String>())
    }
}

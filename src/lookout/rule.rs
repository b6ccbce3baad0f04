//! A single delay-gated threshold predicate.
//!
//! ```text
//!                 unsafe rule                safe rule
//!  inactive       → unsatisfied              → satisfied
//!  missing, flag  → satisfied                → unsatisfied
//!  missing, !flag → unsatisfied              → satisfied
//!  value          ≥ threshold trips timer    < threshold trips timer
//!  timer          satisfied once now - trip ≥ delay
//! ```
//!
//! `flag` is the rule's `missing_is_unsafe`.
//!
//! The trip timestamp is only cleared by the paired rule (see
//! [`QuantityRules`](super::quantity::QuantityRules)).  A value that retreats
//! across the threshold leaves it in place, so a later re-trip can confirm
//! immediately.

use crate::config::RuleConfig;
use crate::sensors::Reading;

/// Which way a rule votes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// Satisfied means "close the dome".
    Unsafe,
    /// Satisfied means "this quantity allows opening".
    Safe,
}

/// Result of one [`ThresholdRule::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Rule disabled; carries the polarity default.
    Inactive,
    /// Condition not met (or reading unusable).
    Unsatisfied,
    /// Condition met, confirm delay still running.
    Pending,
    /// Condition met long enough, or missing data escalated.  The paired
    /// rule's timer must be cleared.
    Confirmed,
}

#[derive(Debug, Clone)]
pub struct ThresholdRule<T> {
    polarity: Polarity,
    active: bool,
    missing_is_unsafe: bool,
    threshold: T,
    delay_secs: u32,
    trip_at: Option<u64>,
    satisfied: bool,
}

impl<T: PartialOrd + Copy> ThresholdRule<T> {
    pub fn new(polarity: Polarity, cfg: RuleConfig<T>) -> Self {
        Self {
            polarity,
            active: cfg.active,
            missing_is_unsafe: cfg.missing_is_unsafe,
            threshold: cfg.threshold,
            delay_secs: cfg.delay_secs,
            trip_at: None,
            satisfied: polarity == Polarity::Safe && !cfg.active,
        }
    }

    /// Evaluate against one reading at `now_secs` (monotonic seconds).
    pub fn check(&mut self, reading: Reading<T>, now_secs: u64) -> Verdict {
        let verdict = if !self.active {
            Verdict::Inactive
        } else if !reading.available {
            // Unsafe rules escalate a missing reading; safe rules let it
            // block opening.  Otherwise the quantity is ignored.
            match (self.polarity, self.missing_is_unsafe) {
                (Polarity::Unsafe, true) | (Polarity::Safe, false) => Verdict::Confirmed,
                (Polarity::Unsafe, false) | (Polarity::Safe, true) => Verdict::Unsatisfied,
            }
        } else if self.tripping(reading.value) {
            let trip = *self.trip_at.get_or_insert(now_secs);
            if now_secs.saturating_sub(trip) >= u64::from(self.delay_secs) {
                Verdict::Confirmed
            } else {
                Verdict::Pending
            }
        } else {
            Verdict::Unsatisfied
        };

        self.satisfied = match verdict {
            Verdict::Inactive => self.polarity == Polarity::Safe,
            Verdict::Confirmed => true,
            Verdict::Unsatisfied | Verdict::Pending => false,
        };
        verdict
    }

    // NaN readings never pass a `<` comparison: unsafe rules trip, safe
    // rules cannot confirm.
    #[allow(clippy::neg_cmp_op_on_partial_ord)]
    fn tripping(&self, value: T) -> bool {
        match self.polarity {
            Polarity::Unsafe => !(value < self.threshold),
            Polarity::Safe => value < self.threshold,
        }
    }

    /// Forget the first-trip timestamp.  Called by the paired rule.
    pub fn clear_timer(&mut self) {
        self.trip_at = None;
    }

    pub fn satisfied(&self) -> bool {
        self.satisfied
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn trip_at(&self) -> Option<u64> {
        self.trip_at
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }
}

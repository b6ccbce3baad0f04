//! Unsafe and safe rules for one monitored quantity.
//!
//! Rules reference their pair by index inside fixed arrays.  Unsafe rule `i`
//! pairs with safe rule `min(i, S - 1)`, so wind (2 unsafe, 1 safe) shares
//! its safe rule between both unsafe thresholds while cloud coverage
//! (2 + 2) pairs one-to-one.

use log::{debug, info};

use super::rule::{Polarity, ThresholdRule, Verdict};
use crate::config::RuleConfig;
use crate::sensors::Reading;

/// What one quantity contributes to the decision fold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Votes {
    /// Any unsafe rule satisfied.
    pub any_unsafe: bool,
    /// Every safe rule satisfied.
    pub all_safe: bool,
}

#[derive(Debug, Clone)]
pub struct QuantityRules<T, const U: usize, const S: usize> {
    name: &'static str,
    unsafe_rules: [ThresholdRule<T>; U],
    safe_rules: [ThresholdRule<T>; S],
}

impl<T: PartialOrd + Copy, const U: usize, const S: usize> QuantityRules<T, U, S> {
    pub fn new(name: &'static str, unsafe_cfg: &[RuleConfig<T>; U], safe_cfg: &[RuleConfig<T>; S]) -> Self {
        Self {
            name,
            unsafe_rules: core::array::from_fn(|i| ThresholdRule::new(Polarity::Unsafe, unsafe_cfg[i])),
            safe_rules: core::array::from_fn(|i| ThresholdRule::new(Polarity::Safe, safe_cfg[i])),
        }
    }

    const fn pair_of(unsafe_idx: usize) -> usize {
        if unsafe_idx < S { unsafe_idx } else { S - 1 }
    }

    /// Evaluate every rule once, unsafe rules first.  No short-circuit:
    /// each rule's timer and flag advance every cycle.
    pub fn evaluate(&mut self, reading: Reading<T>, now_secs: u64) -> Votes {
        let mut any_unsafe = false;
        for i in 0..U {
            let was = self.unsafe_rules[i].satisfied();
            if self.unsafe_rules[i].check(reading, now_secs) == Verdict::Confirmed && S > 0 {
                self.safe_rules[Self::pair_of(i)].clear_timer();
            }
            let now = self.unsafe_rules[i].satisfied();
            if now != was {
                info!("lookout: unsafe {} #{} {}", self.name, i + 1, if now { "tripped" } else { "cleared" });
            }
            any_unsafe |= now;
        }

        let mut all_safe = true;
        for j in 0..S {
            let was = self.safe_rules[j].satisfied();
            if self.safe_rules[j].check(reading, now_secs) == Verdict::Confirmed {
                for i in (0..U).filter(|&i| Self::pair_of(i) == j) {
                    self.unsafe_rules[i].clear_timer();
                }
            }
            let now = self.safe_rules[j].satisfied();
            if now != was {
                debug!("lookout: safe {} #{} {}", self.name, j + 1, if now { "confirmed" } else { "lost" });
            }
            all_safe &= now;
        }

        Votes { any_unsafe, all_safe }
    }

    /// Clear every safe rule's timer (used when the rain event fires).
    pub fn clear_safe_timers(&mut self) {
        self.safe_rules.iter_mut().for_each(ThresholdRule::clear_timer);
    }

    pub fn unsafe_flags(&self) -> [bool; U] {
        core::array::from_fn(|i| self.unsafe_rules[i].satisfied())
    }

    pub fn safe_flags(&self) -> [bool; S] {
        core::array::from_fn(|j| self.safe_rules[j].satisfied())
    }

    pub fn unsafe_rule(&self, i: usize) -> &ThresholdRule<T> {
        &self.unsafe_rules[i]
    }

    pub fn safe_rule(&self, j: usize) -> &ThresholdRule<T> {
        &self.safe_rules[j]
    }
}

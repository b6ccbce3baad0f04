//! Lookout — the rule-based safety evaluator.
//!
//! ```text
//!  SensorSnapshot ──▶ wind  ┐ unsafe rules ─OR──▶ any_unsafe ┐
//!                    cloud ├                                ├─▶ fold ─▶ Decision
//!                    rain  ┘ safe rules ───AND─▶ all_safe   ┘    ▲
//!  rain-event latch ──────────── short-circuits the cycle ───────┘
//! ```
//!
//! The decision is path-dependent: once safe it stays safe until an unsafe
//! rule actively trips, without re-confirming the safe rules.  From unsafe
//! it only returns to safe when every safe rule holds and no unsafe rule
//! does.
//!
//! All rule state lives in a [`Lookout`] instance owned by the lookout task.

pub mod latch;
pub mod quantity;
pub mod rule;
pub mod status;

use log::{error, info, warn};
use serde::Serialize;

use crate::config::LookoutConfig;
use crate::dome::state::ShutterCommand;
use crate::error::SafetyAlarm;
use crate::sensors::SensorSnapshot;
use quantity::{QuantityRules, Votes};
use status::RulesState;

/// Output of one lookout cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Decision {
    Safe,
    Unsafe,
}

impl Decision {
    pub fn is_safe(self) -> bool {
        self == Self::Safe
    }

    /// Safe opens, unsafe closes.
    pub fn command(self) -> ShutterCommand {
        match self {
            Self::Safe => ShutterCommand::Open,
            Self::Unsafe => ShutterCommand::Close,
        }
    }
}

/// Outcome of folding one cycle's votes against the previous decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Already safe and nothing tripped.
    HoldSafe,
    /// Some unsafe rule holds, or some safe rule does not.
    Unsafe,
    /// Was unsafe, every safe rule holds and nothing tripped.
    Safe,
    /// None of the above matched.
    Inconsistent,
}

impl Transition {
    pub fn fold(previously_safe: bool, votes: Votes) -> Self {
        let Votes { any_unsafe, all_safe } = votes;
        if previously_safe && !any_unsafe {
            Self::HoldSafe
        } else if !all_safe || any_unsafe {
            Self::Unsafe
        } else if !previously_safe {
            Self::Safe
        } else {
            Self::Inconsistent
        }
    }
}

/// The rain-event rule: no threshold, no delay.
#[derive(Debug, Clone)]
struct RainEventRule {
    active: bool,
    missing_is_unsafe: bool,
    satisfied: bool,
}

pub struct Lookout {
    wind: QuantityRules<f32, 2, 1>,
    cloud: QuantityRules<f32, 2, 2>,
    rain: QuantityRules<u8, 1, 1>,
    rain_event: RainEventRule,
    safe: bool,
    last_votes: Votes,
    alarm: Option<SafetyAlarm>,
}

impl Lookout {
    /// Build every rule from configuration.  Starts unsafe.
    pub fn new(cfg: &LookoutConfig) -> Self {
        Self {
            wind: QuantityRules::new("wind_speed", &cfg.unsafe_wind_speed, &cfg.safe_wind_speed),
            cloud: QuantityRules::new("cloud_coverage", &cfg.unsafe_cloud_coverage, &cfg.safe_cloud_coverage),
            rain: QuantityRules::new("rain_intensity", &cfg.unsafe_rain_intensity, &cfg.safe_rain_intensity),
            rain_event: RainEventRule {
                active: cfg.unsafe_rain_event.active,
                missing_is_unsafe: cfg.unsafe_rain_event.missing_is_unsafe,
                satisfied: false,
            },
            safe: false,
            last_votes: Votes {
                any_unsafe: false,
                all_safe: false,
            },
            alarm: None,
        }
    }

    /// Rebuild the rules from new configuration.  Timers restart and the
    /// decision drops back to unsafe.
    pub fn reconfigure(&mut self, cfg: &LookoutConfig) {
        *self = Self::new(cfg);
        info!("lookout: rules rebuilt from new configuration");
    }

    /// Run one cycle.  `rain_event` is the consumed latch value.
    pub fn evaluate(&mut self, snapshot: &SensorSnapshot, rain_event: bool, now_secs: u64) -> Decision {
        if rain_event {
            if self.rain_event.active {
                warn!("lookout: rain event, skipping other rules this cycle");
                self.rain_event.satisfied = true;
                self.rain.clear_safe_timers();
                let votes = Votes {
                    any_unsafe: true,
                    all_safe: false,
                };
                return self.apply(Transition::fold(self.safe, votes), votes);
            }
            info!("lookout: rain event ignored, rule inactive");
        }

        let mut votes = self.wind.evaluate(snapshot.wind_speed, now_secs);
        let cloud = self.cloud.evaluate(snapshot.cloud_coverage, now_secs);
        let rain = self.rain.evaluate(snapshot.rain_intensity, now_secs);

        self.rain_event.satisfied =
            self.rain_event.active && self.rain_event.missing_is_unsafe && !snapshot.rain_intensity.available;

        votes.any_unsafe |= cloud.any_unsafe | rain.any_unsafe | self.rain_event.satisfied;
        votes.all_safe &= cloud.all_safe & rain.all_safe;

        self.apply(Transition::fold(self.safe, votes), votes)
    }

    fn apply(&mut self, transition: Transition, votes: Votes) -> Decision {
        self.last_votes = votes;
        let was_safe = self.safe;
        self.safe = match transition {
            Transition::HoldSafe | Transition::Safe => true,
            Transition::Unsafe => false,
            Transition::Inconsistent => {
                error!(
                    "lookout: inconsistent decision (safe={}, any_unsafe={}, all_safe={}), forcing unsafe",
                    was_safe, votes.any_unsafe, votes.all_safe
                );
                self.alarm = Some(SafetyAlarm::InconsistentDecision);
                false
            }
        };
        if self.safe != was_safe {
            if self.safe {
                info!("lookout: conditions SAFE");
            } else {
                warn!("lookout: conditions UNSAFE");
            }
        }
        self.decision()
    }

    pub fn decision(&self) -> Decision {
        if self.safe { Decision::Safe } else { Decision::Unsafe }
    }

    pub fn is_safe(&self) -> bool {
        self.safe
    }

    /// Votes from the most recent cycle.
    pub fn last_votes(&self) -> Votes {
        self.last_votes
    }

    /// Alarm raised by the last cycle, if any.  Cleared on read.
    pub fn take_alarm(&mut self) -> Option<SafetyAlarm> {
        self.alarm.take()
    }

    pub fn rules_state(&self) -> RulesState {
        RulesState {
            unsafe_wind_speed: self.wind.unsafe_flags(),
            safe_wind_speed: self.wind.safe_flags(),
            unsafe_cloud_coverage: self.cloud.unsafe_flags(),
            safe_cloud_coverage: self.cloud.safe_flags(),
            unsafe_rain_intensity: self.rain.unsafe_flags(),
            safe_rain_intensity: self.rain.safe_flags(),
            unsafe_rain_event: self.rain_event.satisfied,
        }
    }

    pub fn wind(&self) -> &QuantityRules<f32, 2, 1> {
        &self.wind
    }

    pub fn rain(&self) -> &QuantityRules<u8, 1, 1> {
        &self.rain
    }
}

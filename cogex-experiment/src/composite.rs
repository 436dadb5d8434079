//! Reduces a battery into one 0..=100 score and a level.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw battery measurements; any of them may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatteryResult {
    pub reaction_ms_avg: Option<f64>,
    pub stroop_acc: Option<f64>,
    pub nback_acc: Option<f64>,
    pub memory_level: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    Medium,
    High,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Level::Low => "low",
            Level::Medium => "medium",
            Level::High => "high",
        })
    }
}

impl Level {
    pub fn from_composite(composite: u32) -> Self {
        if composite >= 80 {
            Level::High
        } else if composite >= 60 {
            Level::Medium
        } else {
            Level::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
    pub reaction: f64,
    pub stroop: f64,
    pub nback: f64,
    pub memory: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeScore {
    pub composite: u32,
    pub level: Level,
}

const REACTION_WEIGHT: f64 = 35.0;
const STROOP_WEIGHT: f64 = 25.0;
const NBACK_WEIGHT: f64 = 25.0;
const MEMORY_WEIGHT: f64 = 15.0;

fn accuracy_score(acc: Option<f64>) -> f64 {
    match acc {
        Some(a) if a.is_finite() => a.clamp(0.0, 100.0),
        _ => 0.0,
    }
}

/// Each component on a 0..=100 scale. A latency that is missing, not
/// positive or not finite scores 0.
pub fn sub_scores(result: &BatteryResult) -> SubScores {
    let reaction = match result.reaction_ms_avg {
        Some(ms) if ms.is_finite() && ms > 0.0 => {
            (100.0 - ((ms - 150.0) / 3.0).min(100.0)).clamp(0.0, 100.0)
        }
        _ => 0.0,
    };
    let memory = result
        .memory_level
        .map_or(0.0, |level| (f64::from(level) * 10.0).min(100.0));
    SubScores {
        reaction,
        stroop: accuracy_score(result.stroop_acc),
        nback: accuracy_score(result.nback_acc),
        memory,
    }
}

pub fn score(result: &BatteryResult) -> CompositeScore {
    let s = sub_scores(result);
    let weighted = (REACTION_WEIGHT * s.reaction
        + STROOP_WEIGHT * s.stroop
        + NBACK_WEIGHT * s.nback
        + MEMORY_WEIGHT * s.memory)
        / 100.0;
    let composite = weighted.round().clamp(0.0, 100.0) as u32;
    CompositeScore {
        composite,
        level: Level::from_composite(composite),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn battery(rt: Option<f64>, s: Option<f64>, n: Option<f64>, m: Option<u32>) -> BatteryResult {
        BatteryResult {
            reaction_ms_avg: rt,
            stroop_acc: s,
            nback_acc: n,
            memory_level: m,
        }
    }

    #[test]
    fn reference_battery_rounds_half_up() {
        let r = battery(Some(300.0), Some(60.0), Some(50.0), Some(1));
        assert_eq!(sub_scores(&r).reaction, 50.0);
        assert_eq!(
            score(&r),
            CompositeScore {
                composite: 47,
                level: Level::Low,
            }
        );
    }

    #[test]
    fn perfect_and_empty_batteries() {
        let best = battery(Some(150.0), Some(100.0), Some(100.0), Some(12));
        assert_eq!(score(&best).composite, 100);
        assert_eq!(score(&best).level, Level::High);
        assert_eq!(score(&BatteryResult::default()).composite, 0);
    }

    #[test]
    fn degenerate_latencies_score_zero() {
        for rt in [None, Some(0.0), Some(-20.0), Some(f64::NAN), Some(f64::INFINITY)] {
            assert_eq!(sub_scores(&battery(rt, None, None, None)).reaction, 0.0);
        }
        // Faster than the floor is capped, slower than 450 ms bottoms out.
        assert_eq!(sub_scores(&battery(Some(90.0), None, None, None)).reaction, 100.0);
        assert_eq!(sub_scores(&battery(Some(900.0), None, None, None)).reaction, 0.0);
    }

    #[test]
    fn level_thresholds() {
        assert_eq!(Level::from_composite(80), Level::High);
        assert_eq!(Level::from_composite(79), Level::Medium);
        assert_eq!(Level::from_composite(60), Level::Medium);
        assert_eq!(Level::from_composite(59), Level::Low);
    }

    #[test]
    fn serde_accepts_partial_input() {
        let r: BatteryResult = serde_json::from_str(r#"{"stroop_acc": 85.0}"#).unwrap();
        assert_eq!(r.stroop_acc, Some(85.0));
        assert_eq!(r.reaction_ms_avg, None);
        let json = serde_json::to_value(score(&r)).unwrap();
        assert_eq!(json["level"], "low");
    }

    proptest! {
        #[test]
        fn scorer_is_total_and_bounded(
            rt in proptest::option::of(proptest::num::f64::ANY),
            s in proptest::option::of(proptest::num::f64::ANY),
            n in proptest::option::of(proptest::num::f64::ANY),
            m in proptest::option::of(any::<u32>()),
        ) {
            let result = score(&battery(rt, s, n, m));
            prop_assert!(result.composite <= 100);
            prop_assert_eq!(result.level, Level::from_composite(result.composite));
        }

        #[test]
        fn faster_reaction_never_lowers_the_score(a in 1.0f64..2_000.0, b in 1.0f64..2_000.0) {
            let (fast, slow) = if a <= b { (a, b) } else { (b, a) };
            let sf = sub_scores(&battery(Some(fast), None, None, None)).reaction;
            let ss = sub_scores(&battery(Some(slow), None, None, None)).reaction;
            prop_assert!(sf >= ss);
        }
    }
}

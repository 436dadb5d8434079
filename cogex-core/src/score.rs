//! Durable best-score records and the rules that decide when a new run
//! replaces them. The rules are pure; storage lives in `cogex-experiment`.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BestScore {
    Latency { ms: u64 },
    Level { level: u32 },
    Accuracy { pct: u32 },
    AccuracyLatency { accuracy_pct: u32, mean_latency_ms: u64 },
}

impl fmt::Display for BestScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BestScore::Latency { ms } => write!(f, "{ms} ms"),
            BestScore::Level { level } => write!(f, "level {level}"),
            BestScore::Accuracy { pct } => write!(f, "{pct}%"),
            BestScore::AccuracyLatency {
                accuracy_pct,
                mean_latency_ms,
            } => write!(f, "{accuracy_pct}%, {mean_latency_ms} ms"),
        }
    }
}

/// "Better wins" comparison, one per game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BestRule {
    LowerLatency,
    HigherLevel,
    HigherAccuracy,
    /// Accuracy first, lower mean latency breaks ties.
    AccuracyThenLatency,
}

impl BestRule {
    /// True when `candidate` strictly improves on `current`.
    ///
    /// A candidate of the wrong shape for this rule never wins. A stored value
    /// of the wrong shape is treated as missing.
    pub fn improves(&self, candidate: &BestScore, current: Option<&BestScore>) -> bool {
        if !self.accepts(candidate) {
            return false;
        }
        let Some(current) = current.filter(|c| self.accepts(c)) else {
            return true;
        };
        match (self, candidate, current) {
            (BestRule::LowerLatency, BestScore::Latency { ms: new }, BestScore::Latency { ms: old }) => {
                new < old
            }
            (BestRule::HigherLevel, BestScore::Level { level: new }, BestScore::Level { level: old }) => {
                new > old
            }
            (
                BestRule::HigherAccuracy,
                BestScore::Accuracy { pct: new },
                BestScore::Accuracy { pct: old },
            ) => new > old,
            (
                BestRule::AccuracyThenLatency,
                BestScore::AccuracyLatency {
                    accuracy_pct: new_acc,
                    mean_latency_ms: new_rt,
                },
                BestScore::AccuracyLatency {
                    accuracy_pct: old_acc,
                    mean_latency_ms: old_rt,
                },
            ) => new_acc > old_acc || (new_acc == old_acc && new_rt < old_rt),
            _ => false,
        }
    }

    pub fn accepts(&self, score: &BestScore) -> bool {
        matches!(
            (self, score),
            (BestRule::LowerLatency, BestScore::Latency { .. })
                | (BestRule::HigherLevel, BestScore::Level { .. })
                | (BestRule::HigherAccuracy, BestScore::Accuracy { .. })
                | (BestRule::AccuracyThenLatency, BestScore::AccuracyLatency { .. })
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn stroop(acc: u32, rt: u64) -> BestScore {
        BestScore::AccuracyLatency {
            accuracy_pct: acc,
            mean_latency_ms: rt,
        }
    }

    #[test]
    fn first_value_always_wins() {
        assert!(BestRule::LowerLatency.improves(&BestScore::Latency { ms: 900 }, None));
        assert!(BestRule::HigherLevel.improves(&BestScore::Level { level: 0 }, None));
    }

    #[test]
    fn stroop_prefers_accuracy_then_latency() {
        let rule = BestRule::AccuracyThenLatency;
        assert!(rule.improves(&stroop(90, 800), Some(&stroop(85, 500))));
        assert!(rule.improves(&stroop(85, 499), Some(&stroop(85, 500))));
        assert!(!rule.improves(&stroop(85, 500), Some(&stroop(85, 500))));
        assert!(!rule.improves(&stroop(80, 100), Some(&stroop(85, 500))));
    }

    #[test]
    fn equal_scores_never_replace() {
        assert!(!BestRule::LowerLatency.improves(
            &BestScore::Latency { ms: 250 },
            Some(&BestScore::Latency { ms: 250 })
        ));
        assert!(!BestRule::HigherAccuracy.improves(
            &BestScore::Accuracy { pct: 80 },
            Some(&BestScore::Accuracy { pct: 80 })
        ));
    }

    #[test]
    fn shapes_are_checked() {
        let rule = BestRule::HigherLevel;
        assert!(!rule.improves(&BestScore::Accuracy { pct: 99 }, None));
        assert!(rule.improves(
            &BestScore::Level { level: 1 },
            Some(&BestScore::Latency { ms: 5 })
        ));
    }

    #[test]
    fn serialized_shape_is_tagged() {
        let json = serde_json::to_string(&stroop(95, 480)).unwrap();
        assert_eq!(
            json,
            r#"{"kind":"accuracy_latency","accuracy_pct":95,"mean_latency_ms":480}"#
        );
    }

    proptest! {
        #[test]
        fn stroop_best_never_regresses(runs in proptest::collection::vec((0u32..=100, 200u64..2000), 1..40)) {
            let rule = BestRule::AccuracyThenLatency;
            let mut best: Option<BestScore> = None;
            for (acc, rt) in runs {
                let before = best;
                let candidate = stroop(acc, rt);
                if rule.improves(&candidate, best.as_ref()) {
                    best = Some(candidate);
                }
                if let (Some(BestScore::AccuracyLatency { accuracy_pct: a0, mean_latency_ms: r0 }),
                        Some(BestScore::AccuracyLatency { accuracy_pct: a1, mean_latency_ms: r1 })) = (before, best) {
                    prop_assert!(a1 > a0 || (a1 == a0 && r1 <= r0));
                }
            }
        }

        #[test]
        fn latency_best_is_running_minimum(values in proptest::collection::vec(1u64..5000, 1..50)) {
            let rule = BestRule::LowerLatency;
            let mut best: Option<BestScore> = None;
            for ms in &values {
                let candidate = BestScore::Latency { ms: *ms };
                if rule.improves(&candidate, best.as_ref()) {
                    best = Some(candidate);
                }
            }
            let min = values.iter().copied().min().unwrap();
            prop_assert_eq!(best, Some(BestScore::Latency { ms: min }));
        }
    }
}

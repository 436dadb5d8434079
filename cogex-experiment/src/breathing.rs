//! Paced breathing: inhale, hold, exhale, repeat. Not scored.

use cogex_core::ConfigError;
use tracing::debug;

pub const MIN_SPEED: f64 = 0.5;
pub const MAX_SPEED: f64 = 2.0;

const INHALE_MS: f64 = 4000.0;
const HOLD_MS: f64 = 4000.0;
const EXHALE_MS: f64 = 6000.0;
const NANOS_PER_MS: u64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreathPhase {
    Inhale,
    Hold,
    Exhale,
}

impl BreathPhase {
    pub fn label(&self) -> &'static str {
        match self {
            BreathPhase::Inhale => "Inhale",
            BreathPhase::Hold => "Hold",
            BreathPhase::Exhale => "Exhale",
        }
    }

    fn next(&self) -> Self {
        match self {
            BreathPhase::Inhale => BreathPhase::Hold,
            BreathPhase::Hold => BreathPhase::Exhale,
            BreathPhase::Exhale => BreathPhase::Inhale,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BreathingPacer {
    speed: f64,
    current: Option<(BreathPhase, u64)>,
    cycles: u32,
}

impl BreathingPacer {
    /// `speed` divides every phase duration; 0.5..=2.0.
    pub fn new(speed: f64) -> Result<Self, ConfigError> {
        if !(MIN_SPEED..=MAX_SPEED).contains(&speed) {
            return Err(ConfigError::invalid(
                "breathing.speed",
                format!("{speed} is outside {MIN_SPEED}..={MAX_SPEED}"),
            ));
        }
        Ok(Self {
            speed,
            current: None,
            cycles: 0,
        })
    }

    pub fn duration_ms(&self, phase: BreathPhase) -> u64 {
        let base = match phase {
            BreathPhase::Inhale => INHALE_MS,
            BreathPhase::Hold => HOLD_MS,
            BreathPhase::Exhale => EXHALE_MS,
        };
        (base / self.speed).round() as u64
    }

    pub fn is_running(&self) -> bool {
        self.current.is_some()
    }

    /// Begins with an inhale. A no-op returning false while running.
    pub fn start(&mut self, now: u64) -> bool {
        if self.is_running() {
            return false;
        }
        self.current = Some((BreathPhase::Inhale, now));
        self.cycles = 0;
        debug!(speed = self.speed, "breathing pacer started");
        true
    }

    pub fn stop(&mut self) -> bool {
        self.current.take().is_some()
    }

    pub fn phase(&self) -> Option<BreathPhase> {
        self.current.map(|(phase, _)| phase)
    }

    pub fn phase_label(&self) -> &'static str {
        self.phase().map_or("Ready", |p| p.label())
    }

    /// Completed inhale-hold-exhale cycles since start.
    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    pub fn next_transition(&self) -> Option<u64> {
        self.current
            .map(|(phase, since)| since + self.duration_ms(phase) * NANOS_PER_MS)
    }

    /// Advances through every phase boundary up to `now`; returns the new
    /// phase if at least one boundary was crossed.
    pub fn update(&mut self, now: u64) -> Option<BreathPhase> {
        let mut changed = None;
        while let (Some((phase, _)), Some(due)) = (self.current, self.next_transition()) {
            if due > now {
                break;
            }
            if phase == BreathPhase::Exhale {
                self.cycles += 1;
            }
            let next = phase.next();
            self.current = Some((next, due));
            changed = Some(next);
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: u64 = NANOS_PER_MS;

    #[test]
    fn speed_scales_durations() {
        let normal = BreathingPacer::new(1.0).unwrap();
        assert_eq!(normal.duration_ms(BreathPhase::Exhale), 6000);
        let fast = BreathingPacer::new(1.5).unwrap();
        assert_eq!(fast.duration_ms(BreathPhase::Inhale), 2667);
        assert!(BreathingPacer::new(0.2).is_err());
        assert!(BreathingPacer::new(2.5).is_err());
    }

    #[test]
    fn cycles_through_phases() {
        let mut pacer = BreathingPacer::new(1.0).unwrap();
        assert_eq!(pacer.phase_label(), "Ready");
        assert!(pacer.start(0));
        assert!(!pacer.start(5));
        assert_eq!(pacer.update(3_999 * MS), None);
        assert_eq!(pacer.update(4_000 * MS), Some(BreathPhase::Hold));
        assert_eq!(pacer.update(14_000 * MS), Some(BreathPhase::Inhale));
        assert_eq!(pacer.cycles(), 1);
        // Two boundaries at once.
        assert_eq!(pacer.update(22_000 * MS), Some(BreathPhase::Exhale));
        assert_eq!(pacer.next_transition(), Some(28_000 * MS));
        assert!(pacer.stop());
        assert_eq!(pacer.update(60_000 * MS), None);
        assert!(!pacer.stop());
    }
}

use cogex_core::{Outcome, RunEnd, Stimulus, Trial, TrialRecord};

/// Ordered trials of one run plus its timestamps.
#[derive(Debug, Clone)]
pub struct Run<S, O> {
    pub trials: Vec<Trial<S, O>>,
    pub started_at: u64,
    pub finished_at: Option<u64>,
    pub end: Option<RunEnd>,
}

impl<S: Stimulus, O: Outcome> Run<S, O> {
    pub fn new(started_at: u64) -> Self {
        Self {
            trials: Vec::new(),
            started_at,
            finished_at: None,
            end: None,
        }
    }

    /// Appends a pending trial and returns its index.
    pub fn present(&mut self, stimulus: S, at: u64) -> usize {
        let index = self.trials.len();
        self.trials.push(Trial::new(index, stimulus, at));
        index
    }

    pub fn presented(&self) -> usize {
        self.trials.len()
    }

    pub fn last(&self) -> Option<&Trial<S, O>> {
        self.trials.last()
    }

    /// Index of the most recent trial if it is still pending.
    pub fn pending_last(&self) -> Option<usize> {
        self.trials
            .last()
            .filter(|t| t.is_pending())
            .map(|t| t.index)
    }

    pub fn classified(&self) -> usize {
        self.trials.iter().filter(|t| !t.is_pending()).count()
    }

    pub fn all_classified(&self) -> bool {
        self.trials.iter().all(|t| !t.is_pending())
    }

    pub fn tally(&self) -> O::Tally {
        let mut tally = O::Tally::default();
        for outcome in self.trials.iter().filter_map(|t| t.outcome) {
            outcome.record(&mut tally);
        }
        tally
    }

    /// Rounded latencies of every trial that got a response.
    pub fn latencies_ms(&self) -> Vec<u64> {
        self.trials.iter().filter_map(|t| t.latency_ms()).collect()
    }

    pub fn records(&self) -> Vec<TrialRecord> {
        self.trials.iter().map(TrialRecord::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cogex_core::{Detection, DetectionTally, Signal};

    #[test]
    fn tally_counts_only_classified_trials() {
        let mut run: Run<Signal, Detection> = Run::new(0);
        let a = run.present(Signal::Go, 10);
        run.trials[a].classify(Detection::Hit, Some(10 + 300_000_000));
        let b = run.present(Signal::NoGo, 20);
        run.trials[b].classify(Detection::CorrectRejection, None);
        run.present(Signal::Go, 30);

        assert_eq!(run.presented(), 3);
        assert_eq!(run.classified(), 2);
        assert_eq!(run.pending_last(), Some(2));
        assert!(!run.all_classified());
        assert_eq!(
            run.tally(),
            DetectionTally {
                hits: 1,
                correct_rejections: 1,
                ..Default::default()
            }
        );
        assert_eq!(run.latencies_ms(), vec![300]);
        assert_eq!(run.records()[1].outcome.as_deref(), Some("correct_rejection"));
    }
}

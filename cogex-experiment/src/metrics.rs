//! Running statistics and the live status line.

use cogex_core::BestScore;
use cogex_core::stats::mean_rounded;

/// Latency statistics over a session, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LatencyStats {
    pub count: usize,
    pub last: Option<u64>,
    pub mean: Option<u64>,
    pub fastest: Option<u64>,
}

impl LatencyStats {
    pub fn from_ms(values: &[u64]) -> Self {
        Self {
            count: values.len(),
            last: values.last().copied(),
            mean: mean_rounded(values),
            fastest: values.iter().copied().min(),
        }
    }
}

/// Builds `"Trial 3/20 • Accuracy: 67% • Best: 85%, 512 ms"` style lines.
#[derive(Debug, Default, Clone)]
pub struct StatusLine {
    parts: Vec<String>,
}

impl StatusLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, part: impl Into<String>) -> Self {
        self.parts.push(part.into());
        self
    }

    pub fn field(self, label: &str, value: impl std::fmt::Display) -> Self {
        self.text(format!("{label}: {value}"))
    }

    pub fn maybe(self, label: &str, value: Option<impl std::fmt::Display>) -> Self {
        match value {
            Some(v) => self.field(label, v),
            None => self,
        }
    }

    pub fn best(self, best: Option<&BestScore>) -> Self {
        match best {
            Some(b) => self.field("Best", b),
            None => self.field("Best", "none"),
        }
    }

    pub fn build(self) -> String {
        self.parts.join(" • ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latency_stats() {
        let stats = LatencyStats::from_ms(&[300, 250, 301]);
        assert_eq!(stats.count, 3);
        assert_eq!(stats.last, Some(301));
        assert_eq!(stats.mean, Some(284));
        assert_eq!(stats.fastest, Some(250));
        assert_eq!(LatencyStats::from_ms(&[]), LatencyStats::default());
    }

    #[test]
    fn status_line_skips_missing_fields() {
        let line = StatusLine::new()
            .text("Trial 3/20")
            .maybe("Mean RT", None::<u64>)
            .field("Accuracy", "67%")
            .best(Some(&BestScore::Accuracy { pct: 85 }))
            .build();
        assert_eq!(line, "Trial 3/20 • Accuracy: 67% • Best: 85%");
    }
}

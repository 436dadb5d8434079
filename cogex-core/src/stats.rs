//! Rounding helpers shared by every score. Everything rounds half away from
//! zero.

pub const NANOS_PER_MS: u64 = 1_000_000;

/// Nanoseconds to whole milliseconds, rounded.
pub fn ns_to_ms(ns: u64) -> u64 {
    ns.saturating_add(NANOS_PER_MS / 2) / NANOS_PER_MS
}

/// round(100 * numer / denom); 0 when nothing has been counted.
pub fn percent(numer: usize, denom: usize) -> u32 {
    if denom == 0 {
        return 0;
    }
    (100.0 * numer as f64 / denom as f64).round() as u32
}

/// Rounded arithmetic mean; `None` for an empty slice.
pub fn mean_rounded(values: &[u64]) -> Option<u64> {
    if values.is_empty() {
        return None;
    }
    let sum: u64 = values.iter().sum();
    Some((sum as f64 / values.len() as f64).round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_rounds_half_up() {
        assert_eq!(percent(25, 30), 83);
        assert_eq!(percent(1, 8), 13); // 12.5
        assert_eq!(percent(17, 20), 85);
        assert_eq!(percent(0, 0), 0);
    }

    #[test]
    fn ms_conversion_rounds() {
        assert_eq!(ns_to_ms(1_499_999), 1);
        assert_eq!(ns_to_ms(1_500_000), 2);
        assert_eq!(ns_to_ms(u64::MAX), u64::MAX / NANOS_PER_MS);
    }

    #[test]
    fn mean_of_latencies() {
        assert_eq!(mean_rounded(&[]), None);
        assert_eq!(mean_rounded(&[300, 301]), Some(301));
        assert_eq!(mean_rounded(&[250, 310, 400]), Some(320));
    }
}

use rand::Rng;

pub const NANOS_PER_MS: u64 = 1_000_000;

pub fn ms_to_ns(ms: u64) -> u64 {
    ms.saturating_mul(NANOS_PER_MS)
}

/// Uniform delay in `[min_ms, max_ms)`. A degenerate range yields `min_ms`.
pub fn uniform_delay_ms<R: Rng + ?Sized>(rng: &mut R, min_ms: u64, max_ms: u64) -> u64 {
    if max_ms <= min_ms {
        return min_ms;
    }
    rng.random_range(min_ms..max_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn delays_stay_in_half_open_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1_000 {
            let d = uniform_delay_ms(&mut rng, 800, 2600);
            assert!((800..2600).contains(&d));
        }
    }

    #[test]
    fn degenerate_range() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(uniform_delay_ms(&mut rng, 500, 500), 500);
        assert_eq!(uniform_delay_ms(&mut rng, 500, 100), 500);
    }
}

use crate::error::EngineError;
use crate::market::Market;
use crate::series::TimeSeries;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Random-walk price generator for demos and smoke tests. Each instrument
/// gets a drift and a stability level drawn once, then every step adds a
/// fluctuation mixing the series' own mean movement with fresh noise. Seeded,
/// so a scenario can be regenerated exactly.
pub fn generate(instruments: usize, ticks: usize, seed: u64) -> Vec<(String, Vec<f64>)> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..instruments)
        .map(|index| {
            let name = format!("sim-{index}");
            let start = rng.gen_range(10..=500) as f64;
            let drift = rng.gen_range(-6.0..=6.0);
            let stability = rng.gen_range(-2.0..=2.0);
            let (lo, hi) = if drift <= stability {
                (drift, stability)
            } else {
                (stability, drift)
            };

            let mut past = vec![start];
            for _ in 0..ticks {
                let first = past[0];
                let last = *past.last().expect("seeded with a start price");
                let mean_fluct = (last - first) / past.len() as f64;
                let fluct = mean_fluct * rng.gen_range(-6.0..=6.0) + rng.gen_range(lo..=hi);
                past.push(last + fluct);
            }
            (name, past)
        })
        .collect()
}

pub fn generate_market(instruments: usize, ticks: usize, seed: u64) -> Result<Market, EngineError> {
    let mut market = Market::new();
    for (name, observations) in generate(instruments, ticks, seed) {
        market.add_series(TimeSeries::new(name, observations))?;
    }
    Ok(market)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_the_requested_shape() {
        let series = generate(3, 40, 7);
        assert_eq!(series.len(), 3);
        assert_eq!(series[0].0, "sim-0");
        assert!(series.iter().all(|(_, past)| past.len() == 41));
    }

    #[test]
    fn same_seed_reproduces_the_same_walk() {
        assert_eq!(generate(2, 25, 42), generate(2, 25, 42));
    }

    #[test]
    fn different_seeds_diverge() {
        assert_ne!(generate(1, 25, 1), generate(1, 25, 2));
    }
}

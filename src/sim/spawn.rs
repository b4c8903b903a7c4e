//! Next-piece value generator
//!
//! Small numbers show up more often than big ones: on a level whose largest
//! piece is `max`, value `v` has weight `max - v + 2`.

use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;

/// Sampling weight of `value` when pieces go up to `max_number`
pub fn spawn_weight(value: u8, max_number: u8) -> u32 {
    if value == 0 || value > max_number {
        0
    } else {
        u32::from(max_number - value) + 2
    }
}

/// Pick a piece value in `1..=max_number`
pub fn pick_value<R: Rng + ?Sized>(rng: &mut R, max_number: u8) -> u8 {
    let max_number = max_number.max(1);
    let weights: Vec<u32> = (1..=max_number)
        .map(|value| spawn_weight(value, max_number))
        .collect();

    match WeightedIndex::new(&weights) {
        Ok(dist) => dist.sample(rng) as u8 + 1,
        Err(e) => {
            log::warn!("Bad spawn weights for max {}: {}", max_number, e);
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_weights_for_five() {
        let weights: Vec<u32> = (1..=5).map(|v| spawn_weight(v, 5)).collect();
        assert_eq!(weights, vec![6, 5, 4, 3, 2]);
        assert_eq!(weights.iter().sum::<u32>(), 20);
        assert_eq!(spawn_weight(0, 5), 0);
        assert_eq!(spawn_weight(6, 5), 0);
    }

    #[test]
    fn test_distribution_matches_weights() {
        let mut rng = Pcg32::seed_from_u64(7);
        let draws = 40_000;
        let mut counts = [0u32; 6];
        for _ in 0..draws {
            let v = pick_value(&mut rng, 5);
            assert!((1..=5).contains(&v));
            counts[v as usize] += 1;
        }

        for value in 1..=5u8 {
            let expected = f64::from(spawn_weight(value, 5)) / 20.0;
            let observed = f64::from(counts[value as usize]) / f64::from(draws);
            assert!(
                (observed - expected).abs() < 0.015,
                "value {}: observed {:.3}, expected {:.3}",
                value,
                observed,
                expected
            );
        }
    }

    #[test]
    fn test_single_value_level() {
        let mut rng = Pcg32::seed_from_u64(1);
        for _ in 0..100 {
            assert_eq!(pick_value(&mut rng, 1), 1);
        }
        // Zero is treated as one
        assert_eq!(pick_value(&mut rng, 0), 1);
    }
}

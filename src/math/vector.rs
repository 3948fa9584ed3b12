//! Flat `f64` vector helpers shared by the modules, the optimizer and the
//! trainer. Parameters and gradients are plain slices; no matrix type is
//! needed because every layer indexes its weights directly.

use rand::Rng;

/// Inner product of two equal-length slices.
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Element-wise (Hadamard) product of two equal-length slices.
pub fn hadamard(a: &[f64], b: &[f64]) -> Vec<f64> {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b.iter()).map(|(x, y)| x * y).collect()
}

/// Samples `len` values uniformly from [-1, 1).
pub fn random_uniform<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Vec<f64> {
    (0..len).map(|_| rng.gen::<f64>() * 2.0 - 1.0).collect()
}

pub fn mean(v: &[f64]) -> f64 {
    if v.is_empty() {
        return 0.0;
    }
    v.iter().sum::<f64>() / v.len() as f64
}

/// Population standard deviation.
pub fn std_dev(v: &[f64]) -> f64 {
    if v.is_empty() {
        return 0.0;
    }
    let m = mean(v);
    (v.iter().map(|x| (x - m).powi(2)).sum::<f64>() / v.len() as f64).sqrt()
}

/// Index of the maximum element in a slice.
pub fn argmax(v: &[f64]) -> usize {
    v.iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Rounds `x` to `digits` decimal places. Returns `x` unchanged when `digits`
/// is beyond what an `f64` can resolve.
pub fn round_to(x: f64, digits: u32) -> f64 {
    let scale = match i32::try_from(digits) {
        Ok(d) => 10f64.powi(d),
        Err(_) => return x,
    };
    let scaled = x * scale;
    if !scale.is_finite() || !scaled.is_finite() {
        return x;
    }
    scaled.round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_dot_and_hadamard() {
        assert_eq!(dot(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]), 32.0);
        assert_eq!(hadamard(&[1.0, -2.0], &[3.0, 0.5]), vec![3.0, -1.0]);
    }

    #[test]
    fn test_random_uniform_is_seeded_and_bounded() {
        let a = random_uniform(16, &mut StdRng::seed_from_u64(7));
        let b = random_uniform(16, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
        assert!(a.iter().all(|x| (-1.0..1.0).contains(x)));
    }

    #[test]
    fn test_stats() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[1.0, 3.0]), 2.0);
        assert!((std_dev(&[1.0, 3.0]) - 1.0).abs() < 1e-12);
        assert_eq!(argmax(&[0.1, 0.7, 0.2]), 1);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(0.123456, 3), 0.123);
        assert_eq!(round_to(0.1235, 2), 0.12);
    }

    #[test]
    fn test_round_to_past_f64_precision_is_identity() {
        assert_eq!(round_to(0.25, 400), 0.25);
        assert_eq!(round_to(0.0, 400), 0.0);
        assert_eq!(round_to(0.25, u32::MAX), 0.25);
        assert_eq!(round_to(1e300, 20), 1e300);
    }
}

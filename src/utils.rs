//! Small numeric helpers shared by the tracker and the kinematic analyzer.

/// Euclidean distance between two 2D points.
#[inline]
pub fn euclidean(a: (f64, f64), b: (f64, f64)) -> f64 {
    (a.0 - b.0).hypot(a.1 - b.1)
}

/// Arithmetic mean of a slice, or `None` when it is empty.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Clamp a value to a range.
pub fn clamp<T: PartialOrd>(value: T, min: T, max: T) -> T {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Ratio `numerator / denominator` clamped to `[0, 1]`.
///
/// Returns `None` when the denominator is not strictly positive or the ratio is not finite.
pub fn unit_ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator <= 0.0 {
        return None;
    }
    let ratio = numerator / denominator;
    if !ratio.is_finite() {
        return None;
    }
    Some(clamp(ratio, 0.0, 1.0))
}

/// Value of `part / total` as a percentage, or `None` for an empty total.
pub fn percentage(part: usize, total: usize) -> Option<f64> {
    if total == 0 {
        return None;
    }
    Some(100.0 * part as f64 / total as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_euclidean() {
        assert_relative_eq!(euclidean((0.0, 0.0), (3.0, 4.0)), 5.0, epsilon = 1e-12);
        assert_relative_eq!(euclidean((1.0, 1.0), (1.0, 1.0)), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), None);
        assert_relative_eq!(mean(&[1.0, 2.0, 3.0]).unwrap(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(5, 0, 10), 5);
        assert_eq!(clamp(-5, 0, 10), 0);
        assert_eq!(clamp(15, 0, 10), 10);
    }

    #[test]
    fn test_unit_ratio() {
        assert_eq!(unit_ratio(1.0, 0.0), None);
        assert_eq!(unit_ratio(1.0, -2.0), None);
        assert_relative_eq!(unit_ratio(1.0, 4.0).unwrap(), 0.25, epsilon = 1e-12);
        // Noise can push a ratio slightly above one
        assert_relative_eq!(unit_ratio(1.02, 1.0).unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_percentage() {
        assert_eq!(percentage(3, 0), None);
        assert_relative_eq!(percentage(1, 4).unwrap(), 25.0, epsilon = 1e-12);
    }
}

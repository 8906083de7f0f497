//! Standard deviation helpers.
//!
//! Population: sqrt(sum((x - mean)^2) / n)
//! Sample:     sqrt(sum((x - mean)^2) / (n - 1))

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn population_stddev(values: &[f64]) -> Option<f64> {
    let mean = mean(values)?;
    let variance = values
        .iter()
        .map(|v| {
            let diff = v - mean;
            diff * diff
        })
        .sum::<f64>()
        / values.len() as f64;
    Some(variance.sqrt())
}

/// Needs at least two observations.
pub fn sample_stddev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let variance = values
        .iter()
        .map(|v| {
            let diff = v - mean;
            diff * diff
        })
        .sum::<f64>()
        / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_empty_is_none() {
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn population_known_value() {
        // mean 5, squared deviations sum 32, / 8 = 4
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((population_stddev(&values).unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn sample_known_value() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let expected = (32.0_f64 / 7.0).sqrt();
        assert!((sample_stddev(&values).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn constant_values_have_zero_spread() {
        assert_eq!(population_stddev(&[3.0; 6]), Some(0.0));
        assert_eq!(sample_stddev(&[3.0; 6]), Some(0.0));
    }

    #[test]
    fn sample_needs_two_points() {
        assert_eq!(sample_stddev(&[1.0]), None);
        assert_eq!(population_stddev(&[1.0]), Some(0.0));
    }
}

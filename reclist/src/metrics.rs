//! Metric routines used by the concrete suites.

use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetricError {
    #[error("Length mismatch: {what} has {actual} entries, expected {expected}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Cannot compute {metric} over empty input")]
    Empty { metric: &'static str },

    #[error("Invalid cutoff k = {k}")]
    InvalidK { k: usize },
}

pub type MetricResult<T> = Result<T, MetricError>;

fn check_lengths(what: &'static str, expected: usize, actual: usize) -> MetricResult<()> {
    if expected != actual {
        return Err(MetricError::LengthMismatch {
            what,
            expected,
            actual,
        });
    }
    Ok(())
}

/// Fraction of positions where prediction equals target.
pub fn accuracy<T: PartialEq>(targets: &[T], predictions: &[T]) -> MetricResult<f64> {
    check_lengths("predictions", targets.len(), predictions.len())?;
    if targets.is_empty() {
        return Err(MetricError::Empty { metric: "accuracy" });
    }

    let hits = targets
        .iter()
        .zip(predictions)
        .filter(|(target, prediction)| target == prediction)
        .count();

    Ok(hits as f64 / targets.len() as f64)
}

/// Accuracy computed separately for every slice label.
pub fn accuracy_per_slice<T: PartialEq>(
    targets: &[T],
    predictions: &[T],
    slices: &[String],
) -> MetricResult<BTreeMap<String, f64>> {
    check_lengths("predictions", targets.len(), predictions.len())?;
    check_lengths("slices", targets.len(), slices.len())?;
    if targets.is_empty() {
        return Err(MetricError::Empty {
            metric: "accuracy_per_slice",
        });
    }

    // slice -> (hits, total)
    let mut counts: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for ((target, prediction), slice) in targets.iter().zip(predictions).zip(slices) {
        let entry = counts.entry(slice.as_str()).or_insert((0, 0));
        if target == prediction {
            entry.0 += 1;
        }
        entry.1 += 1;
    }

    Ok(counts
        .into_iter()
        .map(|(slice, (hits, total))| (slice.to_string(), hits as f64 / total as f64))
        .collect())
}

/// Fraction of targets found among the first `k` ranked predictions.
pub fn hit_rate_at_k<T: PartialEq>(
    targets: &[T],
    ranked_predictions: &[Vec<T>],
    k: usize,
) -> MetricResult<f64> {
    if k == 0 {
        return Err(MetricError::InvalidK { k });
    }
    check_lengths("ranked predictions", targets.len(), ranked_predictions.len())?;
    if targets.is_empty() {
        return Err(MetricError::Empty {
            metric: "hit_rate_at_k",
        });
    }

    let hits = targets
        .iter()
        .zip(ranked_predictions)
        .filter(|(target, ranking)| ranking.iter().take(k).any(|item| item == *target))
        .count();

    Ok(hits as f64 / targets.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy() {
        assert_eq!(accuracy(&[1, 0, 1, 1], &[1, 1, 1, 0]).unwrap(), 0.5);
        assert_eq!(accuracy(&["a"], &["a"]).unwrap(), 1.0);
    }

    #[test]
    fn test_accuracy_edge_cases() {
        let empty: [u8; 0] = [];
        assert_eq!(
            accuracy(&empty, &empty),
            Err(MetricError::Empty { metric: "accuracy" })
        );
        assert!(matches!(
            accuracy(&[1, 2], &[1]),
            Err(MetricError::LengthMismatch {
                expected: 2,
                actual: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_accuracy_per_slice() {
        let slices = vec![
            "cat".to_string(),
            "dog".to_string(),
            "cat".to_string(),
            "dog".to_string(),
        ];
        let result = accuracy_per_slice(&[1, 1, 0, 0], &[1, 0, 0, 0], &slices).unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result["cat"], 1.0);
        assert_eq!(result["dog"], 0.5);
    }

    #[test]
    fn test_accuracy_per_slice_needs_one_slice_per_target() {
        let slices = vec!["cat".to_string()];
        assert!(matches!(
            accuracy_per_slice(&[1, 1], &[1, 1], &slices),
            Err(MetricError::LengthMismatch { what: "slices", .. })
        ));
    }

    #[test]
    fn test_hit_rate_at_k() {
        let targets = vec!["a", "b", "c"];
        let rankings = vec![vec!["a", "x"], vec!["x", "b"], vec!["x", "y"]];

        let at_one = hit_rate_at_k(&targets, &rankings, 1).unwrap();
        assert!((at_one - 1.0 / 3.0).abs() < 1e-12);

        let at_two = hit_rate_at_k(&targets, &rankings, 2).unwrap();
        assert!((at_two - 2.0 / 3.0).abs() < 1e-12);

        assert!((hit_rate_at_k(&targets, &rankings, 10).unwrap() - at_two).abs() < 1e-12);
    }

    #[test]
    fn test_hit_rate_rejects_zero_k() {
        assert_eq!(
            hit_rate_at_k(&["a"], &[vec!["a"]], 0),
            Err(MetricError::InvalidK { k: 0 })
        );
    }
}

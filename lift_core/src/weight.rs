//! Resolution of set specifications into concrete target weights.

use crate::{Error, ExerciseConfig, Result, SetSpec, SetWeight};

/// Tolerance for float noise when snapping to an increment
const ROUNDING_EPSILON: f64 = 1e-9;

/// A set spec resolved against an exercise
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedSet {
    pub target_weight: f64,
    /// Only set for percentage-based specs
    pub percentage_of_max: Option<f64>,
}

/// Resolve a set spec to the weight the lifter should load
///
/// - Percentage: `max * pct / 100`, rounded to the nearest multiple of the
///   increment (ties round up), then raised to the barbell weight.
/// - Fixed: the value itself, raised to the barbell weight.
/// - Bar only: the barbell weight (0 without a barbell).
///
/// A non-positive increment is rejected. A non-positive max is not.
pub fn resolve_weight(spec: &SetSpec, exercise: &ExerciseConfig) -> Result<ResolvedSet> {
    if !(exercise.weight_increment > 0.0) {
        return Err(Error::Validation(format!(
            "weight increment must be positive, got {}",
            exercise.weight_increment
        )));
    }

    let resolved = match spec.weight {
        SetWeight::Percentage(pct) => {
            let raw = exercise.max_weight * pct / 100.0;
            let rounded = round_to_increment(raw, exercise.weight_increment);
            ResolvedSet {
                target_weight: clamp_to_bar(rounded, exercise),
                percentage_of_max: Some(pct),
            }
        }
        SetWeight::Fixed(weight) => ResolvedSet {
            target_weight: clamp_to_bar(weight, exercise),
            percentage_of_max: None,
        },
        SetWeight::BarOnly => ResolvedSet {
            target_weight: exercise.barbell_weight.max(0.0),
            percentage_of_max: None,
        },
    };

    tracing::debug!(
        "Resolved {:?} against max {} -> {}",
        spec.weight,
        exercise.max_weight,
        resolved.target_weight
    );

    Ok(resolved)
}

/// Round to the nearest multiple of `increment`, ties away from zero
pub fn round_to_increment(weight: f64, increment: f64) -> f64 {
    let steps = weight / increment;
    let rounded = if steps >= 0.0 {
        (steps + 0.5 + ROUNDING_EPSILON).floor()
    } else {
        (steps - 0.5 - ROUNDING_EPSILON).ceil()
    };
    rounded * increment
}

fn clamp_to_bar(weight: f64, exercise: &ExerciseConfig) -> f64 {
    if exercise.uses_barbell() {
        weight.max(exercise.barbell_weight)
    } else {
        weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(max: f64, increment: f64, bar: f64) -> ExerciseConfig {
        ExerciseConfig {
            max_weight: max,
            weight_increment: increment,
            auto_progression_enabled: true,
            barbell_weight: bar,
        }
    }

    fn spec(weight: SetWeight) -> SetSpec {
        SetSpec {
            weight,
            reps: 5,
            rest_time: None,
        }
    }

    #[test]
    fn test_percentage_tie_rounds_up() {
        // 225 * 0.7 = 157.5, exactly between 155 and 160
        let resolved = resolve_weight(&spec(SetWeight::Percentage(70.0)), &config(225.0, 5.0, 45.0))
            .unwrap();
        assert_eq!(resolved.target_weight, 160.0);
        assert_eq!(resolved.percentage_of_max, Some(70.0));
    }

    #[test]
    fn test_percentage_rounds_to_nearest() {
        // 200 * 0.72 = 144 -> 145; 200 * 0.71 = 142 -> 140
        let cfg = config(200.0, 5.0, 45.0);
        let up = resolve_weight(&spec(SetWeight::Percentage(72.0)), &cfg).unwrap();
        let down = resolve_weight(&spec(SetWeight::Percentage(71.0)), &cfg).unwrap();
        assert_eq!(up.target_weight, 145.0);
        assert_eq!(down.target_weight, 140.0);
    }

    #[test]
    fn test_fractional_increment() {
        // 100 * 0.66 = 66 -> nearest 2.5 is 65
        let resolved =
            resolve_weight(&spec(SetWeight::Percentage(66.0)), &config(100.0, 2.5, 0.0)).unwrap();
        assert_eq!(resolved.target_weight, 65.0);
    }

    #[test]
    fn test_percentage_clamped_to_bar() {
        let resolved =
            resolve_weight(&spec(SetWeight::Percentage(20.0)), &config(100.0, 5.0, 45.0)).unwrap();
        assert_eq!(resolved.target_weight, 45.0);
    }

    #[test]
    fn test_fixed_weight() {
        let cfg = config(300.0, 5.0, 45.0);
        let heavy = resolve_weight(&spec(SetWeight::Fixed(135.0)), &cfg).unwrap();
        assert_eq!(heavy.target_weight, 135.0);
        assert_eq!(heavy.percentage_of_max, None);

        let light = resolve_weight(&spec(SetWeight::Fixed(20.0)), &cfg).unwrap();
        assert_eq!(light.target_weight, 45.0);

        let no_bar = resolve_weight(&spec(SetWeight::Fixed(20.0)), &config(300.0, 5.0, 0.0))
            .unwrap();
        assert_eq!(no_bar.target_weight, 20.0);
    }

    #[test]
    fn test_bar_only() {
        let with_bar = resolve_weight(&spec(SetWeight::BarOnly), &config(300.0, 5.0, 45.0)).unwrap();
        assert_eq!(with_bar.target_weight, 45.0);
        assert_eq!(with_bar.percentage_of_max, None);

        let without = resolve_weight(&spec(SetWeight::BarOnly), &config(300.0, 5.0, 0.0)).unwrap();
        assert_eq!(without.target_weight, 0.0);
    }

    #[test]
    fn test_non_positive_increment_rejected() {
        let result = resolve_weight(&spec(SetWeight::Percentage(70.0)), &config(225.0, 0.0, 45.0));
        assert!(matches!(result, Err(Error::Validation(_))));

        let result = resolve_weight(&spec(SetWeight::Fixed(70.0)), &config(225.0, -5.0, 45.0));
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_zero_max_floors_at_bar() {
        let resolved =
            resolve_weight(&spec(SetWeight::Percentage(80.0)), &config(0.0, 5.0, 45.0)).unwrap();
        assert_eq!(resolved.target_weight, 45.0);
    }

    #[test]
    fn test_results_are_increment_multiples() {
        let increments = [1.0, 2.5, 5.0, 10.0];
        for &increment in &increments {
            for max in (50..=500).step_by(37) {
                for pct in (0..=200).step_by(7) {
                    let cfg = config(max as f64, increment, 45.0);
                    let resolved =
                        resolve_weight(&spec(SetWeight::Percentage(pct as f64)), &cfg).unwrap();
                    assert!(resolved.target_weight >= 45.0);
                    if resolved.target_weight > 45.0 {
                        let steps = resolved.target_weight / increment;
                        assert!(
                            (steps - steps.round()).abs() < 1e-6,
                            "{} is not a multiple of {}",
                            resolved.target_weight,
                            increment
                        );
                    }
                }
            }
        }
    }
}

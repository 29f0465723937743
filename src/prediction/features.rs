/// Model input for one grid cell: relative humidity, specific humidity, wind magnitude.
pub type FeatureVector = [f64; 3];

pub const FEATURE_NAMES: [&str; 3] = ["relative_humidity", "specific_humidity", "wind_speed"];

/// Builds the feature vector of a cell from its raw `(rh, q, u, v, w)` values.
///
/// The wind feature is the Euclidean norm of the three wind components; a missing
/// component makes the whole magnitude missing.
pub fn feature_vector(raw: [f64; 5]) -> FeatureVector {
    let [rh, q, u, v, w] = raw;
    [rh, q, (u * u + v * v + w * w).sqrt()]
}

/// Replaces every `NaN` in `batch` with the mean of the non-missing values of the same
/// feature in the same batch.
///
/// Returns the name of the first feature that is missing in every vector; in that case
/// `batch` is left untouched.
pub fn impute_batch_means(batch: &mut [FeatureVector]) -> Result<(), &'static str> {
    let mut means = [0.0; 3];
    for (feature, mean) in means.iter_mut().enumerate() {
        let (sum, count) = batch
            .iter()
            .map(|vector| vector[feature])
            .filter(|value| !value.is_nan())
            .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
        if count == 0 {
            return Err(FEATURE_NAMES[feature]);
        }
        *mean = sum / count as f64;
    }

    for vector in batch.iter_mut() {
        for (value, mean) in vector.iter_mut().zip(means) {
            if value.is_nan() {
                *value = mean;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wind_magnitude() {
        let vector = feature_vector([95.0, 0.009, 3.0, 4.0, 0.0]);
        assert_eq!(vector, [95.0, 0.009, 5.0]);
        assert!(feature_vector([95.0, 0.009, f64::NAN, 4.0, 0.0])[2].is_nan());
    }

    #[test]
    fn test_imputes_from_other_vectors_in_batch() {
        let mut batch = vec![
            [90.0, 0.008, 2.0],
            [f64::NAN, 0.010, 4.0],
            [80.0, f64::NAN, f64::NAN],
        ];
        impute_batch_means(&mut batch).unwrap();
        assert_eq!(batch[1][0], 85.0);
        assert!((batch[2][1] - 0.009).abs() < 1e-12);
        assert_eq!(batch[2][2], 3.0);
        assert_eq!(batch[0], [90.0, 0.008, 2.0]);
    }

    #[test]
    fn test_all_missing_feature_is_reported() {
        let mut batch = vec![[90.0, f64::NAN, 2.0], [91.0, f64::NAN, f64::NAN]];
        assert_eq!(impute_batch_means(&mut batch), Err("specific_humidity"));
        assert!(batch[1][2].is_nan());
    }
}

//! Sample preparation: filtering, deterministic splitting, oversampling
//!
//! Each grid-search iteration gets its own reproducible train/test split,
//! then rebalances the training pool by duplicating disturbance-class
//! samples up to per-class target sizes. The stable class (label 0) is
//! never oversampled.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use taigamap_core::{Error, RawSample, Result, SamplePoint};

/// Offset added to the iteration index to seed the split RNG.
/// Keeps iteration 0 from reusing the bare default seed.
pub const SPLIT_SEED_OFFSET: u64 = 97;

/// Fraction of samples routed to the training pool
pub const TRAIN_FRACTION: f64 = 0.75;

/// Filtering rules applied before parsing
#[derive(Debug, Clone, Default)]
pub struct FilterParams {
    /// Fields every usable sample must carry
    pub required: Vec<String>,
    /// Band whose zero or non-finite value marks a sample unusable
    pub quality_band: Option<String>,
}

/// Drop unusable raw samples and coerce the survivors to numeric form.
///
/// A sample is dropped when a required field is absent, or when the
/// quality band parses to zero or a non-finite value. Malformed values in
/// other fields still coerce to 0 rather than dropping the sample.
pub fn filter_and_parse(raw: &[RawSample], params: &FilterParams) -> Vec<SamplePoint> {
    raw.iter()
        .filter(|sample| sample.has_fields(&params.required))
        .map(|sample| sample.parse())
        .filter(|point| match &params.quality_band {
            Some(band) => point
                .features
                .get(band)
                .is_some_and(|v| v.is_finite() && *v != 0.0),
            None => true,
        })
        .collect()
}

/// Deterministic train/test split for one grid iteration.
///
/// Every sample draws a pseudo-random fraction from an RNG seeded by the
/// iteration index; fractions below [`TRAIN_FRACTION`] go to the training
/// pool. The split is reproducible per iteration yet distinct across
/// iterations.
pub fn split_samples(samples: &[SamplePoint], iteration: usize) -> (Vec<SamplePoint>, Vec<SamplePoint>) {
    let mut rng = StdRng::seed_from_u64(iteration as u64 + SPLIT_SEED_OFFSET);
    let mut train = Vec::new();
    let mut test = Vec::new();
    for sample in samples {
        if rng.gen::<f64>() < TRAIN_FRACTION {
            train.push(sample.clone());
        } else {
            test.push(sample.clone());
        }
    }
    (train, test)
}

/// Oversample disturbance classes 1..=3 up to the per-class `targets`.
///
/// Classes already at or above their target are left alone. A target for
/// a class with zero observed samples is a configuration error surfaced
/// with the offending region and iteration.
pub fn oversample(
    samples: &mut Vec<SamplePoint>,
    targets: [usize; 3],
    region: u8,
    iteration: usize,
) -> Result<()> {
    let mut rng = StdRng::seed_from_u64(iteration as u64 + SPLIT_SEED_OFFSET);

    for (class_index, &target) in targets.iter().enumerate() {
        let label = class_index as i32 + 1;
        let members: Vec<usize> = samples
            .iter()
            .enumerate()
            .filter(|(_, s)| s.label == label)
            .map(|(i, _)| i)
            .collect();

        if members.is_empty() {
            return Err(Error::EmptyClass {
                region,
                iteration,
                label,
            });
        }
        if target <= members.len() {
            continue;
        }

        let needed = target - members.len();
        for _ in 0..needed {
            let pick = members[rng.gen_range(0..members.len())];
            let duplicate = samples[pick].clone();
            samples.push(duplicate);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn point(label: i32, ndvi: f64) -> SamplePoint {
        SamplePoint {
            label,
            features: HashMap::from([("ndvi".to_string(), ndvi)]),
        }
    }

    fn raw(label: &str, pairs: &[(&str, &str)]) -> RawSample {
        RawSample {
            label: label.to_string(),
            fields: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_filter_drops_missing_required_field() {
        let samples = vec![
            raw("1", &[("ndvi", "500"), ("qa", "1")]),
            raw("1", &[("qa", "1")]),
        ];
        let params = FilterParams {
            required: vec!["ndvi".to_string()],
            quality_band: None,
        };
        assert_eq!(filter_and_parse(&samples, &params).len(), 1);
    }

    #[test]
    fn test_filter_drops_zero_quality() {
        let samples = vec![
            raw("1", &[("ndvi", "500"), ("qa", "1")]),
            raw("1", &[("ndvi", "400"), ("qa", "0")]),
            raw("1", &[("ndvi", "300"), ("qa", "bogus")]),
        ];
        let params = FilterParams {
            required: vec![],
            quality_band: Some("qa".to_string()),
        };
        // "bogus" coerces to 0 and is dropped with the explicit zero
        assert_eq!(filter_and_parse(&samples, &params).len(), 1);
    }

    #[test]
    fn test_split_is_deterministic_and_iteration_dependent() {
        let samples: Vec<SamplePoint> = (0..200).map(|i| point(0, i as f64)).collect();

        let (train_a, test_a) = split_samples(&samples, 3);
        let (train_b, test_b) = split_samples(&samples, 3);
        assert_eq!(train_a.len(), train_b.len());
        assert_eq!(test_a.len(), test_b.len());

        let (train_c, _) = split_samples(&samples, 4);
        // Different iterations draw different fractions
        let a_vals: Vec<f64> = train_a.iter().map(|s| s.features["ndvi"]).collect();
        let c_vals: Vec<f64> = train_c.iter().map(|s| s.features["ndvi"]).collect();
        assert_ne!(a_vals, c_vals);

        assert_eq!(train_a.len() + test_a.len(), samples.len());
        // Around 3/4 of the pool should land in training
        assert!(train_a.len() > samples.len() / 2);
    }

    #[test]
    fn test_oversample_reaches_targets() {
        let mut samples = vec![
            point(0, 1.0),
            point(1, 2.0),
            point(1, 3.0),
            point(2, 4.0),
            point(3, 5.0),
        ];
        oversample(&mut samples, [6, 4, 1], 1, 0).unwrap();

        let count = |label| samples.iter().filter(|s| s.label == label).count();
        assert_eq!(count(1), 6);
        assert_eq!(count(2), 4);
        // Already at target: untouched
        assert_eq!(count(3), 1);
        // Stable class never duplicated
        assert_eq!(count(0), 1);
    }

    #[test]
    fn test_oversample_no_shrinking() {
        let mut samples = vec![point(1, 1.0), point(1, 2.0), point(2, 3.0), point(3, 4.0)];
        oversample(&mut samples, [1, 1, 1], 1, 0).unwrap();
        assert_eq!(samples.len(), 4);
    }

    #[test]
    fn test_oversample_empty_class_is_error() {
        let mut samples = vec![point(0, 1.0), point(1, 2.0)];
        let err = oversample(&mut samples, [5, 5, 5], 9, 3).unwrap_err();
        match err {
            Error::EmptyClass {
                region,
                iteration,
                label,
            } => {
                assert_eq!(region, 9);
                assert_eq!(iteration, 3);
                assert_eq!(label, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

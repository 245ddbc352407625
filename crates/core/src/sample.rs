//! Labeled sample points for classifier training
//!
//! Sample libraries are curated externally and arrive with string-or-numeric
//! encoded values. Coercion is lenient by contract: an empty or malformed
//! value parses to 0, and labels always cast to integers.

use std::collections::HashMap;

/// A sample point as stored in a region's library, values still raw.
#[derive(Debug, Clone, Default)]
pub struct RawSample {
    /// Raw label value (string-or-numeric encoded)
    pub label: String,
    /// Raw feature values keyed by feature name
    pub fields: HashMap<String, String>,
}

impl RawSample {
    /// Whether every named field is present
    pub fn has_fields(&self, names: &[String]) -> bool {
        names.iter().all(|n| self.fields.contains_key(n))
    }

    /// Coerce all values to numeric form
    pub fn parse(&self) -> SamplePoint {
        let features = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), coerce_numeric(v)))
            .collect();
        SamplePoint {
            label: coerce_numeric(&self.label) as i32,
            features,
        }
    }
}

/// A parsed sample point ready for training
#[derive(Debug, Clone)]
pub struct SamplePoint {
    /// Class label: 0 = stable, 1..K = disturbance subtype
    pub label: i32,
    /// Numeric feature values keyed by feature name
    pub features: HashMap<String, f64>,
}

impl SamplePoint {
    /// Feature values in the given order, or None if any name is absent
    pub fn to_vector(&self, names: &[String]) -> Option<Vec<f64>> {
        names
            .iter()
            .map(|n| self.features.get(n).copied())
            .collect()
    }
}

/// Coerce a raw value to f64. Empty or malformed input yields 0.
pub fn coerce_numeric(raw: &str) -> f64 {
    raw.trim().parse::<f64>().unwrap_or(0.0)
}

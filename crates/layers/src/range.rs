//! Per-dataset value domains used for color mapping.

use std::collections::BTreeMap;

use tracing::debug;

/// Fallback domain when a dataset yields no usable values.
pub const DEFAULT_RANGE: ValueRange = ValueRange {
    min: 1.0,
    max: 100.0,
};

/// A color-mapping domain `[min, max]` over the `DN` property.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

/// Whether zero-valued `DN` features participate in domain computation.
///
/// The historical behavior is `ExcludeZeros` (only `dn > 0` counts), which
/// silently drops legitimate zero-valued data points. `IncludeZeros` keeps
/// them; negatives and NaN are ignored under both policies.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ZeroPolicy {
    #[default]
    ExcludeZeros,
    IncludeZeros,
}

impl ZeroPolicy {
    fn admits(self, value: f64) -> bool {
        match self {
            ZeroPolicy::ExcludeZeros => value > 0.0,
            ZeroPolicy::IncludeZeros => value >= 0.0,
        }
    }
}

/// Maintains one stable value domain per dataset.
///
/// A domain is computed once, on the first batch of observed values for a
/// dataset, and reused unchanged afterwards so color semantics never shift
/// across incremental loads of more locations or years. Only the external
/// range-override action goes through `reset`/`override_range`.
#[derive(Debug, Default)]
pub struct RangeTracker {
    ranges: BTreeMap<String, ValueRange>,
    zero_policy: ZeroPolicy,
}

impl RangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_zero_policy(zero_policy: ZeroPolicy) -> Self {
        Self {
            ranges: BTreeMap::new(),
            zero_policy,
        }
    }

    pub fn get(&self, dataset: &str) -> Option<ValueRange> {
        self.ranges.get(dataset).copied()
    }

    /// Returns the tracked range for `dataset`, computing it from `values`
    /// only if absent. An existing range is returned unchanged even when
    /// the new values would suggest different extremes.
    pub fn ensure_range(
        &mut self,
        dataset: &str,
        values: impl IntoIterator<Item = f64>,
    ) -> ValueRange {
        if let Some(range) = self.ranges.get(dataset) {
            return *range;
        }

        let mut observed: Option<ValueRange> = None;
        for value in values {
            if value.is_nan() || !self.zero_policy.admits(value) {
                continue;
            }
            observed = Some(match observed {
                None => ValueRange::new(value, value),
                Some(r) => ValueRange::new(r.min.min(value), r.max.max(value)),
            });
        }

        let range = observed.unwrap_or(DEFAULT_RANGE);
        debug!(dataset, min = range.min, max = range.max, "dataset range set");
        self.ranges.insert(dataset.to_string(), range);
        range
    }

    /// Clears the tracked range so the next batch recomputes it. Invoked
    /// only by the external range-override action, never by load cycles.
    pub fn reset(&mut self, dataset: &str) {
        self.ranges.remove(dataset);
    }

    /// Installs a user-supplied domain, replacing any tracked one.
    pub fn override_range(&mut self, dataset: impl Into<String>, range: ValueRange) {
        self.ranges.insert(dataset.into(), range);
    }
}

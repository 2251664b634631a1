//! Numeric arithmetic over property values
//!
//! Integer arithmetic is checked; on overflow the result is promoted to a
//! float rather than wrapping.

use crate::structure::PropertyValue;

/// `a + b`, `None` when either side is not a number
pub fn add(a: &PropertyValue, b: &PropertyValue) -> Option<PropertyValue> {
    match (a, b) {
        (PropertyValue::Integer(x), PropertyValue::Integer(y)) => Some(
            x.checked_add(*y)
                .map(PropertyValue::Integer)
                .unwrap_or(PropertyValue::Float(*x as f64 + *y as f64)),
        ),
        _ => Some(PropertyValue::Float(a.as_f64()? + b.as_f64()?)),
    }
}

/// `value * bulk`
pub fn mul_bulk(value: &PropertyValue, bulk: u64) -> Option<PropertyValue> {
    match value {
        PropertyValue::Integer(x) => Some(
            i64::try_from(bulk)
                .ok()
                .and_then(|b| x.checked_mul(b))
                .map(PropertyValue::Integer)
                .unwrap_or(PropertyValue::Float(*x as f64 * bulk as f64)),
        ),
        PropertyValue::Float(x) => Some(PropertyValue::Float(x * bulk as f64)),
        _ => None,
    }
}

/// Smaller of two numbers with numeric promotion; ties keep `a`
pub fn min(a: &PropertyValue, b: &PropertyValue) -> Option<PropertyValue> {
    let ord = a.compare_loose(b)?;
    Some(if ord.is_le() { a.clone() } else { b.clone() })
}

/// Larger of two numbers with numeric promotion; ties keep `a`
pub fn max(a: &PropertyValue, b: &PropertyValue) -> Option<PropertyValue> {
    let ord = a.compare_loose(b)?;
    Some(if ord.is_ge() { a.clone() } else { b.clone() })
}

/// Bulk-weighted running sum and count
///
/// Each input contributes `value * bulk` to the sum and `bulk` to the
/// count, so merged traversers aggregate to the same result as unmerged
/// ones.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkAccumulator {
    sum: PropertyValue,
    count: u64,
}

impl Default for BulkAccumulator {
    fn default() -> Self {
        Self {
            sum: PropertyValue::Integer(0),
            count: 0,
        }
    }
}

impl BulkAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate `value` weighted by `bulk`; `false` if `value` is not a number
    pub fn add(&mut self, value: &PropertyValue, bulk: u64) -> bool {
        let Some(sum) = mul_bulk(value, bulk).and_then(|weighted| add(&self.sum, &weighted)) else {
            return false;
        };
        self.sum = sum;
        self.count = self.count.saturating_add(bulk);
        true
    }

    /// Merge a partial accumulator
    pub fn combine(&mut self, other: &BulkAccumulator) {
        if let Some(sum) = add(&self.sum, &other.sum) {
            self.sum = sum;
        }
        self.count = self.count.saturating_add(other.count);
    }

    pub fn sum(&self) -> &PropertyValue {
        &self.sum
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// `sum / count` as a float, `None` when nothing was accumulated
    pub fn mean(&self) -> Option<PropertyValue> {
        if self.count == 0 {
            return None;
        }
        Some(PropertyValue::Float(self.sum.as_f64()? / self.count as f64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_overflow_promotes() {
        let big = PropertyValue::Integer(i64::MAX);
        match add(&big, &PropertyValue::Integer(1)) {
            Some(PropertyValue::Float(f)) => assert!(f > i64::MAX as f64 - 1.0),
            other => panic!("expected float promotion, got {:?}", other),
        }
        assert!(matches!(mul_bulk(&big, 2), Some(PropertyValue::Float(_))));
    }

    #[test]
    fn test_mixed_addition() {
        assert_eq!(
            add(&PropertyValue::Integer(1), &PropertyValue::Float(0.5)),
            Some(PropertyValue::Float(1.5))
        );
        assert_eq!(add(&PropertyValue::Integer(1), &PropertyValue::from("x")), None);
    }

    #[test]
    fn test_bulk_weighting_matches_repetition() {
        let mut merged = BulkAccumulator::new();
        merged.add(&PropertyValue::Integer(4), 3);
        merged.add(&PropertyValue::Integer(1), 1);

        let mut plain = BulkAccumulator::new();
        for v in [4, 4, 4, 1] {
            plain.add(&PropertyValue::Integer(v), 1);
        }
        assert_eq!(merged, plain);
        assert_eq!(merged.mean(), Some(PropertyValue::Float(3.25)));
    }

    #[test]
    fn test_empty_mean_is_none() {
        assert_eq!(BulkAccumulator::new().mean(), None);
        assert!(!BulkAccumulator::new().add(&PropertyValue::Null, 1));
    }

    #[test]
    fn test_min_max() {
        let a = PropertyValue::Integer(2);
        let b = PropertyValue::Float(1.5);
        assert_eq!(min(&a, &b), Some(b.clone()));
        assert_eq!(max(&a, &b), Some(a.clone()));
    }
}

//! Inclusive reference id range.

use serde::{Deserialize, Serialize};

use crate::error::SweepError;

/// Closed interval `[start, end]` of reference ids, validated on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefRange {
    start: u64,
    end: u64,
}

impl RefRange {
    pub fn new(start: u64, end: u64) -> Result<Self, SweepError> {
        if start > end {
            return Err(SweepError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    /// Number of ids in the range (never zero; saturates for the full u64 span).
    pub fn len(&self) -> u64 {
        (self.end - self.start).saturating_add(1)
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, id: u64) -> bool {
        (self.start..=self.end).contains(&id)
    }

    /// Ids remaining after `id` (0 when `id` is the last one).
    pub fn remaining_after(&self, id: u64) -> u64 {
        self.end.saturating_sub(id)
    }

    /// Ascending iterator over every id.
    pub fn iter(&self) -> std::ops::RangeInclusive<u64> {
        self.start..=self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reversed_bounds_rejected() {
        let err = RefRange::new(10, 9).unwrap_err();
        assert!(matches!(err, SweepError::InvalidRange { start: 10, end: 9 }));
    }

    #[test]
    fn single_id_range() {
        let r = RefRange::new(7, 7).unwrap();
        assert_eq!(r.len(), 1);
        assert_eq!(r.iter().collect::<Vec<_>>(), vec![7]);
        assert_eq!(r.remaining_after(7), 0);
    }

    #[test]
    fn contains_is_inclusive() {
        let r = RefRange::new(164_847, 177_697).unwrap();
        assert!(r.contains(164_847));
        assert!(r.contains(177_697));
        assert!(!r.contains(164_846));
        assert!(!r.contains(177_698));
        assert_eq!(r.len(), 12_851);
    }

    #[test]
    fn full_u64_span_does_not_overflow_iteration_start() {
        let r = RefRange::new(u64::MAX - 1, u64::MAX).unwrap();
        assert_eq!(r.len(), 2);
        assert_eq!(r.iter().count(), 2);
    }
}

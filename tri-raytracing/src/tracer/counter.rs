use std::ops::{Add, AddAssign};

/// Counts the triangle and bounding box tests of a traversal.
///
/// Counters of sub-tasks are merged by addition, which is associative and commutative, so the
/// order in which sub-tasks complete does not matter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TestCounter {
    /// The number of triangle tests.
    checks: u64,

    /// The number of bounding box tests.
    bbox_checks: u64,
}

impl TestCounter {
    /// Creates a counter with the given values.
    #[inline]
    pub fn new(checks: u64, bbox_checks: u64) -> Self {
        Self {
            checks,
            bbox_checks,
        }
    }

    /// Increases the triangle test count.
    #[inline]
    pub fn add_check(&mut self) {
        self.checks += 1;
    }

    /// Increases the bounding box test count.
    #[inline]
    pub fn add_bbox_check(&mut self) {
        self.bbox_checks += 1;
    }

    /// Adds the counts of another counter.
    #[inline]
    pub fn add_checks(&mut self, o: &Self) {
        self.checks += o.checks;
        self.bbox_checks += o.bbox_checks;
    }

    /// Returns the number of triangle tests.
    #[inline]
    pub fn checks(&self) -> u64 {
        self.checks
    }

    /// Returns the number of bounding box tests.
    #[inline]
    pub fn bbox_checks(&self) -> u64 {
        self.bbox_checks
    }
}

impl Add<Self> for TestCounter {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            checks: self.checks + rhs.checks,
            bbox_checks: self.bbox_checks + rhs.bbox_checks,
        }
    }
}

impl AddAssign<Self> for TestCounter {
    fn add_assign(&mut self, rhs: Self) {
        self.add_checks(&rhs);
    }
}

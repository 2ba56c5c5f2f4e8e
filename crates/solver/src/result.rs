use std::collections::BTreeMap;
use std::fmt;

use microflow_smtlib::Symbol;

/// A closed real interval `[lower, upper]`.
///
/// Bounds may be infinite but never NaN, and `lower <= upper`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    lower: f64,
    upper: f64,
}

impl Interval {
    /// Returns `None` if either bound is NaN or `lower > upper`.
    pub fn new(lower: f64, upper: f64) -> Option<Self> {
        if lower.is_nan() || upper.is_nan() || lower > upper {
            None
        } else {
            Some(Self { lower, upper })
        }
    }

    /// Degenerate interval `[value, value]`.
    pub fn point(value: f64) -> Option<Self> {
        Self::new(value, value)
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    /// Representative value. Not finite when a bound is infinite.
    pub fn midpoint(&self) -> f64 {
        self.lower / 2.0 + self.upper / 2.0
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.lower, self.upper)
    }
}

/// Outcome of a solve: satisfiability plus per-symbol intervals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntervalResult {
    satisfiable: bool,
    intervals: BTreeMap<Symbol, Interval>,
}

impl IntervalResult {
    pub fn unsatisfiable() -> Self {
        Self::default()
    }

    pub fn satisfiable(intervals: BTreeMap<Symbol, Interval>) -> Self {
        Self {
            satisfiable: true,
            intervals,
        }
    }

    pub fn is_satisfiable(&self) -> bool {
        self.satisfiable
    }

    pub fn get(&self, name: &str) -> Option<&Interval> {
        self.intervals.get(name)
    }

    pub fn intervals(&self) -> &BTreeMap<Symbol, Interval> {
        &self.intervals
    }

    pub fn into_intervals(self) -> BTreeMap<Symbol, Interval> {
        self.intervals
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, &Interval)> {
        self.intervals.iter()
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }
}
